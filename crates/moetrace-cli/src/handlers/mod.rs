pub mod analyze;
pub mod ingest;
pub mod list;
pub mod show;
pub mod status;

use is_terminal::IsTerminal;

/// Color only when stdout is a real terminal, so piped output stays
/// clean.
pub(crate) fn use_color() -> bool {
    std::io::stdout().is_terminal()
}

/// Truncate to `max_chars` on a char boundary, with a `...` marker.
pub(crate) fn truncate_for_display(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
