use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Defaults read from `<data-dir>/config.toml`. Every field is
/// optional; CLI flags win over the file, the file wins over built-ins.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scope used when --scope is not passed.
    pub default_scope: Option<String>,
    /// Experts shown in top/bottom listings.
    pub top_n: usize,
    /// Cluster edge threshold used when --threshold is not passed.
    pub cluster_threshold: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_scope: None,
            top_n: 10,
            cluster_threshold: moetrace_engine::DEFAULT_CLUSTER_THRESHOLD,
        }
    }
}

impl Config {
    /// Load the config file, falling back to defaults when it does not
    /// exist. A present-but-invalid file is an error, not a silent
    /// fallback.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("invalid config: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.top_n, 10);
        assert!(config.default_scope.is_none());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_scope = \"agent:a1\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.default_scope.as_deref(), Some("agent:a1"));
        assert_eq!(config.top_n, 10);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "top_n = \"lots\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
