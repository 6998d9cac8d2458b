use std::fmt;

/// Partition key for saved sessions: a shared pool, or one pool per
/// agent. Partitions are created on demand at first put.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Shared,
    Agent(String),
}

impl Scope {
    /// Directory-safe partition name.
    pub fn dir_name(&self) -> String {
        match self {
            Scope::Shared => "shared".to_string(),
            Scope::Agent(id) => format!("agent-{}", sanitize(id)),
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Shared
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Shared => write!(f, "shared"),
            Scope::Agent(id) => write!(f, "agent:{}", id),
        }
    }
}

impl std::str::FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == "shared" {
            return Ok(Scope::Shared);
        }
        if let Some(id) = s.strip_prefix("agent:") {
            if id.is_empty() {
                return Err("agent scope requires an id (agent:<id>)".to_string());
            }
            return Ok(Scope::Agent(id.to_string()));
        }
        Err(format!("unknown scope: {} (expected 'shared' or 'agent:<id>')", s))
    }
}

/// Keep agent ids path-safe: anything outside `[A-Za-z0-9._-]`
/// becomes `_`.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_prints_scopes() {
        assert_eq!("shared".parse::<Scope>().unwrap(), Scope::Shared);
        assert_eq!(
            "agent:abc".parse::<Scope>().unwrap(),
            Scope::Agent("abc".to_string())
        );
        assert!("agent:".parse::<Scope>().is_err());
        assert!("bogus".parse::<Scope>().is_err());
        assert_eq!(Scope::Agent("abc".into()).to_string(), "agent:abc");
    }

    #[test]
    fn dir_name_sanitizes_agent_ids() {
        assert_eq!(Scope::Agent("a/b c".into()).dir_name(), "agent-a_b_c");
        assert_eq!(Scope::Shared.dir_name(), "shared");
    }
}
