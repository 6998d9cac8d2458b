use std::fmt;

/// Result type for moetrace-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the persistence layer
#[derive(Debug)]
pub enum Error {
    /// Requested artifact id does not exist in the scope.
    NotFound(String),

    /// Artifact exists but cannot be parsed. Fatal on direct `get`;
    /// batch aggregation skips and counts these instead.
    CorruptSnapshot {
        id: String,
        source: serde_json::Error,
    },

    /// Storage substrate unavailable for read or write. Always
    /// surfaced: silent data loss in research telemetry is worse than
    /// a failed request.
    Storage(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound(id) => write!(f, "Session not found: {}", id),
            Error::CorruptSnapshot { id, source } => {
                write!(f, "Corrupt session snapshot {}: {}", id, source)
            }
            Error::Storage(err) => write!(f, "Storage error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotFound(_) => None,
            Error::CorruptSnapshot { source, .. } => Some(source),
            Error::Storage(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(err)
    }
}
