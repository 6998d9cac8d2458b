use std::fmt;

/// Result type for moetrace-types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the types layer
#[derive(Debug)]
pub enum Error {
    /// A routing event violated a shape invariant. Signals an
    /// instrumentation bug, so it is never coerced or repaired.
    Validation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(msg) => write!(f, "Invalid routing event: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
