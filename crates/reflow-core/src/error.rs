//! Error types for reflow.
//!
//! Provides [`ReflowError`], the backend-independent failure type shared by
//! every crate in the workspace. Backend crates define richer error enums and
//! convert into this one at their boundary.

use std::fmt;

/// Fatal error types for extraction, layout and conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum ReflowError {
    /// The input is missing, unreadable or structurally invalid.
    InvalidInput(String),
    /// The input or requested output format is not supported.
    UnsupportedFormat(String),
    /// A geometric quantity could not be computed (degenerate page box, etc.).
    Geometry(String),
    /// Any other error not covered by specific variants.
    Other(String),
}

impl fmt::Display for ReflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReflowError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            ReflowError::UnsupportedFormat(msg) => write!(f, "unsupported format: {msg}"),
            ReflowError::Geometry(msg) => write!(f, "geometry error: {msg}"),
            ReflowError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ReflowError {}

impl From<std::io::Error> for ReflowError {
    fn from(err: std::io::Error) -> Self {
        ReflowError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_input() {
        let err = ReflowError::InvalidInput("file missing".to_string());
        assert_eq!(err.to_string(), "invalid input: file missing");
    }

    #[test]
    fn display_unsupported_format() {
        let err = ReflowError::UnsupportedFormat(".xlsx".to_string());
        assert_eq!(err.to_string(), "unsupported format: .xlsx");
    }

    #[test]
    fn display_other_is_bare_message() {
        let err = ReflowError::Other("boom".to_string());
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: ReflowError = io_err.into();
        assert!(matches!(err, ReflowError::InvalidInput(_)));
        assert!(err.to_string().contains("no such file"));
    }

    #[test]
    fn is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(ReflowError::Geometry("x".into()));
        assert_eq!(err.to_string(), "geometry error: x");
    }
}
