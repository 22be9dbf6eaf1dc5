//! Error types for source access and element extraction.
//!
//! Uses [`thiserror`] for ergonomic error derivation. [`SourceError`] wraps
//! lopdf and image-codec failures and converts into [`ReflowError`] at the
//! crate boundary.

use reflow_core::ReflowError;
use thiserror::Error;

/// Error type for PDF source operations.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Error from PDF parsing (structure, syntax, object resolution).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// Error reading PDF data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is encrypted.
    #[error("PDF is encrypted and cannot be read")]
    Encrypted,

    /// An embedded raster could not be decoded or re-encoded.
    #[error("image error: {0}")]
    Image(String),

    /// A core library error.
    #[error(transparent)]
    Core(#[from] ReflowError),
}

impl From<lopdf::Error> for SourceError {
    fn from(err: lopdf::Error) -> Self {
        SourceError::Parse(err.to_string())
    }
}

impl From<SourceError> for ReflowError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Parse(msg) => ReflowError::InvalidInput(msg),
            SourceError::Io(e) => ReflowError::InvalidInput(e.to_string()),
            SourceError::Encrypted => {
                ReflowError::UnsupportedFormat("encrypted PDF".to_string())
            }
            SourceError::Image(msg) => ReflowError::Other(format!("image error: {msg}")),
            SourceError::Core(e) => e,
        }
    }
}
