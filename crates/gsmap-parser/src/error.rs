//! Error types for snapshot decoding.

use rain_common::{ErrorKind, RainError};
use thiserror::Error;

/// Errors that can occur while turning snapshot bytes into a grid.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("decompression failed: {0}")]
    Decompression(String),

    #[error("expected {expected} bytes of grid data, got {actual}")]
    Format { expected: usize, actual: usize },
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::Decompression(_) => ErrorKind::Decompress,
            ParseError::Format { .. } => ErrorKind::Format,
        }
    }
}

impl From<ParseError> for RainError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Decompression(msg) => RainError::Decompress(msg),
            ParseError::Format { .. } => RainError::Format(err.to_string()),
        }
    }
}

/// Result type for decoding operations.
pub type Result<T> = std::result::Result<T, ParseError>;
