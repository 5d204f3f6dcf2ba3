//! Error types for archive access.

use rain_common::{ErrorKind, RainError};
use thiserror::Error;

/// Errors raised by archive sessions.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("failed to connect to {endpoint}: {message}")]
    Connection { endpoint: String, message: String },

    #[error("login rejected by {endpoint}: {message}")]
    Auth { endpoint: String, message: String },

    #[error("failed to list {path}: {message}")]
    Listing { path: String, message: String },

    #[error("failed to fetch {path}: {message}")]
    Fetch { path: String, message: String },
}

impl ArchiveError {
    /// Create a Listing error.
    pub fn listing(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Listing {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a Fetch error.
    pub fn fetch(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Fetch {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ArchiveError::Connection { .. } => ErrorKind::Connection,
            ArchiveError::Auth { .. } => ErrorKind::Auth,
            ArchiveError::Listing { .. } => ErrorKind::Listing,
            ArchiveError::Fetch { .. } => ErrorKind::Fetch,
        }
    }

    /// Connect and auth failures end the whole operation.
    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }
}

impl From<ArchiveError> for RainError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::Connection { .. } => RainError::Connection(err.to_string()),
            ArchiveError::Auth { .. } => RainError::Auth(err.to_string()),
            ArchiveError::Listing { path, message } => RainError::Listing { path, message },
            ArchiveError::Fetch { path, message } => RainError::Fetch { path, message },
        }
    }
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;
