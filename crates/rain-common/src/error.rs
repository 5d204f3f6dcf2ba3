//! Error taxonomy shared by the archive client, decoder, scanner and sync.

use thiserror::Error;

/// Result type alias using RainError.
pub type RainResult<T> = Result<T, RainError>;

/// Classified failure of an archive operation.
///
/// Only session-establishment failures (`Connection`, `Auth`) are fatal; the
/// rest describe a single listing or probe and let a scan carry on.
#[derive(Debug, Error)]
pub enum RainError {
    // === Session Errors (fatal) ===
    #[error("Failed to connect to archive: {0}")]
    Connection(String),

    #[error("Archive rejected credentials: {0}")]
    Auth(String),

    // === Navigation Errors ===
    #[error("Failed to list {path}: {message}")]
    Listing { path: String, message: String },

    // === Probe Errors ===
    #[error("Failed to fetch {path}: {message}")]
    Fetch { path: String, message: String },

    #[error("Failed to decompress snapshot: {0}")]
    Decompress(String),

    #[error("Invalid grid format: {0}")]
    Format(String),

    // === Caller Errors ===
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

/// Coarse error classification used for logging and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    Auth,
    Listing,
    Fetch,
    Decompress,
    Format,
    Configuration,
}

impl ErrorKind {
    /// Session-establishment failures abort the whole operation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::Connection | ErrorKind::Auth)
    }

    /// Stable label for metrics and structured logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Connection => "connection",
            ErrorKind::Auth => "auth",
            ErrorKind::Listing => "listing",
            ErrorKind::Fetch => "fetch",
            ErrorKind::Decompress => "decompress",
            ErrorKind::Format => "format",
            ErrorKind::Configuration => "configuration",
        }
    }
}

impl RainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RainError::Connection(_) => ErrorKind::Connection,
            RainError::Auth(_) => ErrorKind::Auth,
            RainError::Listing { .. } => ErrorKind::Listing,
            RainError::Fetch { .. } => ErrorKind::Fetch,
            RainError::Decompress(_) => ErrorKind::Decompress,
            RainError::Format(_) => ErrorKind::Format,
            RainError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }
}
