//! Scan error types.

use std::path::PathBuf;

use archive_client::ArchiveError;
use gsmap_parser::ParseError;
use rain_common::{ErrorKind, RainError};
use thiserror::Error;

/// Why a single probe produced no reading.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl ProbeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProbeError::Archive(e) => e.kind(),
            ProbeError::Parse(e) => e.kind(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }
}

/// Failures that end a scan without a result.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("archive session failed: {0}")]
    Session(#[source] ArchiveError),

    #[error("invalid scan configuration: {0}")]
    Configuration(String),

    #[error("failed to load profile {path}: {message}")]
    Profile { path: PathBuf, message: String },
}

impl ScanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::Session(e) => e.kind(),
            ScanError::Configuration(_) | ScanError::Profile { .. } => ErrorKind::Configuration,
        }
    }
}

impl From<ScanError> for RainError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Session(e) => e.into(),
            other => RainError::Configuration(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skippable_failure_labels() {
        let cases = [
            (ProbeError::from(ArchiveError::fetch("/now/x.gz", "426 aborted")), "fetch"),
            (ProbeError::from(ParseError::Decompression("bad header".into())), "decompress"),
            (
                ProbeError::from(ParseError::Format {
                    expected: 17_280_000,
                    actual: 64,
                }),
                "format",
            ),
        ];
        for (err, label) in cases {
            assert_eq!(err.kind().as_str(), label);
            assert!(!err.is_fatal());
        }
    }

    #[test]
    fn test_session_failures_are_fatal() {
        let err = ProbeError::from(ArchiveError::Auth {
            endpoint: "hokusai.eorc.jaxa.jp:21".to_string(),
            message: "530 Login incorrect".to_string(),
        });
        assert!(err.is_fatal());
        assert_eq!(err.kind().as_str(), "auth");
    }
}
