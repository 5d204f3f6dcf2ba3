//! Sync and artifact errors.

use std::path::PathBuf;

use archive_client::ArchiveError;
use gsmap_parser::ParseError;
use rain_common::{ErrorKind, RainError};
use thiserror::Error;

/// Errors reading or writing the persisted artifact.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("rainfall data not yet synced")]
    NotSynced { path: PathBuf },

    #[error("artifact I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact at {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Why a sync did not replace the artifact.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{0}")]
    Configuration(String),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Configuration(_) => ErrorKind::Configuration,
            SyncError::Archive(e) => e.kind(),
            SyncError::Parse(e) => e.kind(),
            // Local write failures have no archive-side category.
            SyncError::Artifact(_) => ErrorKind::Format,
        }
    }
}

impl From<SyncError> for RainError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Configuration(msg) => RainError::Configuration(msg),
            SyncError::Archive(e) => e.into(),
            SyncError::Parse(e) => e.into(),
            SyncError::Artifact(e) => RainError::Format(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
