//! Remote archive client for GSMaP snapshots.
//!
//! The archive is a directory tree partitioned as `{root}/{YYYY}/{MM}/{DD}/`
//! holding one gzip-wrapped grid per half hour, plus a rolling "latest"
//! directory. Every call takes an absolute path; the client never changes a
//! remote working directory.
//!
//! # Architecture
//!
//! - [`ArchiveTransport`] is the raw session (list a directory, retrieve a file).
//! - [`ArchiveConnector`] opens sessions; [`FtpConnector`] does so over FTP and
//!   [`MemoryArchive`] serves an in-process tree.
//! - [`ArchiveClient`] layers the archive layout and scoped staging on top.
//!
//! A session serves one request at a time and is not `Sync`-shared; callers
//! open one per scan or sync.

mod client;
pub mod config;
pub mod error;
mod ftp;
pub mod memory;
mod staging;
mod transport;

pub use client::ArchiveClient;
pub use config::{ArchiveConfig, ArchiveLayout};
pub use error::{ArchiveError, Result};
pub use ftp::{FtpConnector, FtpTransport};
pub use memory::{ConnectFailure, MemoryArchive, MemoryTransport};
pub use staging::{StagedFile, StagingArea};
pub use transport::{ArchiveConnector, ArchiveTransport};
