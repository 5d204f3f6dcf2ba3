//! In-process archive.
//!
//! Serves a tree of files held in memory through the same traits as the FTP
//! transport. Directories exist implicitly while they contain a file. Listing
//! and fetch failures can be injected per path, and every retrieve is logged
//! so callers can check which snapshots were touched.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;

use crate::error::{ArchiveError, Result};
use crate::transport::{ArchiveConnector, ArchiveTransport};

/// Failure returned by [`MemoryArchive::connect`] when injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectFailure {
    Unreachable,
    BadCredentials,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, Bytes>,
    failing_lists: HashSet<String>,
    failing_fetches: HashSet<String>,
    connect_failure: Option<ConnectFailure>,
    fetch_log: Vec<String>,
    sessions_opened: usize,
    sessions_closed: usize,
}

/// Shared handle to an in-memory archive. Clones see the same tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    state: Arc<Mutex<State>>,
}

fn dir_key(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    format!("{trimmed}/")
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace a file at an absolute path.
    pub fn insert(&self, path: &str, data: impl Into<Bytes>) {
        self.state().files.insert(path.to_string(), data.into());
    }

    /// Remove every file below a directory.
    pub fn clear_dir(&self, dir: &str) {
        let prefix = dir_key(dir);
        self.state().files.retain(|path, _| !path.starts_with(&prefix));
    }

    /// Make listing `dir` fail.
    pub fn fail_listing(&self, dir: &str) {
        self.state().failing_lists.insert(dir_key(dir));
    }

    /// Make retrieving `path` fail after a partial transfer.
    pub fn fail_fetch(&self, path: &str) {
        self.state().failing_fetches.insert(path.to_string());
    }

    /// Make every subsequent connect fail.
    pub fn fail_connect(&self, failure: ConnectFailure) {
        self.state().connect_failure = Some(failure);
    }

    /// Paths passed to `retrieve`, in call order, including failed ones.
    pub fn fetch_log(&self) -> Vec<String> {
        self.state().fetch_log.clone()
    }

    /// `(opened, closed)` session counts.
    pub fn sessions(&self) -> (usize, usize) {
        let state = self.state();
        (state.sessions_opened, state.sessions_closed)
    }
}

impl ArchiveConnector for MemoryArchive {
    type Transport = MemoryTransport;

    fn connect(&self) -> Result<MemoryTransport> {
        let mut state = self.state();
        match state.connect_failure {
            Some(ConnectFailure::Unreachable) => Err(ArchiveError::Connection {
                endpoint: "memory".to_string(),
                message: "connection refused".to_string(),
            }),
            Some(ConnectFailure::BadCredentials) => Err(ArchiveError::Auth {
                endpoint: "memory".to_string(),
                message: "530 Login incorrect".to_string(),
            }),
            None => {
                state.sessions_opened += 1;
                Ok(MemoryTransport {
                    archive: self.clone(),
                })
            }
        }
    }

    fn endpoint(&self) -> String {
        "memory".to_string()
    }
}

/// Session over a [`MemoryArchive`].
#[derive(Debug)]
pub struct MemoryTransport {
    archive: MemoryArchive,
}

impl ArchiveTransport for MemoryTransport {
    fn list(&mut self, path: &str) -> Result<Vec<String>> {
        let prefix = dir_key(path);
        let state = self.archive.state();
        if state.failing_lists.contains(&prefix) {
            return Err(ArchiveError::listing(path, "421 Service not available"));
        }

        let children: BTreeSet<String> = state
            .files
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter_map(|rest| rest.split('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        if children.is_empty() {
            return Err(ArchiveError::listing(path, "550 No such file or directory"));
        }
        Ok(children.into_iter().collect())
    }

    fn retrieve(&mut self, path: &str, sink: &mut dyn Write) -> Result<u64> {
        let (data, failing) = {
            let mut state = self.archive.state();
            state.fetch_log.push(path.to_string());
            (
                state.files.get(path).cloned(),
                state.failing_fetches.contains(path),
            )
        };

        let data = data.ok_or_else(|| ArchiveError::fetch(path, "550 No such file"))?;
        if failing {
            let half = data.len() / 2;
            sink.write_all(&data[..half])
                .map_err(|e| ArchiveError::fetch(path, e))?;
            return Err(ArchiveError::fetch(path, "426 Transfer aborted"));
        }

        sink.write_all(&data).map_err(|e| ArchiveError::fetch(path, e))?;
        Ok(data.len() as u64)
    }

    fn close(&mut self) -> Result<()> {
        self.archive.state().sessions_closed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_children() {
        let archive = MemoryArchive::new();
        archive.insert("/root/2024/11/10/a.gz", vec![1u8]);
        archive.insert("/root/2024/11/12/b.gz", vec![2u8]);
        archive.insert("/root/2024/11/12/c.gz", vec![3u8]);

        let mut session = archive.connect().unwrap();
        assert_eq!(session.list("/root/2024/11/").unwrap(), vec!["10", "12"]);
        assert_eq!(session.list("/root/2024/11/12").unwrap(), vec!["b.gz", "c.gz"]);
        assert!(session.list("/root/2024/12/").is_err());
    }

    #[test]
    fn test_injected_fetch_failure_writes_partial() {
        let archive = MemoryArchive::new();
        archive.insert("/d/f.gz", vec![0u8; 10]);
        archive.fail_fetch("/d/f.gz");

        let mut session = archive.connect().unwrap();
        let mut sink = Vec::new();
        let err = session.retrieve("/d/f.gz", &mut sink).unwrap_err();
        assert!(matches!(err, ArchiveError::Fetch { .. }));
        assert_eq!(sink.len(), 5);
        assert_eq!(archive.fetch_log(), vec!["/d/f.gz"]);
    }

    #[test]
    fn test_connect_failures() {
        let archive = MemoryArchive::new();
        archive.fail_connect(ConnectFailure::BadCredentials);
        assert!(matches!(archive.connect(), Err(ArchiveError::Auth { .. })));
        archive.fail_connect(ConnectFailure::Unreachable);
        assert!(matches!(archive.connect(), Err(ArchiveError::Connection { .. })));
        assert_eq!(archive.sessions(), (0, 0));
    }
}
