//! Scoped staging files for downloads.
//!
//! A transfer is written to a named temp file and read back into memory. The
//! file is removed when the [`StagedFile`] is dropped, whether the transfer
//! finished or not.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tempfile::NamedTempFile;

/// Where staging files are created.
#[derive(Debug, Clone, Default)]
pub struct StagingArea {
    dir: Option<PathBuf>,
}

impl StagingArea {
    /// Stage under `dir`, or the system temp dir when `None`.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Create an empty staging file.
    pub fn stage(&self) -> io::Result<StagedFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("snapshot-").suffix(".partial");
        let file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(StagedFile { file })
    }
}

/// A staging file that deletes itself on drop.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
}

impl StagedFile {
    /// Writable handle for the transfer.
    pub fn writer(&mut self) -> &mut File {
        self.file.as_file_mut()
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read the whole transfer back and remove the file.
    pub fn into_bytes(mut self) -> io::Result<Bytes> {
        let file = self.file.as_file_mut();
        file.seek(SeekFrom::Start(0))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Ok(Bytes::from(buf))
    }
}
