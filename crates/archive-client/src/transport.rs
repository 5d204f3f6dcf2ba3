//! Session abstractions the client is written against.

use std::io::Write;

use crate::error::Result;

/// One open archive session.
///
/// Paths are always absolute. Implementations never keep a working
/// directory between calls.
pub trait ArchiveTransport {
    /// Entry names in a directory. Entries may be bare names or full paths.
    fn list(&mut self, path: &str) -> Result<Vec<String>>;

    /// Stream a file into `sink`, returning the number of bytes written.
    ///
    /// On error `sink` may hold a partial transfer.
    fn retrieve(&mut self, path: &str, sink: &mut dyn Write) -> Result<u64>;

    /// End the session. Errors while closing are not fatal to the caller.
    fn close(&mut self) -> Result<()>;
}

/// Opens sessions against one archive endpoint.
pub trait ArchiveConnector {
    type Transport: ArchiveTransport;

    /// Connect and authenticate.
    ///
    /// Fails with `Connection` when the endpoint cannot be reached and with
    /// `Auth` when the credentials are rejected.
    fn connect(&self) -> Result<Self::Transport>;

    /// Endpoint description for logs.
    fn endpoint(&self) -> String;
}
