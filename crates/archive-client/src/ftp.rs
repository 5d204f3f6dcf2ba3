//! FTP sessions via `suppaftp`.

use std::io::Write;
use std::net::{SocketAddr, ToSocketAddrs};

use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};
use tracing::{debug, info, instrument};

use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, Result};
use crate::transport::{ArchiveConnector, ArchiveTransport};

/// Opens passive-mode binary FTP sessions.
#[derive(Debug, Clone)]
pub struct FtpConnector {
    config: ArchiveConfig,
}

impl FtpConnector {
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    fn resolve(&self) -> Result<SocketAddr> {
        let endpoint = self.config.endpoint();
        (self.config.host.as_str(), self.config.port)
            .to_socket_addrs()
            .map_err(|e| ArchiveError::Connection {
                endpoint: endpoint.clone(),
                message: e.to_string(),
            })?
            .next()
            .ok_or_else(|| ArchiveError::Connection {
                endpoint,
                message: "host resolved to no addresses".to_string(),
            })
    }
}

impl ArchiveConnector for FtpConnector {
    type Transport = FtpTransport;

    #[instrument(skip(self), fields(endpoint = %self.config.endpoint()))]
    fn connect(&self) -> Result<FtpTransport> {
        let endpoint = self.config.endpoint();
        let connection_error = |e: FtpError| ArchiveError::Connection {
            endpoint: endpoint.clone(),
            message: e.to_string(),
        };

        let addr = self.resolve()?;
        let mut stream = FtpStream::connect_timeout(addr, self.config.connect_timeout())
            .map_err(connection_error)?;

        stream
            .get_ref()
            .set_read_timeout(Some(self.config.read_timeout()))
            .map_err(|e| connection_error(FtpError::ConnectionError(e)))?;

        stream
            .login(self.config.user.as_str(), self.config.password.as_str())
            .map_err(|e| ArchiveError::Auth {
                endpoint: endpoint.clone(),
                message: e.to_string(),
            })?;

        stream
            .transfer_type(FileType::Binary)
            .map_err(connection_error)?;

        info!(user = %self.config.user, "Archive session opened");
        Ok(FtpTransport { stream })
    }

    fn endpoint(&self) -> String {
        self.config.endpoint()
    }
}

/// An authenticated FTP session.
pub struct FtpTransport {
    stream: FtpStream,
}

impl ArchiveTransport for FtpTransport {
    fn list(&mut self, path: &str) -> Result<Vec<String>> {
        let entries = self
            .stream
            .nlst(Some(path))
            .map_err(|e| ArchiveError::listing(path, e))?;
        debug!(path = %path, entries = entries.len(), "Listed directory");
        Ok(entries)
    }

    fn retrieve(&mut self, path: &str, sink: &mut dyn Write) -> Result<u64> {
        self.stream
            .retr(path, |data| {
                std::io::copy(data, &mut *sink).map_err(FtpError::ConnectionError)
            })
            .map_err(|e| ArchiveError::fetch(path, e))
    }

    fn close(&mut self) -> Result<()> {
        self.stream.quit().map_err(|e| ArchiveError::Connection {
            endpoint: "archive".to_string(),
            message: format!("quit failed: {e}"),
        })
    }
}
