//! Archive connection settings and directory layout.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection settings for the FTP archive.
#[derive(Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Archive host name
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Socket read timeout in seconds while a session is open
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// Directory for in-flight transfers (system temp dir when unset)
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    #[serde(default)]
    pub layout: ArchiveLayout,
}

fn default_host() -> String {
    "hokusai.eorc.jaxa.jp".to_string()
}

fn default_port() -> u16 {
    21
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_read_timeout() -> u64 {
    120
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: String::new(),
            password: String::new(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            staging_dir: None,
            layout: ArchiveLayout::default(),
        }
    }
}

impl ArchiveConfig {
    /// Same settings against another host with other credentials.
    pub fn with_credentials(
        &self,
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            ..self.clone()
        }
    }

    /// `host:port`, used in logs and errors.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl fmt::Debug for ArchiveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("read_timeout_secs", &self.read_timeout_secs)
            .field("staging_dir", &self.staging_dir)
            .field("layout", &self.layout)
            .finish()
    }
}

/// Where snapshots live on the archive and how they are named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveLayout {
    /// Root of the `{YYYY}/{MM}/{DD}/` tree
    #[serde(default = "default_root")]
    pub root: String,

    /// Rolling directory holding the most recent snapshots
    #[serde(default = "default_latest_dir")]
    pub latest_dir: String,

    /// Only keep filenames starting with this product name. Unset keeps
    /// every grid file, whatever product it belongs to.
    #[serde(default)]
    pub file_prefix: Option<String>,

    /// Snapshot filenames end with this suffix
    #[serde(default = "default_file_suffix")]
    pub file_suffix: String,
}

fn default_root() -> String {
    "/now/half_hour_G".to_string()
}

fn default_latest_dir() -> String {
    "/now/latest".to_string()
}

fn default_file_suffix() -> String {
    ".gz".to_string()
}

impl Default for ArchiveLayout {
    fn default() -> Self {
        Self {
            root: default_root(),
            latest_dir: default_latest_dir(),
            file_prefix: None,
            file_suffix: default_file_suffix(),
        }
    }
}

impl ArchiveLayout {
    /// Same layout under a different date-tree root.
    pub fn with_root(&self, root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ..self.clone()
        }
    }

    /// Same layout restricted to one product.
    pub fn with_prefix(&self, prefix: impl Into<String>) -> Self {
        Self {
            file_prefix: Some(prefix.into()),
            ..self.clone()
        }
    }

    /// True if a listed basename is a compressed grid file of this layout.
    pub fn is_snapshot_name(&self, name: &str) -> bool {
        name.ends_with(&self.file_suffix)
            && self
                .file_prefix
                .as_deref()
                .map_or(true, |prefix| name.starts_with(prefix))
    }
}
