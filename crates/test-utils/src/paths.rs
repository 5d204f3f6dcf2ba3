//! Locating workspace files from tests.

use std::path::PathBuf;

/// Returns the workspace root directory.
///
/// Determined from this crate's manifest directory, which sits at
/// `crates/test-utils` below the root.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// The shipped `config/` directory.
pub fn workspace_config_dir() -> PathBuf {
    workspace_root().join("config")
}
