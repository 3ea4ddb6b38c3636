//! Bundled media assets.
//!
//! Assets are opaque byte blobs under an assets directory: the
//! `MOCKINGBIRD_ASSETS_DIR` environment variable when set, else `assets/`
//! relative to the working directory. Files are read once per use and
//! re-emitted inside envelopes; a missing file is a hard error that
//! surfaces through the producer as a failed send.

use std::path::{Path, PathBuf};

/// Error locating or reading a bundled asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("bundled asset not found: {0}")]
    NotFound(String),
    #[error("reading bundled asset: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolve the assets directory (env override, else `assets/`).
pub fn assets_dir() -> PathBuf {
    std::env::var("MOCKINGBIRD_ASSETS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("assets"))
}

/// Read a bundled asset as opaque bytes.
pub fn load(name: &str) -> Result<Vec<u8>, AssetError> {
    load_from(&assets_dir(), name)
}

/// Read an asset from an explicit directory.
pub fn load_from(dir: &Path, name: &str) -> Result<Vec<u8>, AssetError> {
    let path = dir.join(name);
    if !path.exists() {
        return Err(AssetError::NotFound(path.display().to_string()));
    }
    Ok(std::fs::read(&path)?)
}
