//! Filesystem locations for local signer state.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SignerError};

/// Directory name used under the user's home directory.
pub const DEFAULT_DIR_NAME: &str = ".dilithium-signer";
const KEY_FILE_NAME: &str = "keys.json";
const REGISTRY_DIR_NAME: &str = "registry";

/// Locations of the key file and registry directory.
///
/// Passed explicitly into [`crate::KeyStore`] and [`crate::Registry`] so
/// independent installations (and tests) never share state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerPaths {
    pub root: PathBuf,
    pub key_file: PathBuf,
    pub registry_dir: PathBuf,
}

impl SignerPaths {
    /// Lay out signer state beneath `root`.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            key_file: root.join(KEY_FILE_NAME),
            registry_dir: root.join(REGISTRY_DIR_NAME),
            root,
        }
    }

    /// `~/.dilithium-signer`, or `None` when no home directory is known.
    pub fn default_home() -> Option<Self> {
        dirs::home_dir().map(|home| Self::from_root(home.join(DEFAULT_DIR_NAME)))
    }

    /// Create the root and registry directories if missing.
    pub fn ensure(&self) -> Result<()> {
        create_dir(&self.root)?;
        create_dir(&self.registry_dir)
    }
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| SignerError::io(path, source))
}
