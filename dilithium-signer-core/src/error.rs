use std::path::PathBuf;

use dilithium_signer_scheme::{SchemeError, UnsupportedLevel};
use thiserror::Error;

/// Unified error type for key management and commit signing.
///
/// Absence (no local key, unknown signer, unsigned commit) is never an error
/// here; it is reported through `Option` or a dedicated outcome variant.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("local key state at {path} is corrupt ({reason}); regenerate it with `keygen`")]
    CorruptKeyState { path: PathBuf, reason: String },
    #[error("registry entry at {path} is corrupt ({reason}); re-import the key")]
    CorruptRegistryEntry { path: PathBuf, reason: String },
    #[error("malformed key import: {0}")]
    MalformedImport(String),
    #[error("malformed signature annotation: {0}")]
    MalformedAnnotation(String),
    #[error(transparent)]
    UnsupportedLevel(#[from] UnsupportedLevel),
    #[error("identity {0:?} is not a valid email address")]
    InvalidIdentity(String),
    #[error("a keypair already exists at {0}; overwriting it requires confirmation")]
    KeyExists(PathBuf),
    #[error("no local keypair found; run `init` or `keygen` first")]
    NoLocalKey,
    #[error("version control command failed: {0}")]
    Collaborator(String),
    #[error("unable to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Scheme(#[from] SchemeError),
}

impl SignerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SignerError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for signer operations.
pub type Result<T> = std::result::Result<T, SignerError>;
