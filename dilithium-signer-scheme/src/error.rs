use thiserror::Error;

use crate::level::SecurityLevel;

/// A level tag that is not one of `"2"`, `"3"` or `"5"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported security level {0:?} (expected one of \"2\", \"3\", \"5\")")]
pub struct UnsupportedLevel(pub String);

/// Which piece of key material a length check refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMaterial {
    PublicKey,
    SecretKey,
    Signature,
}

impl KeyMaterial {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyMaterial::PublicKey => "public key",
            KeyMaterial::SecretKey => "secret key",
            KeyMaterial::Signature => "signature",
        }
    }
}

/// Errors returned by the Dilithium engines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemeError {
    #[error("{} length {actual} does not match Dilithium{level} (expected {expected})", .material.as_str())]
    KeyLength {
        level: SecurityLevel,
        material: KeyMaterial,
        expected: usize,
        actual: usize,
    },
    #[error("signature verification failed")]
    VerifyFailed,
    #[error("backend {0} is not compiled into this build")]
    BackendUnavailable(&'static str),
    #[error("{context}: {details}")]
    Integration {
        context: &'static str,
        details: String,
    },
}

/// Result alias for scheme operations.
pub type SchemeResult<T> = Result<T, SchemeError>;
