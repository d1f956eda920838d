//! Abstractions over Dilithium implementations.

use std::fmt;

use crate::error::{KeyMaterial, SchemeError, SchemeResult};
use crate::level::{KeySizes, SecurityLevel};

/// Dilithium key pair produced by an engine.
#[derive(Clone, PartialEq, Eq)]
pub struct DilithiumKeyPair {
    pub public_key: Vec<u8>,
    pub secret_key: Vec<u8>,
    pub level: SecurityLevel,
}

impl fmt::Debug for DilithiumKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DilithiumKeyPair")
            .field("public_key_len", &self.public_key.len())
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

/// Trait describing a Dilithium implementation bound to one level.
pub trait DilithiumScheme: Send + Sync {
    /// Level this instance is parameterized with.
    fn level(&self) -> SecurityLevel;

    /// Key and signature sizes for this level.
    fn sizes(&self) -> KeySizes;

    /// Generate a fresh key pair.
    fn keygen(&self) -> SchemeResult<DilithiumKeyPair>;

    /// Produce a detached signature over `message`.
    fn sign(&self, secret_key: &[u8], message: &[u8]) -> SchemeResult<Vec<u8>>;

    /// Verify a detached signature.
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> SchemeResult<()>;
}

/// Available Dilithium implementations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    /// PQClean reference code via `pqcrypto-dilithium`.
    #[default]
    PqClean,
    /// liboqs via the `oqs` crate (requires the `liboqs` feature).
    LibOqs,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::PqClean => "pqclean",
            Backend::LibOqs => "liboqs",
        }
    }

    /// Instantiate an engine for `level` on this backend.
    pub fn engine(self, level: SecurityLevel) -> SchemeResult<DilithiumEngine> {
        match self {
            Backend::PqClean => Ok(DilithiumEngine::new(Box::new(
                crate::pqclean::PqCleanDilithium::new(level),
            ))),
            #[cfg(feature = "liboqs")]
            Backend::LibOqs => Ok(DilithiumEngine::new(Box::new(
                crate::liboqs::LibOqsDilithium::new(level)?,
            ))),
            #[cfg(not(feature = "liboqs"))]
            Backend::LibOqs => Err(SchemeError::BackendUnavailable("liboqs")),
        }
    }
}

/// Thin wrapper used by signing logic to call a Dilithium engine.
///
/// All inputs are length-checked against the engine's own level before they
/// reach the primitive, so material from a different level is rejected here
/// rather than being reinterpreted.
pub struct DilithiumEngine {
    inner: Box<dyn DilithiumScheme>,
}

impl DilithiumEngine {
    pub fn new(inner: Box<dyn DilithiumScheme>) -> Self {
        Self { inner }
    }

    pub fn level(&self) -> SecurityLevel {
        self.inner.level()
    }

    pub fn sizes(&self) -> KeySizes {
        self.inner.sizes()
    }

    pub fn keygen(&self) -> SchemeResult<DilithiumKeyPair> {
        let pair = self.inner.keygen()?;
        self.check_len(KeyMaterial::PublicKey, pair.public_key.len())?;
        self.check_len(KeyMaterial::SecretKey, pair.secret_key.len())?;
        Ok(pair)
    }

    pub fn sign(&self, secret_key: &[u8], message: &[u8]) -> SchemeResult<Vec<u8>> {
        self.check_len(KeyMaterial::SecretKey, secret_key.len())?;
        self.inner.sign(secret_key, message)
    }

    /// Verify a signature, folding every failure into `false`.
    pub fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        self.check_len(KeyMaterial::PublicKey, public_key.len())
            .and_then(|_| self.check_len(KeyMaterial::Signature, signature.len()))
            .and_then(|_| self.inner.verify(public_key, message, signature))
            .is_ok()
    }

    /// Check that `len` is the expected size of `material` at this level.
    pub fn check_len(&self, material: KeyMaterial, len: usize) -> SchemeResult<()> {
        let sizes = self.sizes();
        let expected = match material {
            KeyMaterial::PublicKey => sizes.public_key,
            KeyMaterial::SecretKey => sizes.secret_key,
            KeyMaterial::Signature => sizes.signature,
        };
        if len == expected {
            Ok(())
        } else {
            Err(SchemeError::KeyLength {
                level: self.level(),
                material,
                expected,
                actual: len,
            })
        }
    }
}
