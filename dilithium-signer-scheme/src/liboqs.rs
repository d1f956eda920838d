#![cfg(feature = "liboqs")]

use std::sync::Once;

use oqs::sig;

use crate::engine::{DilithiumKeyPair, DilithiumScheme};
use crate::error::{SchemeError, SchemeResult};
use crate::level::{KeySizes, SecurityLevel};

/// liboqs-backed Dilithium engine.
pub struct LibOqsDilithium {
    level: SecurityLevel,
    sizes: KeySizes,
}

impl LibOqsDilithium {
    pub fn new(level: SecurityLevel) -> SchemeResult<Self> {
        ensure_liboqs_init();
        let sig = instantiate(level)?;
        let sizes = KeySizes {
            public_key: sig.length_public_key(),
            secret_key: sig.length_secret_key(),
            signature: sig.length_signature(),
        };
        Ok(Self { level, sizes })
    }
}

fn instantiate(level: SecurityLevel) -> SchemeResult<sig::Sig> {
    sig::Sig::new(as_oqs(level)).map_err(|err| map_oqs_error("sig::new", err))
}

fn as_oqs(level: SecurityLevel) -> sig::Algorithm {
    match level {
        SecurityLevel::Level2 => sig::Algorithm::Dilithium2,
        SecurityLevel::Level3 => sig::Algorithm::Dilithium3,
        SecurityLevel::Level5 => sig::Algorithm::Dilithium5,
    }
}

impl DilithiumScheme for LibOqsDilithium {
    fn level(&self) -> SecurityLevel {
        self.level
    }

    fn sizes(&self) -> KeySizes {
        self.sizes
    }

    fn keygen(&self) -> SchemeResult<DilithiumKeyPair> {
        let (public_key, secret_key) = instantiate(self.level)?
            .keypair()
            .map_err(|err| map_oqs_error("sig::keypair", err))?;
        Ok(DilithiumKeyPair {
            public_key: public_key.into_vec(),
            secret_key: secret_key.into_vec(),
            level: self.level,
        })
    }

    fn sign(&self, secret_key: &[u8], message: &[u8]) -> SchemeResult<Vec<u8>> {
        let sig = instantiate(self.level)?;
        let sk = sig
            .secret_key_from_bytes(secret_key)
            .ok_or_else(|| integration("sig::secret_key_from_bytes", "length mismatch"))?;
        let signature = sig
            .sign(message, sk)
            .map_err(|err| map_oqs_error("sig::sign", err))?;
        Ok(signature.into_vec())
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> SchemeResult<()> {
        let sig = instantiate(self.level)?;
        let pk = sig
            .public_key_from_bytes(public_key)
            .ok_or_else(|| integration("sig::public_key_from_bytes", "length mismatch"))?;
        let sig_ref = sig
            .signature_from_bytes(signature)
            .ok_or_else(|| integration("sig::signature_from_bytes", "length mismatch"))?;
        sig.verify(message, sig_ref, pk)
            .map_err(|_| SchemeError::VerifyFailed)
    }
}

fn ensure_liboqs_init() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        oqs::init();
    });
}

fn map_oqs_error(context: &'static str, err: oqs::Error) -> SchemeError {
    integration(context, err)
}

fn integration(context: &'static str, details: impl std::fmt::Display) -> SchemeError {
    SchemeError::Integration {
        context,
        details: details.to_string(),
    }
}
