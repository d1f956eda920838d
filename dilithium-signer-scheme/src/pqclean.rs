use pqcrypto_traits::sign::{DetachedSignature as _, PublicKey as _, SecretKey as _};

use crate::engine::{DilithiumKeyPair, DilithiumScheme};
use crate::error::{SchemeError, SchemeResult};
use crate::level::{KeySizes, SecurityLevel};

/// PQClean-backed Dilithium engine.
pub struct PqCleanDilithium {
    level: SecurityLevel,
}

impl PqCleanDilithium {
    pub fn new(level: SecurityLevel) -> Self {
        Self { level }
    }
}

macro_rules! with_params {
    ($level:expr, $params:ident => $body:expr) => {
        match $level {
            SecurityLevel::Level2 => {
                use pqcrypto_dilithium::dilithium2 as $params;
                $body
            }
            SecurityLevel::Level3 => {
                use pqcrypto_dilithium::dilithium3 as $params;
                $body
            }
            SecurityLevel::Level5 => {
                use pqcrypto_dilithium::dilithium5 as $params;
                $body
            }
        }
    };
}

impl DilithiumScheme for PqCleanDilithium {
    fn level(&self) -> SecurityLevel {
        self.level
    }

    fn sizes(&self) -> KeySizes {
        with_params!(self.level, p => KeySizes {
            public_key: p::public_key_bytes(),
            secret_key: p::secret_key_bytes(),
            signature: p::signature_bytes(),
        })
    }

    fn keygen(&self) -> SchemeResult<DilithiumKeyPair> {
        let (public_key, secret_key) = with_params!(self.level, p => {
            let (pk, sk) = p::keypair();
            (pk.as_bytes().to_vec(), sk.as_bytes().to_vec())
        });
        Ok(DilithiumKeyPair {
            public_key,
            secret_key,
            level: self.level,
        })
    }

    fn sign(&self, secret_key: &[u8], message: &[u8]) -> SchemeResult<Vec<u8>> {
        with_params!(self.level, p => {
            let sk = p::SecretKey::from_bytes(secret_key)
                .map_err(|err| integration("secret_key_from_bytes", err))?;
            Ok(p::detached_sign(message, &sk).as_bytes().to_vec())
        })
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> SchemeResult<()> {
        with_params!(self.level, p => {
            let pk = p::PublicKey::from_bytes(public_key)
                .map_err(|err| integration("public_key_from_bytes", err))?;
            let sig = p::DetachedSignature::from_bytes(signature)
                .map_err(|err| integration("signature_from_bytes", err))?;
            p::verify_detached_signature(&sig, message, &pk).map_err(|_| SchemeError::VerifyFailed)
        })
    }
}

fn integration(context: &'static str, err: impl std::fmt::Display) -> SchemeError {
    SchemeError::Integration {
        context,
        details: err.to_string(),
    }
}
