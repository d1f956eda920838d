//! Stateless signing and verification over canonical commit bytes.
//!
//! The message is the commit's rendered message body exactly as the
//! version-control collaborator returns it. Tree and parent hashes are not
//! covered: a signature attests authorship of the message, not the content
//! or position of the commit.

use dilithium_signer_scheme::{Backend, SecurityLevel};

use crate::error::Result;
use crate::keystore::LocalKeypair;

/// Sign `message` with a secret key generated for `level`.
///
/// A secret key from another level is rejected with a length error.
pub fn sign(
    message: &[u8],
    secret_key: &[u8],
    level: SecurityLevel,
    backend: Backend,
) -> Result<Vec<u8>> {
    let engine = backend.engine(level)?;
    let signature = engine.sign(secret_key, message)?;
    tracing::debug!(
        level = level.tag(),
        message_len = message.len(),
        signature_len = signature.len(),
        "signed message"
    );
    Ok(signature)
}

/// Sign `message` with the local keypair at its own level.
pub fn sign_with_keypair(
    message: &[u8],
    keypair: &LocalKeypair,
    backend: Backend,
) -> Result<Vec<u8>> {
    sign(message, keypair.secret_key(), keypair.level(), backend)
}

/// Check `signature` over `message` against `public_key` at `level`.
///
/// Invalid, truncated or foreign-level signatures yield `Ok(false)`. An error
/// means verification could not be attempted at all (e.g. the backend is not
/// compiled in).
pub fn verify(
    message: &[u8],
    signature: &[u8],
    public_key: &[u8],
    level: SecurityLevel,
    backend: Backend,
) -> Result<bool> {
    let engine = backend.engine(level)?;
    let valid = engine.verify(public_key, message, signature);
    tracing::debug!(
        level = level.tag(),
        message_len = message.len(),
        signature_len = signature.len(),
        valid,
        "verified message"
    );
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignerError;
    use dilithium_signer_scheme::SchemeError;

    fn keypair(level: SecurityLevel) -> (Vec<u8>, Vec<u8>) {
        let pair = Backend::PqClean.engine(level).unwrap().keygen().unwrap();
        (pair.public_key, pair.secret_key)
    }

    #[test]
    fn round_trip_for_every_level() {
        for level in SecurityLevel::ALL {
            let (pk, sk) = keypair(level);
            let messages: [&[u8]; 4] = [b"", b"x", b"Add test file", &[0u8; 4096]];
            for message in messages {
                let sig = sign(message, &sk, level, Backend::PqClean).unwrap();
                assert!(verify(message, &sig, &pk, level, Backend::PqClean).unwrap());
            }
        }
    }

    #[test]
    fn signatures_are_not_required_to_be_identical() {
        let (pk, sk) = keypair(SecurityLevel::Level2);
        let a = sign(b"msg", &sk, SecurityLevel::Level2, Backend::PqClean).unwrap();
        let b = sign(b"msg", &sk, SecurityLevel::Level2, Backend::PqClean).unwrap();
        assert!(verify(b"msg", &a, &pk, SecurityLevel::Level2, Backend::PqClean).unwrap());
        assert!(verify(b"msg", &b, &pk, SecurityLevel::Level2, Backend::PqClean).unwrap());
    }

    #[test]
    fn other_key_at_same_level_fails() {
        let (_, sk_a) = keypair(SecurityLevel::Level2);
        let (pk_b, _) = keypair(SecurityLevel::Level2);
        let sig = sign(b"Add test file", &sk_a, SecurityLevel::Level2, Backend::PqClean).unwrap();
        assert!(!verify(b"Add test file", &sig, &pk_b, SecurityLevel::Level2, Backend::PqClean).unwrap());
    }

    #[test]
    fn single_bit_flips_fail_verification() {
        let (pk, sk) = keypair(SecurityLevel::Level2);
        let message = b"Refactor parser for better error messages".to_vec();
        let sig = sign(&message, &sk, SecurityLevel::Level2, Backend::PqClean).unwrap();
        for bit in (0..message.len() * 8).step_by(11) {
            let mut flipped = message.clone();
            flipped[bit / 8] ^= 1 << (bit % 8);
            assert!(!verify(&flipped, &sig, &pk, SecurityLevel::Level2, Backend::PqClean).unwrap());
        }
    }

    #[test]
    fn level_mismatch_never_verifies() {
        let (pk, sk) = keypair(SecurityLevel::Level2);
        let sig = sign(b"msg", &sk, SecurityLevel::Level2, Backend::PqClean).unwrap();
        for level in [SecurityLevel::Level3, SecurityLevel::Level5] {
            assert!(!verify(b"msg", &sig, &pk, level, Backend::PqClean).unwrap());
        }

        let err = sign(b"msg", &sk, SecurityLevel::Level5, Backend::PqClean).unwrap_err();
        assert!(matches!(err, SignerError::Scheme(SchemeError::KeyLength { .. })));
    }

    #[test]
    fn structurally_invalid_signature_is_false() {
        let (pk, _) = keypair(SecurityLevel::Level3);
        for sig in [vec![], vec![1, 2, 3], vec![0xff; 10_000]] {
            assert!(!verify(b"msg", &sig, &pk, SecurityLevel::Level3, Backend::PqClean).unwrap());
        }
    }
}
