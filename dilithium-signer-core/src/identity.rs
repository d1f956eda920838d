use blake2::Blake2s256;
use digest::Digest;

use crate::error::{Result, SignerError};

/// Reject identities that cannot be a registry key.
pub(crate) fn validate(identity: &str) -> Result<()> {
    let trimmed = identity.trim();
    let valid = !trimmed.is_empty()
        && trimmed == identity
        && identity.contains('@')
        && !identity.chars().any(char::is_control);
    if valid {
        Ok(())
    } else {
        Err(SignerError::InvalidIdentity(identity.to_owned()))
    }
}

/// Short Blake2s fingerprint of a public key, rendered as hex.
pub fn fingerprint(public_key: &[u8]) -> String {
    let digest = Blake2s256::digest(public_key);
    hex::encode(&digest[..16])
}
