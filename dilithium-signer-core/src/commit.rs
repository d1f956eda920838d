//! Binds commits to the key store and registry.

use dilithium_signer_scheme::SecurityLevel;

use crate::annotation::SignatureRecord;
use crate::error::{Result, SignerError};
use crate::keystore::KeyStore;
use crate::registry::Registry;
use crate::signer;
use crate::vcs::VersionControl;

/// Result of signing one commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedCommit {
    pub commit: String,
    pub identity: String,
    pub level: SecurityLevel,
    pub fingerprint: String,
}

/// Trust decision for one commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verification {
    /// No annotation is attached.
    Unsigned,
    /// Annotated by an identity absent from the registry.
    UnknownSigner { identity: String },
    Valid {
        identity: String,
        level: SecurityLevel,
    },
    Invalid {
        identity: String,
        level: SecurityLevel,
    },
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid { .. })
    }
}

/// Signs commits with the local key and verifies them against the registry.
pub struct CommitSigner<'a> {
    keystore: &'a KeyStore,
    registry: &'a Registry,
}

impl<'a> CommitSigner<'a> {
    pub fn new(keystore: &'a KeyStore, registry: &'a Registry) -> Self {
        Self { keystore, registry }
    }

    /// Sign `rev`'s canonical message and attach the annotation.
    pub fn sign_commit(&self, vcs: &dyn VersionControl, rev: &str) -> Result<SignedCommit> {
        let keypair = self.keystore.load()?.ok_or(SignerError::NoLocalKey)?;
        let commit = vcs.resolve(rev)?;
        let message = vcs.canonical_message(&commit)?;
        let signature = signer::sign_with_keypair(&message, &keypair, self.keystore.backend())?;

        let record = SignatureRecord::new(keypair.identity(), signature);
        vcs.attach_annotation(&commit, &record)?;
        tracing::info!(
            commit = %commit,
            identity = keypair.identity(),
            level = keypair.level().tag(),
            "commit signed"
        );

        Ok(SignedCommit {
            commit,
            identity: keypair.identity().to_owned(),
            level: keypair.level(),
            fingerprint: keypair.fingerprint(),
        })
    }

    /// Verify `rev` using the registry entry of the identity it names.
    pub fn verify_commit(&self, vcs: &dyn VersionControl, rev: &str) -> Result<Verification> {
        let commit = vcs.resolve(rev)?;
        let Some(record) = vcs.read_annotation(&commit)? else {
            tracing::info!(commit = %commit, "commit has no signature annotation");
            return Ok(Verification::Unsigned);
        };
        let Some(entry) = self.registry.get(&record.identity)? else {
            tracing::warn!(commit = %commit, identity = %record.identity, "signer not in registry");
            return Ok(Verification::UnknownSigner {
                identity: record.identity,
            });
        };

        let message = vcs.canonical_message(&commit)?;
        let valid = signer::verify(
            &message,
            &record.signature,
            &entry.public_key,
            entry.level,
            self.keystore.backend(),
        )?;
        tracing::info!(
            commit = %commit,
            identity = %entry.identity,
            level = entry.level.tag(),
            valid,
            "commit verified"
        );

        let identity = entry.identity;
        let level = entry.level;
        Ok(if valid {
            Verification::Valid { identity, level }
        } else {
            Verification::Invalid { identity, level }
        })
    }
}
