//! Subcommand handlers. Each returns a report that `main` prints.

use std::fmt;
use std::path::{Path, PathBuf};

use dilithium_signer_core::{
    Backend, CommitSigner, KeyStore, KeyTransfer, Overwrite, Registry, RegistryEntry,
    SecurityLevel, SignedCommit, SignerError, SignerPaths, Verification,
};
use thiserror::Error;

use crate::git::GitCli;
use crate::hook;
use crate::prompt;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("keys already exist at {0}; rerun with --yes to overwrite")]
    Declined(PathBuf),
    #[error("unable to read confirmation: {0}")]
    Prompt(#[source] std::io::Error),
    #[error(transparent)]
    Signer(#[from] SignerError),
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Resolved state shared by every subcommand.
pub struct App {
    keystore: KeyStore,
    registry: Registry,
    git: GitCli,
}

impl App {
    pub fn new(paths: SignerPaths, backend: Backend, git: GitCli) -> Self {
        let registry = Registry::new(&paths, backend);
        Self {
            keystore: KeyStore::new(paths, backend),
            registry,
            git,
        }
    }

    /// `init`: generate a key and install the post-commit hook.
    pub fn init(
        &self,
        level: SecurityLevel,
        email: &str,
        assume_yes: bool,
    ) -> CommandResult<KeygenReport> {
        let mut report = self.keygen(level, email, assume_yes)?;
        report.hook = Some(self.setup_hook()?);
        Ok(report)
    }

    /// `keygen`: generate a key, confirming before replacing an existing one.
    pub fn keygen(
        &self,
        level: SecurityLevel,
        email: &str,
        assume_yes: bool,
    ) -> CommandResult<KeygenReport> {
        let overwrite = self.overwrite_decision(assume_yes)?;
        let keypair = self
            .keystore
            .generate(level, email, overwrite, &self.registry)?;
        Ok(KeygenReport {
            identity: keypair.identity().to_owned(),
            level: keypair.level(),
            fingerprint: keypair.fingerprint(),
            key_file: self.keystore.paths().key_file.clone(),
            hook: None,
        })
    }

    fn overwrite_decision(&self, assume_yes: bool) -> CommandResult<Overwrite> {
        if !self.keystore.exists() || assume_yes {
            return Ok(Overwrite::Replace);
        }
        if prompt::confirm("Keys already exist. Overwrite?").map_err(CommandError::Prompt)? {
            Ok(Overwrite::Replace)
        } else {
            Err(CommandError::Declined(self.keystore.paths().key_file.clone()))
        }
    }

    pub fn sign(&self, rev: &str) -> CommandResult<SignedCommit> {
        Ok(CommitSigner::new(&self.keystore, &self.registry).sign_commit(&self.git, rev)?)
    }

    pub fn verify(&self, rev: &str) -> CommandResult<Verification> {
        Ok(CommitSigner::new(&self.keystore, &self.registry).verify_commit(&self.git, rev)?)
    }

    /// `export-key`: write the local public key for a teammate.
    pub fn export_key(&self, output: &Path) -> CommandResult<KeyTransfer> {
        let transfer = self.keystore.export()?.ok_or(SignerError::NoLocalKey)?;
        transfer.write_to(output)?;
        tracing::info!(path = %output.display(), identity = %transfer.email, "exported public key");
        Ok(transfer)
    }

    pub fn import_key(&self, file: &Path) -> CommandResult<RegistryEntry> {
        Ok(self.registry.import_file(file)?)
    }

    pub fn setup_hook(&self) -> CommandResult<PathBuf> {
        let hooks_dir = self.git.hooks_dir()?;
        Ok(hook::install_post_commit(&hooks_dir)?)
    }

    pub fn list_keys(&self) -> CommandResult<Vec<RegistryEntry>> {
        let mut entries = Vec::new();
        for identity in self.registry.identities()? {
            if let Some(entry) = self.registry.get(&identity)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeygenReport {
    pub identity: String,
    pub level: SecurityLevel,
    pub fingerprint: String,
    pub key_file: PathBuf,
    pub hook: Option<PathBuf>,
}

impl fmt::Display for KeygenReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Generated Dilithium level {} key for {} (fingerprint {}) at {}",
            self.level,
            self.identity,
            self.fingerprint,
            self.key_file.display()
        )?;
        if let Some(hook) = &self.hook {
            write!(f, "\nInstalled post-commit hook at {}", hook.display())?;
        }
        Ok(())
    }
}

pub fn describe_signed(signed: &SignedCommit) -> String {
    format!(
        "Signed commit {} as {} (level {}, key {})",
        signed.commit, signed.identity, signed.level, signed.fingerprint
    )
}

pub fn describe_verification(rev: &str, verification: &Verification) -> String {
    match verification {
        Verification::Unsigned => format!("Commit {rev} is not signed"),
        Verification::UnknownSigner { identity } => {
            format!("Commit {rev} is signed by {identity}, who is not in the registry")
        }
        Verification::Valid { identity, level } => {
            format!("Valid signature on {rev} from {identity} (level {level})")
        }
        Verification::Invalid { identity, level } => {
            format!("INVALID signature on {rev} claimed by {identity} (level {level})")
        }
    }
}

pub fn describe_entry(entry: &RegistryEntry) -> String {
    format!(
        "{}\tlevel {}\t{}",
        entry.identity,
        entry.level,
        entry.fingerprint()
    )
}
