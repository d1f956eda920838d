//! `git` subprocess collaborator.

use std::path::PathBuf;
use std::process::Command;

use dilithium_signer_core::{Result, SignatureRecord, SignerError, VersionControl};

/// Runs `git -C <repo>` and stores signatures as notes under `notes_ref`.
#[derive(Clone, Debug)]
pub struct GitCli {
    repo: PathBuf,
    notes_ref: String,
}

impl GitCli {
    pub fn new(repo: impl Into<PathBuf>, notes_ref: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            notes_ref: notes_ref.into(),
        }
    }

    /// Run git and return its trimmed stdout.
    pub fn run(&self, args: &[&str]) -> Result<String> {
        tracing::debug!(repo = %self.repo.display(), ?args, "running git");
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo)
            .args(args)
            .output()
            .map_err(|err| SignerError::Collaborator(format!("unable to run git: {err}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SignerError::Collaborator(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }

    /// Hooks directory of the repository, honouring `core.hooksPath`.
    pub fn hooks_dir(&self) -> Result<PathBuf> {
        let path = PathBuf::from(self.run(&["rev-parse", "--git-path", "hooks"])?);
        Ok(if path.is_absolute() {
            path
        } else {
            self.repo.join(path)
        })
    }

    fn notes_arg(&self) -> String {
        format!("--ref={}", self.notes_ref)
    }

    fn has_note(&self, commit: &str) -> Result<bool> {
        // Each line is `<note-object> <annotated-object>`.
        let listing = self.run(&["notes", &self.notes_arg(), "list"])?;
        Ok(listing
            .lines()
            .filter_map(|line| line.split_whitespace().nth(1))
            .any(|annotated| annotated == commit))
    }
}

impl VersionControl for GitCli {
    fn resolve(&self, rev: &str) -> Result<String> {
        self.run(&["rev-parse", "--verify", &format!("{rev}^{{commit}}")])
    }

    fn canonical_message(&self, commit: &str) -> Result<Vec<u8>> {
        Ok(self
            .run(&["show", "-s", "--format=%B", commit])?
            .into_bytes())
    }

    fn attach_annotation(&self, commit: &str, record: &SignatureRecord) -> Result<()> {
        let note = record.to_note()?;
        self.run(&["notes", &self.notes_arg(), "add", "-f", "-m", &note, commit])?;
        Ok(())
    }

    fn read_annotation(&self, commit: &str) -> Result<Option<SignatureRecord>> {
        if !self.has_note(commit)? {
            return Ok(None);
        }
        let note = self.run(&["notes", &self.notes_arg(), "show", commit])?;
        SignatureRecord::from_note(&note).map(Some)
    }
}
