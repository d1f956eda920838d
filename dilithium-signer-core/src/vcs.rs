//! Version-control collaborator interface.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::annotation::SignatureRecord;
use crate::error::{Result, SignerError};

/// What the signing core needs from a version-control system.
pub trait VersionControl {
    /// Resolve a revision expression (e.g. `HEAD`) to a stable commit id.
    fn resolve(&self, rev: &str) -> Result<String>;

    /// Bytes that a signature for `commit` covers.
    fn canonical_message(&self, commit: &str) -> Result<Vec<u8>>;

    /// Attach (or replace) the signature annotation on `commit`.
    fn attach_annotation(&self, commit: &str, record: &SignatureRecord) -> Result<()>;

    /// Read the annotation on `commit`; `Ok(None)` when unsigned.
    fn read_annotation(&self, commit: &str) -> Result<Option<SignatureRecord>>;
}

#[derive(Default)]
struct MemoryState {
    messages: HashMap<String, Vec<u8>>,
    notes: HashMap<String, String>,
}

/// In-memory repository: commits are ids mapped to message bytes and notes
/// are stored in their encoded JSON form.
#[derive(Clone, Default)]
pub struct MemoryVcs {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a commit with `message`.
    pub fn commit(&self, id: impl Into<String>, message: impl Into<Vec<u8>>) {
        self.lock().messages.insert(id.into(), message.into());
    }

    /// Replace a commit's message in place, as a history rewrite would.
    pub fn amend_message(&self, id: &str, message: impl Into<Vec<u8>>) {
        if let Some(existing) = self.lock().messages.get_mut(id) {
            *existing = message.into();
        }
    }

    /// Store a raw note body, bypassing the encoder.
    pub fn set_raw_note(&self, id: impl Into<String>, note: impl Into<String>) {
        self.lock().notes.insert(id.into(), note.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means another test thread panicked mid-update.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn known(&self, commit: &str) -> Result<()> {
        if self.lock().messages.contains_key(commit) {
            Ok(())
        } else {
            Err(SignerError::Collaborator(format!("unknown revision {commit}")))
        }
    }
}

impl VersionControl for MemoryVcs {
    fn resolve(&self, rev: &str) -> Result<String> {
        self.known(rev)?;
        Ok(rev.to_owned())
    }

    fn canonical_message(&self, commit: &str) -> Result<Vec<u8>> {
        self.lock()
            .messages
            .get(commit)
            .cloned()
            .ok_or_else(|| SignerError::Collaborator(format!("unknown revision {commit}")))
    }

    fn attach_annotation(&self, commit: &str, record: &SignatureRecord) -> Result<()> {
        self.known(commit)?;
        let note = record.to_note()?;
        self.lock().notes.insert(commit.to_owned(), note);
        Ok(())
    }

    fn read_annotation(&self, commit: &str) -> Result<Option<SignatureRecord>> {
        self.known(commit)?;
        let note = self.lock().notes.get(commit).cloned();
        note.map(|note| SignatureRecord::from_note(&note)).transpose()
    }
}
