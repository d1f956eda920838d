//! Public key registry: one JSON record per identity.

use std::fs;
use std::path::{Path, PathBuf};

use dilithium_signer_scheme::{Backend, KeyMaterial, SecurityLevel};

use crate::config::SignerPaths;
use crate::error::{Result, SignerError};
use crate::identity;
use crate::persist;
use crate::transfer::KeyTransfer;

const RECORD_EXTENSION: &str = "json";

/// A trusted public key for one identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryEntry {
    pub identity: String,
    pub public_key: Vec<u8>,
    pub level: SecurityLevel,
}

impl RegistryEntry {
    pub fn fingerprint(&self) -> String {
        identity::fingerprint(&self.public_key)
    }
}

impl From<RegistryEntry> for KeyTransfer {
    fn from(entry: RegistryEntry) -> Self {
        KeyTransfer {
            email: entry.identity,
            public_key: entry.public_key,
            level: entry.level,
        }
    }
}

/// Maps identities to `{public_key, level}`; last write wins.
pub struct Registry {
    dir: PathBuf,
    backend: Backend,
}

impl Registry {
    pub fn new(paths: &SignerPaths, backend: Backend) -> Self {
        Self {
            dir: paths.registry_dir.clone(),
            backend,
        }
    }

    /// File backing `identity`'s record.
    ///
    /// Identities made of filename-safe characters are used verbatim; anything
    /// else is hex-encoded behind a `~` prefix, which the verbatim form can
    /// never start with.
    pub fn entry_path(&self, identity: &str) -> PathBuf {
        let safe = !identity.is_empty()
            && !identity.starts_with('.')
            && identity
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '+' | '-'));
        let stem = if safe {
            identity.to_owned()
        } else {
            format!("~{}", hex::encode(identity.as_bytes()))
        };
        self.dir.join(format!("{stem}.{RECORD_EXTENSION}"))
    }

    /// Insert or overwrite the record for `identity`.
    pub fn put(&self, identity: &str, public_key: &[u8], level: SecurityLevel) -> Result<()> {
        identity::validate(identity)?;
        self.backend
            .engine(level)?
            .check_len(KeyMaterial::PublicKey, public_key.len())?;

        fs::create_dir_all(&self.dir).map_err(|err| SignerError::io(&self.dir, err))?;
        let path = self.entry_path(identity);
        let record = KeyTransfer {
            email: identity.to_owned(),
            public_key: public_key.to_vec(),
            level,
        };
        persist::write_json(&path, &record.encode(), None)?;
        tracing::info!(
            identity,
            level = level.tag(),
            fingerprint = %identity::fingerprint(public_key),
            path = %path.display(),
            "registry entry stored"
        );
        Ok(())
    }

    /// Look up `identity`; an unknown identity is `Ok(None)`.
    pub fn get(&self, identity: &str) -> Result<Option<RegistryEntry>> {
        let path = self.entry_path(identity);
        let Some(bytes) = persist::read_optional(&path)? else {
            tracing::debug!(identity, "no registry entry");
            return Ok(None);
        };
        let entry = self.decode_entry(&path, &bytes)?;
        if entry.identity != identity {
            return Err(corrupt(
                &path,
                format!("record names {:?}, expected {identity:?}", entry.identity),
            ));
        }
        Ok(Some(entry))
    }

    /// Validate a teammate's key and store it.
    ///
    /// Nothing is written unless every field is present and consistent.
    pub fn import(&self, transfer: &KeyTransfer) -> Result<RegistryEntry> {
        identity::validate(&transfer.email)
            .map_err(|err| SignerError::MalformedImport(err.to_string()))?;
        self.backend
            .engine(transfer.level)?
            .check_len(KeyMaterial::PublicKey, transfer.public_key.len())
            .map_err(|err| SignerError::MalformedImport(err.to_string()))?;

        self.put(&transfer.email, &transfer.public_key, transfer.level)?;
        Ok(RegistryEntry {
            identity: transfer.email.clone(),
            public_key: transfer.public_key.clone(),
            level: transfer.level,
        })
    }

    /// Read a transfer file and [`import`](Self::import) it.
    pub fn import_file(&self, path: &Path) -> Result<RegistryEntry> {
        let transfer = KeyTransfer::read_from(path)?;
        self.import(&transfer)
    }

    /// Every registered identity, sorted.
    pub fn identities(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(SignerError::io(&self.dir, err)),
        };

        let mut identities = Vec::new();
        for entry in entries {
            let path = entry.map_err(|err| SignerError::io(&self.dir, err))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let bytes = fs::read(&path).map_err(|err| SignerError::io(&path, err))?;
            identities.push(self.decode_entry(&path, &bytes)?.identity);
        }
        identities.sort();
        Ok(identities)
    }

    fn decode_entry(&self, path: &Path, bytes: &[u8]) -> Result<RegistryEntry> {
        let record = KeyTransfer::decode(bytes).map_err(|err| corrupt(path, err.describe()))?;
        self.backend
            .engine(record.level)?
            .check_len(KeyMaterial::PublicKey, record.public_key.len())
            .map_err(|err| corrupt(path, err.to_string()))?;
        Ok(RegistryEntry {
            identity: record.email,
            public_key: record.public_key,
            level: record.level,
        })
    }
}

fn corrupt(path: &Path, reason: String) -> SignerError {
    SignerError::CorruptRegistryEntry {
        path: path.to_path_buf(),
        reason,
    }
}
