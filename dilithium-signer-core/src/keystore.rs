//! The local identity's keypair, persisted as a single JSON file.

use std::fmt;

use dilithium_signer_scheme::{Backend, KeyMaterial, SecurityLevel};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::config::SignerPaths;
use crate::error::{Result, SignerError};
use crate::identity;
use crate::persist;
use crate::registry::Registry;
use crate::transfer::KeyTransfer;

const KEY_FILE_MODE: u32 = 0o600;

/// Whether [`KeyStore::generate`] may replace an existing keypair.
///
/// Replacing is irreversible: the old secret key has no backup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Overwrite {
    Refuse,
    Replace,
}

/// The locally owned keypair. The secret half never leaves this process
/// except through the key file.
pub struct LocalKeypair {
    identity: String,
    level: SecurityLevel,
    public_key: Vec<u8>,
    secret_key: Zeroizing<Vec<u8>>,
}

impl LocalKeypair {
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn level(&self) -> SecurityLevel {
        self.level
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn secret_key(&self) -> &[u8] {
        &self.secret_key
    }

    pub fn fingerprint(&self) -> String {
        identity::fingerprint(&self.public_key)
    }

    /// Public half in transfer form.
    pub fn to_transfer(&self) -> KeyTransfer {
        KeyTransfer {
            email: self.identity.clone(),
            public_key: self.public_key.clone(),
            level: self.level,
        }
    }
}

impl fmt::Debug for LocalKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKeypair")
            .field("identity", &self.identity)
            .field("level", &self.level)
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct KeyRecord<'a> {
    public_key: String,
    secret_key: Zeroizing<String>,
    level: &'static str,
    email: &'a str,
}

#[derive(Deserialize)]
struct RawKeyRecord {
    public_key: Option<String>,
    secret_key: Option<Zeroizing<String>>,
    level: Option<String>,
    email: Option<String>,
}

/// Owns the single local keypair of this installation.
pub struct KeyStore {
    paths: SignerPaths,
    backend: Backend,
}

impl KeyStore {
    pub fn new(paths: SignerPaths, backend: Backend) -> Self {
        Self { paths, backend }
    }

    pub fn paths(&self) -> &SignerPaths {
        &self.paths
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Whether a key file is present (without validating it).
    pub fn exists(&self) -> bool {
        self.paths.key_file.exists()
    }

    /// Load the persisted keypair; `Ok(None)` when none has been generated.
    pub fn load(&self) -> Result<Option<LocalKeypair>> {
        let path = &self.paths.key_file;
        let Some(bytes) = persist::read_optional(path)?.map(Zeroizing::new) else {
            tracing::debug!(path = %path.display(), "no local keypair");
            return Ok(None);
        };
        let keypair = self.decode(&bytes).map_err(|reason| SignerError::CorruptKeyState {
            path: path.clone(),
            reason,
        })?;
        tracing::debug!(
            identity = keypair.identity(),
            level = keypair.level().tag(),
            fingerprint = %keypair.fingerprint(),
            "loaded local keypair"
        );
        Ok(Some(keypair))
    }

    /// Generate a keypair for `identity`, persist it as the local key and
    /// publish its public half into `registry`.
    ///
    /// Returns only after both writes have completed.
    pub fn generate(
        &self,
        level: SecurityLevel,
        identity: &str,
        overwrite: Overwrite,
        registry: &Registry,
    ) -> Result<LocalKeypair> {
        identity::validate(identity)?;
        if self.exists() {
            match overwrite {
                Overwrite::Refuse => return Err(SignerError::KeyExists(self.paths.key_file.clone())),
                Overwrite::Replace => tracing::warn!(
                    path = %self.paths.key_file.display(),
                    "replacing existing local keypair"
                ),
            }
        }

        let engine = self.backend.engine(level)?;
        let pair = engine.keygen()?;
        tracing::debug!(
            level = level.tag(),
            backend = self.backend.as_str(),
            public_key_len = pair.public_key.len(),
            secret_key_len = pair.secret_key.len(),
            "generated keypair"
        );
        let keypair = LocalKeypair {
            identity: identity.to_owned(),
            level,
            public_key: pair.public_key,
            secret_key: Zeroizing::new(pair.secret_key),
        };

        self.paths.ensure()?;
        let record = KeyRecord {
            public_key: hex::encode(&keypair.public_key),
            secret_key: Zeroizing::new(hex::encode(keypair.secret_key.as_slice())),
            level: level.tag(),
            email: identity,
        };
        // The old key stays in place until the registry has accepted the new one.
        let staged = persist::stage_json(&self.paths.key_file, &record, Some(KEY_FILE_MODE))?;
        let previous = registry.get(identity).ok().flatten();
        registry.put(identity, &keypair.public_key, level)?;
        if let Err(err) = staged.commit() {
            if let Some(previous) = previous {
                if let Err(restore) =
                    registry.put(&previous.identity, &previous.public_key, previous.level)
                {
                    tracing::error!(identity, error = %restore, "failed to restore registry entry");
                }
            }
            return Err(err);
        }

        tracing::info!(
            identity,
            level = level.tag(),
            fingerprint = %keypair.fingerprint(),
            path = %self.paths.key_file.display(),
            "local keypair stored"
        );
        Ok(keypair)
    }

    /// Public half of the local keypair, if one exists.
    pub fn export(&self) -> Result<Option<KeyTransfer>> {
        Ok(self.load()?.map(|keypair| keypair.to_transfer()))
    }

    fn decode(&self, bytes: &[u8]) -> std::result::Result<LocalKeypair, String> {
        let raw: RawKeyRecord =
            serde_json::from_slice(bytes).map_err(|err| format!("invalid JSON: {err}"))?;
        let level = raw.level.ok_or("missing field `level`")?;
        let level: SecurityLevel = level.parse().map_err(|err| format!("{err}"))?;
        let identity = raw.email.ok_or("missing field `email`")?;
        identity::validate(&identity).map_err(|err| err.to_string())?;
        let public_key = raw.public_key.ok_or("missing field `public_key`")?;
        let secret_key = raw.secret_key.ok_or("missing field `secret_key`")?;

        let public_key =
            hex::decode(public_key.trim()).map_err(|err| format!("public_key: {err}"))?;
        let secret_key = Zeroizing::new(
            hex::decode(secret_key.trim()).map_err(|err| format!("secret_key: {err}"))?,
        );

        let engine = self.backend.engine(level).map_err(|err| err.to_string())?;
        engine
            .check_len(KeyMaterial::PublicKey, public_key.len())
            .and_then(|_| engine.check_len(KeyMaterial::SecretKey, secret_key.len()))
            .map_err(|err| err.to_string())?;

        Ok(LocalKeypair {
            identity,
            level,
            public_key,
            secret_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct Fixture {
        _dir: tempfile::TempDir,
        store: KeyStore,
        registry: Registry,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let paths = SignerPaths::from_root(dir.path().join(".dilithium-signer"));
        let registry = Registry::new(&paths, Backend::PqClean);
        let store = KeyStore::new(paths, Backend::PqClean);
        Fixture {
            _dir: dir,
            store,
            registry,
        }
    }

    fn rewrite(store: &KeyStore, edit: impl FnOnce(&mut serde_json::Value)) {
        let path = &store.paths().key_file;
        let mut value: serde_json::Value =
            serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
        edit(&mut value);
        fs::write(path, serde_json::to_vec(&value).unwrap()).unwrap();
    }

    #[test]
    fn empty_store_loads_nothing() {
        let fx = fixture();
        assert!(fx.store.load().unwrap().is_none());
        assert!(fx.store.export().unwrap().is_none());
    }

    #[test]
    fn generate_persists_and_self_registers() {
        let fx = fixture();
        let keys = fx
            .store
            .generate(SecurityLevel::Level2, "alice@example.com", Overwrite::Refuse, &fx.registry)
            .unwrap();
        assert_eq!(keys.identity(), "alice@example.com");
        assert_eq!(keys.level(), SecurityLevel::Level2);

        let loaded = fx.store.load().unwrap().unwrap();
        assert_eq!(loaded.public_key(), keys.public_key());
        assert_eq!(loaded.secret_key(), keys.secret_key());

        let entry = fx.registry.get("alice@example.com").unwrap().unwrap();
        assert_eq!(entry.public_key, keys.public_key());
        assert_eq!(entry.level, SecurityLevel::Level2);
    }

    #[test]
    fn persisted_record_uses_hex_and_level_tag() {
        let fx = fixture();
        let keys = fx
            .store
            .generate(SecurityLevel::Level3, "alice@example.com", Overwrite::Refuse, &fx.registry)
            .unwrap();
        let value: serde_json::Value =
            serde_json::from_slice(&fs::read(&fx.store.paths().key_file).unwrap()).unwrap();
        assert_eq!(value["level"], "3");
        assert_eq!(value["email"], "alice@example.com");
        assert_eq!(value["public_key"], hex::encode(keys.public_key()));
        assert_eq!(value["secret_key"], hex::encode(keys.secret_key()));
    }

    #[test]
    fn overwrite_requires_confirmation() {
        let fx = fixture();
        let first = fx
            .store
            .generate(SecurityLevel::Level2, "alice@example.com", Overwrite::Refuse, &fx.registry)
            .unwrap();
        let err = fx
            .store
            .generate(SecurityLevel::Level2, "alice@example.com", Overwrite::Refuse, &fx.registry)
            .unwrap_err();
        assert!(matches!(err, SignerError::KeyExists(_)));
        assert_eq!(fx.store.load().unwrap().unwrap().public_key(), first.public_key());

        let second = fx
            .store
            .generate(SecurityLevel::Level5, "alice@example.com", Overwrite::Replace, &fx.registry)
            .unwrap();
        assert_ne!(second.public_key(), first.public_key());
        let entry = fx.registry.get("alice@example.com").unwrap().unwrap();
        assert_eq!(entry.level, SecurityLevel::Level5);
        assert_eq!(entry.public_key, second.public_key());
    }

    #[test]
    fn invalid_identity_is_rejected_before_writing() {
        let fx = fixture();
        let err = fx
            .store
            .generate(SecurityLevel::Level2, "not-an-email", Overwrite::Refuse, &fx.registry)
            .unwrap_err();
        assert!(matches!(err, SignerError::InvalidIdentity(_)));
        assert!(!fx.store.exists());
    }

    #[test]
    fn corrupt_states_are_distinguished() {
        let fx = fixture();
        fx.store
            .generate(SecurityLevel::Level2, "alice@example.com", Overwrite::Refuse, &fx.registry)
            .unwrap();

        let edits: Vec<Box<dyn FnOnce(&mut serde_json::Value)>> = vec![
            Box::new(|v: &mut serde_json::Value| {
                v.as_object_mut().unwrap().remove("level");
            }),
            Box::new(|v: &mut serde_json::Value| v["level"] = "7".into()),
            Box::new(|v: &mut serde_json::Value| v["level"] = "3".into()),
            Box::new(|v: &mut serde_json::Value| {
                let sk = v["secret_key"].as_str().unwrap().to_owned();
                v["secret_key"] = sk[..sk.len() - 3].into();
            }),
            Box::new(|v: &mut serde_json::Value| v["public_key"] = "00ff".into()),
        ];
        let original = fs::read(&fx.store.paths().key_file).unwrap();
        for edit in edits {
            fs::write(&fx.store.paths().key_file, &original).unwrap();
            rewrite(&fx.store, edit);
            let err = fx.store.load().unwrap_err();
            assert!(
                matches!(err, SignerError::CorruptKeyState { .. }),
                "unexpected error: {err}"
            );
        }

        fs::write(&fx.store.paths().key_file, b"not json at all").unwrap();
        assert!(matches!(
            fx.store.load().unwrap_err(),
            SignerError::CorruptKeyState { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let fx = fixture();
        fx.store
            .generate(SecurityLevel::Level2, "alice@example.com", Overwrite::Refuse, &fx.registry)
            .unwrap();
        let mode = fs::metadata(&fx.store.paths().key_file)
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn failed_registration_keeps_previous_key() {
        let fx = fixture();
        let first = fx
            .store
            .generate(SecurityLevel::Level2, "alice@example.com", Overwrite::Refuse, &fx.registry)
            .unwrap();

        let entry = fx.registry.entry_path("alice@example.com");
        fs::remove_file(&entry).unwrap();
        fs::create_dir(&entry).unwrap();

        let err = fx
            .store
            .generate(SecurityLevel::Level2, "alice@example.com", Overwrite::Replace, &fx.registry)
            .unwrap_err();
        assert!(matches!(err, SignerError::Io { .. }), "unexpected error: {err}");

        let now = fx.store.load().unwrap().unwrap();
        assert_eq!(now.public_key(), first.public_key());
        assert_eq!(now.secret_key(), first.secret_key());
        assert!(!fx.store.paths().key_file.with_extension("json.tmp").exists());
    }

    #[test]
    fn export_exposes_only_public_half() {
        let fx = fixture();
        let keys = fx
            .store
            .generate(SecurityLevel::Level2, "alice@example.com", Overwrite::Refuse, &fx.registry)
            .unwrap();
        let transfer = fx.store.export().unwrap().unwrap();
        assert_eq!(transfer.email, "alice@example.com");
        assert_eq!(transfer.public_key, keys.public_key());
        assert_eq!(transfer.level, SecurityLevel::Level2);
    }
}
