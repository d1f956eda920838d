//! Key management and commit signing for `dilithium-signer`.
//!
//! [`KeyStore`] owns the single local keypair, [`Registry`] maps identities
//! to trusted public keys, and [`CommitSigner`] binds both to a
//! [`VersionControl`] collaborator. All state lives beneath an explicit
//! [`SignerPaths`]:
//!
//! ```
//! use dilithium_signer_core::{
//!     Backend, CommitSigner, KeyStore, MemoryVcs, Overwrite, Registry, SecurityLevel,
//!     SignerPaths,
//! };
//!
//! let dir = tempfile::tempdir().unwrap();
//! let paths = SignerPaths::from_root(dir.path());
//! let registry = Registry::new(&paths, Backend::PqClean);
//! let keystore = KeyStore::new(paths, Backend::PqClean);
//! keystore
//!     .generate(SecurityLevel::Level2, "alice@example.com", Overwrite::Refuse, &registry)
//!     .unwrap();
//!
//! let vcs = MemoryVcs::new();
//! vcs.commit("c0ffee", "Add test file");
//! let signer = CommitSigner::new(&keystore, &registry);
//! signer.sign_commit(&vcs, "c0ffee").unwrap();
//! assert!(signer.verify_commit(&vcs, "c0ffee").unwrap().is_valid());
//! ```

pub mod annotation;
pub mod commit;
pub mod config;
pub mod error;
mod identity;
pub mod keystore;
mod persist;
pub mod registry;
pub mod signer;
pub mod transfer;
pub mod vcs;

pub use annotation::SignatureRecord;
pub use commit::{CommitSigner, SignedCommit, Verification};
pub use config::SignerPaths;
pub use dilithium_signer_scheme::{Backend, SecurityLevel, UnsupportedLevel};
pub use error::{Result, SignerError};
pub use identity::fingerprint;
pub use keystore::{KeyStore, LocalKeypair, Overwrite};
pub use registry::{Registry, RegistryEntry};
pub use transfer::KeyTransfer;
pub use vcs::{MemoryVcs, VersionControl};
