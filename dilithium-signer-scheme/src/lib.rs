//! Dilithium security levels and signature engines.
//!
//! Each [`SecurityLevel`] maps to exactly one parameter set. Engines are
//! obtained through [`Backend::engine`]; the PQClean backend is always
//! compiled in, liboqs is behind the `liboqs` feature.
//!
//! ```
//! use dilithium_signer_scheme::{Backend, SecurityLevel};
//!
//! let level: SecurityLevel = "2".parse().unwrap();
//! let engine = Backend::PqClean.engine(level).unwrap();
//! let pair = engine.keygen().unwrap();
//! let sig = engine.sign(&pair.secret_key, b"Add test file").unwrap();
//! assert!(engine.verify(&pair.public_key, b"Add test file", &sig));
//! ```

pub mod engine;
pub mod error;
pub mod level;
pub mod pqclean;

#[cfg(feature = "liboqs")]
pub mod liboqs;

pub use engine::{Backend, DilithiumEngine, DilithiumKeyPair, DilithiumScheme};
pub use error::{KeyMaterial, SchemeError, SchemeResult, UnsupportedLevel};
pub use level::{KeySizes, SecurityLevel};
