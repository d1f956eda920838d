//! The `{email, public_key, level}` triple shared between teammates.
//!
//! Registry entries are persisted in the same shape, so this codec is used
//! both for transfer files and for the registry directory.

use std::path::Path;

use dilithium_signer_scheme::{SecurityLevel, UnsupportedLevel};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignerError};
use crate::persist;

/// Public half of a keypair, bound to an identity and level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyTransfer {
    pub email: String,
    pub public_key: Vec<u8>,
    pub level: SecurityLevel,
}

#[derive(Serialize)]
struct TransferRecord<'a> {
    email: &'a str,
    public_key: String,
    level: &'static str,
}

#[derive(Deserialize)]
struct RawTransfer {
    email: Option<String>,
    public_key: Option<String>,
    level: Option<String>,
}

/// Why a transfer record could not be decoded.
#[derive(Debug)]
pub(crate) enum DecodeError {
    Json(serde_json::Error),
    Missing(&'static str),
    Hex(hex::FromHexError),
    Level(UnsupportedLevel),
}

impl DecodeError {
    pub(crate) fn describe(&self) -> String {
        match self {
            DecodeError::Json(err) => format!("invalid JSON: {err}"),
            DecodeError::Missing(field) => format!("missing field `{field}`"),
            DecodeError::Hex(err) => format!("public_key is not valid hex: {err}"),
            DecodeError::Level(err) => err.to_string(),
        }
    }
}

impl KeyTransfer {
    pub(crate) fn encode(&self) -> impl Serialize + '_ {
        TransferRecord {
            email: &self.email,
            public_key: hex::encode(&self.public_key),
            level: self.level.tag(),
        }
    }

    pub(crate) fn decode(bytes: &[u8]) -> std::result::Result<Self, DecodeError> {
        let raw: RawTransfer = serde_json::from_slice(bytes).map_err(DecodeError::Json)?;
        let email = raw.email.ok_or(DecodeError::Missing("email"))?;
        let public_key = raw.public_key.ok_or(DecodeError::Missing("public_key"))?;
        let level = raw.level.ok_or(DecodeError::Missing("level"))?;
        let level = level.parse::<SecurityLevel>().map_err(DecodeError::Level)?;
        let public_key = hex::decode(public_key.trim()).map_err(DecodeError::Hex)?;
        Ok(Self {
            email,
            public_key,
            level,
        })
    }

    /// Parse a transfer file received from a teammate.
    ///
    /// An unrecognized level is reported as [`SignerError::UnsupportedLevel`];
    /// every other defect is [`SignerError::MalformedImport`].
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Self::decode(bytes).map_err(|err| match err {
            DecodeError::Level(err) => SignerError::UnsupportedLevel(err),
            other => SignerError::MalformedImport(other.describe()),
        })
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let bytes = persist::read_optional(path)?.ok_or_else(|| {
            SignerError::MalformedImport(format!("{} does not exist", path.display()))
        })?;
        Self::from_json(&bytes)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        persist::write_json(path, &self.encode(), None)
    }
}
