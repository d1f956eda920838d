//! Signature annotations attached to commits.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SignerError};

/// `{identity, signature}` stored alongside a commit.
///
/// The record deliberately carries no level: verifiers take the level from
/// the registry entry of `identity`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureRecord {
    pub identity: String,
    pub signature: Vec<u8>,
}

#[derive(Serialize)]
struct NoteBody<'a> {
    email: &'a str,
    signature: String,
}

#[derive(Deserialize)]
struct RawNote {
    email: Option<String>,
    signature: Option<String>,
}

impl SignatureRecord {
    pub fn new(identity: impl Into<String>, signature: Vec<u8>) -> Self {
        Self {
            identity: identity.into(),
            signature,
        }
    }

    /// Encode as the JSON note body `{"email": .., "signature": "<hex>"}`.
    pub fn to_note(&self) -> Result<String> {
        Ok(serde_json::to_string(&NoteBody {
            email: &self.identity,
            signature: hex::encode(&self.signature),
        })?)
    }

    pub fn from_note(note: &str) -> Result<Self> {
        let raw: RawNote = serde_json::from_str(note.trim())
            .map_err(|err| SignerError::MalformedAnnotation(format!("invalid JSON: {err}")))?;
        let identity = raw
            .email
            .ok_or_else(|| SignerError::MalformedAnnotation("missing field `email`".into()))?;
        let signature = raw
            .signature
            .ok_or_else(|| SignerError::MalformedAnnotation("missing field `signature`".into()))?;
        let signature = hex::decode(signature.trim()).map_err(|err| {
            SignerError::MalformedAnnotation(format!("signature is not valid hex: {err}"))
        })?;
        Ok(Self {
            identity,
            signature,
        })
    }
}
