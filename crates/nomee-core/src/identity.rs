//! Hashed identifiers for the rate limiter keyspace.
//!
//! Emails are normalized (trimmed, lowercased) and SHA-256 hashed before
//! they reach any store. The raw address is never retained.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::logging::IDENTIFIER_LOG_PREFIX;

/// Hex-encoded SHA-256 of a normalized identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentifierHash(String);

impl IdentifierHash {
    /// Length of a hex-encoded SHA-256 digest.
    pub const HEX_LEN: usize = 64;

    /// Hash an email address after trimming and lowercasing it.
    pub fn from_email(email: &str) -> Self {
        let normalized = normalize_email(email);
        let digest = Sha256::digest(normalized.as_bytes());
        Self(hex::encode(digest))
    }

    /// Accept an already-hashed identifier (64 hex characters).
    pub fn from_hex(hash: &str) -> Result<Self> {
        let hash = hash.trim().to_lowercase();
        if hash.len() != Self::HEX_LEN || hex::decode(&hash).is_err() {
            return Err(Error::InvalidInput(format!(
                "identifier hash must be {} hex characters",
                Self::HEX_LEN
            )));
        }
        Ok(Self(hash))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix safe to put in logs.
    pub fn log_prefix(&self) -> &str {
        &self.0[..IDENTIFIER_LOG_PREFIX]
    }
}

impl std::fmt::Display for IdentifierHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for IdentifierHash {
    type Error = Error;
    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<IdentifierHash> for String {
    fn from(value: IdentifierHash) -> Self {
        value.0
    }
}

/// Lowercase and trim an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
