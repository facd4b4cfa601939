//! Digests, seeds and security levels.
//!
//! A [`Digest`] is the public commitment to one one-time-signature key. The
//! key itself is derived from a participant's [`Seed`] at a key index; only the
//! digest value ever leaves the participant.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config::{MAX_SECURITY, MIN_SECURITY, SEED_LENGTH};
use crate::error::{FlashError, Result};

// ---------------------------------------------------------------------------
// Security
// ---------------------------------------------------------------------------

/// Number of signature fragments composing one one-time-signature key.
///
/// Always within `MIN_SECURITY..=MAX_SECURITY`; construction validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Security(u8);

impl Security {
    /// Validates a raw security level.
    pub fn new(level: u8) -> Result<Self> {
        if !(MIN_SECURITY..=MAX_SECURITY).contains(&level) {
            return Err(FlashError::InvalidConfig(format!(
                "security must be in {}..={}, got {}",
                MIN_SECURITY, MAX_SECURITY, level
            )));
        }
        Ok(Self(level))
    }

    /// The raw level.
    pub fn get(self) -> u8 {
        self.0
    }

    /// The level as a slot count.
    pub fn fragments(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u8> for Security {
    type Error = FlashError;

    fn try_from(level: u8) -> Result<Self> {
        Self::new(level)
    }
}

impl From<Security> for u8 {
    fn from(security: Security) -> u8 {
        security.0
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Seed
// ---------------------------------------------------------------------------

/// A participant's secret seed.
///
/// Deliberately not `Serialize`: exporting a seed should be an explicit call
/// to [`Seed::to_hex`], never a side effect of dumping a struct to JSON.
#[derive(Clone, PartialEq, Eq)]
pub struct Seed([u8; SEED_LENGTH]);

impl Seed {
    /// Fresh seed from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SEED_LENGTH];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wraps raw seed bytes.
    pub fn from_bytes(bytes: [u8; SEED_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Derives a seed from an arbitrary passphrase by hashing it.
    ///
    /// Handy for fixtures and the CLI simulator. A weak phrase gives a weak seed.
    pub fn from_phrase(phrase: &str) -> Self {
        Self(crate::crypto::hash::blake3_hash(phrase.as_bytes()))
    }

    /// Parses a 64-character hex seed.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| FlashError::InvalidConfig(format!("seed is not hex: {}", e)))?;
        let arr: [u8; SEED_LENGTH] = bytes.try_into().map_err(|_| {
            FlashError::InvalidConfig(format!("seed must be {} bytes", SEED_LENGTH))
        })?;
        Ok(Self(arr))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; SEED_LENGTH] {
        &self.0
    }

    /// Hex export. Treat the result as secret.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Digest
// ---------------------------------------------------------------------------

/// Public commitment to the one-time-signature key at `(seed, index, security)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest {
    /// Key index the digest was derived at.
    pub index: u64,
    /// Signature strength of the key.
    pub security: Security,
    /// Opaque commitment value (hex).
    pub value: String,
}
