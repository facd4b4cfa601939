//! # Channel Configuration & Constants
//!
//! Every protocol constant of the Flash channel lives here, next to the
//! [`ChannelConfig`] that participants agree on before the first digest is
//! generated. Once a channel is set up, none of these values may change for
//! its lifetime: every participant recomputes the same tree from them.

use serde::{Deserialize, Serialize};

use crate::error::{FlashError, Result};
use crate::multisig::Security;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Crate protocol version, reported by the CLI.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// One-Time-Signature Parameters
// ---------------------------------------------------------------------------

/// Lowest security level. One signature fragment per key.
pub const MIN_SECURITY: u8 = 1;

/// Highest security level. Three fragments per key.
pub const MAX_SECURITY: u8 = 3;

/// Security level used when a config omits it.
pub const DEFAULT_SECURITY: u8 = 2;

/// Seed length in bytes.
pub const SEED_LENGTH: usize = 32;

/// Domain tag mixed into fragment key derivation.
pub const FRAGMENT_KEY_DOMAIN: &[u8] = b"flash/ots/fragment-key/v1";

/// Domain tag mixed into digest computation.
pub const DIGEST_DOMAIN: &[u8] = b"flash/ots/digest/v1";

/// Domain tag mixed into multisig address composition.
pub const ADDRESS_DOMAIN: &[u8] = b"flash/multisig/address/v1";

// ---------------------------------------------------------------------------
// Channel Limits
// ---------------------------------------------------------------------------

/// Tree depth used when a config omits it.
pub const DEFAULT_TREE_DEPTH: usize = 4;

/// Deepest supported tree. Each level adds one funding bundle per transfer.
pub const MAX_TREE_DEPTH: usize = 32;

/// Maximum participants in one channel. The root input group grows with
/// `signers * security`, so this bounds bundle size.
pub const MAX_SIGNERS: usize = 16;

// ---------------------------------------------------------------------------
// ChannelConfig
// ---------------------------------------------------------------------------

/// Parameters every participant agrees on before setup.
///
/// Construct through [`ChannelConfig::new`] or [`ChannelConfig::from_json`];
/// both validate. A config deserialized by other means should be passed
/// through [`ChannelConfig::validate`] before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Signature strength of every participant's digests.
    #[serde(default = "default_security")]
    pub security: u8,
    /// Number of participants.
    pub signers_count: usize,
    /// Number of chained tree nodes below the remainder address.
    #[serde(default = "default_depth")]
    pub depth: usize,
    /// Deposit of each participant, index-aligned to its ordinal.
    pub deposit: Vec<u64>,
    /// One external settlement address per participant, index-aligned.
    pub settlement_addresses: Vec<String>,
}

fn default_security() -> u8 {
    DEFAULT_SECURITY
}

fn default_depth() -> usize {
    DEFAULT_TREE_DEPTH
}

impl ChannelConfig {
    /// Builds and validates a config.
    pub fn new(
        security: u8,
        signers_count: usize,
        depth: usize,
        deposit: Vec<u64>,
        settlement_addresses: Vec<String>,
    ) -> Result<Self> {
        let config = Self {
            security,
            signers_count,
            depth,
            deposit,
            settlement_addresses,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON document and validates it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| FlashError::InvalidConfig(format!("parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every rule a channel relies on.
    pub fn validate(&self) -> Result<()> {
        Security::new(self.security)?;

        if self.signers_count < 2 || self.signers_count > MAX_SIGNERS {
            return Err(FlashError::InvalidConfig(format!(
                "signers_count must be in 2..={}, got {}",
                MAX_SIGNERS, self.signers_count
            )));
        }
        if self.depth == 0 || self.depth > MAX_TREE_DEPTH {
            return Err(FlashError::InvalidConfig(format!(
                "depth must be in 1..={}, got {}",
                MAX_TREE_DEPTH, self.depth
            )));
        }
        if self.deposit.len() != self.signers_count {
            return Err(FlashError::InvalidConfig(format!(
                "expected {} deposits, got {}",
                self.signers_count,
                self.deposit.len()
            )));
        }
        if self.settlement_addresses.len() != self.signers_count {
            return Err(FlashError::InvalidConfig(format!(
                "expected {} settlement addresses, got {}",
                self.signers_count,
                self.settlement_addresses.len()
            )));
        }
        for (i, address) in self.settlement_addresses.iter().enumerate() {
            if address.is_empty() {
                return Err(FlashError::InvalidConfig(format!(
                    "settlement address {} is empty",
                    i
                )));
            }
            if self.settlement_addresses[..i].contains(address) {
                return Err(FlashError::InvalidConfig(format!(
                    "settlement address {} is used twice",
                    address
                )));
            }
        }
        if self.total_deposit()? == 0 {
            return Err(FlashError::InvalidConfig(
                "channel must hold a non-zero deposit".to_string(),
            ));
        }
        Ok(())
    }

    /// Sum of all deposits: the initial channel balance.
    pub fn total_deposit(&self) -> Result<u64> {
        self.deposit
            .iter()
            .try_fold(0u64, |acc, d| acc.checked_add(*d))
            .ok_or(FlashError::BalanceOverflow)
    }

    /// Number of digests each participant generates at setup.
    pub fn digests_per_participant(&self) -> usize {
        self.depth + 1
    }
}
