//! Per-participant channel state.
//!
//! Each participant holds its own [`ChannelState`], derived from the shared
//! public setup data. Nobody reads anyone else's copy; consistency comes from
//! every participant applying the same agreed bundles.
//!
//! ## Accounting
//!
//! - `deposit[i]` is participant *i*'s current claim on the pool.
//! - `outputs` holds cumulative payments to addresses outside the channel.
//! - `balance == Σ deposit` between agreed bundle sets.
//! - The root address holds `balance + Σ outputs` on the ledger (the
//!   *custody*); every bundle set re-spends all of it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ChannelConfig;
use crate::error::{FlashError, Result};
use crate::multisig::{ChannelTree, MultisigAddress, Security};
use crate::transaction::Bundle;

/// One participant's view of the channel.
///
/// A deserialized state is checked with [`ChannelState::check_shape`] and
/// [`ChannelState::check_invariants`] before it is handed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StateData")]
pub struct ChannelState {
    /// Number of participants.
    pub signers_count: usize,
    /// Security of every participant's digests.
    pub security: Security,
    /// Total pooled value still owed to participants.
    pub balance: u64,
    /// Per-participant share of `balance`, index-aligned to ordinals.
    pub deposit: Vec<u64>,
    /// Cumulative payments to non-participant addresses.
    pub outputs: BTreeMap<String, u64>,
    /// Bundle sets applied so far, oldest first.
    pub transfers: Vec<Vec<Bundle>>,
    /// Remainder address and root-first chain.
    pub tree: ChannelTree,
    /// One external settlement address per participant.
    pub settlement_addresses: Vec<String>,
    /// Set once a closing bundle has been applied.
    pub closed: bool,
}

impl ChannelState {
    /// Initial state for a freshly set-up channel.
    pub fn new(config: &ChannelConfig, tree: ChannelTree) -> Result<Self> {
        config.validate()?;
        let security = Security::new(config.security)?;

        if let Some(clash) = config
            .settlement_addresses
            .iter()
            .find(|address| tree.contains(address))
        {
            return Err(FlashError::InvalidConfig(format!(
                "settlement address {} is a channel address",
                clash
            )));
        }

        let state = Self {
            signers_count: config.signers_count,
            security,
            balance: config.total_deposit()?,
            deposit: config.deposit.clone(),
            outputs: BTreeMap::new(),
            transfers: Vec::new(),
            tree,
            settlement_addresses: config.settlement_addresses.clone(),
            closed: false,
        };
        state.check_shape()?;
        Ok(state)
    }

    /// The remainder address.
    pub fn remainder_address(&self) -> &MultisigAddress {
        self.tree.remainder()
    }

    /// The root address.
    pub fn root(&self) -> &MultisigAddress {
        self.tree.root()
    }

    /// Value held by the root address: `balance + Σ outputs`.
    pub fn custody(&self) -> Result<u64> {
        self.outputs
            .values()
            .try_fold(self.balance, |acc, v| acc.checked_add(*v))
            .ok_or(FlashError::BalanceOverflow)
    }

    /// Ordinal of the participant owning settlement `address`.
    pub fn participant_of(&self, address: &str) -> Option<usize> {
        self.settlement_addresses.iter().position(|a| a == address)
    }

    /// Checks that the per-participant vectors and every tree node agree
    /// with `signers_count` and `security`.
    pub fn check_shape(&self) -> Result<()> {
        if self.signers_count == 0 {
            return Err(FlashError::InvalidConfig("channel has no signers".to_string()));
        }
        if self.deposit.len() != self.signers_count
            || self.settlement_addresses.len() != self.signers_count
        {
            return Err(FlashError::InvalidConfig(format!(
                "{} signers but {} deposits and {} settlement addresses",
                self.signers_count,
                self.deposit.len(),
                self.settlement_addresses.len()
            )));
        }

        let expected_sum = self.signers_count * self.security.fragments();
        if let Some(node) = std::iter::once(self.tree.remainder())
            .chain(self.tree.iter())
            .find(|node| node.security_sum != expected_sum)
        {
            return Err(FlashError::AddressMismatch(format!(
                "address {} requires {} fragments, channel expects {}",
                node.address, node.security_sum, expected_sum
            )));
        }
        Ok(())
    }

    /// Checks `Σ deposit == balance`.
    pub fn check_invariants(&self) -> Result<()> {
        let total = self
            .deposit
            .iter()
            .try_fold(0u64, |acc, d| acc.checked_add(*d))
            .ok_or(FlashError::BalanceOverflow)?;
        if total != self.balance {
            return Err(FlashError::AddressMismatch(format!(
                "deposits sum to {} but balance is {}",
                total, self.balance
            )));
        }
        Ok(())
    }
}

/// Wire form of [`ChannelState`], validated on the way in.
#[derive(Deserialize)]
struct StateData {
    signers_count: usize,
    security: Security,
    balance: u64,
    deposit: Vec<u64>,
    outputs: BTreeMap<String, u64>,
    transfers: Vec<Vec<Bundle>>,
    tree: ChannelTree,
    settlement_addresses: Vec<String>,
    closed: bool,
}

impl TryFrom<StateData> for ChannelState {
    type Error = FlashError;

    fn try_from(data: StateData) -> Result<Self> {
        let state = Self {
            signers_count: data.signers_count,
            security: data.security,
            balance: data.balance,
            deposit: data.deposit,
            outputs: data.outputs,
            transfers: data.transfers,
            tree: data.tree,
            settlement_addresses: data.settlement_addresses,
            closed: data.closed,
        };
        state.check_shape()?;
        state.check_invariants()?;
        Ok(state)
    }
}
