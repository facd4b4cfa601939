//! Bundle construction.
//!
//! The builder is pure: it reads a [`ChannelState`] and a request and returns
//! bundles. It never touches the state; that is the applier's job once the
//! bundles are signed by everyone.
//!
//! ## Transfer bundles
//!
//! Every transfer re-spends the whole custody from the root, down the chain:
//!
//! ```text
//! root ──► node1 ──► node2 ──► … ──► leaf ──► remainder (one credit per participant)
//!                                         └─► external outputs (cumulative)
//! ```
//!
//! One funding bundle per edge, then one distribution bundle from the leaf.
//! The remainder credits are emitted in ordinal order, so the new deposit
//! split can be read straight back out of the bundle.
//!
//! ## Closing bundle
//!
//! A single bundle spends the root and pays every participant's settlement
//! address its deposit, plus any cumulative external outputs.
//!
//! Each spent address gets `security_sum` input slots: the first carries the
//! debit, the rest are zero-value slots that hold the remaining fragments.

use std::collections::BTreeMap;

use tracing::debug;

use super::types::{to_value, Bundle, Transaction, Transfer, TransactionRequest};
use crate::channel::ChannelState;
use crate::error::{FlashError, Result};
use crate::multisig::MultisigAddress;

/// Deposit split and cumulative outputs after a set of transfers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    /// New per-participant deposits.
    pub deposit: Vec<u64>,
    /// New cumulative external outputs.
    pub outputs: BTreeMap<String, u64>,
}

/// Builds the bundles for `request` on behalf of participant `sender`.
///
/// `sender` is only consulted for transfers; closing is symmetric.
pub fn create_transaction(
    state: &ChannelState,
    sender: usize,
    request: &TransactionRequest,
) -> Result<Vec<Bundle>> {
    match request {
        TransactionRequest::Transfer(transfers) => create_transfer(state, sender, transfers),
        TransactionRequest::Close(addresses) => create_close(state, addresses),
    }
}

/// Computes the distribution that results from `sender` paying `transfers`.
///
/// Transfers to a participant's settlement address move value between
/// deposits. Anything else is an external payment recorded in `outputs`.
pub fn prepare(state: &ChannelState, sender: usize, transfers: &[Transfer]) -> Result<Distribution> {
    if state.closed {
        return Err(FlashError::ChannelClosed);
    }
    let available = match state.deposit.get(sender) {
        Some(available) if sender < state.signers_count => *available,
        _ => {
            return Err(FlashError::UnknownParticipant {
                index: sender,
                signers: state.signers_count,
            })
        }
    };
    if transfers.is_empty() {
        return Err(FlashError::EmptyTransferRequest);
    }

    let mut requested = 0u64;
    for transfer in transfers {
        if transfer.value == 0 {
            return Err(FlashError::ZeroValueTransfer {
                address: transfer.address.clone(),
            });
        }
        if state.tree.contains(&transfer.address) {
            return Err(FlashError::AddressMismatch(format!(
                "cannot pay channel address {}",
                transfer.address
            )));
        }
        requested = requested
            .checked_add(transfer.value)
            .ok_or(FlashError::BalanceOverflow)?;
    }

    if requested > available {
        return Err(FlashError::InsufficientBalance {
            available,
            requested,
        });
    }

    let mut deposit = state.deposit.clone();
    let mut outputs = state.outputs.clone();
    deposit[sender] = available - requested;
    for transfer in transfers {
        let slot = match state.participant_of(&transfer.address) {
            Some(receiver) => {
                deposit
                    .get_mut(receiver)
                    .ok_or(FlashError::UnknownParticipant {
                        index: receiver,
                        signers: state.signers_count,
                    })?
            }
            None => outputs.entry(transfer.address.clone()).or_insert(0),
        };
        *slot = slot
            .checked_add(transfer.value)
            .ok_or(FlashError::BalanceOverflow)?;
    }

    Ok(Distribution { deposit, outputs })
}

/// Builds the funding chain and distribution bundle for a transfer.
pub fn create_transfer(
    state: &ChannelState,
    sender: usize,
    transfers: &[Transfer],
) -> Result<Vec<Bundle>> {
    let distribution = prepare(state, sender, transfers)?;
    let bundles = bundles_for(state, &distribution)?;

    debug!(
        sender,
        transfers = transfers.len(),
        bundles = bundles.len(),
        "transfer bundles built"
    );
    Ok(bundles)
}

/// Funding chain plus distribution bundle that move the channel's custody to
/// `distribution`.
pub fn bundles_for(state: &ChannelState, distribution: &Distribution) -> Result<Vec<Bundle>> {
    let custody = to_value(state.custody()?)?;
    let remainder = &state.remainder_address().address;

    let mut bundles = Vec::with_capacity(state.tree.depth());
    for (position, node) in state.tree.iter().enumerate() {
        let mut txs = spend(node, custody);
        match state.tree.child_of(position) {
            Some(child) => txs.push(Transaction::new(child.address.clone(), custody)),
            None => {
                for share in &distribution.deposit {
                    txs.push(Transaction::new(remainder.clone(), to_value(*share)?));
                }
                for (address, value) in &distribution.outputs {
                    txs.push(Transaction::new(address.clone(), to_value(*value)?));
                }
            }
        }
        bundles.push(Bundle::new(txs));
    }
    Ok(bundles)
}

/// Builds the single closing bundle.
///
/// `settlement_addresses` must match the channel's, in ordinal order.
pub fn create_close(state: &ChannelState, settlement_addresses: &[String]) -> Result<Vec<Bundle>> {
    if state.closed {
        return Err(FlashError::ChannelClosed);
    }
    if settlement_addresses.is_empty() {
        return Err(FlashError::EmptyTransferRequest);
    }
    if settlement_addresses != state.settlement_addresses.as_slice() {
        return Err(FlashError::AddressMismatch(
            "closing addresses differ from the channel's settlement addresses".to_string(),
        ));
    }

    let custody = to_value(state.custody()?)?;
    let mut txs = spend(state.root(), custody);

    for (address, deposit) in settlement_addresses.iter().zip(&state.deposit) {
        let owed = deposit
            .checked_add(state.outputs.get(address).copied().unwrap_or(0))
            .ok_or(FlashError::BalanceOverflow)?;
        if owed > 0 {
            txs.push(Transaction::new(address.clone(), to_value(owed)?));
        }
    }
    for (address, value) in &state.outputs {
        if *value > 0 && state.participant_of(address).is_none() {
            txs.push(Transaction::new(address.clone(), to_value(*value)?));
        }
    }

    debug!(custody, transactions = txs.len(), "closing bundle built");
    Ok(vec![Bundle::new(txs)])
}

/// Input slots spending `value` from `address`.
fn spend(address: &MultisigAddress, value: i64) -> Vec<Transaction> {
    let mut txs = Vec::with_capacity(address.security_sum + 1);
    txs.push(Transaction::new(address.address.clone(), -value));
    for _ in 1..address.security_sum {
        txs.push(Transaction::new(address.address.clone(), 0));
    }
    txs
}
