//! Applying agreed bundle sets to a participant's state.
//!
//! The applier is the only place a [`ChannelState`] changes after setup. It
//! takes the current state by reference and returns the next one, so a
//! rejected bundle set can never leave a participant half-updated.
//!
//! ## Checks
//!
//! 1. The channel is still open.
//! 2. [`verify_bundles`]: zero-sum, known addresses, every slot signed, every
//!    spent address recovered from its fragments.
//! 3. The set has the exact shape this state would build for the outcome it
//!    encodes: the funding chain for a transfer, or the single closing bundle.
//! 4. For transfers: one remainder credit per participant, custody conserved,
//!    no external output shrinks.
//!
//! Key indices are never advanced here; every transfer re-spends the same
//! chain.

use std::collections::BTreeMap;

use tracing::info;

use super::state::ChannelState;
use crate::crypto::FragmentSigner;
use crate::error::{FlashError, Result};
use crate::transaction::{bundles_for, create_close, verify_bundles, Bundle, Distribution};

/// What a verified bundle set does to the channel.
#[derive(Debug)]
enum Outcome {
    Transfer(Distribution),
    Close,
}

/// Validates a fully signed bundle set and returns the resulting state.
pub fn apply_transfers<S: FragmentSigner>(
    state: &ChannelState,
    scheme: &S,
    bundles: &[Bundle],
) -> Result<ChannelState> {
    if state.closed {
        return Err(FlashError::ChannelClosed);
    }
    verify_bundles(state, scheme, bundles)?;

    let outcome = read_outcome(state, bundles)?;
    let expected = match &outcome {
        Outcome::Transfer(distribution) => bundles_for(state, distribution)?,
        Outcome::Close => create_close(state, &state.settlement_addresses)?,
    };
    if !same_layout(&expected, bundles) {
        return Err(FlashError::AddressMismatch(
            "bundle set does not match the channel's tree or custody".to_string(),
        ));
    }

    let mut next = state.clone();
    match outcome {
        Outcome::Transfer(distribution) => {
            next.balance = sum(&distribution.deposit)?;
            next.deposit = distribution.deposit;
            next.outputs = distribution.outputs;
            next.check_invariants()?;
            info!(
                bundles = bundles.len(),
                balance = next.balance,
                outputs = next.outputs.len(),
                "transfer applied"
            );
        }
        Outcome::Close => {
            next.closed = true;
            next.balance = 0;
            next.deposit = vec![0; next.signers_count];
            next.outputs.clear();
            info!(custody = state.custody()?, "channel closed");
        }
    }
    next.transfers.push(bundles.to_vec());
    Ok(next)
}

// ---------------------------------------------------------------------------
// Outcome Recovery
// ---------------------------------------------------------------------------

fn read_outcome(state: &ChannelState, bundles: &[Bundle]) -> Result<Outcome> {
    let Some(last) = bundles.last() else {
        return Err(FlashError::EmptyTransferRequest);
    };
    let remainder = &state.remainder_address().address;
    if last.transactions.iter().any(|tx| &tx.address == remainder) {
        read_distribution(state, last).map(Outcome::Transfer)
    } else {
        Ok(Outcome::Close)
    }
}

/// Reads the new deposit split and outputs out of the leaf bundle.
fn read_distribution(state: &ChannelState, last: &Bundle) -> Result<Distribution> {
    let remainder = &state.remainder_address().address;
    let mut inputs = vec![false; last.len()];
    for group in last.input_groups() {
        inputs[group.start..group.start + group.len].fill(true);
    }

    let mut deposit = Vec::with_capacity(state.signers_count);
    let mut outputs = BTreeMap::new();
    for (tx, _) in last.transactions.iter().zip(&inputs).filter(|(_, input)| !**input) {
        let value = u64::try_from(tx.value).map_err(|_| {
            FlashError::AddressMismatch(format!("negative credit to {}", tx.address))
        })?;
        if &tx.address == remainder {
            deposit.push(value);
        } else if state.tree.contains(&tx.address) {
            return Err(FlashError::AddressMismatch(format!(
                "distribution credits channel address {}",
                tx.address
            )));
        } else if state.participant_of(&tx.address).is_some() {
            return Err(FlashError::AddressMismatch(format!(
                "distribution pays settlement address {} before closing",
                tx.address
            )));
        } else if outputs.insert(tx.address.clone(), value).is_some() {
            return Err(FlashError::AddressMismatch(format!(
                "output {} appears twice",
                tx.address
            )));
        }
    }

    if deposit.len() != state.signers_count {
        return Err(FlashError::AddressMismatch(format!(
            "expected {} remainder credits, got {}",
            state.signers_count,
            deposit.len()
        )));
    }

    let custody = state.custody()?;
    let total = sum(&deposit)?
        .checked_add(sum(outputs.values())?)
        .ok_or(FlashError::BalanceOverflow)?;
    if total != custody {
        return Err(FlashError::AddressMismatch(format!(
            "distribution moves {} but the channel holds {}",
            total, custody
        )));
    }

    for (address, paid) in &state.outputs {
        let now = outputs.get(address).copied().unwrap_or(0);
        if now < *paid {
            return Err(FlashError::AddressMismatch(format!(
                "output to {} shrinks from {} to {}",
                address, paid, now
            )));
        }
    }

    Ok(Distribution { deposit, outputs })
}

/// Same transactions in the same order, signatures aside.
fn same_layout(expected: &[Bundle], got: &[Bundle]) -> bool {
    expected.len() == got.len() && expected.iter().zip(got).all(|(a, b)| a.hash() == b.hash())
}

fn sum<'a>(values: impl IntoIterator<Item = &'a u64>) -> Result<u64> {
    values
        .into_iter()
        .try_fold(0u64, |acc, v| acc.checked_add(*v))
        .ok_or(FlashError::BalanceOverflow)
}
