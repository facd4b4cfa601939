//! Verification of signed bundle sets.
//!
//! A bundle is authoritative only when it is zero-sum, every address it
//! spends is one of the channel's, every input slot holds a fragment, and the
//! fragments recover exactly the spent address. Checks run cheapest first.

use super::types::Bundle;
use crate::channel::ChannelState;
use crate::crypto::FragmentSigner;
use crate::error::{FlashError, Result};
use crate::multisig::address_from_digest_values;

/// Structural checks only: balance, known addresses, slot counts.
pub fn verify_structure(state: &ChannelState, bundles: &[Bundle]) -> Result<()> {
    if bundles.is_empty() {
        return Err(FlashError::EmptyTransferRequest);
    }
    for (i, bundle) in bundles.iter().enumerate() {
        if !bundle.is_balanced() {
            return Err(FlashError::UnbalancedBundle {
                bundle: i,
                sum: bundle.sum(),
            });
        }
        for group in bundle.input_groups() {
            let node = state.tree.find(group.address).ok_or_else(|| {
                FlashError::AddressMismatch(format!(
                    "bundle {} spends unknown address {}",
                    i, group.address
                ))
            })?;
            if group.len != node.security_sum {
                return Err(FlashError::AddressMismatch(format!(
                    "bundle {} spends {} with {} slots, expected {}",
                    i, node.address, group.len, node.security_sum
                )));
            }
        }
    }
    Ok(())
}

/// Full verification: structure, completeness, then fragment recovery.
pub fn verify_bundles<S: FragmentSigner>(
    state: &ChannelState,
    scheme: &S,
    bundles: &[Bundle],
) -> Result<()> {
    verify_structure(state, bundles)?;

    for (i, bundle) in bundles.iter().enumerate() {
        let missing = bundle.unsigned_slots();
        if missing > 0 {
            return Err(FlashError::IncompleteSignatures { bundle: i, missing });
        }
    }

    for bundle in bundles {
        let hash = bundle.hash();
        for group in bundle.input_groups() {
            // verify_structure guarantees the lookup succeeds.
            let Some(node) = state.tree.find(group.address) else {
                continue;
            };
            let fragments: Vec<_> = bundle.transactions[group.start..group.start + group.len]
                .iter()
                .filter_map(|tx| tx.signature.clone())
                .collect();

            let mut digests = Vec::with_capacity(node.signers());
            for chunk in fragments.chunks(node.security.fragments()) {
                let digest = scheme.recover_digest(&hash, chunk).map_err(|e| {
                    FlashError::InvalidSignature {
                        address: node.address.clone(),
                        reason: e.to_string(),
                    }
                })?;
                digests.push(digest);
            }

            if address_from_digest_values(&digests) != node.address {
                return Err(FlashError::InvalidSignature {
                    address: node.address.clone(),
                    reason: "fragments recover a different address".to_string(),
                });
            }
        }
    }

    Ok(())
}
