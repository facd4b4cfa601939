//! Partial signing and signature merging.
//!
//! Each participant signs every input group in a bundle set with the
//! one-time key at the spent address's key index, producing its fragments
//! for slots `signing_index .. signing_index + security`. The fragments of
//! all participants are then merged into the bundles with
//! [`applied_signatures`]. Participants fill disjoint slots, so the merge
//! order does not matter.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::Bundle;
use crate::channel::ChannelState;
use crate::crypto::{FragmentSigner, SignatureFragment};
use crate::error::{FlashError, Result};
use crate::multisig::Seed;

/// One participant's fragments for one input group of one bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleSignature {
    /// Position of the bundle within the set.
    pub bundle: usize,
    /// Hex hash of the bundle that was signed.
    pub bundle_hash: String,
    /// The spent address.
    pub address: String,
    /// First slot the fragments go into.
    pub signing_index: usize,
    /// Fragments in slot order.
    pub fragments: Vec<SignatureFragment>,
}

/// Produces the caller's partial signatures over `bundles`.
///
/// # Errors
///
/// - [`FlashError::UnauthorizedSigner`] when a bundle spends an address
///   outside the caller's tree.
/// - [`FlashError::AddressMismatch`] when an input group's slot count does
///   not match the address's `security_sum`.
pub fn sign_transaction<S: FragmentSigner>(
    state: &ChannelState,
    seed: &Seed,
    scheme: &S,
    bundles: &[Bundle],
) -> Result<Vec<BundleSignature>> {
    let mut signatures = Vec::new();

    for (i, bundle) in bundles.iter().enumerate() {
        let hash = bundle.hash();
        for group in bundle.input_groups() {
            let node = state
                .tree
                .find(group.address)
                .ok_or_else(|| FlashError::UnauthorizedSigner {
                    address: group.address.to_string(),
                })?;
            if group.len != node.security_sum {
                return Err(FlashError::AddressMismatch(format!(
                    "bundle {} spends {} with {} slots, expected {}",
                    i, node.address, group.len, node.security_sum
                )));
            }

            signatures.push(BundleSignature {
                bundle: i,
                bundle_hash: hex::encode(hash),
                address: node.address.clone(),
                signing_index: node.signing_index,
                fragments: scheme.sign(seed, node.index, node.security, &hash),
            });
        }
    }

    debug!(
        bundles = bundles.len(),
        signatures = signatures.len(),
        "partial signatures produced"
    );
    Ok(signatures)
}

/// Merges `signatures` into a copy of `bundles`.
///
/// Re-applying a fragment that is already in place is a no-op.
pub fn applied_signatures(bundles: &[Bundle], signatures: &[BundleSignature]) -> Result<Vec<Bundle>> {
    let mut merged = bundles.to_vec();
    let count = merged.len();

    for signature in signatures {
        let bundle = merged
            .get_mut(signature.bundle)
            .ok_or(FlashError::BundleOutOfRange {
                index: signature.bundle,
                count,
            })?;

        let expected = bundle.hash_hex();
        if expected != signature.bundle_hash {
            return Err(FlashError::BundleHashMismatch {
                bundle: signature.bundle,
                expected,
                got: signature.bundle_hash.clone(),
            });
        }

        let (start, len) = bundle
            .input_groups()
            .iter()
            .find(|g| g.address == signature.address)
            .map(|g| (g.start, g.len))
            .ok_or_else(|| {
                FlashError::AddressMismatch(format!(
                    "bundle {} does not spend {}",
                    signature.bundle, signature.address
                ))
            })?;
        signature
            .signing_index
            .checked_add(signature.fragments.len())
            .filter(|end| *end <= len)
            .ok_or_else(|| {
                FlashError::AddressMismatch(format!(
                    "fragments for {} overrun its {} slots",
                    signature.address, len
                ))
            })?;

        for (k, fragment) in signature.fragments.iter().enumerate() {
            let slot = signature.signing_index + k;
            let tx = &mut bundle.transactions[start + slot];
            match &tx.signature {
                Some(existing) if existing != fragment => {
                    return Err(FlashError::SignatureSlotConflict {
                        bundle: signature.bundle,
                        address: signature.address.clone(),
                        slot,
                    });
                }
                _ => tx.signature = Some(fragment.clone()),
            }
        }
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::test_utils::{two_party, TWO_SETTLEMENT};
    use crate::crypto::Ed25519Ots;
    use crate::transaction::builder::create_transfer;
    use crate::transaction::Transfer;

    fn transfer_bundles() -> (Vec<crate::channel::Participant>, Vec<Bundle>) {
        let parties = two_party();
        let bundles =
            create_transfer(&parties[0].state, 0, &[Transfer::new(200, TWO_SETTLEMENT)]).unwrap();
        (parties, bundles)
    }

    fn sign(p: &crate::channel::Participant, bundles: &[Bundle]) -> Vec<BundleSignature> {
        sign_transaction(&p.state, p.seed(), &Ed25519Ots, bundles).unwrap()
    }

    #[test]
    fn one_signature_per_input_group() {
        let (parties, bundles) = transfer_bundles();
        let sigs = sign(&parties[0], &bundles);
        assert_eq!(sigs.len(), bundles.len());
        for sig in &sigs {
            assert_eq!(sig.signing_index, 0);
            assert_eq!(sig.fragments.len(), 2);
        }
        let second = sign(&parties[1], &bundles);
        assert!(second.iter().all(|s| s.signing_index == 2));
    }

    #[test]
    fn partial_merge_leaves_slots_open() {
        let (parties, bundles) = transfer_bundles();
        let merged = applied_signatures(&bundles, &sign(&parties[0], &bundles)).unwrap();
        for bundle in &merged {
            assert_eq!(bundle.unsigned_slots(), 2);
        }
    }

    #[test]
    fn full_merge_fills_every_slot() {
        let (parties, bundles) = transfer_bundles();
        let merged = applied_signatures(&bundles, &sign(&parties[0], &bundles)).unwrap();
        let merged = applied_signatures(&merged, &sign(&parties[1], &bundles)).unwrap();
        assert!(merged.iter().all(|b| b.unsigned_slots() == 0));
        // Outputs never carry fragments.
        let last = merged.last().unwrap();
        assert!(last.transactions.iter().filter(|tx| tx.value > 0).all(|tx| !tx.is_signed()));
    }

    #[test]
    fn merge_is_commutative() {
        let (parties, bundles) = transfer_bundles();
        let a = sign(&parties[0], &bundles);
        let b = sign(&parties[1], &bundles);

        let ab = applied_signatures(&applied_signatures(&bundles, &a).unwrap(), &b).unwrap();
        let ba = applied_signatures(&applied_signatures(&bundles, &b).unwrap(), &a).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn merge_is_idempotent() {
        let (parties, bundles) = transfer_bundles();
        let a = sign(&parties[0], &bundles);
        let once = applied_signatures(&bundles, &a).unwrap();
        let twice = applied_signatures(&once, &a).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn signing_foreign_address_is_unauthorized() {
        let (parties, bundles) = transfer_bundles();
        let other = crate::channel::test_utils::channel_with_phrases("CAROL", "DAVE");
        let err = sign_transaction(&other[0].state, other[0].seed(), &Ed25519Ots, &bundles)
            .unwrap_err();
        assert_eq!(
            err,
            FlashError::UnauthorizedSigner {
                address: parties[0].state.root().address.clone()
            }
        );
    }

    #[test]
    fn out_of_range_bundle_is_rejected() {
        let (parties, bundles) = transfer_bundles();
        let mut sigs = sign(&parties[0], &bundles);
        sigs[0].bundle = 99;
        assert_eq!(
            applied_signatures(&bundles, &sigs).unwrap_err(),
            FlashError::BundleOutOfRange {
                index: 99,
                count: bundles.len()
            }
        );
    }

    #[test]
    fn signature_over_other_bundle_is_rejected() {
        let (parties, bundles) = transfer_bundles();
        let sigs = sign(&parties[0], &bundles);
        let other =
            create_transfer(&parties[0].state, 0, &[Transfer::new(1, TWO_SETTLEMENT)]).unwrap();
        assert!(matches!(
            applied_signatures(&other, &sigs),
            Err(FlashError::BundleHashMismatch { bundle: 0, .. })
        ));
    }

    #[test]
    fn conflicting_fragment_is_rejected() {
        let (parties, bundles) = transfer_bundles();
        let merged = applied_signatures(&bundles, &sign(&parties[0], &bundles)).unwrap();

        // Participant 1's fragments forced into participant 0's slots.
        let mut forged = sign(&parties[1], &bundles);
        forged[0].signing_index = 0;
        assert!(matches!(
            applied_signatures(&merged, &forged[..1]),
            Err(FlashError::SignatureSlotConflict { bundle: 0, slot: 0, .. })
        ));
    }

    #[test]
    fn huge_signing_index_is_mismatch() {
        let (parties, bundles) = transfer_bundles();
        let mut sigs = sign(&parties[1], &bundles);
        sigs[0].signing_index = usize::MAX;
        let err = applied_signatures(&bundles, &sigs[..1]).unwrap_err();
        assert!(err.to_string().contains("overrun"));
    }

    #[test]
    fn fragments_past_the_group_are_mismatch() {
        let (parties, bundles) = transfer_bundles();
        let mut sigs = sign(&parties[1], &bundles);
        // Slots 3..5 of a 4-slot group.
        sigs[0].signing_index = 3;
        assert!(matches!(
            applied_signatures(&bundles, &sigs[..1]),
            Err(FlashError::AddressMismatch(_))
        ));
    }

    #[test]
    fn signature_for_unspent_address_is_mismatch() {
        let (parties, bundles) = transfer_bundles();
        let mut sigs = sign(&parties[0], &bundles);
        sigs[0].address = parties[0].state.remainder_address().address.clone();
        let err = applied_signatures(&bundles, &sigs[..1]).unwrap_err();
        assert!(err.to_string().contains("does not spend"));
    }

    #[test]
    fn failed_merge_leaves_input_untouched() {
        let (parties, bundles) = transfer_bundles();
        let mut sigs = sign(&parties[0], &bundles);
        sigs.last_mut().unwrap().bundle = 42;
        let snapshot = bundles.clone();
        assert!(applied_signatures(&bundles, &sigs).is_err());
        assert_eq!(bundles, snapshot);
    }
}
