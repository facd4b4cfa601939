//! Multisig address composition.
//!
//! A multisig address is derived from one digest per participant, all taken
//! at the same tree position. Every participant composes the same address
//! string from the shared public digests; the per-caller fields
//! (`signing_index`, `security`) tell that caller where its fragments go when
//! the address is spent.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::digest::{Digest, Security};
use crate::config::ADDRESS_DOMAIN;
use crate::crypto::hash::blake3_tagged;
use crate::error::{FlashError, Result};

/// A composite address plus the caller's view of its signing layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigAddress {
    /// Composite identifier shared by every participant.
    pub address: String,
    /// Key index of the member digests.
    pub index: u64,
    /// Offset of the caller's first fragment within the input group.
    pub signing_index: usize,
    /// Total fragments required to spend: Σ security over all members.
    pub security_sum: usize,
    /// Caller's own digest security.
    pub security: Security,
}

impl MultisigAddress {
    /// Slots of the input group the caller fills when signing.
    pub fn signing_range(&self) -> Range<usize> {
        self.signing_index..self.signing_index + self.security.fragments()
    }

    /// Number of participants that must sign, assuming uniform security.
    pub fn signers(&self) -> usize {
        self.security_sum / self.security.fragments()
    }
}

/// Address string for an ordered set of digest values.
pub fn address_from_digest_values<S: AsRef<str>>(values: &[S]) -> String {
    let parts: Vec<&[u8]> = values.iter().map(|v| v.as_ref().as_bytes()).collect();
    hex::encode(blake3_tagged(ADDRESS_DOMAIN, &parts))
}

/// Composes one multisig address from `digests` (one per participant, in
/// ordinal order) as seen by participant `signer`.
///
/// # Errors
///
/// [`FlashError::MalformedDigestSet`] when the set does not hold exactly
/// `signers_count` digests, the indices disagree, the security levels are
/// mixed, or `signer` is not a member.
pub fn compose_address(
    digests: &[Digest],
    signer: usize,
    signers_count: usize,
) -> Result<MultisigAddress> {
    if digests.len() != signers_count {
        return Err(FlashError::MalformedDigestSet(format!(
            "expected {} digests, got {}",
            signers_count,
            digests.len()
        )));
    }
    let own = digests.get(signer).ok_or_else(|| {
        FlashError::MalformedDigestSet(format!(
            "signer {} is not among {} digests",
            signer,
            digests.len()
        ))
    })?;

    if let Some(stray) = digests.iter().find(|d| d.index != own.index) {
        return Err(FlashError::MalformedDigestSet(format!(
            "index mismatch: {} vs {}",
            own.index, stray.index
        )));
    }
    // signing_index = ordinal * security only partitions the slots when every
    // member uses the same security.
    if digests.iter().any(|d| d.security != own.security) {
        return Err(FlashError::MalformedDigestSet(
            "mixed security levels".to_string(),
        ));
    }

    let values: Vec<&str> = digests.iter().map(|d| d.value.as_str()).collect();
    let security_sum = digests.iter().map(|d| d.security.fragments()).sum();

    Ok(MultisigAddress {
        address: address_from_digest_values(&values),
        index: own.index,
        signing_index: signer * own.security.fragments(),
        security_sum,
        security: own.security,
    })
}
