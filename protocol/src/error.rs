//! Error types for Flash channel operations.
//!
//! Every fallible operation in the crate returns a [`FlashError`]. Failures
//! are local and synchronous: the caller aborts the current transaction round
//! and retries with corrected inputs. No operation leaves a
//! [`ChannelState`](crate::channel::ChannelState) partially updated.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FlashError>;

/// Errors that can occur while composing addresses, building bundles,
/// signing, or applying agreed bundles to a channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlashError {
    /// The channel configuration failed validation.
    #[error("invalid channel config: {0}")]
    InvalidConfig(String),

    /// Wrong digest count or mismatched indices when composing an address.
    #[error("malformed digest set: {0}")]
    MalformedDigestSet(String),

    /// Fewer than two addresses supplied to the tree builder.
    #[error("malformed tree: need at least 2 addresses (remainder + root), got {got}")]
    MalformedTree {
        /// Number of addresses supplied.
        got: usize,
    },

    /// Requested transfers exceed the funds available to the sender.
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Funds the sender can still spend.
        available: u64,
        /// Total value requested.
        requested: u64,
    },

    /// The transfer request carried no transfers (or no settlement addresses).
    #[error("transfer request is empty")]
    EmptyTransferRequest,

    /// A transfer with a zero value was requested.
    #[error("transfer to {address} has zero value")]
    ZeroValueTransfer {
        /// Destination of the offending transfer.
        address: String,
    },

    /// The participant ordinal is outside the channel's signer set.
    #[error("unknown participant {index} (channel has {signers} signers)")]
    UnknownParticipant {
        /// Ordinal that was requested.
        index: usize,
        /// Number of signers in the channel.
        signers: usize,
    },

    /// The channel has been closed and accepts no further bundles.
    #[error("channel is closed")]
    ChannelClosed,

    /// A signature was requested for an address the signer holds no key for.
    #[error("unauthorized signer: no key for address {address}")]
    UnauthorizedSigner {
        /// The address that could not be signed.
        address: String,
    },

    /// A bundle was applied before every input slot was signed.
    #[error("incomplete signatures: bundle {bundle} has {missing} unsigned input slot(s)")]
    IncompleteSignatures {
        /// Position of the bundle within the set.
        bundle: usize,
        /// Number of input slots still missing a fragment.
        missing: usize,
    },

    /// A bundle references an address outside the participant's tree, or its
    /// distribution does not match the channel.
    #[error("address mismatch: {0}")]
    AddressMismatch(String),

    /// A signature refers to a bundle index that does not exist.
    #[error("bundle index {index} out of range ({count} bundle(s))")]
    BundleOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of bundles in the set.
        count: usize,
    },

    /// A signature was produced over a different bundle.
    #[error("bundle hash mismatch at bundle {bundle}: expected {expected}, got {got}")]
    BundleHashMismatch {
        /// Position of the bundle within the set.
        bundle: usize,
        /// Hash of the bundle being signed.
        expected: String,
        /// Hash the signature was made over.
        got: String,
    },

    /// An input slot already holds a different fragment.
    #[error("signature slot {slot} of {address} in bundle {bundle} is already taken")]
    SignatureSlotConflict {
        /// Position of the bundle within the set.
        bundle: usize,
        /// Address whose input group holds the slot.
        address: String,
        /// Slot offset within the input group.
        slot: usize,
    },

    /// A bundle's transaction values do not sum to zero.
    #[error("bundle {bundle} is unbalanced: values sum to {sum}")]
    UnbalancedBundle {
        /// Position of the bundle within the set.
        bundle: usize,
        /// Sum of all transaction values.
        sum: i128,
    },

    /// Fragments on an input group do not recover the spent address.
    #[error("invalid signature for {address}: {reason}")]
    InvalidSignature {
        /// The spent address.
        address: String,
        /// Why recovery failed.
        reason: String,
    },

    /// Arithmetic overflow on channel amounts.
    #[error("balance overflow")]
    BalanceOverflow,
}
