//! # Transaction Module
//!
//! Construction, signing and verification of Flash bundles.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        - Transfer, TransactionRequest, Transaction, Bundle
//! builder.rs      - create_transaction: transfer chains and closing bundles
//! signing.rs      - sign_transaction / applied_signatures
//! verification.rs - zero-sum, slot layout, completeness, fragment recovery
//! ```
//!
//! ## Bundle Lifecycle
//!
//! 1. **Build** - any participant calls [`create_transaction`]; every
//!    participant can rebuild the same bundles from its own state.
//! 2. **Sign** - each participant runs [`sign_transaction`] and shares the
//!    resulting [`BundleSignature`]s.
//! 3. **Merge** - [`applied_signatures`] places everyone's fragments.
//! 4. **Apply** - each participant applies the fully signed set to its own
//!    state (see [`crate::channel::apply_transfers`]), which runs
//!    [`verify_bundles`] first.
//!
//! ## Design Decisions
//!
//! - Bundle hashes are `double_sha256` of the canonical `(address, value)`
//!   encoding, so merging fragments never changes what is being signed.
//! - Amounts are `u64` in channel state and `i64` in bundles; conversion is
//!   checked.

pub mod builder;
pub mod signing;
pub mod types;
pub mod verification;

pub use builder::{
    bundles_for, create_close, create_transaction, create_transfer, prepare, Distribution,
};
pub use signing::{applied_signatures, sign_transaction, BundleSignature};
pub use types::{Bundle, InputGroup, Transaction, TransactionRequest, Transfer};
pub use verification::{verify_bundles, verify_structure};
