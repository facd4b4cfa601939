//! # Multisig Addresses
//!
//! From per-participant digests to the shared channel tree:
//!
//! ```text
//! digest.rs  - Seed, Security, Digest
//! address.rs - compose_address: one digest per participant → MultisigAddress
//! tree.rs    - build_tree: remainder + root-first chain of addresses
//! ```
//!
//! Every participant runs the same composition over the same public digests,
//! so every participant ends up with the same address strings and the same
//! nesting, and can check the others' bundles without trusting them.

pub mod address;
pub mod digest;
pub mod tree;

pub use address::{address_from_digest_values, compose_address, MultisigAddress};
pub use digest::{Digest, Security, Seed};
pub use tree::{build_tree, ChannelTree};
