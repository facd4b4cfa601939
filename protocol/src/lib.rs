// Copyright (c) 2026 Flash Channel Contributors. MIT License.
// See LICENSE for details.

//! # Flash Channel: Core Library
//!
//! An N-party payment channel built from one-time-signature multisig
//! addresses. Participants pool deposits once, then pay each other (or
//! outside addresses) off-ledger by re-signing the same chain of nested
//! addresses, and settle on the ledger with a single closing bundle.
//!
//! ## Architecture
//!
//! - **config**: Protocol constants and the validated [`config::ChannelConfig`].
//! - **crypto**: Hashing plus the one-time-signature traits and the
//!   Ed25519-based reference scheme.
//! - **multisig**: Seeds, digests, composite addresses, the channel tree.
//! - **transaction**: Bundle construction, partial signing, merging and
//!   verification.
//! - **channel**: Setup, per-participant state and the state applier.
//! - **error**: [`FlashError`], the one error type of the crate.
//!
//! ## Flow
//!
//! ```text
//! setup:  generate_digests ─► compose_address ─► build_tree ─► ChannelState
//! repeat: create_transaction ─► sign_transaction ─► applied_signatures ─► apply_transfers
//! ```
//!
//! ## Design Philosophy
//!
//! 1. Every state transition is all or nothing.
//! 2. Builders are pure; only the applier produces a new state.
//! 3. Key material stays behind the [`crypto::ots`] traits and is never logged.

pub mod channel;
pub mod config;
pub mod crypto;
pub mod error;
pub mod multisig;
pub mod transaction;

pub use error::{FlashError, Result};
