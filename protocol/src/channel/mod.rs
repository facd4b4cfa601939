//! # Channel
//!
//! Setup, per-participant state and state transitions.
//!
//! ```text
//! setup.rs       - generate_digests / compose_tree / open_channel
//! state.rs       - ChannelState: balance, deposits, outputs, tree
//! participant.rs - Participant: ordinal + seed + own state
//! apply.rs       - apply_transfers: verified bundle set → next state
//! ```
//!
//! Every participant keeps its own [`ChannelState`]. Nothing is shared
//! between participants except digests during setup and bundles plus
//! signatures afterwards.

pub mod apply;
pub mod participant;
pub mod setup;
pub mod state;

pub use apply::apply_transfers;
pub use participant::Participant;
pub use setup::{compose_tree, generate_digests, open_channel};
pub use state::ChannelState;
