//! The private side of a channel member.

use std::fmt;

use super::apply::apply_transfers;
use super::state::ChannelState;
use crate::crypto::FragmentSigner;
use crate::error::{FlashError, Result};
use crate::multisig::Seed;
use crate::transaction::{
    create_transaction, sign_transaction, Bundle, BundleSignature, TransactionRequest,
};

/// A participant: ordinal, seed, next unused key index and own state.
pub struct Participant {
    /// Ordinal within the channel.
    pub index: usize,
    seed: Seed,
    /// First key index not consumed by setup. Reserved for drawing fresh
    /// digests when an address has to be retired; transfers and closing
    /// never advance it.
    pub key_index: u64,
    /// This participant's view of the channel.
    pub state: ChannelState,
}

impl Participant {
    /// Wraps a set-up state. `index` must be one of the channel's ordinals.
    pub fn new(index: usize, seed: Seed, key_index: u64, state: ChannelState) -> Result<Self> {
        if index >= state.signers_count {
            return Err(FlashError::UnknownParticipant {
                index,
                signers: state.signers_count,
            });
        }
        Ok(Self {
            index,
            seed,
            key_index,
            state,
        })
    }

    /// The participant's secret seed.
    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    /// Builds bundles for `request` with this participant as sender.
    pub fn create_transaction(&self, request: &TransactionRequest) -> Result<Vec<Bundle>> {
        create_transaction(&self.state, self.index, request)
    }

    /// Produces this participant's partial signatures over `bundles`.
    pub fn sign<S: FragmentSigner>(
        &self,
        scheme: &S,
        bundles: &[Bundle],
    ) -> Result<Vec<BundleSignature>> {
        sign_transaction(&self.state, &self.seed, scheme, bundles)
    }

    /// Applies a fully signed bundle set. On error the state is unchanged.
    pub fn apply<S: FragmentSigner>(&mut self, scheme: &S, bundles: &[Bundle]) -> Result<()> {
        self.state = apply_transfers(&self.state, scheme, bundles)?;
        Ok(())
    }
}

impl fmt::Debug for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participant")
            .field("index", &self.index)
            .field("key_index", &self.key_index)
            .field("balance", &self.state.balance)
            .field("closed", &self.state.closed)
            .finish_non_exhaustive()
    }
}
