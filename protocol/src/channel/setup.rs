//! Channel opening.
//!
//! Setup runs in three steps, identical on every participant:
//!
//! 1. each participant derives `depth + 1` digests from its seed, starting at
//!    key index 0, and publishes them;
//! 2. for every position, the participants' digests are composed into one
//!    multisig address;
//! 3. the composed addresses are arranged into the channel tree (remainder
//!    first, then root, then the chain).
//!
//! [`open_channel`] simulates all participants in one process.

use tracing::{debug, info};

use super::participant::Participant;
use super::state::ChannelState;
use crate::config::ChannelConfig;
use crate::crypto::DigestSource;
use crate::error::{FlashError, Result};
use crate::multisig::{build_tree, compose_address, ChannelTree, Digest, Security, Seed};

/// Derives `count` consecutive digests from `seed`, starting at `start`.
pub fn generate_digests<S: DigestSource>(
    scheme: &S,
    seed: &Seed,
    start: u64,
    count: usize,
    security: Security,
) -> Vec<Digest> {
    (0..count as u64)
        .map(|offset| scheme.digest(seed, start + offset, security))
        .collect()
}

/// Composes every participant's published digests into `signer`'s tree.
///
/// `all_digests[i]` holds participant *i*'s digests in setup order; every
/// participant must have published the same number.
pub fn compose_tree(all_digests: &[Vec<Digest>], signer: usize) -> Result<ChannelTree> {
    let positions = all_digests.first().map(Vec::len).unwrap_or(0);
    if let Some((i, stray)) = all_digests
        .iter()
        .enumerate()
        .find(|(_, digests)| digests.len() != positions)
    {
        return Err(FlashError::MalformedDigestSet(format!(
            "participant {} published {} digests, expected {}",
            i,
            stray.len(),
            positions
        )));
    }

    let addresses = (0..positions)
        .map(|position| {
            let column: Vec<Digest> = all_digests
                .iter()
                .map(|digests| digests[position].clone())
                .collect();
            compose_address(&column, signer, all_digests.len())
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(signer, addresses = addresses.len(), "channel tree composed");
    build_tree(addresses)
}

/// Opens a channel for every participant at once.
///
/// `seeds[i]` is participant *i*'s seed. Each returned participant holds its
/// own state; the trees agree on every address string.
pub fn open_channel<S: DigestSource>(
    scheme: &S,
    config: &ChannelConfig,
    seeds: Vec<Seed>,
) -> Result<Vec<Participant>> {
    config.validate()?;
    if seeds.len() != config.signers_count {
        return Err(FlashError::InvalidConfig(format!(
            "expected {} seeds, got {}",
            config.signers_count,
            seeds.len()
        )));
    }

    let security = Security::new(config.security)?;
    let count = config.digests_per_participant();
    let published: Vec<Vec<Digest>> = seeds
        .iter()
        .map(|seed| generate_digests(scheme, seed, 0, count, security))
        .collect();

    let mut participants = Vec::with_capacity(seeds.len());
    for (index, seed) in seeds.into_iter().enumerate() {
        let tree = compose_tree(&published, index)?;
        let state = ChannelState::new(config, tree)?;
        participants.push(Participant::new(index, seed, count as u64, state)?);
    }

    info!(
        signers = config.signers_count,
        depth = config.depth,
        security = config.security,
        root = %participants[0].state.root().address,
        "channel opened"
    );
    Ok(participants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Ed25519Ots;

    fn config() -> ChannelConfig {
        ChannelConfig::new(2, 2, 3, vec![10, 20], vec!["ALICE".into(), "BOB".into()]).unwrap()
    }

    fn seeds() -> Vec<Seed> {
        vec![Seed::from_phrase("alice"), Seed::from_phrase("bob")]
    }

    #[test]
    fn digests_are_consecutive() {
        let security = Security::new(2).unwrap();
        let digests = generate_digests(&Ed25519Ots, &Seed::from_phrase("x"), 5, 3, security);
        let indices: Vec<u64> = digests.iter().map(|d| d.index).collect();
        assert_eq!(indices, vec![5, 6, 7]);
    }

    #[test]
    fn every_participant_sees_the_same_addresses() {
        let parties = open_channel(&Ed25519Ots, &config(), seeds()).unwrap();
        let a: Vec<&str> = parties[0].state.tree.iter().map(|n| n.address.as_str()).collect();
        let b: Vec<&str> = parties[1].state.tree.iter().map(|n| n.address.as_str()).collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        assert_eq!(
            parties[0].state.remainder_address().address,
            parties[1].state.remainder_address().address
        );
    }

    #[test]
    fn signing_offsets_follow_ordinals() {
        let parties = open_channel(&Ed25519Ots, &config(), seeds()).unwrap();
        assert_eq!(parties[0].state.root().signing_index, 0);
        assert_eq!(parties[1].state.root().signing_index, 2);
        assert_eq!(parties[1].state.root().security_sum, 4);
    }

    #[test]
    fn key_index_moves_past_setup_digests() {
        let parties = open_channel(&Ed25519Ots, &config(), seeds()).unwrap();
        assert!(parties.iter().all(|p| p.key_index == 4));
        assert_eq!(parties[0].state.root().index, 1);
        assert_eq!(parties[0].state.tree.leaf().index, 3);
    }

    #[test]
    fn setup_is_deterministic() {
        let a = open_channel(&Ed25519Ots, &config(), seeds()).unwrap();
        let b = open_channel(&Ed25519Ots, &config(), seeds()).unwrap();
        assert_eq!(a[0].state, b[0].state);
    }

    #[test]
    fn seed_count_must_match() {
        let err = open_channel(&Ed25519Ots, &config(), vec![Seed::from_phrase("solo")])
            .unwrap_err();
        assert!(matches!(err, FlashError::InvalidConfig(_)));
    }

    #[test]
    fn ragged_digest_sets_are_malformed() {
        let security = Security::new(2).unwrap();
        let published = vec![
            generate_digests(&Ed25519Ots, &Seed::from_phrase("a"), 0, 3, security),
            generate_digests(&Ed25519Ots, &Seed::from_phrase("b"), 0, 2, security),
        ];
        assert!(matches!(
            compose_tree(&published, 0),
            Err(FlashError::MalformedDigestSet(_))
        ));
    }

    #[test]
    fn single_position_is_too_small_for_a_tree() {
        let security = Security::new(1).unwrap();
        let published = vec![
            generate_digests(&Ed25519Ots, &Seed::from_phrase("a"), 0, 1, security),
            generate_digests(&Ed25519Ots, &Seed::from_phrase("b"), 0, 1, security),
        ];
        assert_eq!(
            compose_tree(&published, 0).unwrap_err(),
            FlashError::MalformedTree { got: 1 }
        );
    }
}
