//! End-to-end integration tests for Flash channels.
//!
//! These tests drive the public API the way participants would: open a
//! channel from a shared config, build bundles from one participant's state,
//! collect everyone's partial signatures, merge them, and apply the result to
//! every participant's own state.
//!
//! Each test opens its own channel. No shared state, no ordering
//! dependencies.

use flash_channel::channel::{apply_transfers, open_channel, Participant};
use flash_channel::config::ChannelConfig;
use flash_channel::crypto::{DigestSource, Ed25519Ots};
use flash_channel::multisig::{compose_address, Security, Seed};
use flash_channel::transaction::{
    applied_signatures, create_close, create_transaction, create_transfer, Bundle,
    TransactionRequest, Transfer,
};
use flash_channel::FlashError;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const ALICE_SETTLEMENT: &str = "SETTLE-ALICE";
const BOB_SETTLEMENT: &str = "SETTLE-BOB";
const CAROL_SETTLEMENT: &str = "SETTLE-CAROL";

fn open(phrases: &[&str], deposit: Vec<u64>, settlement: &[&str]) -> Vec<Participant> {
    let config = ChannelConfig::new(
        2,
        phrases.len(),
        4,
        deposit,
        settlement.iter().map(|s| s.to_string()).collect(),
    )
    .expect("valid config");
    let seeds = phrases.iter().map(|p| Seed::from_phrase(p)).collect();
    open_channel(&Ed25519Ots, &config, seeds).expect("channel opens")
}

/// The scenario channel: two participants, 1000 each, security 2, depth 4.
fn two_party() -> Vec<Participant> {
    open(
        &["alice", "bob"],
        vec![1000, 1000],
        &[ALICE_SETTLEMENT, BOB_SETTLEMENT],
    )
}

/// Collects every participant's fragments, in the given order.
fn sign_all(parties: &[&Participant], bundles: &[Bundle]) -> Vec<Bundle> {
    parties.iter().fold(bundles.to_vec(), |merged, p| {
        let sigs = p.sign(&Ed25519Ots, bundles).expect("sign");
        applied_signatures(&merged, &sigs).expect("merge")
    })
}

/// Builds from `sender`, signs by all, applies to all.
fn round(parties: &mut [Participant], sender: usize, request: TransactionRequest) -> Vec<Bundle> {
    let bundles = parties[sender].create_transaction(&request).expect("build");
    let refs: Vec<&Participant> = parties.iter().collect();
    let signed = sign_all(&refs, &bundles);
    for p in parties.iter_mut() {
        p.apply(&Ed25519Ots, &signed).expect("apply");
    }
    signed
}

fn close_request(parties: &[Participant]) -> TransactionRequest {
    TransactionRequest::Close(parties[0].state.settlement_addresses.clone())
}

// ---------------------------------------------------------------------------
// 1. Transfer Then Close
// ---------------------------------------------------------------------------

#[test]
fn transfer_then_close() {
    let mut parties = two_party();

    round(
        &mut parties,
        0,
        TransactionRequest::Transfer(vec![Transfer::new(200, BOB_SETTLEMENT)]),
    );
    for p in &parties {
        assert_eq!(p.state.deposit, vec![800, 1200]);
        assert_eq!(p.state.balance, 2000);
    }

    let close = parties[0].create_transaction(&close_request(&parties)).unwrap();
    assert_eq!(close.len(), 1);
    let bundle = &close[0];
    assert_eq!(bundle.transactions_for(ALICE_SETTLEMENT).next().unwrap().value, 800);
    assert_eq!(bundle.transactions_for(BOB_SETTLEMENT).next().unwrap().value, 1200);

    let root = &parties[0].state.root().address;
    let root_values: Vec<i64> = bundle.transactions_for(root).map(|tx| tx.value).collect();
    assert_eq!(root_values.len(), 4);
    assert_eq!(root_values.iter().filter(|v| **v == -2000).count(), 1);
    assert_eq!(root_values.iter().filter(|v| **v == 0).count(), 3);

    let signed = sign_all(&parties.iter().collect::<Vec<_>>(), &close);
    for p in parties.iter_mut() {
        p.apply(&Ed25519Ots, &signed).unwrap();
        assert!(p.state.closed);
        assert_eq!(p.state.balance, 0);
    }
    assert_eq!(
        parties[0].create_transaction(&close_request(&parties)).unwrap_err(),
        FlashError::ChannelClosed
    );
}

// ---------------------------------------------------------------------------
// 2. Setup Agreement
// ---------------------------------------------------------------------------

#[test]
fn participants_agree_on_the_tree() {
    let parties = two_party();
    let (a, b) = (&parties[0].state, &parties[1].state);
    assert_eq!(a.root().address, b.root().address);
    assert_eq!(a.remainder_address().address, b.remainder_address().address);
    assert_eq!(a.tree.depth(), 4);
    assert_ne!(a.root().signing_index, b.root().signing_index);
}

#[test]
fn address_composition_is_deterministic() {
    let security = Security::new(2).unwrap();
    let digests = vec![
        Ed25519Ots.digest(&Seed::from_phrase("x"), 7, security),
        Ed25519Ots.digest(&Seed::from_phrase("y"), 7, security),
    ];
    let first = compose_address(&digests, 1, 2).unwrap();
    let second = compose_address(&digests, 1, 2).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.security_sum, 4);
    assert_eq!(first.signing_index, 2);
}

// ---------------------------------------------------------------------------
// 3. Bundle Invariants
// ---------------------------------------------------------------------------

#[test]
fn every_built_bundle_is_zero_sum() {
    let parties = two_party();
    let state = &parties[0].state;
    let transfer = create_transfer(
        state,
        1,
        &[Transfer::new(10, ALICE_SETTLEMENT), Transfer::new(90, "MERCHANT")],
    )
    .unwrap();
    let close = create_close(state, &state.settlement_addresses).unwrap();
    assert!(transfer.iter().chain(&close).all(Bundle::is_balanced));
}

#[test]
fn merge_order_does_not_matter() {
    let parties = two_party();
    let bundles = create_transaction(
        &parties[0].state,
        0,
        &TransactionRequest::Transfer(vec![Transfer::new(1, BOB_SETTLEMENT)]),
    )
    .unwrap();
    let ab = sign_all(&[&parties[0], &parties[1]], &bundles);
    let ba = sign_all(&[&parties[1], &parties[0]], &bundles);
    assert_eq!(ab, ba);
}

// ---------------------------------------------------------------------------
// 4. Failure Modes
// ---------------------------------------------------------------------------

#[test]
fn half_signed_set_leaves_state_unchanged() {
    let mut parties = two_party();
    let bundles = parties[0]
        .create_transaction(&TransactionRequest::Transfer(vec![Transfer::new(
            200,
            BOB_SETTLEMENT,
        )]))
        .unwrap();
    let half = sign_all(&[&parties[0]], &bundles);
    let before = parties[1].state.clone();

    assert!(matches!(
        parties[1].apply(&Ed25519Ots, &half),
        Err(FlashError::IncompleteSignatures { .. })
    ));
    assert_eq!(parties[1].state, before);
}

#[test]
fn overspending_produces_no_bundle() {
    let parties = two_party();
    let result = parties[0].create_transaction(&TransactionRequest::Transfer(vec![
        Transfer::new(1001, BOB_SETTLEMENT),
    ]));
    assert_eq!(
        result.unwrap_err(),
        FlashError::InsufficientBalance {
            available: 1000,
            requested: 1001
        }
    );
}

#[test]
fn bundles_from_another_channel_are_rejected() {
    let parties = two_party();
    let others = open(
        &["mallory", "trent"],
        vec![1000, 1000],
        &[ALICE_SETTLEMENT, BOB_SETTLEMENT],
    );
    let foreign = others[0]
        .create_transaction(&TransactionRequest::Transfer(vec![Transfer::new(
            5,
            BOB_SETTLEMENT,
        )]))
        .unwrap();
    let signed = sign_all(&others.iter().collect::<Vec<_>>(), &foreign);

    assert!(matches!(
        apply_transfers(&parties[0].state, &Ed25519Ots, &signed),
        Err(FlashError::AddressMismatch(_))
    ));
    assert!(matches!(
        parties[0].sign(&Ed25519Ots, &foreign),
        Err(FlashError::UnauthorizedSigner { .. })
    ));
}

// ---------------------------------------------------------------------------
// 5. External Payments
// ---------------------------------------------------------------------------

#[test]
fn external_outputs_accumulate_and_settle() {
    let mut parties = two_party();
    round(
        &mut parties,
        0,
        TransactionRequest::Transfer(vec![Transfer::new(100, "MERCHANT")]),
    );
    round(
        &mut parties,
        1,
        TransactionRequest::Transfer(vec![Transfer::new(50, "MERCHANT")]),
    );

    let state = &parties[1].state;
    assert_eq!(state.deposit, vec![900, 950]);
    assert_eq!(state.balance, 1850);
    assert_eq!(state.outputs.get("MERCHANT"), Some(&150));
    assert_eq!(state.custody().unwrap(), 2000);

    let close = close_request(&parties);
    let signed = round(&mut parties, 1, close);
    let bundle = &signed[0];
    assert_eq!(bundle.transactions_for("MERCHANT").next().unwrap().value, 150);
    assert_eq!(bundle.transactions_for(ALICE_SETTLEMENT).next().unwrap().value, 900);
    assert_eq!(bundle.transactions_for(BOB_SETTLEMENT).next().unwrap().value, 950);
    assert!(parties.iter().all(|p| p.state.closed));
}

// ---------------------------------------------------------------------------
// 6. Three Participants
// ---------------------------------------------------------------------------

#[test]
fn three_party_channel() {
    let mut parties = open(
        &["alice", "bob", "carol"],
        vec![500, 300, 200],
        &[ALICE_SETTLEMENT, BOB_SETTLEMENT, CAROL_SETTLEMENT],
    );
    assert_eq!(parties[2].state.root().security_sum, 6);
    assert_eq!(parties[2].state.root().signing_index, 4);

    round(
        &mut parties,
        2,
        TransactionRequest::Transfer(vec![
            Transfer::new(50, ALICE_SETTLEMENT),
            Transfer::new(50, BOB_SETTLEMENT),
        ]),
    );
    assert!(parties.iter().all(|p| p.state.deposit == vec![550, 350, 100]));

    let close = close_request(&parties);
    let signed = round(&mut parties, 0, close);
    let root = &parties[0].state.root().address;
    assert_eq!(signed[0].transactions_for(root).count(), 6);
    assert_eq!(
        signed[0].transactions_for(CAROL_SETTLEMENT).next().unwrap().value,
        100
    );
}
