//! # Scenario Runner
//!
//! A scenario is a JSON document describing one channel and the rounds to
//! play on it:
//!
//! ```json
//! {
//!   "channel": { "security": 2, "signers_count": 2, "depth": 4,
//!                "deposit": [1000, 1000],
//!                "settlement_addresses": ["SETTLE-ALICE", "SETTLE-BOB"] },
//!   "seeds": ["alice", "bob"],
//!   "rounds": [ { "sender": 0, "transfers": [ { "value": 200, "address": "SETTLE-BOB" } ] } ],
//!   "close": true
//! }
//! ```
//!
//! Every round is built by its sender, signed by every participant, merged,
//! and applied to every participant's own state, exactly as separate
//! processes would do after exchanging bundles.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use flash_channel::channel::{open_channel, Participant};
use flash_channel::config::ChannelConfig;
use flash_channel::crypto::Ed25519Ots;
use flash_channel::multisig::Seed;
use flash_channel::transaction::{applied_signatures, Bundle, TransactionRequest, Transfer};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A channel plus the rounds to run on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub channel: ChannelConfig,
    /// Seed phrases, one per participant. Derived from the ordinal when
    /// omitted.
    #[serde(default)]
    pub seeds: Vec<String>,
    #[serde(default)]
    pub rounds: Vec<Round>,
    /// Close the channel after the last round.
    #[serde(default)]
    pub close: bool,
}

/// One participant paying one or more transfers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub sender: usize,
    pub transfers: Vec<Transfer>,
}

impl Scenario {
    /// Reads and validates a scenario file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        let scenario: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse scenario {}", path.display()))?;
        scenario
            .channel
            .validate()
            .context("scenario has an invalid channel config")?;
        Ok(scenario)
    }

    /// The two-party channel written by `flash-cli init`.
    pub fn sample() -> Self {
        Self {
            channel: ChannelConfig {
                security: 2,
                signers_count: 2,
                depth: 4,
                deposit: vec![1000, 1000],
                settlement_addresses: vec!["SETTLE-ALICE".to_string(), "SETTLE-BOB".to_string()],
            },
            seeds: vec!["alice".to_string(), "bob".to_string()],
            rounds: vec![Round {
                sender: 0,
                transfers: vec![Transfer::new(200, "SETTLE-BOB")],
            }],
            close: true,
        }
    }

    fn seeds(&self) -> Result<Vec<Seed>> {
        let count = self.channel.signers_count;
        if self.seeds.is_empty() {
            return Ok((0..count)
                .map(|i| Seed::from_phrase(&format!("participant-{}", i)))
                .collect());
        }
        ensure!(
            self.seeds.len() == count,
            "scenario lists {} seeds for {} participants",
            self.seeds.len(),
            count
        );
        Ok(self.seeds.iter().map(|p| Seed::from_phrase(p)).collect())
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Everything a run produced.
#[derive(Debug, Serialize)]
pub struct Report {
    pub root: String,
    pub remainder: String,
    pub rounds: Vec<RoundReport>,
    pub final_state: FinalState,
}

/// The signed bundles of one round.
#[derive(Debug, Serialize)]
pub struct RoundReport {
    /// `None` for the closing round.
    pub sender: Option<usize>,
    pub closing: bool,
    pub bundles: Vec<Bundle>,
}

/// Balances after the last round, as every participant sees them.
#[derive(Debug, Serialize)]
pub struct FinalState {
    pub balance: u64,
    pub deposit: Vec<u64>,
    pub outputs: BTreeMap<String, u64>,
    pub transfers_applied: usize,
    pub closed: bool,
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Opens the channel and plays every round, closing if asked to.
pub fn run(scenario: &Scenario, force_close: bool) -> Result<Report> {
    let mut parties = open_channel(&Ed25519Ots, &scenario.channel, scenario.seeds()?)
        .context("channel setup failed")?;

    let mut rounds = Vec::with_capacity(scenario.rounds.len() + 1);
    for (n, round) in scenario.rounds.iter().enumerate() {
        if round.sender >= parties.len() {
            bail!(
                "round {}: sender {} is not one of {} participants",
                n,
                round.sender,
                parties.len()
            );
        }
        let request = TransactionRequest::Transfer(round.transfers.clone());
        let bundles = play(&mut parties, round.sender, &request)
            .with_context(|| format!("round {} failed", n))?;
        info!(round = n, sender = round.sender, bundles = bundles.len(), "round applied");
        rounds.push(RoundReport {
            sender: Some(round.sender),
            closing: false,
            bundles,
        });
    }

    if scenario.close || force_close {
        let request = TransactionRequest::Close(scenario.channel.settlement_addresses.clone());
        let bundles = play(&mut parties, 0, &request).context("closing failed")?;
        info!(bundles = bundles.len(), "channel closed");
        rounds.push(RoundReport {
            sender: None,
            closing: true,
            bundles,
        });
    }

    let state = &parties[0].state;
    Ok(Report {
        root: state.root().address.clone(),
        remainder: state.remainder_address().address.clone(),
        rounds,
        final_state: FinalState {
            balance: state.balance,
            deposit: state.deposit.clone(),
            outputs: state.outputs.clone(),
            transfers_applied: state.transfers.len(),
            closed: state.closed,
        },
    })
}

/// Build by `sender`, sign by everyone, merge, apply everywhere.
fn play(
    parties: &mut [Participant],
    sender: usize,
    request: &TransactionRequest,
) -> Result<Vec<Bundle>> {
    let bundles = parties[sender].create_transaction(request)?;

    let mut signed = bundles.clone();
    for participant in parties.iter() {
        let signatures = participant.sign(&Ed25519Ots, &bundles)?;
        signed = applied_signatures(&signed, &signatures)?;
    }
    for participant in parties.iter_mut() {
        participant
            .apply(&Ed25519Ots, &signed)
            .with_context(|| format!("participant {} rejected the bundles", participant.index))?;
    }
    Ok(signed)
}
