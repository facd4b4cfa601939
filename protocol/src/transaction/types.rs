//! Core value types for Flash bundles.
//!
//! These mirror the ledger's fixed schema: a [`Transaction`] is an
//! `(address, value)` pair, a [`Bundle`] is an ordered list of them that must
//! sum to zero. Input transactions additionally carry one signature fragment
//! each once signed.

use serde::{Deserialize, Serialize};

use crate::crypto::hash::double_sha256;
use crate::crypto::{BundleHash, SignatureFragment};
use crate::error::{FlashError, Result};

// ---------------------------------------------------------------------------
// Transfer requests
// ---------------------------------------------------------------------------

/// A request to pay `value` to `address`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Amount in the ledger's smallest unit.
    pub value: u64,
    /// Destination address.
    pub address: String,
}

impl Transfer {
    /// Creates a transfer request.
    pub fn new(value: u64, address: impl Into<String>) -> Self {
        Self {
            value,
            address: address.into(),
        }
    }
}

/// What the transaction builder is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionRequest {
    /// Pay the listed transfers out of the sender's deposit.
    Transfer(Vec<Transfer>),
    /// Liquidate the channel to these settlement addresses.
    Close(Vec<String>),
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// One entry of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Ledger address credited (positive value) or debited (negative value).
    pub address: String,
    /// Signed amount.
    pub value: i64,
    /// Fragment filling this input slot. Always `None` on outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureFragment>,
}

impl Transaction {
    /// Unsigned transaction.
    pub fn new(address: impl Into<String>, value: i64) -> Self {
        Self {
            address: address.into(),
            value,
            signature: None,
        }
    }

    /// Whether a fragment has been placed on this transaction.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

/// Converts a channel amount to a bundle value.
pub(crate) fn to_value(amount: u64) -> Result<i64> {
    i64::try_from(amount).map_err(|_| FlashError::BalanceOverflow)
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// A run of transactions that spends one address: the first slot carries the
/// debit, the rest are zero-value slots for the remaining fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputGroup<'a> {
    /// The spent address.
    pub address: &'a str,
    /// Position of the first slot in the bundle.
    pub start: usize,
    /// Number of slots.
    pub len: usize,
}

/// An ordered, zero-sum set of transactions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bundle {
    /// Transactions in bundle order.
    pub transactions: Vec<Transaction>,
}

impl Bundle {
    /// Wraps a transaction list.
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    /// Canonical bytes covered by the bundle hash.
    ///
    /// Count, then per transaction: address, `0x00`, value as i64 LE.
    /// Signatures are excluded so that the hash is stable while fragments are
    /// merged in.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8 + self.transactions.len() * 80);
        buf.extend_from_slice(&(self.transactions.len() as u64).to_le_bytes());
        for tx in &self.transactions {
            buf.extend_from_slice(tx.address.as_bytes());
            buf.push(0x00);
            buf.extend_from_slice(&tx.value.to_le_bytes());
        }
        buf
    }

    /// `double_sha256(signable_bytes)`.
    pub fn hash(&self) -> BundleHash {
        double_sha256(&self.signable_bytes())
    }

    /// Hex form of [`Bundle::hash`].
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }

    /// Sum of all values, widened so it cannot overflow.
    pub fn sum(&self) -> i128 {
        self.transactions.iter().map(|tx| tx.value as i128).sum()
    }

    /// Whether the bundle is zero-sum.
    pub fn is_balanced(&self) -> bool {
        self.sum() == 0
    }

    /// Number of transactions.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Whether the bundle has no transactions.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Transactions referencing `address`.
    pub fn transactions_for<'a>(
        &'a self,
        address: &'a str,
    ) -> impl Iterator<Item = &'a Transaction> + 'a {
        self.transactions
            .iter()
            .filter(move |tx| tx.address == address)
    }

    /// Input groups: each starts at a debit and extends over the following
    /// zero-value transactions on the same address.
    pub fn input_groups(&self) -> Vec<InputGroup<'_>> {
        let mut groups = Vec::new();
        let mut i = 0;
        while i < self.transactions.len() {
            let tx = &self.transactions[i];
            if tx.value < 0 {
                let mut len = 1;
                while let Some(next) = self.transactions.get(i + len) {
                    if next.address != tx.address || next.value != 0 {
                        break;
                    }
                    len += 1;
                }
                groups.push(InputGroup {
                    address: &tx.address,
                    start: i,
                    len,
                });
                i += len;
            } else {
                i += 1;
            }
        }
        groups
    }

    /// Number of input slots that still lack a fragment.
    pub fn unsigned_slots(&self) -> usize {
        self.input_groups()
            .iter()
            .flat_map(|g| &self.transactions[g.start..g.start + g.len])
            .filter(|tx| !tx.is_signed())
            .count()
    }
}
