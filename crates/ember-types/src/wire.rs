//! Wire shapes for raw blocks and transactions as returned by a node's
//! block-scan endpoint (`get_wallet_sync_data`/`getrawblocks`).
//!
//! These are intentionally minimal: just enough of a block/transaction to
//! drive the outputs scan. Everything else a node might report
//! (difficulty, PoW hash, reward breakdown, …) is out of scope for the
//! wallet core and is not modeled here.

use crate::model::KeyBytes;
use serde::{Deserialize, Serialize};

/// One transaction output as seen on the wire: its amount (cleartext for
/// a CryptoNote-family, non-RingCT chain, as assumed throughout this
/// spec), its one-time public key, and — once known — its position in
/// the global output index for its amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOutput {
    pub amount: u64,
    pub key: KeyBytes,
    #[serde(default)]
    pub global_index: Option<u64>,
}

/// One transaction input as seen on the wire: its key image (for
/// double-spend/ownership detection) and its amount. The amount is the
/// denomination of the referenced output, which — like every other
/// output amount on this cleartext-amount, non-RingCT chain — is public;
/// only which ring member is the real one stays hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSpentInput {
    pub key_image: KeyBytes,
    pub amount: u64,
}

/// A transaction as scanned from a block: enough to run the per-output
/// derivation loop, to detect spends of our own key images, and — since
/// both sides' amounts are public — to derive the fee as
/// `Σ spent_inputs.amount − Σ outputs.amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub hash: KeyBytes,
    pub tx_public_key: KeyBytes,
    #[serde(default)]
    pub payment_id: Option<KeyBytes>,
    #[serde(default)]
    pub unlock_time: u64,
    pub outputs: Vec<RawOutput>,
    /// This transaction's inputs: key image plus amount, in wire order.
    #[serde(default)]
    pub spent_inputs: Vec<RawSpentInput>,
}

/// A full block: the coinbase transaction plus the ordinary transactions
/// it contains, as the block downloader (C3) delivers them to the sync
/// coordinator (C4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBlock {
    pub height: u64,
    pub hash: KeyBytes,
    pub timestamp: u64,
    pub coinbase: RawTransaction,
    pub transactions: Vec<RawTransaction>,
}

impl RawBlock {
    /// Approximate serialized size, for the block downloader's memory
    /// budget — not a byte-exact wire size, just a cheap proxy.
    pub fn approx_size(&self) -> usize {
        let per_tx = |tx: &RawTransaction| 64 + 32 + tx.outputs.len() * 40 + tx.spent_inputs.len() * 40;
        64 + per_tx(&self.coinbase) + self.transactions.iter().map(per_tx).sum::<usize>()
    }
}

/// Newest-tip marker returned instead of block bodies when the node has
/// nothing new to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopBlock {
    pub hash: KeyBytes,
    pub height: u64,
}
