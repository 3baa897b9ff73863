//! Transaction history (C6): a hash-indexed ledger of transactions
//! affecting this wallet, plus the subset still unconfirmed.
//!
//! An unconfirmed entry has `block_height = 0` and `timestamp` set to the
//! moment it was sent; the sync coordinator (C4) overwrites both fields
//! with the true on-chain values once the transaction's status moves to
//! `in_block`.

use std::collections::{HashMap, HashSet};

use ember_types::model::{KeyBytes, Transaction};

#[derive(Debug, Clone, Default)]
pub struct TransactionHistory {
    transactions: HashMap<KeyBytes, Transaction>,
    unconfirmed: HashSet<KeyBytes>,
}

impl TransactionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<Transaction>) -> Self {
        let mut history = Self::new();
        for entry in entries {
            history.insert(entry);
        }
        history
    }

    pub fn insert(&mut self, tx: Transaction) {
        let hash = tx.hash;
        if tx.is_unconfirmed() {
            self.unconfirmed.insert(hash);
        } else {
            self.unconfirmed.remove(&hash);
        }
        self.transactions.insert(hash, tx);
    }

    pub fn remove(&mut self, hash: &KeyBytes) -> Option<Transaction> {
        self.unconfirmed.remove(hash);
        self.transactions.remove(hash)
    }

    /// Overwrite an unconfirmed entry's height/timestamp once the node
    /// reports it as `in_block`, moving it out of the unconfirmed set.
    pub fn confirm(&mut self, hash: &KeyBytes, block_height: u64, timestamp: u64) {
        if let Some(tx) = self.transactions.get_mut(hash) {
            tx.block_height = block_height;
            tx.timestamp = timestamp;
        }
        self.unconfirmed.remove(hash);
    }

    /// Delete every entry at or above `fork_height`, as part of reorg handling.
    pub fn remove_forked(&mut self, fork_height: u64) {
        let to_remove: Vec<KeyBytes> = self
            .transactions
            .values()
            .filter(|tx| !tx.is_unconfirmed() && tx.block_height >= fork_height)
            .map(|tx| tx.hash)
            .collect();
        for hash in to_remove {
            self.transactions.remove(&hash);
        }
    }

    pub fn by_hash(&self, hash: &KeyBytes) -> Option<&Transaction> {
        self.transactions.get(hash)
    }

    /// Entries with `min_height <= block_height <= max_height`, ordered by
    /// block height ascending, then by hash for a stable tiebreak among
    /// same-block entries (true arrival order within a block is not
    /// retained once entries are stored unordered in a map).
    pub fn range(&self, min_height: u64, max_height: u64) -> Vec<&Transaction> {
        let mut out: Vec<&Transaction> = self
            .transactions
            .values()
            .filter(|tx| tx.block_height >= min_height && tx.block_height <= max_height)
            .collect();
        out.sort_by(|a, b| a.block_height.cmp(&b.block_height).then(a.hash.cmp(&b.hash)));
        out
    }

    pub fn unconfirmed(&self) -> Vec<&Transaction> {
        let mut out: Vec<&Transaction> = self
            .unconfirmed
            .iter()
            .filter_map(|h| self.transactions.get(h))
            .collect();
        out.sort_by_key(|tx| tx.timestamp);
        out
    }

    pub fn all(&self) -> Vec<&Transaction> {
        self.range(0, u64::MAX)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(hash: u8, block_height: u64, timestamp: u64) -> Transaction {
        Transaction {
            hash: [hash; 32],
            payment_id: None,
            transfers: HashMap::new(),
            fee: 0,
            block_height,
            timestamp,
            unlock_time: 0,
            is_coinbase: false,
        }
    }

    #[test]
    fn unconfirmed_entries_tracked_separately() {
        let mut history = TransactionHistory::new();
        history.insert(tx(1, 0, 1000));
        assert_eq!(history.unconfirmed().len(), 1);

        history.confirm(&[1u8; 32], 500, 123_456);
        assert!(history.unconfirmed().is_empty());
        assert_eq!(history.by_hash(&[1u8; 32]).unwrap().block_height, 500);
    }

    #[test]
    fn range_orders_by_height_then_hash() {
        let mut history = TransactionHistory::new();
        history.insert(tx(2, 100, 0));
        history.insert(tx(1, 100, 0));
        history.insert(tx(3, 50, 0));

        let ordered: Vec<KeyBytes> = history.range(0, u64::MAX).into_iter().map(|t| t.hash).collect();
        assert_eq!(ordered, vec![[3u8; 32], [1u8; 32], [2u8; 32]]);
    }

    #[test]
    fn remove_forked_drops_only_at_or_above_fork_height() {
        let mut history = TransactionHistory::new();
        history.insert(tx(1, 100, 0));
        history.insert(tx(2, 200, 0));
        history.remove_forked(150);
        assert!(history.by_hash(&[1u8; 32]).is_some());
        assert!(history.by_hash(&[2u8; 32]).is_none());
    }
}
