//! Shared data model: subwallets, transaction inputs, history entries,
//! synchronization status, and prepared transactions.
//!
//! Keys and key images are carried as raw 32-byte arrays rather than the
//! curve types used internally by `ember-crypto`, so this crate (which
//! `ember-rpc`, `ember-tx`, and `ember-wallet` all depend on) has no need to
//! depend on the curve arithmetic crate itself.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// A compressed Ed25519 point or Ed25519/Curve25519 scalar, serialized as
/// 32 raw bytes (hex-encoded at the JSON boundary).
pub type KeyBytes = [u8; 32];

/// Height at and above which `unlock_time` is interpreted as a unix
/// timestamp rather than a block height.
pub const MAX_BLOCK_NUMBER: u64 = crate::constants::MAX_BLOCK_NUMBER;

/// Blocks of slack granted once `unlock_time` (as a height) has passed,
/// before the output is considered unlocked.
pub const HEIGHT_DELTA: u64 = crate::constants::LOCKED_TX_ALLOWED_DELTA_BLOCKS;

/// Seconds of slack granted once `unlock_time` (as a timestamp) has passed.
pub const TIMESTAMP_DELTA: u64 = crate::constants::DIFFICULTY_TARGET;

/// Grace period, in seconds, an outgoing transaction may sit reported as
/// `unknown` by the node before the wallet treats it as cancelled.
pub const CANCELLED_GRACE_SECONDS: u64 = 60;

/// Whether an output with the given `unlock_time` is spendable at
/// `current_height`, given the current wall-clock time.
pub fn is_unlocked(unlock_time: u64, current_height: u64, now: u64) -> bool {
    if unlock_time == 0 {
        true
    } else if unlock_time >= MAX_BLOCK_NUMBER {
        now + TIMESTAMP_DELTA >= unlock_time
    } else {
        current_height + HEIGHT_DELTA >= unlock_time
    }
}

/// An on-chain output owned (or potentially owned) by one of our
/// subwallets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub key_image: KeyBytes,
    pub amount: u64,
    pub block_height: u64,
    pub transaction_public_key: KeyBytes,
    pub transaction_index: u32,
    pub global_output_index: u64,
    pub key: KeyBytes,
    pub unlock_time: u64,
    pub parent_transaction_hash: KeyBytes,
    /// Derived one-time private key. Absent (all-zero) for view-only
    /// subwallets, which identify this input by `key` instead.
    pub private_ephemeral: Option<KeyBytes>,
    /// Zero while unspent; set to the spending block's height once spent.
    pub spend_height: u64,
}

impl TransactionInput {
    pub fn is_spent(&self) -> bool {
        self.spend_height > 0
    }
}

/// Per-subwallet input ledger: four disjoint sets of `TransactionInput`,
/// partitioned by `key_image`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subwallet {
    pub public_spend_key: KeyBytes,
    /// Zero for view-only subwallets.
    pub private_spend_key: KeyBytes,
    pub address: String,
    pub is_primary: bool,
    pub sync_start_height: u64,
    pub sync_start_timestamp: u64,
    pub wallet_index: u64,

    pub unconfirmed_incoming: Vec<TransactionInput>,
    pub unspent: Vec<TransactionInput>,
    pub locked: Vec<TransactionInput>,
    pub spent: Vec<TransactionInput>,
}

impl Subwallet {
    pub fn new(
        public_spend_key: KeyBytes,
        private_spend_key: KeyBytes,
        address: String,
        is_primary: bool,
        wallet_index: u64,
    ) -> Self {
        Self {
            public_spend_key,
            private_spend_key,
            address,
            is_primary,
            sync_start_height: 0,
            sync_start_timestamp: 0,
            wallet_index,
            unconfirmed_incoming: Vec::new(),
            unspent: Vec::new(),
            locked: Vec::new(),
            spent: Vec::new(),
        }
    }

    pub fn is_view_only(&self) -> bool {
        self.private_spend_key == [0u8; 32]
    }

    fn contains_key_image(&self, key_image: &KeyBytes) -> bool {
        self.unspent.iter().any(|i| &i.key_image == key_image)
            || self.locked.iter().any(|i| &i.key_image == key_image)
            || self.spent.iter().any(|i| &i.key_image == key_image)
    }

    /// Append to `unconfirmed_incoming`.
    pub fn store_unconfirmed_incoming(&mut self, input: TransactionInput) {
        self.unconfirmed_incoming.push(input);
    }

    /// Promote a previously-unconfirmed or freshly-scanned output into
    /// `unspent`, deduplicating by `key_image`.
    pub fn store_transaction_input(&mut self, input: TransactionInput) {
        if let Some(pos) = self
            .unconfirmed_incoming
            .iter()
            .position(|i| i.key == input.key)
        {
            self.unconfirmed_incoming.remove(pos);
        }

        if self.contains_key_image(&input.key_image) {
            log::debug!(
                "dropping duplicate transaction input with key_image {}",
                hex::encode(input.key_image)
            );
            return;
        }

        self.unspent.push(input);
    }

    /// Move an input from `unspent` or `locked` into `spent`.
    pub fn mark_input_as_spent(&mut self, key_image: &KeyBytes, spend_height: u64) {
        if let Some(pos) = self.unspent.iter().position(|i| &i.key_image == key_image) {
            let mut input = self.unspent.remove(pos);
            input.spend_height = spend_height;
            self.spent.push(input);
            return;
        }
        if let Some(pos) = self.locked.iter().position(|i| &i.key_image == key_image) {
            let mut input = self.locked.remove(pos);
            input.spend_height = spend_height;
            self.spent.push(input);
            return;
        }
        log::debug!(
            "mark_input_as_spent: key_image {} not found in unspent or locked",
            hex::encode(key_image)
        );
    }

    /// Move an input from `unspent` to `locked`, reserving it against
    /// double-spend while a send is in flight.
    pub fn mark_input_as_locked(&mut self, key_image: &KeyBytes) {
        if let Some(pos) = self.unspent.iter().position(|i| &i.key_image == key_image) {
            let input = self.unspent.remove(pos);
            self.locked.push(input);
        }
    }

    /// Roll back every input at or above `fork_height`. Returns the
    /// key images of inputs that were removed outright.
    pub fn remove_forked_inputs(&mut self, fork_height: u64) -> Vec<KeyBytes> {
        let mut removed = Vec::new();

        for set in [&mut self.unspent, &mut self.locked, &mut self.spent] {
            let mut i = 0;
            while i < set.len() {
                if set[i].block_height >= fork_height {
                    removed.push(set.remove(i).key_image);
                } else {
                    i += 1;
                }
            }
        }

        let mut i = 0;
        while i < self.spent.len() {
            if self.spent[i].spend_height >= fork_height {
                let mut input = self.spent.remove(i);
                input.spend_height = 0;
                self.unspent.push(input);
            } else {
                i += 1;
            }
        }

        self.unconfirmed_incoming.clear();
        removed
    }

    /// Move locked inputs whose parent transaction was cancelled back to
    /// `unspent`, and drop their unconfirmed-incoming records.
    pub fn remove_cancelled_transactions(&mut self, hashes: &HashSet<KeyBytes>) {
        let mut i = 0;
        while i < self.locked.len() {
            if hashes.contains(&self.locked[i].parent_transaction_hash) {
                let mut input = self.locked.remove(i);
                input.spend_height = 0;
                self.unspent.push(input);
            } else {
                i += 1;
            }
        }

        self.unconfirmed_incoming
            .retain(|i| !hashes.contains(&i.parent_transaction_hash));
    }

    /// `(unlocked, locked)` balance at `current_height`/`now`.
    pub fn balance(&self, current_height: u64, now: u64) -> (u64, u64) {
        let mut unlocked = 0u64;
        let mut locked = 0u64;

        for input in &self.unspent {
            if is_unlocked(input.unlock_time, current_height, now) {
                unlocked += input.amount;
            } else {
                locked += input.amount;
            }
        }
        for input in &self.locked {
            locked += input.amount;
        }
        for input in &self.unconfirmed_incoming {
            locked += input.amount;
        }

        (unlocked, locked)
    }

    /// Spendable (unlocked, unspent) inputs as of `current_height`/`now`.
    pub fn get_spendable_inputs(&self, current_height: u64, now: u64) -> Vec<&TransactionInput> {
        self.unspent
            .iter()
            .filter(|i| is_unlocked(i.unlock_time, current_height, now))
            .collect()
    }
}

/// A transaction history entry: `transfers` maps a subwallet's public
/// spend key to its net credit (positive) or debit (negative).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: KeyBytes,
    pub payment_id: Option<KeyBytes>,
    pub transfers: HashMap<KeyBytes, i64>,
    pub fee: u64,
    pub block_height: u64,
    pub timestamp: u64,
    pub unlock_time: u64,
    pub is_coinbase: bool,
}

impl Transaction {
    pub fn is_unconfirmed(&self) -> bool {
        self.block_height == 0
    }
}

/// The sync coordinator's fork-detection memory.
///
/// Hashes are kept paired with their height internally so that a rollback
/// can drop exactly the entries at or past the fork point; `hashes()` and
/// `checkpoint_hashes()` expose the bare hash lists (newest first) that C2
/// wants on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynchronizationStatus {
    recent_block_hashes: VecDeque<(u64, KeyBytes)>,
    block_hash_checkpoints: VecDeque<(u64, KeyBytes)>,
    pub last_known_block_height: u64,
}

impl SynchronizationStatus {
    pub const RECENT_BLOCK_HASHES_LIMIT: usize = 100;
    pub const CHECKPOINT_INTERVAL: u64 = 5000;

    pub fn new() -> Self {
        Self {
            recent_block_hashes: VecDeque::new(),
            block_hash_checkpoints: VecDeque::new(),
            last_known_block_height: 0,
        }
    }

    /// Recent block hashes, newest first.
    pub fn hashes(&self) -> Vec<KeyBytes> {
        self.recent_block_hashes.iter().map(|(_, h)| *h).collect()
    }

    /// Checkpoint hashes, newest first.
    pub fn checkpoint_hashes(&self) -> Vec<KeyBytes> {
        self.block_hash_checkpoints.iter().map(|(_, h)| *h).collect()
    }

    pub fn record_commit(&mut self, hash: KeyBytes, height: u64) {
        self.recent_block_hashes.push_front((height, hash));
        self.recent_block_hashes
            .truncate(Self::RECENT_BLOCK_HASHES_LIMIT);

        if height % Self::CHECKPOINT_INTERVAL == 0 {
            self.block_hash_checkpoints.push_front((height, hash));
        }

        self.last_known_block_height = height;
    }

    /// Drop every recorded hash at or past `fork_height` and rewind
    /// `last_known_block_height` to just before it.
    pub fn rollback_to(&mut self, fork_height: u64) {
        self.recent_block_hashes
            .retain(|(height, _)| *height < fork_height);
        self.block_hash_checkpoints
            .retain(|(height, _)| *height < fork_height);
        self.last_known_block_height = fork_height.saturating_sub(1);
    }
}

impl Default for SynchronizationStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully-built transaction, held in memory until sent or discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedTransaction {
    pub transaction_hash: KeyBytes,
    pub raw_transaction_bytes: Vec<u8>,
    pub fee: u64,
    pub change_required: u64,
    pub inputs_used: Vec<KeyBytes>,
    pub destinations: Vec<(String, u64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(key_image: u8, amount: u64, block_height: u64, unlock_time: u64) -> TransactionInput {
        TransactionInput {
            key_image: [key_image; 32],
            amount,
            block_height,
            transaction_public_key: [0u8; 32],
            transaction_index: 0,
            global_output_index: 0,
            key: [key_image; 32],
            unlock_time,
            parent_transaction_hash: [0u8; 32],
            private_ephemeral: Some([1u8; 32]),
            spend_height: 0,
        }
    }

    #[test]
    fn is_unlocked_zero_means_unlocked() {
        assert!(is_unlocked(0, 100, 1000));
    }

    #[test]
    fn is_unlocked_height_based() {
        assert!(!is_unlocked(200, 100, 1000));
        assert!(is_unlocked(100, 100, 1000));
        assert!(is_unlocked(100, 99, 1000)); // 99 + HEIGHT_DELTA(1) >= 100
    }

    #[test]
    fn is_unlocked_timestamp_based() {
        let ts = MAX_BLOCK_NUMBER + 500;
        assert!(!is_unlocked(ts, 100, ts - 1000));
        assert!(is_unlocked(ts, 100, ts));
    }

    #[test]
    fn store_transaction_input_dedupes_by_key_image() {
        let mut wallet = Subwallet::new([0u8; 32], [1u8; 32], "addr".into(), true, 0);
        wallet.store_transaction_input(input(5, 100, 10, 0));
        wallet.store_transaction_input(input(5, 100, 10, 0));
        assert_eq!(wallet.unspent.len(), 1);
    }

    #[test]
    fn store_transaction_input_clears_unconfirmed_incoming_by_key() {
        let mut wallet = Subwallet::new([0u8; 32], [1u8; 32], "addr".into(), true, 0);
        wallet.store_unconfirmed_incoming(input(5, 100, 0, 0));
        assert_eq!(wallet.unconfirmed_incoming.len(), 1);
        wallet.store_transaction_input(input(5, 100, 10, 0));
        assert!(wallet.unconfirmed_incoming.is_empty());
        assert_eq!(wallet.unspent.len(), 1);
    }

    #[test]
    fn mark_input_as_spent_moves_set() {
        let mut wallet = Subwallet::new([0u8; 32], [1u8; 32], "addr".into(), true, 0);
        wallet.store_transaction_input(input(5, 100, 10, 0));
        wallet.mark_input_as_spent(&[5u8; 32], 20);
        assert!(wallet.unspent.is_empty());
        assert_eq!(wallet.spent.len(), 1);
        assert_eq!(wallet.spent[0].spend_height, 20);
    }

    #[test]
    fn remove_forked_inputs_rolls_back_new_and_unspends_recently_spent() {
        let mut wallet = Subwallet::new([0u8; 32], [1u8; 32], "addr".into(), true, 0);
        wallet.store_transaction_input(input(1, 100, 10, 0));
        wallet.store_transaction_input(input(2, 100, 50, 0));
        wallet.mark_input_as_spent(&[1u8; 32], 60);

        let removed = wallet.remove_forked_inputs(55);

        assert_eq!(removed, vec![[2u8; 32]]);
        assert!(wallet.spent.is_empty());
        assert_eq!(wallet.unspent.len(), 1);
        assert_eq!(wallet.unspent[0].key_image, [1u8; 32]);
        assert_eq!(wallet.unspent[0].spend_height, 0);
    }

    #[test]
    fn balance_splits_locked_and_unlocked() {
        let mut wallet = Subwallet::new([0u8; 32], [1u8; 32], "addr".into(), true, 0);
        wallet.store_transaction_input(input(1, 100, 10, 0));
        wallet.store_transaction_input(input(2, 50, 10, MAX_BLOCK_NUMBER + 10_000));
        let (unlocked, locked) = wallet.balance(100, 0);
        assert_eq!(unlocked, 100);
        assert_eq!(locked, 50);
    }

    #[test]
    fn sync_status_checkpoints_on_interval() {
        let mut status = SynchronizationStatus::new();
        status.record_commit([1u8; 32], SynchronizationStatus::CHECKPOINT_INTERVAL);
        assert_eq!(status.checkpoint_hashes().len(), 1);
        status.record_commit([2u8; 32], SynchronizationStatus::CHECKPOINT_INTERVAL + 1);
        assert_eq!(status.checkpoint_hashes().len(), 1);
    }

    #[test]
    fn sync_status_rollback_drops_forked_entries() {
        let mut status = SynchronizationStatus::new();
        status.record_commit([1u8; 32], 10);
        status.record_commit([2u8; 32], 20);
        status.record_commit([3u8; 32], 30);

        status.rollback_to(20);

        assert_eq!(status.hashes(), vec![[1u8; 32]]);
        assert_eq!(status.last_known_block_height, 19);
    }
}
