//! Wallet container (C8): the top-level facade. Owns the subwallet set,
//! transaction history, sync status, daemon handle, and prepared-transaction
//! map; composes the downloader (C3), sync coordinator (C4), and transaction
//! composer (C7); delegates save/restore to persistence (C9).
//!
//! Only one send may be in flight at a time (`send_mutex`); scanning may
//! proceed concurrently with a send because every subwallet-ledger mutation
//! goes through the wallet-wide `SyncState` mutexes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use ember_crypto::{
    derive_public_key, derive_secret_key, generate_key_derivation, generate_key_image,
    point_from_bytes, point_to_bytes, random_scalar, scalar_from_canonical_bytes,
    scalar_mul_base, scalar_to_bytes, subwallet_domain, viewkey_domain, Scalar,
};
use ember_rpc::DaemonClient;
use ember_types::address::{create_address_raw, parse_address};
use ember_types::mnemonic::{mnemonic_to_seed, seed_to_mnemonic};
use ember_types::model::{
    KeyBytes, PreparedTransaction, Subwallet, SynchronizationStatus, Transaction, TransactionInput,
};
use ember_tx::builder::FeeMode;
use ember_tx::decoy::RingCandidate;
use ember_tx::{build_transaction, select_fusion_inputs, BuildRequest, Destination};

use crate::downloader::{self, BlockQueue};
use crate::error::WalletError;
use crate::history::TransactionHistory;
use crate::persistence::{self, WalletFile};
use crate::sync::{spawn_locked_transaction_checker, SyncCoordinator, SyncState};

/// Extra decoys requested per amount beyond the mixin count, to survive
/// dedup against the real output and the occasional stale/duplicate entry.
const DECOY_FETCH_SLACK: u64 = 6;

fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// A source subwallet and destination list for an outgoing transaction,
/// plus the knobs `send_advanced` exposes.
pub struct SendAdvancedRequest {
    pub destinations: Vec<(String, u64)>,
    pub mixin: usize,
    pub fee_mode: FeeMode,
    pub payment_id: Option<KeyBytes>,
    pub source_addresses: Option<Vec<String>>,
    pub change_address: Option<String>,
    pub unlock_time: u64,
    pub extra_data: Vec<u8>,
    pub send_all: bool,
    pub send_now: bool,
}

impl Default for SendAdvancedRequest {
    fn default() -> Self {
        Self {
            destinations: Vec::new(),
            mixin: ember_types::constants::DEFAULT_RING_SIZE - 1,
            fee_mode: FeeMode::Fixed(ember_types::constants::MINIMUM_FEE),
            payment_id: None,
            source_addresses: None,
            change_address: None,
            unlock_time: 0,
            extra_data: Vec::new(),
            send_all: false,
            send_now: true,
        }
    }
}

/// Outcome of a completed (non-prepared) send.
pub struct SentTransaction {
    pub hash: KeyBytes,
    pub fee: u64,
}

/// The wallet container. Cloning is not supported — there is exactly one
/// owner: the container holds the canonical subwallet set, and the
/// coordinator/composer are handed borrowed/shared access to it rather
/// than a back-pointer.
pub struct Wallet {
    filename: PathBuf,
    password: String,
    daemon: DaemonClient,
    state: Arc<SyncState>,
    queue: Arc<BlockQueue>,
    private_view_key: Scalar,
    is_view_wallet: bool,
    prepared: Mutex<HashMap<KeyBytes, PreparedTransaction>>,
    send_mutex: tokio::sync::Mutex<()>,
    sync_stop: Arc<(Mutex<bool>, Condvar)>,
    coordinator: Mutex<Option<SyncCoordinator>>,
    locked_checker: Mutex<Option<std::thread::JoinHandle<()>>>,
    downloader_handle: Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl Wallet {
    fn new_internal(
        filename: PathBuf,
        password: String,
        daemon: DaemonClient,
        subwallets: Vec<Subwallet>,
        private_view_key: Scalar,
        is_view_wallet: bool,
        history: TransactionHistory,
        status: SynchronizationStatus,
        prepared: HashMap<KeyBytes, PreparedTransaction>,
    ) -> Self {
        Self {
            filename,
            password,
            daemon,
            state: Arc::new(SyncState {
                subwallets: Mutex::new(subwallets),
                history: Mutex::new(history),
                status: Arc::new(Mutex::new(status)),
            }),
            queue: BlockQueue::new(),
            private_view_key,
            is_view_wallet,
            prepared: Mutex::new(prepared),
            send_mutex: tokio::sync::Mutex::new(()),
            sync_stop: Arc::new((Mutex::new(false), Condvar::new())),
            coordinator: Mutex::new(None),
            locked_checker: Mutex::new(None),
            downloader_handle: Mutex::new(None),
        }
    }

    /// Deterministic view key derived from the primary spend secret: the
    /// primary wallet's two keys both trace back to one seed, the same way
    /// a 25-word mnemonic only ever needs to encode the spend secret.
    fn deterministic_view_key(primary_spend_secret: &Scalar) -> Scalar {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&scalar_to_bytes(&viewkey_domain()));
        buf.extend_from_slice(&scalar_to_bytes(primary_spend_secret));
        ember_crypto::hash_to_scalar(&buf)
    }

    /// Generate a brand-new wallet with deterministic primary keys,
    /// persist it, and return it.
    pub fn create_new(filename: PathBuf, password: String, daemon: DaemonClient) -> Result<Self, WalletError> {
        let spend_secret = random_scalar();
        Self::from_spend_secret(filename, password, daemon, spend_secret, 0, 0)
    }

    /// Restore from a 25-word mnemonic (checksum word is CRC-32 over
    /// the first 24 words' indices, per `ember_types::mnemonic`).
    pub fn import_from_seed(
        filename: PathBuf,
        password: String,
        daemon: DaemonClient,
        mnemonic: &str,
        scan_height: u64,
    ) -> Result<Self, WalletError> {
        let seed = mnemonic_to_seed(mnemonic)?;
        let spend_secret = scalar_from_canonical_bytes(&seed)
            .ok_or_else(|| WalletError::Other("mnemonic decoded to a non-canonical scalar".into()))?;
        Self::from_spend_secret(filename, password, daemon, spend_secret, scan_height, 0)
    }

    /// Restore from an explicit spend/view secret pair. Unlike
    /// `import_from_seed`, the view key need not be the deterministic
    /// derivative of the spend key (e.g. keys exported from another
    /// wallet implementation).
    pub fn import_from_keys(
        filename: PathBuf,
        password: String,
        daemon: DaemonClient,
        spend_secret: &KeyBytes,
        view_secret: &KeyBytes,
        scan_height: u64,
    ) -> Result<Self, WalletError> {
        let spend_secret = scalar_from_canonical_bytes(spend_secret)
            .ok_or_else(|| WalletError::Other("spend secret is not a canonical scalar".into()))?;
        let view_secret = scalar_from_canonical_bytes(view_secret)
            .ok_or_else(|| WalletError::Other("view secret is not a canonical scalar".into()))?;

        let spend_public = scalar_mul_base(&spend_secret);
        let view_public = scalar_mul_base(&view_secret);
        let address = create_address_raw(&point_to_bytes(&spend_public), &point_to_bytes(&view_public));

        let mut subwallet = Subwallet::new(
            point_to_bytes(&spend_public),
            scalar_to_bytes(&spend_secret),
            address,
            true,
            0,
        );
        subwallet.sync_start_height = scan_height;

        let wallet = Self::new_internal(
            filename,
            password,
            daemon,
            vec![subwallet],
            view_secret,
            false,
            TransactionHistory::new(),
            SynchronizationStatus::new(),
            HashMap::new(),
        );
        wallet.save()?;
        Ok(wallet)
    }

    /// Restore a view-only wallet: can scan and report balance, but can
    /// never sign (its subwallets have an all-zero `private_spend_key`,
    /// the convention used throughout for "zero means view-only").
    pub fn import_view_only(
        filename: PathBuf,
        password: String,
        daemon: DaemonClient,
        view_secret: &KeyBytes,
        address: &str,
        scan_height: u64,
    ) -> Result<Self, WalletError> {
        let parsed = parse_address(address)?;
        let view_secret = scalar_from_canonical_bytes(view_secret)
            .ok_or_else(|| WalletError::Other("view secret is not a canonical scalar".into()))?;

        let mut subwallet = Subwallet::new(
            parsed.public_spend_key,
            [0u8; 32],
            address.to_string(),
            true,
            0,
        );
        subwallet.sync_start_height = scan_height;

        let wallet = Self::new_internal(
            filename,
            password,
            daemon,
            vec![subwallet],
            view_secret,
            true,
            TransactionHistory::new(),
            SynchronizationStatus::new(),
            HashMap::new(),
        );
        wallet.save()?;
        Ok(wallet)
    }

    fn from_spend_secret(
        filename: PathBuf,
        password: String,
        daemon: DaemonClient,
        spend_secret: Scalar,
        scan_height: u64,
        scan_timestamp: u64,
    ) -> Result<Self, WalletError> {
        let view_secret = Self::deterministic_view_key(&spend_secret);
        let spend_public = scalar_mul_base(&spend_secret);
        let view_public = scalar_mul_base(&view_secret);
        let address = create_address_raw(&point_to_bytes(&spend_public), &point_to_bytes(&view_public));

        let mut subwallet = Subwallet::new(
            point_to_bytes(&spend_public),
            scalar_to_bytes(&spend_secret),
            address,
            true,
            0,
        );
        subwallet.sync_start_height = scan_height;
        subwallet.sync_start_timestamp = scan_timestamp;

        let wallet = Self::new_internal(
            filename,
            password,
            daemon,
            vec![subwallet],
            view_secret,
            false,
            TransactionHistory::new(),
            SynchronizationStatus::new(),
            HashMap::new(),
        );
        wallet.save()?;
        Ok(wallet)
    }

    /// Decrypt and deserialize a wallet file.
    pub fn open(filename: PathBuf, password: String, daemon: DaemonClient) -> Result<Self, WalletError> {
        let file = persistence::load(&filename, &password)?;
        let view_secret = scalar_from_canonical_bytes(&file.private_view_key)
            .ok_or_else(|| WalletError::CorruptFile("private view key is not a canonical scalar".into()))?;

        let mut prepared = HashMap::new();
        for p in file.prepared_transactions {
            prepared.insert(p.transaction_hash, p);
        }

        let mut history = TransactionHistory::from_entries(file.transactions);
        for locked in file.locked_transactions {
            history.insert(locked);
        }

        Ok(Self::new_internal(
            filename,
            password,
            daemon,
            file.subwallets,
            view_secret,
            file.is_view_wallet,
            history,
            file.synchronization_status,
            prepared,
        ))
    }

    /// Encrypt and atomically persist the wallet to its file.
    pub fn save(&self) -> Result<(), WalletError> {
        let subwallets = self.state.subwallets.lock().expect("subwallets mutex poisoned").clone();
        let history = self.state.history.lock().expect("history mutex poisoned");
        let status = self.state.status.lock().expect("sync status mutex poisoned").clone();
        let prepared = self.prepared.lock().expect("prepared mutex poisoned");

        let all_transactions: Vec<Transaction> =
            history.all().into_iter().filter(|tx| !tx.is_unconfirmed()).cloned().collect();
        let locked_transactions: Vec<Transaction> =
            history.unconfirmed().into_iter().cloned().collect();

        let file = WalletFile {
            subwallets,
            private_view_key: scalar_to_bytes(&self.private_view_key),
            is_view_wallet: self.is_view_wallet,
            transactions: all_transactions,
            locked_transactions,
            synchronization_status: status,
            sync_start_timestamp: 0,
            sync_start_height: 0,
            prepared_transactions: prepared.values().cloned().collect(),
            tx_private_keys: HashMap::new(),
        };

        persistence::save(&self.filename, &self.password, &file)
    }

    pub fn is_view_only(&self) -> bool {
        self.is_view_wallet
    }

    /// The 25-word seed for the primary spend key. Fails on a view-only
    /// wallet (no spend secret to encode) or an imported wallet whose
    /// view key isn't the deterministic derivative of the spend key
    /// (there would be no way to recover the view key from the seed
    /// alone, so showing a seed would be actively misleading).
    pub fn mnemonic_seed(&self) -> Result<String, WalletError> {
        if self.is_view_wallet {
            return Err(WalletError::ViewOnly("display the seed".into()));
        }
        let subwallets = self.state.subwallets.lock().expect("subwallets mutex poisoned");
        let primary = subwallets.iter().find(|s| s.is_primary).ok_or(WalletError::NoSuchSubwallet(0))?;
        let spend_secret = scalar_from_canonical_bytes(&primary.private_spend_key)
            .ok_or_else(|| WalletError::Other("primary spend key is not a canonical scalar".into()))?;
        if Self::deterministic_view_key(&spend_secret) != self.private_view_key {
            return Err(WalletError::Other(
                "this wallet's view key was not derived from its spend key; it has no single-seed representation"
                    .into(),
            ));
        }
        Ok(seed_to_mnemonic(&primary.private_spend_key))
    }

    pub fn primary_address(&self) -> String {
        let subwallets = self.state.subwallets.lock().expect("subwallets mutex poisoned");
        subwallets
            .iter()
            .find(|s| s.is_primary)
            .map(|s| s.address.clone())
            .unwrap_or_default()
    }

    pub fn addresses(&self) -> Vec<String> {
        let subwallets = self.state.subwallets.lock().expect("subwallets mutex poisoned");
        subwallets.iter().map(|s| s.address.clone()).collect()
    }

    /// `(unlocked, locked)` balance, summed over every subwallet or, if
    /// `address` is given, just that one.
    pub fn balance(&self, address: Option<&str>) -> Result<(u64, u64), WalletError> {
        let height = self.daemon.local_height();
        let now = now_unix();
        let subwallets = self.state.subwallets.lock().expect("subwallets mutex poisoned");

        let mut unlocked_total = 0u64;
        let mut locked_total = 0u64;
        let mut found = address.is_none();
        for subwallet in subwallets.iter() {
            if let Some(addr) = address {
                if subwallet.address != addr {
                    continue;
                }
                found = true;
            }
            let (unlocked, locked) = subwallet.balance(height, now);
            unlocked_total += unlocked;
            locked_total += locked;
        }
        if !found {
            return Err(WalletError::NotOurAddress(address.unwrap_or_default().to_string()));
        }
        Ok((unlocked_total, locked_total))
    }

    pub fn transaction_history(&self) -> Vec<Transaction> {
        let history = self.state.history.lock().expect("history mutex poisoned");
        history.all().into_iter().cloned().collect()
    }

    pub fn sync_status(&self) -> (u64, u64) {
        let local = self.daemon.local_height();
        let network = self.daemon.network_height();
        (local, network)
    }

    /// Deterministically derive and add the next sub-wallet, using
    /// `hash_to_scalar(SUBWALLET_DOMAIN || primary_private_spend || u64_le(index))`.
    /// View key is shared across all subwallets.
    pub fn add_subwallet(&self) -> Result<String, WalletError> {
        if self.is_view_wallet {
            return Err(WalletError::ViewOnly("add a sub-wallet".into()));
        }

        let mut subwallets = self.state.subwallets.lock().expect("subwallets mutex poisoned");
        let primary = subwallets
            .iter()
            .find(|s| s.is_primary)
            .ok_or(WalletError::NoSuchSubwallet(0))?;
        let primary_spend_secret = scalar_from_canonical_bytes(&primary.private_spend_key)
            .ok_or_else(|| WalletError::Other("primary spend key is not a canonical scalar".into()))?;

        let next_index = subwallets.iter().map(|s| s.wallet_index).max().unwrap_or(0) + 1;

        let mut buf = Vec::with_capacity(32 + 32 + 8);
        buf.extend_from_slice(&scalar_to_bytes(&subwallet_domain()));
        buf.extend_from_slice(&scalar_to_bytes(&primary_spend_secret));
        buf.extend_from_slice(&next_index.to_le_bytes());
        let new_spend_secret = ember_crypto::hash_to_scalar(&buf);
        let new_spend_public = scalar_mul_base(&new_spend_secret);
        let view_public = scalar_mul_base(&self.private_view_key);

        let address = create_address_raw(&point_to_bytes(&new_spend_public), &point_to_bytes(&view_public));
        let mut subwallet = Subwallet::new(
            point_to_bytes(&new_spend_public),
            scalar_to_bytes(&new_spend_secret),
            address.clone(),
            false,
            next_index,
        );
        subwallet.sync_start_height = self.daemon.local_height();
        subwallets.push(subwallet);
        drop(subwallets);

        self.save()?;
        Ok(address)
    }

    /// Remove a sub-wallet and its inputs. Forbidden on the primary
    /// address while other subwallets exist.
    pub fn delete_subwallet(&self, address: &str) -> Result<(), WalletError> {
        let mut subwallets = self.state.subwallets.lock().expect("subwallets mutex poisoned");
        let index = subwallets
            .iter()
            .position(|s| s.address == address)
            .ok_or_else(|| WalletError::NotOurAddress(address.to_string()))?;

        if subwallets[index].is_primary && subwallets.len() > 1 {
            return Err(WalletError::CannotDeletePrimary);
        }

        subwallets.remove(index);
        drop(subwallets);
        self.save()
    }

    /// Start the block downloader, sync coordinator, and locked-transaction
    /// checker. Idempotent: a second call while already running is a no-op.
    pub fn start_sync(&self, worker_count: Option<usize>, skip_coinbase: bool) {
        let mut coordinator_slot = self.coordinator.lock().expect("coordinator mutex poisoned");
        if coordinator_slot.is_some() {
            return;
        }

        *self.sync_stop.0.lock().expect("sync stop mutex poisoned") = false;

        let start_height = {
            let subwallets = self.state.subwallets.lock().expect("subwallets mutex poisoned");
            subwallets.iter().map(|s| s.sync_start_height).min().unwrap_or(0)
        };

        let downloader_handle = downloader::spawn(
            self.daemon.clone(),
            Arc::clone(&self.queue),
            Arc::clone(&self.state.status),
            start_height,
            skip_coinbase,
        );
        *self.downloader_handle.lock().expect("downloader handle mutex poisoned") = Some(downloader_handle);

        let coordinator = SyncCoordinator::spawn(
            Arc::clone(&self.queue),
            Arc::clone(&self.state),
            scalar_to_bytes(&self.private_view_key),
            worker_count,
        );
        *coordinator_slot = Some(coordinator);

        let checker_handle = spawn_locked_transaction_checker(
            self.daemon.clone(),
            Arc::clone(&self.state),
            Arc::clone(&self.sync_stop),
        );
        *self.locked_checker.lock().expect("locked checker mutex poisoned") = Some(checker_handle);
    }

    /// Stop all background threads and join them. Safe to call even if
    /// `start_sync` was never called.
    pub fn stop_sync(&self) {
        *self.sync_stop.0.lock().expect("sync stop mutex poisoned") = true;
        self.sync_stop.1.notify_all();
        self.queue.stop();

        if let Some(coordinator) = self.coordinator.lock().expect("coordinator mutex poisoned").take() {
            coordinator.stop();
        }
        if let Some(handle) = self.downloader_handle.lock().expect("downloader handle mutex poisoned").take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.locked_checker.lock().expect("locked checker mutex poisoned").take() {
            let _ = handle.join();
        }
    }

    fn spendable_inputs_with_private_keys(
        &self,
        source_addresses: Option<&[String]>,
    ) -> Result<Vec<TransactionInput>, WalletError> {
        if self.is_view_wallet {
            return Err(WalletError::ViewOnly("select spendable inputs".into()));
        }
        let height = self.daemon.local_height();
        let now = now_unix();
        let subwallets = self.state.subwallets.lock().expect("subwallets mutex poisoned");

        let mut out = Vec::new();
        for subwallet in subwallets.iter() {
            if let Some(addrs) = source_addresses {
                if !addrs.iter().any(|a| a == &subwallet.address) {
                    continue;
                }
            }
            out.extend(subwallet.get_spendable_inputs(height, now).into_iter().cloned());
        }
        Ok(out)
    }

    async fn fetch_decoys(
        &self,
        inputs: &[TransactionInput],
        mixin: usize,
    ) -> Result<HashMap<u64, Vec<RingCandidate>>, WalletError> {
        let mut amounts: Vec<u64> = inputs.iter().map(|i| i.amount).collect();
        amounts.sort_unstable();
        amounts.dedup();
        if amounts.is_empty() {
            return Ok(HashMap::new());
        }

        let response = self
            .daemon
            .get_random_outs(&amounts, mixin as u64 + DECOY_FETCH_SLACK)
            .await?;

        let mut out = HashMap::new();
        for (amount, entries) in amounts.into_iter().zip(response.outs.into_iter()) {
            let candidates = entries
                .into_iter()
                .map(|e| RingCandidate {
                    global_index: e.global_index,
                    public_key: e.public_key,
                })
                .collect();
            out.insert(amount, candidates);
        }
        Ok(out)
    }

    fn resolve_destination(&self, address: &str, amount: u64) -> Result<Destination, WalletError> {
        let parsed = parse_address(address)?;
        Ok(Destination {
            address: address.to_string(),
            public_spend_key: parsed.public_spend_key,
            public_view_key: parsed.public_view_key,
            amount,
            embedded_payment_id: parsed.payment_id,
        })
    }

    async fn resolve_node_fee(&self) -> Option<Destination> {
        let info = self.daemon.get_fee_info().await.ok()?;
        if info.amount == 0 {
            return None;
        }
        let address = info.address?;
        self.resolve_destination(&address, info.amount).ok()
    }

    fn default_change_address(&self, requested: Option<&str>) -> Result<Destination, WalletError> {
        let subwallets = self.state.subwallets.lock().expect("subwallets mutex poisoned");
        let address = match requested {
            Some(addr) => {
                if !subwallets.iter().any(|s| s.address == addr) {
                    return Err(WalletError::NotOurAddress(addr.to_string()));
                }
                addr.to_string()
            }
            None => subwallets
                .iter()
                .find(|s| s.is_primary)
                .map(|s| s.address.clone())
                .ok_or(WalletError::NoSuchSubwallet(0))?,
        };
        drop(subwallets);
        self.resolve_destination(&address, 0)
    }

    /// Scan a just-built transaction's outputs against our own subwallets,
    /// exactly as the sync coordinator's commit step would once it's
    /// on-chain, and register immediately-visible change as
    /// `unconfirmed_incoming` — this ties change returning from our own
    /// sends back to the originating key images.
    fn register_own_outputs(&self, tx: &ember_tx::types::Transaction, unlock_time: u64) {
        let Some(tx_public_key) = ember_tx::types::extract_tx_public_key(&tx.prefix.extra) else {
            return;
        };
        let Ok(tx_pub) = point_from_bytes(&tx_public_key) else {
            return;
        };
        let derivation = generate_key_derivation(&tx_pub, &self.private_view_key);
        let tx_hash = tx.hash();

        let mut subwallets = self.state.subwallets.lock().expect("subwallets mutex poisoned");
        for (index, output) in tx.prefix.outputs.iter().enumerate() {
            for subwallet in subwallets.iter_mut() {
                let Ok(spend_pub) = point_from_bytes(&subwallet.public_spend_key) else { continue };
                let candidate = derive_public_key(&derivation, index as u64, &spend_pub);
                if point_to_bytes(&candidate) != output.key {
                    continue;
                }

                let (key_image, private_ephemeral) = if subwallet.is_view_only() {
                    (output.key, None)
                } else {
                    let Some(secret) = scalar_from_canonical_bytes(&subwallet.private_spend_key) else { continue };
                    let one_time_secret = derive_secret_key(&derivation, index as u64, &secret);
                    let image = generate_key_image(&candidate, &one_time_secret);
                    (point_to_bytes(&image), Some(scalar_to_bytes(&one_time_secret)))
                };

                subwallet.store_unconfirmed_incoming(TransactionInput {
                    key_image,
                    amount: output.amount,
                    block_height: 0,
                    transaction_public_key: tx_public_key,
                    transaction_index: index as u32,
                    global_output_index: 0,
                    key: output.key,
                    unlock_time,
                    parent_transaction_hash: tx_hash,
                    private_ephemeral,
                    spend_height: 0,
                });
            }
        }
    }

    /// Build (and, unless `send_now` is false, submit) a transaction.
    /// Recovers once from `TooManyInputsToFitInBlock` by sending a
    /// fusion round first and retrying.
    pub async fn send_advanced(&self, req: SendAdvancedRequest) -> Result<SentTransaction, WalletError> {
        let _guard = self.send_mutex.lock().await;

        let height = self.daemon.local_height();
        let mut destinations = Vec::with_capacity(req.destinations.len());
        for (address, amount) in &req.destinations {
            destinations.push(self.resolve_destination(address, *amount)?);
        }

        let change_address = self.default_change_address(req.change_address.as_deref())?;
        let source_addresses = req.source_addresses.clone();
        let mut spendable = self.spendable_inputs_with_private_keys(source_addresses.as_deref())?;
        if req.send_all {
            let total: u64 = spendable.iter().map(|i| i.amount).sum();
            if let Some(first) = destinations.first_mut() {
                first.amount = total;
            }
        }

        let decoys = self.fetch_decoys(&spendable, req.mixin).await?;
        let node_fee = self.resolve_node_fee().await;

        let build_once = |spendable: &[TransactionInput],
                           decoys: &HashMap<u64, Vec<RingCandidate>>,
                           node_fee: &Option<Destination>| {
            build_transaction(BuildRequest {
                destinations: destinations.clone(),
                payment_id: req.payment_id,
                mixin: req.mixin,
                height,
                fee_mode: req.fee_mode,
                unlock_time: req.unlock_time,
                extra_data: req.extra_data.clone(),
                spendable_inputs: spendable,
                change_address: Destination {
                    address: change_address.address.clone(),
                    public_spend_key: change_address.public_spend_key,
                    public_view_key: change_address.public_view_key,
                    amount: 0,
                    embedded_payment_id: None,
                },
                decoys_by_amount: decoys,
                node_fee: node_fee.clone(),
                is_fusion: false,
            })
        };

        let mut result = build_once(&spendable, &decoys, &node_fee);
        if let Err(ember_tx::TxError::TooManyInputsToFitInBlock { .. }) = result {
            log::warn!("transaction too large for a block; attempting one fusion round before retrying");
            if let Ok(fusion_inputs) = select_fusion_inputs(&spendable, None, req.mixin + 1) {
                let fusion_keys: std::collections::HashSet<KeyBytes> =
                    fusion_inputs.iter().map(|i| i.key_image).collect();
                if let Ok(()) = self.send_fusion_inputs(&fusion_inputs, req.mixin, height).await {
                    spendable.retain(|i| !fusion_keys.contains(&i.key_image));
                }
            }
            result = build_once(&spendable, &decoys, &node_fee);
        }

        let (tx, prepared) = result?;

        if !req.send_now {
            self.prepared
                .lock()
                .expect("prepared mutex poisoned")
                .insert(prepared.transaction_hash, prepared.clone());
            self.save()?;
            return Ok(SentTransaction {
                hash: prepared.transaction_hash,
                fee: prepared.fee,
            });
        }

        self.submit_and_record(&tx, &prepared, &destinations, &node_fee).await
    }

    async fn send_fusion_inputs(
        &self,
        inputs: &[TransactionInput],
        mixin: usize,
        height: u64,
    ) -> Result<(), WalletError> {
        let change_address = self.default_change_address(None)?;
        let decoys = self.fetch_decoys(inputs, mixin).await?;

        let (tx, prepared) = build_transaction(BuildRequest {
            destinations: vec![],
            payment_id: None,
            mixin,
            height,
            fee_mode: FeeMode::Fixed(0),
            unlock_time: 0,
            extra_data: vec![],
            spendable_inputs: inputs,
            change_address: Destination {
                address: change_address.address.clone(),
                public_spend_key: change_address.public_spend_key,
                public_view_key: change_address.public_view_key,
                amount: 0,
                embedded_payment_id: None,
            },
            decoys_by_amount: &decoys,
            node_fee: None,
            is_fusion: true,
        })?;

        self.submit_and_record(&tx, &prepared, &[], &None).await?;
        Ok(())
    }

    /// Mark the inputs used as `locked`, submit to the node, and record an
    /// unconfirmed history entry plus immediately-visible change.
    async fn submit_and_record(
        &self,
        tx: &ember_tx::types::Transaction,
        prepared: &PreparedTransaction,
        destinations: &[Destination],
        node_fee: &Option<Destination>,
    ) -> Result<SentTransaction, WalletError> {
        let response = self.daemon.send_raw_transaction(&prepared.raw_transaction_bytes).await?;
        if !response.accepted {
            return Err(WalletError::Other(format!(
                "transaction rejected by node: {}",
                response.error.unwrap_or_else(|| "no reason given".into())
            )));
        }

        let mut subwallets = self.state.subwallets.lock().expect("subwallets mutex poisoned");
        let mut transfers = HashMap::new();
        for subwallet in subwallets.iter_mut() {
            let mut debit = 0i64;
            for key_image in &prepared.inputs_used {
                let had = subwallet.unspent.iter().any(|i| &i.key_image == key_image);
                if had {
                    if let Some(input) = subwallet.unspent.iter().find(|i| &i.key_image == key_image) {
                        debit += input.amount as i64;
                    }
                    subwallet.mark_input_as_locked(key_image);
                }
            }
            if debit != 0 {
                transfers.insert(subwallet.public_spend_key, -debit);
            }
        }
        drop(subwallets);

        let destination_total: u64 = destinations.iter().map(|d| d.amount).sum();
        let node_fee_amount = node_fee.as_ref().map(|d| d.amount).unwrap_or(0);
        let _ = destination_total;
        let _ = node_fee_amount;

        let mut history = self.state.history.lock().expect("history mutex poisoned");
        history.insert(Transaction {
            hash: prepared.transaction_hash,
            payment_id: None,
            transfers,
            fee: prepared.fee,
            block_height: 0,
            timestamp: now_unix(),
            unlock_time: tx.prefix.unlock_time,
            is_coinbase: false,
        });
        drop(history);

        self.register_own_outputs(tx, tx.prefix.unlock_time);
        self.save()?;

        Ok(SentTransaction {
            hash: prepared.transaction_hash,
            fee: prepared.fee,
        })
    }

    /// Submit a previously prepared transaction, consuming it from the
    /// in-memory map — it can be consumed at most once.
    pub async fn send_prepared(&self, hash: &KeyBytes) -> Result<SentTransaction, WalletError> {
        let _guard = self.send_mutex.lock().await;
        let prepared = self
            .prepared
            .lock()
            .expect("prepared mutex poisoned")
            .remove(hash)
            .ok_or(WalletError::NoSuchPreparedTransaction(hex::encode(hash)))?;

        let response = self.daemon.send_raw_transaction(&prepared.raw_transaction_bytes).await?;
        if !response.accepted {
            self.prepared.lock().expect("prepared mutex poisoned").insert(*hash, prepared);
            return Err(WalletError::Other(format!(
                "transaction rejected by node: {}",
                response.error.unwrap_or_else(|| "no reason given".into())
            )));
        }

        let mut subwallets = self.state.subwallets.lock().expect("subwallets mutex poisoned");
        let mut transfers = HashMap::new();
        for subwallet in subwallets.iter_mut() {
            let mut debit = 0i64;
            for key_image in &prepared.inputs_used {
                if let Some(input) = subwallet.unspent.iter().find(|i| &i.key_image == key_image) {
                    debit += input.amount as i64;
                    subwallet.mark_input_as_locked(key_image);
                }
            }
            if debit != 0 {
                transfers.insert(subwallet.public_spend_key, -debit);
            }
        }
        drop(subwallets);

        let mut history = self.state.history.lock().expect("history mutex poisoned");
        history.insert(Transaction {
            hash: prepared.transaction_hash,
            payment_id: None,
            transfers,
            fee: prepared.fee,
            block_height: 0,
            timestamp: now_unix(),
            unlock_time: 0,
            is_coinbase: false,
        });
        drop(history);

        self.save()?;
        Ok(SentTransaction {
            hash: prepared.transaction_hash,
            fee: prepared.fee,
        })
    }

    /// Discard a prepared transaction without ever submitting it. Its
    /// inputs were never locked (only `send_prepared`/`send_now` lock),
    /// so there is nothing to unwind.
    pub fn remove_prepared(&self, hash: &KeyBytes) -> Result<(), WalletError> {
        self.prepared
            .lock()
            .expect("prepared mutex poisoned")
            .remove(hash)
            .ok_or(WalletError::NoSuchPreparedTransaction(hex::encode(hash)))?;
        self.save()
    }

    /// Convenience wrapper over `send_advanced` for a single destination.
    pub async fn send_basic(
        &self,
        address: &str,
        amount: u64,
        payment_id: Option<KeyBytes>,
        send_all: bool,
    ) -> Result<SentTransaction, WalletError> {
        self.send_advanced(SendAdvancedRequest {
            destinations: vec![(address.to_string(), amount)],
            payment_id,
            send_all,
            ..Default::default()
        })
        .await
    }

    /// Consolidate dust: a fee-free transaction with `fee_mode` forced to
    /// zero and inputs chosen by `select_fusion_inputs`.
    pub async fn send_fusion_basic(&self) -> Result<SentTransaction, WalletError> {
        let height = self.daemon.local_height();
        let spendable = self.spendable_inputs_with_private_keys(None)?;
        let mixin = ember_types::constants::DEFAULT_RING_SIZE - 1;
        let selected = select_fusion_inputs(&spendable, None, mixin + 1)?;
        let _guard = self.send_mutex.lock().await;
        let change_address = self.default_change_address(None)?;
        let decoys = self.fetch_decoys(&selected, mixin).await?;

        let (tx, prepared) = build_transaction(BuildRequest {
            destinations: vec![],
            payment_id: None,
            mixin,
            height,
            fee_mode: FeeMode::Fixed(0),
            unlock_time: 0,
            extra_data: vec![],
            spendable_inputs: &selected,
            change_address: Destination {
                address: change_address.address.clone(),
                public_spend_key: change_address.public_spend_key,
                public_view_key: change_address.public_view_key,
                amount: 0,
                embedded_payment_id: None,
            },
            decoys_by_amount: &decoys,
            node_fee: None,
            is_fusion: true,
        })?;

        self.submit_and_record(&tx, &prepared, &[], &None).await
    }

    /// Fusion with caller-chosen source addresses, target denomination
    /// bias, and mixin.
    pub async fn send_fusion_advanced(
        &self,
        source_addresses: Option<Vec<String>>,
        optimize_target: Option<u64>,
        mixin: usize,
    ) -> Result<SentTransaction, WalletError> {
        let height = self.daemon.local_height();
        let spendable = self.spendable_inputs_with_private_keys(source_addresses.as_deref())?;
        let selected = select_fusion_inputs(&spendable, optimize_target, mixin + 1)?;
        let _guard = self.send_mutex.lock().await;
        let change_address = self.default_change_address(None)?;
        let decoys = self.fetch_decoys(&selected, mixin).await?;

        let (tx, prepared) = build_transaction(BuildRequest {
            destinations: vec![],
            payment_id: None,
            mixin,
            height,
            fee_mode: FeeMode::Fixed(0),
            unlock_time: 0,
            extra_data: vec![],
            spendable_inputs: &selected,
            change_address: Destination {
                address: change_address.address.clone(),
                public_spend_key: change_address.public_spend_key,
                public_view_key: change_address.public_view_key,
                amount: 0,
                embedded_payment_id: None,
            },
            decoys_by_amount: &decoys,
            node_fee: None,
            is_fusion: true,
        })?;

        self.submit_and_record(&tx, &prepared, &[], &None).await
    }
}

impl Drop for Wallet {
    fn drop(&mut self) {
        self.stop_sync();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daemon() -> DaemonClient {
        DaemonClient::new("http://127.0.0.1:1")
    }

    #[test]
    fn create_new_persists_and_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.bin");

        let wallet = Wallet::create_new(path.clone(), "hunter2".into(), daemon()).unwrap();
        let address = wallet.primary_address();
        assert!(!address.is_empty());
        drop(wallet);

        let reopened = Wallet::open(path, "hunter2".into(), daemon()).unwrap();
        assert_eq!(reopened.primary_address(), address);
        assert!(!reopened.is_view_only());
    }

    #[test]
    fn seed_round_trips_through_mnemonic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.bin");
        let wallet = Wallet::create_new(path, "pw".into(), daemon()).unwrap();
        let seed = wallet.mnemonic_seed().unwrap();

        let dir2 = tempfile::tempdir().unwrap();
        let path2 = dir2.path().join("wallet2.bin");
        let restored = Wallet::import_from_seed(path2, "pw".into(), daemon(), &seed, 0).unwrap();
        assert_eq!(restored.primary_address(), wallet.primary_address());
    }

    #[test]
    fn view_only_wallet_rejects_seed_and_spend_operations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.bin");
        let spend_wallet = Wallet::create_new(dir.path().join("spend.bin"), "pw".into(), daemon()).unwrap();
        let address = spend_wallet.primary_address();
        let view_secret = scalar_to_bytes(&spend_wallet.private_view_key);

        let view_wallet =
            Wallet::import_view_only(path, "pw".into(), daemon(), &view_secret, &address, 0).unwrap();
        assert!(view_wallet.is_view_only());
        assert!(matches!(view_wallet.mnemonic_seed(), Err(WalletError::ViewOnly(_))));
        assert!(matches!(
            view_wallet.add_subwallet(),
            Err(WalletError::ViewOnly(_))
        ));
    }

    #[test]
    fn add_subwallet_derives_deterministically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.bin");
        let wallet = Wallet::create_new(path, "pw".into(), daemon()).unwrap();

        let addr1 = wallet.add_subwallet().unwrap();
        assert_eq!(wallet.addresses().len(), 2);
        assert_ne!(addr1, wallet.primary_address());
    }

    #[test]
    fn delete_primary_forbidden_while_others_exist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.bin");
        let wallet = Wallet::create_new(path, "pw".into(), daemon()).unwrap();
        wallet.add_subwallet().unwrap();

        let primary = wallet.primary_address();
        let err = wallet.delete_subwallet(&primary).unwrap_err();
        assert!(matches!(err, WalletError::CannotDeletePrimary));
    }

    #[test]
    fn balance_on_unknown_address_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.bin");
        let wallet = Wallet::create_new(path, "pw".into(), daemon()).unwrap();
        assert!(matches!(
            wallet.balance(Some("not-an-address")),
            Err(WalletError::NotOurAddress(_))
        ));
    }
}
