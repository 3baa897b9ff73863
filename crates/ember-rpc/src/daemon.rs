//! Node client: the seven endpoints the wallet core consumes.
//!
//! Every method is cancellable by dropping the [`DaemonClient`] (its async
//! calls simply stop being polled). A background task refreshes `get_info`
//! every [`ember_types::constants::INFO_REFRESH_INTERVAL_SECS`] seconds;
//! callers read the cached snapshot through non-blocking getters rather
//! than calling `get_info` themselves on the hot path.

use crate::client::{HttpClient, RpcConfig};
use crate::error::RpcError;
use ember_types::model::KeyBytes;
use ember_types::{RawBlock, TopBlock};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// `GET /info` response. The node reports height as a block
/// *count*; `local_height()` decrements it by one to get a zero-indexed
/// top height, floored at zero.
#[derive(Debug, Clone, Deserialize)]
pub struct GetInfoResponse {
    pub height: u64,
    pub network_height: u64,
    pub peer_count: u64,
    pub hashrate: u64,
    #[serde(default)]
    pub upgrade_heights: Vec<u64>,
    #[serde(default)]
    pub supported_height: u64,
    #[serde(default)]
    pub start_time: u64,
    #[serde(default)]
    pub is_cache_api: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
struct WalletSyncDataRequest<'a> {
    #[serde(rename = "blockHashCheckpoints")]
    checkpoints: &'a [KeyBytes],
    #[serde(rename = "startHeight")]
    start_height: u64,
    #[serde(rename = "startTimestamp")]
    start_timestamp: u64,
    #[serde(rename = "skipCoinbaseTransactions")]
    skip_coinbase: bool,
}

/// `POST /getrawblocks` (preferred) or `/getwalletsyncdata` (legacy).
#[derive(Debug, Clone, Deserialize)]
pub struct WalletSyncData {
    #[serde(default)]
    pub items: Vec<RawBlock>,
    #[serde(default)]
    pub top_block: Option<TopBlock>,
}

#[derive(Debug, Clone, Serialize)]
struct RandomOutsRequest<'a> {
    amounts: &'a [u64],
    count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RandomOutEntry {
    pub global_index: u64,
    pub public_key: KeyBytes,
}

/// `POST /getrandom_outs` (or `/randomOutputs` on cache-API backends):
/// one decoy list per requested amount, same order as the request.
#[derive(Debug, Clone, Deserialize)]
pub struct RandomOuts {
    pub outs: Vec<Vec<RandomOutEntry>>,
}

#[derive(Debug, Clone, Serialize)]
struct SendRawTransactionRequest {
    #[serde(rename = "tx_as_hex")]
    tx_hex: String,
}

/// `POST /sendrawtransaction` response. Transport failures surface as
/// `RpcError`; a node-side rejection surfaces here instead, with a reason
/// string for the caller to surface as a consensus-level rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct SendRawTransactionResponse {
    #[serde(default = "default_true")]
    pub accepted: bool,
    #[serde(default)]
    pub error: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
struct TransactionsStatusRequest<'a> {
    transaction_hashes: &'a [KeyBytes],
}

/// `POST /get_transactions_status`: partitions the requested hashes into
/// the set in the mempool, the set already in a block, and the rest
/// (unknown to the node).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TransactionsStatus {
    #[serde(default)]
    pub in_pool: Vec<KeyBytes>,
    #[serde(default)]
    pub in_block: Vec<KeyBytes>,
    #[serde(default)]
    pub unknown: Vec<KeyBytes>,
}

#[derive(Debug, Clone, Serialize)]
struct GlobalIndexesRequest {
    start_height: u64,
    end_height: u64,
}

/// `POST /get_global_indexes_for_range`: hash → global output indexes.
/// Absent (`None`) on cache-API backends — callers must tolerate
/// its absence and fall back to the per-output indexes already present
/// on scanned blocks.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GlobalIndexes {
    #[serde(default)]
    pub indexes: std::collections::HashMap<String, Vec<u64>>,
}

/// `GET /fee`: a node-operator tip the wallet adds as an extra
/// destination on outgoing non-fusion transactions.
#[derive(Debug, Clone, Deserialize)]
pub struct FeeInfo {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub amount: u64,
}

pub type NodeFeeInfo = FeeInfo;

/// Cached last-known snapshot of `get_info`, read without locking by
/// consumers ("last-known" snapshots — fields are not mutually
/// consistent across separate reads).
#[derive(Debug, Default)]
struct CachedInfo {
    local_height: AtomicU64,
    network_height: AtomicU64,
    peer_count: AtomicU64,
    hashrate: AtomicU64,
    last_refreshed_unix: AtomicU64,
}

/// Which shape of the block-scan endpoint this node understands. Sticky
/// for the lifetime of the client handle, and resets on `swap_node`:
/// the flag is per-connection, not global.
#[derive(Debug)]
struct EndpointShape {
    use_legacy_sync_endpoint: AtomicBool,
    tried_preferred: AtomicBool,
}

impl Default for EndpointShape {
    fn default() -> Self {
        Self {
            use_legacy_sync_endpoint: AtomicBool::new(false),
            tried_preferred: AtomicBool::new(false),
        }
    }
}

/// Node client. Cheaply cloneable (everything behind `Arc`) so the
/// block downloader, sync coordinator, and transaction composer can each
/// hold a handle without fighting over ownership.
#[derive(Clone)]
pub struct DaemonClient {
    inner: Arc<RwLock<HttpClient>>,
    cache: Arc<CachedInfo>,
    endpoint_shape: Arc<EndpointShape>,
}

impl DaemonClient {
    pub fn new(url: impl Into<String>) -> Self {
        let config = RpcConfig {
            url: url.into(),
            ..RpcConfig::default()
        };
        Self {
            inner: Arc::new(RwLock::new(HttpClient::new(config))),
            cache: Arc::new(CachedInfo::default()),
            endpoint_shape: Arc::new(EndpointShape::default()),
        }
    }

    pub fn with_config(config: RpcConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HttpClient::new(config))),
            cache: Arc::new(CachedInfo::default()),
            endpoint_shape: Arc::new(EndpointShape::default()),
        }
    }

    /// Point this client at a different node. Resets the sticky legacy
    /// endpoint flag: it does not carry over to a new node, which may
    /// support the preferred endpoint.
    pub async fn swap_node(&self, url: impl Into<String>) {
        self.inner.write().await.set_url(url.into());
        self.endpoint_shape
            .use_legacy_sync_endpoint
            .store(false, Ordering::SeqCst);
        self.endpoint_shape
            .tried_preferred
            .store(false, Ordering::SeqCst);
    }

    pub async fn current_url(&self) -> String {
        self.inner.read().await.url().to_string()
    }

    /// `GET /info`. Caches the result for the non-blocking getters below.
    pub async fn get_info(&self) -> Result<GetInfoResponse, RpcError> {
        let info: GetInfoResponse = self
            .inner
            .read()
            .await
            .get_json("/info", "get_info")
            .await?;

        self.cache
            .local_height
            .store(info.height.saturating_sub(1), Ordering::Relaxed);
        self.cache
            .network_height
            .store(info.network_height, Ordering::Relaxed);
        self.cache.peer_count.store(info.peer_count, Ordering::Relaxed);
        self.cache.hashrate.store(info.hashrate, Ordering::Relaxed);
        self.cache.last_refreshed_unix.store(now_unix(), Ordering::Relaxed);

        Ok(info)
    }

    /// Spawn the background `get_info` refresh task. Returns a
    /// handle; dropping it (or aborting it) stops the refresh.
    pub fn spawn_info_refresh(&self) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = this.get_info().await {
                    log::debug!("background get_info refresh failed: {e}");
                }
                tokio::time::sleep(Duration::from_secs(
                    ember_types::constants::INFO_REFRESH_INTERVAL_SECS,
                ))
                .await;
            }
        })
    }

    /// Cached, zero-indexed local top height (never negative: floored at
    /// zero).
    pub fn local_height(&self) -> u64 {
        self.cache.local_height.load(Ordering::Relaxed)
    }

    pub fn network_height(&self) -> u64 {
        self.cache.network_height.load(Ordering::Relaxed)
    }

    pub fn peer_count(&self) -> u64 {
        self.cache.peer_count.load(Ordering::Relaxed)
    }

    pub fn hashrate(&self) -> u64 {
        self.cache.hashrate.load(Ordering::Relaxed)
    }

    /// `POST /getrawblocks` (preferred) or `/getwalletsyncdata` (legacy).
    /// Falls back to the legacy path exactly once on a 404 from the
    /// preferred path, then remembers never to try the preferred path
    /// again for this client handle's lifetime.
    pub async fn get_wallet_sync_data(
        &self,
        checkpoints: &[KeyBytes],
        start_height: u64,
        start_timestamp: u64,
        skip_coinbase: bool,
    ) -> Result<WalletSyncData, RpcError> {
        let request = WalletSyncDataRequest {
            checkpoints,
            start_height,
            start_timestamp,
            skip_coinbase,
        };

        if self.endpoint_shape.use_legacy_sync_endpoint.load(Ordering::SeqCst) {
            return self
                .inner
                .read()
                .await
                .post_json("/getwalletsyncdata", "get_wallet_sync_data", &request)
                .await;
        }

        let client = self.inner.read().await;
        match client
            .post_json("/getrawblocks", "get_wallet_sync_data", &request)
            .await
        {
            Ok(data) => Ok(data),
            Err(e) if e.is_not_found() && !self.endpoint_shape.tried_preferred.swap(true, Ordering::SeqCst) => {
                self.endpoint_shape
                    .use_legacy_sync_endpoint
                    .store(true, Ordering::SeqCst);
                client
                    .post_json("/getwalletsyncdata", "get_wallet_sync_data", &request)
                    .await
            }
            Err(e) => Err(e),
        }
    }

    /// `POST /getrandom_outs` (or `/randomOutputs` on a cache-API node).
    pub async fn get_random_outs(&self, amounts: &[u64], count: u64) -> Result<RandomOuts, RpcError> {
        let request = RandomOutsRequest { amounts, count };
        let client = self.inner.read().await;
        match client.post_json("/getrandom_outs", "get_random_outs", &request).await {
            Ok(outs) => Ok(outs),
            Err(e) if e.is_not_found() => {
                client
                    .post_json("/randomOutputs", "get_random_outs", &request)
                    .await
            }
            Err(e) => Err(e),
        }
    }

    /// `POST /sendrawtransaction`. A successful HTTP round trip with a
    /// node-side rejection is reported via the returned struct, not as an
    /// `RpcError` — transport failures are reported separately from
    /// node-side rejections.
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<SendRawTransactionResponse, RpcError> {
        let request = SendRawTransactionRequest {
            tx_hex: hex::encode(raw),
        };
        self.inner
            .read()
            .await
            .post_json("/sendrawtransaction", "send_raw_transaction", &request)
            .await
    }

    /// `POST /get_transactions_status`.
    pub async fn get_transactions_status(&self, hashes: &[KeyBytes]) -> Result<TransactionsStatus, RpcError> {
        if hashes.is_empty() {
            return Ok(TransactionsStatus::default());
        }
        let request = TransactionsStatusRequest {
            transaction_hashes: hashes,
        };
        self.inner
            .read()
            .await
            .post_json(
                "/get_transactions_status",
                "get_transactions_status",
                &request,
            )
            .await
    }

    /// `POST /get_global_indexes_for_range`. Absent on cache-API backends:
    /// a 404 is mapped to an empty map rather than an error, since
    /// callers already tolerate this endpoint's absence.
    pub async fn get_global_indexes_for_range(
        &self,
        start: u64,
        end: u64,
    ) -> Result<GlobalIndexes, RpcError> {
        let request = GlobalIndexesRequest {
            start_height: start,
            end_height: end,
        };
        match self
            .inner
            .read()
            .await
            .post_json(
                "/get_global_indexes_for_range",
                "get_global_indexes_for_range",
                &request,
            )
            .await
        {
            Ok(indexes) => Ok(indexes),
            Err(e) if e.is_not_found() => Ok(GlobalIndexes::default()),
            Err(e) => Err(e),
        }
    }

    /// `GET /fee`.
    pub async fn get_fee_info(&self) -> Result<FeeInfo, RpcError> {
        self.inner.read().await.get_json("/fee", "get_fee_info").await
    }
}

fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_shape_defaults_to_preferred() {
        let shape = EndpointShape::default();
        assert!(!shape.use_legacy_sync_endpoint.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn swap_node_resets_sticky_fallback() {
        let client = DaemonClient::new("http://127.0.0.1:1");
        client
            .endpoint_shape
            .use_legacy_sync_endpoint
            .store(true, Ordering::SeqCst);
        client.swap_node("http://127.0.0.1:2").await;
        assert!(!client
            .endpoint_shape
            .use_legacy_sync_endpoint
            .load(Ordering::SeqCst));
        assert_eq!(client.current_url().await, "http://127.0.0.1:2");
    }

    #[test]
    fn cached_getters_start_at_zero() {
        let client = DaemonClient::new("http://127.0.0.1:1");
        assert_eq!(client.local_height(), 0);
        assert_eq!(client.network_height(), 0);
    }
}
