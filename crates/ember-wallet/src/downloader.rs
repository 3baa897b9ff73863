//! Block downloader (C3): a memory-bounded look-ahead queue of raw blocks,
//! fed by its own thread so the sync coordinator (C4) never blocks on the
//! network while committing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use ember_rpc::DaemonClient;
use ember_types::constants::{
    BLOCK_DOWNLOADER_IDLE_SLEEP_SECS, BLOCK_DOWNLOADER_MAX_RESPONSE_SIZE,
    BLOCK_DOWNLOADER_MEMORY_LIMIT, DEFAULT_BLOCK_COUNT,
};
use ember_types::model::SynchronizationStatus;
use ember_types::RawBlock;

/// Thread-safe FIFO of undrained blocks, with a memory-usage estimate the
/// fetch loop uses to decide whether it has room for another response.
struct Inner {
    blocks: VecDeque<RawBlock>,
    should_stop: bool,
    consumed_data: bool,
}

/// Shared state between the downloader thread and its consumers. `fetch`
/// peeks without removing; `drop_front` pops the oldest block (§4.3).
pub struct BlockQueue {
    inner: Mutex<Inner>,
    condvar: Condvar,
    approx_bytes: AtomicUsize,
}

impl BlockQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                blocks: VecDeque::new(),
                should_stop: false,
                consumed_data: false,
            }),
            condvar: Condvar::new(),
            approx_bytes: AtomicUsize::new(0),
        })
    }

    /// Up to `n` blocks from the head, without removing them.
    pub fn fetch(&self, n: usize) -> Vec<RawBlock> {
        let inner = self.inner.lock().expect("downloader queue mutex poisoned");
        inner.blocks.iter().take(n).cloned().collect()
    }

    /// Pop the oldest block, recording that the consumer wants more data.
    pub fn drop_front(&self) -> Option<RawBlock> {
        let mut inner = self.inner.lock().expect("downloader queue mutex poisoned");
        let block = inner.blocks.pop_front();
        if block.is_some() {
            self.approx_bytes.fetch_sub(
                block.as_ref().map(RawBlock::approx_size).unwrap_or(0),
                Ordering::Relaxed,
            );
            inner.consumed_data = true;
            self.condvar.notify_all();
        }
        block
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("downloader queue mutex poisoned").blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stop(&self) {
        let mut inner = self.inner.lock().expect("downloader queue mutex poisoned");
        inner.should_stop = true;
        self.condvar.notify_all();
    }

    fn push_many(&self, blocks: Vec<RawBlock>) {
        let added: usize = blocks.iter().map(RawBlock::approx_size).sum();
        let mut inner = self.inner.lock().expect("downloader queue mutex poisoned");
        inner.blocks.extend(blocks);
        self.approx_bytes.fetch_add(added, Ordering::Relaxed);
    }

    fn has_room_for_one_more_response(&self) -> bool {
        self.approx_bytes.load(Ordering::Relaxed) + BLOCK_DOWNLOADER_MAX_RESPONSE_SIZE
            < BLOCK_DOWNLOADER_MEMORY_LIMIT
    }
}

/// Spawn the downloader thread (§4.3). `expect_start_height` guards
/// against committing to a speculative start: the first response must
/// contain that height or it is discarded and retried.
pub fn spawn(
    client: DaemonClient,
    queue: Arc<BlockQueue>,
    sync_status: Arc<Mutex<SynchronizationStatus>>,
    expect_start_height: u64,
    skip_coinbase: bool,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("building a current-thread tokio runtime");

        let mut requested_count = DEFAULT_BLOCK_COUNT;
        let mut first_response = true;

        loop {
            {
                let inner = queue.inner.lock().expect("downloader queue mutex poisoned");
                if inner.should_stop {
                    return;
                }
                if !queue.has_room_for_one_more_response() {
                    let _unused = queue
                        .condvar
                        .wait_while(inner, |i| !i.should_stop && !i.consumed_data)
                        .expect("downloader queue mutex poisoned");
                    continue;
                }
            }

            let checkpoints = {
                let status = sync_status.lock().expect("sync status mutex poisoned");
                status.checkpoint_hashes()
            };
            let recent = {
                let status = sync_status.lock().expect("sync status mutex poisoned");
                status.hashes()
            };
            let start_height = {
                let status = sync_status.lock().expect("sync status mutex poisoned");
                status.last_known_block_height
            };

            let mut anchors: Vec<_> = queue.fetch(requested_count).iter().rev().map(|b| b.hash).collect();
            anchors.extend(recent.into_iter().take(100));
            anchors.extend(checkpoints);

            let result = runtime.block_on(client.get_wallet_sync_data(&anchors, start_height, 0, skip_coinbase));

            match result {
                Ok(data) if data.items.is_empty() && data.top_block.is_none() => {
                    requested_count = (requested_count / 2).max(1);
                    std::thread::sleep(std::time::Duration::from_secs(BLOCK_DOWNLOADER_IDLE_SLEEP_SECS));
                }
                Ok(data) if data.items.is_empty() => {
                    // Tip-only response: nothing to push, the sync
                    // coordinator handles a bare `top_block` directly.
                    std::thread::sleep(std::time::Duration::from_secs(BLOCK_DOWNLOADER_IDLE_SLEEP_SECS));
                }
                Ok(data) => {
                    if first_response {
                        first_response = false;
                        let starts_correctly = data
                            .items
                            .first()
                            .map(|b| b.height == expect_start_height)
                            .unwrap_or(false);
                        if !starts_correctly {
                            continue;
                        }
                    }
                    requested_count = DEFAULT_BLOCK_COUNT;
                    queue.push_many(data.items);
                }
                Err(e) => {
                    log::warn!("block downloader: get_wallet_sync_data failed: {e}");
                    std::thread::sleep(std::time::Duration::from_secs(BLOCK_DOWNLOADER_IDLE_SLEEP_SECS));
                }
            }

            {
                let mut inner = queue.inner.lock().expect("downloader queue mutex poisoned");
                inner.consumed_data = false;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(height: u64) -> RawBlock {
        RawBlock {
            height,
            hash: [height as u8; 32],
            timestamp: 0,
            coinbase: ember_types::RawTransaction {
                hash: [0u8; 32],
                tx_public_key: [0u8; 32],
                payment_id: None,
                unlock_time: 0,
                outputs: vec![],
                spent_inputs: vec![],
            },
            transactions: vec![],
        }
    }

    #[test]
    fn fetch_does_not_remove() {
        let queue = BlockQueue::new();
        queue.push_many(vec![block(1), block(2)]);
        assert_eq!(queue.fetch(10).len(), 2);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn drop_front_removes_oldest() {
        let queue = BlockQueue::new();
        queue.push_many(vec![block(1), block(2)]);
        let dropped = queue.drop_front().unwrap();
        assert_eq!(dropped.height, 1);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn stop_flag_is_observed() {
        let queue = BlockQueue::new();
        queue.stop();
        assert!(queue.inner.lock().unwrap().should_stop);
    }
}
