//! Wallet core.
//!
//! Composes the block downloader (C3), the sync coordinator (C4), the
//! subwallet input ledger and transaction history (C5/C6), and encrypted
//! persistence (C9) behind a single [`Wallet`] facade (C8).

pub mod container;
pub mod downloader;
pub mod error;
pub mod history;
pub mod persistence;
pub mod sync;

pub use container::{SendAdvancedRequest, SentTransaction, Wallet};
pub use downloader::BlockQueue;
pub use error::WalletError;
pub use history::TransactionHistory;
pub use persistence::WalletFile;
pub use sync::{SyncCoordinator, SyncState};
