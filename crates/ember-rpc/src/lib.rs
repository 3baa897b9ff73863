//! Node client (C2): stateless, best-effort request/response against a
//! remote CryptoNote-family node for the endpoints the wallet core
//! consumes. No P2P, no consensus rules, no block template/mining
//! surface — those belong to the node itself, not to this client.

pub mod client;
pub mod daemon;
pub mod error;

pub use client::{HttpClient, RpcConfig};
pub use daemon::{
    DaemonClient, FeeInfo, GetInfoResponse, GlobalIndexes, NodeFeeInfo, RandomOuts,
    SendRawTransactionResponse, TransactionsStatus, WalletSyncData,
};
pub use error::RpcError;
