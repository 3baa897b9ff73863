//! Wallet-level error taxonomy: malformed input, balance shortfalls,
//! network/persistence failures, and disallowed state transitions, each
//! mapped onto one `thiserror` variant so callers can match on kind
//! without parsing message strings.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] ember_types::AddressError),

    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(#[from] ember_types::mnemonic::MnemonicError),

    #[error("payment id must be 32 bytes (64 hex chars)")]
    InvalidPaymentId,

    #[error("node error: {0}")]
    Rpc(#[from] ember_rpc::RpcError),

    #[error("transaction composition failed: {0}")]
    Tx(#[from] ember_tx::TxError),

    #[error("insufficient unlocked balance: need {need}, have {have}")]
    InsufficientBalance { need: u64, have: u64 },

    #[error("wrong password or corrupted wallet file")]
    DecryptionFailed,

    #[error("unrecognized wallet file (bad magic)")]
    BadMagic,

    #[error("unsupported wallet file version {0}")]
    UnsupportedVersion(u8),

    #[error("wallet file is truncated or malformed: {0}")]
    CorruptFile(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot {0}: wallet is view-only")]
    ViewOnly(String),

    #[error("cannot delete the primary address while other subwallets exist")]
    CannotDeletePrimary,

    #[error("no subwallet at index {0}")]
    NoSuchSubwallet(u64),

    #[error("address {0} does not belong to this wallet")]
    NotOurAddress(String),

    #[error("no prepared transaction with hash {0}")]
    NoSuchPreparedTransaction(String),

    #[error("a send is already in progress")]
    SendInProgress,

    #[error("{0}")]
    Other(String),
}
