//! Transaction composition (C7): input selection, decoy ring construction,
//! pretty-denomination output splitting, stealth output derivation, LSAG
//! signing, and the fusion/prepared-transaction variants on top.
//!
//! Network-free by design — decoys and node-fee info are fetched by the
//! caller (`ember-wallet`'s wallet container) and handed in, so this crate
//! depends only on `ember-crypto` and `ember-types` and is unit testable
//! without a mock node.

pub mod builder;
pub mod decoy;
pub mod denom;
pub mod fee;
pub mod sign;
pub mod types;

pub use builder::{build_transaction, select_fusion_inputs, BuildRequest, Destination};
pub use decoy::{build_ring, BuiltRing, RingCandidate};
pub use types::{Transaction, TxInput, TxOutput, TxPrefix, TxRingSignature};

use thiserror::Error;

/// Error taxonomy for transaction composition, grouped into input,
/// cryptographic, and consensus-shaped failure kinds.
#[derive(Debug, Error)]
pub enum TxError {
    #[error("no destinations specified")]
    NoDestinations,

    #[error("destination amount is zero")]
    ZeroAmount,

    #[error("payment id conflicts with an integrated address's embedded payment id")]
    PaymentIdConflict,

    #[error("mixin {mixin} out of range [{min}, {max}] at this height")]
    MixinOutOfRange { mixin: usize, min: u64, max: u64 },

    #[error("total required amount overflows u64")]
    AmountOverflow,

    #[error("insufficient spendable funds: need {need}, have {have}")]
    InsufficientFunds { need: u64, have: u64 },

    #[error("not enough unique decoys: need {needed}, found {available}")]
    NotEnoughOutputs { needed: usize, available: usize },

    #[error("composed transaction does not fit in a block: {size} > {limit}")]
    TooManyInputsToFitInBlock { size: u64, limit: u64 },

    #[error("composed fee {actual} does not match expected {expected}")]
    InvalidFee { expected: u64, actual: u64 },

    #[error("output amount {0} is not a pretty denomination")]
    NotPrettyDenomination(u64),

    #[error("not enough inputs for a fusion transaction: need {need}, have {have}")]
    NotEnoughFusionInputs { need: usize, have: usize },

    #[error("invalid transaction: {0}")]
    Invalid(String),

    #[error("cryptographic operation failed: {0}")]
    Crypto(String),
}
