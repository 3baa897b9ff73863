//! Shared data model for the wallet core: address encoding, mnemonic seed
//! phrases, protocol constants, and the types describing subwallets,
//! transaction inputs, history entries, and sync status.

pub mod address;
pub mod base58;
pub mod constants;
pub mod mnemonic;
pub mod model;
pub mod wire;
pub mod wordlist_en;

pub use address::{AddressError, ParsedAddress};
pub use constants::AddressType;
pub use model::{
    is_unlocked, KeyBytes, PreparedTransaction, Subwallet, SynchronizationStatus, Transaction,
    TransactionInput,
};
pub use wire::{RawBlock, RawOutput, RawSpentInput, RawTransaction, TopBlock};
