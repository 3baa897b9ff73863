//! Network constants, address prefixes, and protocol limits.
//!
//! Reference: original node's `cryptonote_config.h`.

// =============================================================================
// Address Prefixes
// =============================================================================

/// Base58 varint prefix for standard addresses.
pub const ADDRESS_PREFIX: u64 = 999730;

/// Base58 varint prefix for integrated addresses (standard prefix + 1; the
/// upstream config does not define a separate constant for this, so the
/// distinct prefix required by the address format is derived from it).
pub const INTEGRATED_ADDRESS_PREFIX: u64 = 999731;

/// Address type distinguished by which prefix it decodes under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressType {
    Standard,
    Integrated,
}

// =============================================================================
// Key and Data Sizes
// =============================================================================

/// Size of a public/private key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of the address checksum in bytes.
pub const CHECKSUM_SIZE: usize = 4;

/// Size of the payment ID embedded in an integrated address, in bytes.
pub const PAYMENT_ID_SIZE: usize = 32;

/// Address data sizes (without prefix), indexed by address type.
pub fn address_data_size(addr_type: AddressType) -> usize {
    match addr_type {
        AddressType::Standard => KEY_SIZE * 2,
        AddressType::Integrated => KEY_SIZE * 2 + PAYMENT_ID_SIZE,
    }
}

// =============================================================================
// Consensus / Protocol Constants
// =============================================================================

/// Target seconds between blocks.
pub const DIFFICULTY_TARGET: u64 = 60;

/// Ceiling on block height; used to bound scan ranges and sanity-check RPC
/// responses.
pub const MAX_BLOCK_NUMBER: u64 = 500_000_000;

/// Number of blocks a coinbase output stays locked before it is spendable.
pub const MINED_MONEY_UNLOCK_WINDOW: u64 = 40;

/// Blocks of slack allowed between a locked transaction's unlock height and
/// the chain tip when checking "about to unlock soon".
pub const LOCKED_TX_ALLOWED_DELTA_BLOCKS: u64 = 1;

/// Flat minimum fee (atomic units) before the per-byte fee regime.
pub const MINIMUM_FEE: u64 = 5;

/// Flat minimum fee (atomic units) once the V1 fee schedule activates.
pub const MINIMUM_FEE_V1: u64 = 50_000;

/// Height at which `MINIMUM_FEE_V1` plus the unlock window are enforced.
pub const MINIMUM_FEE_V1_HEIGHT: u64 = 678_500;

/// Minimum number of inputs for a transaction to qualify as a fusion
/// (self-consolidation) transaction.
pub const FUSION_TX_MIN_INPUT_COUNT: usize = 12;

/// Minimum ratio of inputs to outputs for a fusion transaction.
pub const FUSION_TX_MIN_IN_OUT_COUNT_RATIO: usize = 4;

/// Maximum size, in bytes, of the `extra` field before the V2 limit
/// activates.
pub const MAX_EXTRA_SIZE: usize = 140_000;

/// Maximum size, in bytes, of the `extra` field once the V2 limit activates.
pub const MAX_EXTRA_SIZE_V2: usize = 1024;

/// Height at which `MAX_EXTRA_SIZE_V2` activates.
pub const MAX_EXTRA_SIZE_V2_HEIGHT: u64 = 543_000;

/// Initial block size ceiling in bytes, used as a starting point for
/// dynamic block size growth.
pub const MAX_BLOCK_SIZE_INITIAL: usize = 100_000;

// =============================================================================
// Ring Size / Mixin Bounds
// =============================================================================

/// Default ring size (mixin + 1) used when composing a transaction.
pub const DEFAULT_RING_SIZE: usize = 16;

/// Lowest permitted mixin at any height.
pub const MIN_MIXIN: u64 = 1;

/// Highest permitted mixin at any height.
pub const MAX_MIXIN: u64 = 15;

pub fn min_mixin(_height: u64) -> u64 {
    MIN_MIXIN
}

pub fn max_mixin(_height: u64) -> u64 {
    MAX_MIXIN
}

// =============================================================================
// Fee Schedule
// =============================================================================

/// Per-byte fee floor, in atomic units, once the V1 schedule activates.
/// Divided by `CHUNK_SIZE` to get the per-byte rate; fees are rounded up to
/// whole chunks.
pub const MIN_FEE_PER_BYTE_V1: u64 = 500;

/// Byte granularity at which the per-byte fee is rounded up.
pub const CHUNK_SIZE: u64 = 256;

/// Minimum fee before the V1 fee schedule activates (alias kept for the
/// pre-V1 era name).
pub const MIN_FEE_V0: u64 = MINIMUM_FEE;

/// Minimum fee once the V1 fee schedule activates.
pub const MIN_FEE_V1: u64 = MINIMUM_FEE_V1;

/// Height at which the V1 fee schedule activates (alias of
/// `MINIMUM_FEE_V1_HEIGHT`).
pub const MIN_FEE_V1_HEIGHT: u64 = MINIMUM_FEE_V1_HEIGHT;

// =============================================================================
// Output / Transaction Size Limits
// =============================================================================

/// Largest amount permitted in a single output when composing a
/// transaction; larger "pretty" pieces are split across multiple outputs.
pub const MAX_OUTPUT_SIZE_CLIENT: u64 = 100_000_000_000;

/// Block size growth: numerator/denominator of the per-height linear term
/// added to `MAX_BLOCK_SIZE_INITIAL`.
pub const MAX_BLOCK_SIZE_GROWTH_SPEED_NUMERATOR: u64 = 100;
pub const MAX_BLOCK_SIZE_GROWTH_SPEED_DENOMINATOR: u64 = 1;

/// Hard ceiling on the dynamic block size, in bytes.
pub const MAX_BLOCK_SIZE_CAP: u64 = 125_000;

/// Bytes reserved in every block for the coinbase transaction, subtracted
/// from the dynamic block size to get the budget available to client
/// transactions.
pub const CRYPTONOTE_COINBASE_BLOB_RESERVED_SIZE: u64 = 600;

/// Maximum serialized transaction size allowed at a given height.
pub fn max_tx_size(height: u64) -> u64 {
    let dynamic = MAX_BLOCK_SIZE_INITIAL as u64
        + height * MAX_BLOCK_SIZE_GROWTH_SPEED_NUMERATOR / MAX_BLOCK_SIZE_GROWTH_SPEED_DENOMINATOR;
    dynamic.min(MAX_BLOCK_SIZE_CAP) - CRYPTONOTE_COINBASE_BLOB_RESERVED_SIZE
}

/// Maximum size, in bytes, of a fusion (self-consolidation) transaction.
pub const FUSION_TX_MAX_SIZE: u64 = 40_960;

// =============================================================================
// Network / Concurrency Defaults
// =============================================================================

/// Default request timeout for node RPC calls, in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Interval at which the node client refreshes its cached `get_info`
/// snapshot, in seconds.
pub const INFO_REFRESH_INTERVAL_SECS: u64 = 10;

/// Interval at which the sync coordinator polls for cancelled
/// (never-confirmed) outgoing transactions, in seconds.
pub const LOCKED_TX_CHECK_INTERVAL_SECS: u64 = 15;

/// Memory budget for the block downloader's look-ahead queue, in bytes.
pub const BLOCK_DOWNLOADER_MEMORY_LIMIT: usize = 50 * 1024 * 1024;

/// Assumed worst-case size of a single `get_wallet_sync_data` response, in
/// bytes; the downloader stops requesting more once queue usage plus one
/// response would exceed the memory budget.
pub const BLOCK_DOWNLOADER_MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024;

/// Default number of blocks requested per `get_wallet_sync_data` call.
pub const DEFAULT_BLOCK_COUNT: usize = 100;

/// Seconds to sleep after a request returns zero blocks and no new tip.
pub const BLOCK_DOWNLOADER_IDLE_SLEEP_SECS: u64 = 5;

// =============================================================================
// Persistence
// =============================================================================

/// Magic bytes identifying an ember-wallet container file.
pub const WALLET_FILE_MAGIC: [u8; 8] = *b"EMBERWLT";

/// Current on-disk wallet file format version.
pub const WALLET_FILE_FORMAT_VERSION: u8 = 1;

/// PBKDF2-SHA256 iteration count used to derive the AES key from the
/// wallet password.
pub const PBKDF2_ITERATIONS: u32 = 500;

// =============================================================================
// Amount Helpers
// =============================================================================

/// Atomic units per coin (10^8).
pub const COIN: u64 = 100_000_000;

/// Number of decimal places for display.
pub const DISPLAY_DECIMAL_POINT: u32 = 8;

/// Format an atomic amount as a human-readable string (e.g., 1.23456789).
pub fn format_amount(atomic: u64) -> String {
    let whole = atomic / COIN;
    let frac = atomic % COIN;
    if frac == 0 {
        format!("{}.0", whole)
    } else {
        let frac_str = format!("{:08}", frac);
        let trimmed = frac_str.trim_end_matches('0');
        format!("{}.{}", whole, trimmed)
    }
}

/// Parse a human-readable amount string to atomic units.
pub fn parse_amount(s: &str) -> Option<u64> {
    let s = s.trim();
    let (whole_str, frac_str) = if let Some(dot_pos) = s.find('.') {
        (&s[..dot_pos], &s[dot_pos + 1..])
    } else {
        (s, "")
    };

    let whole: u64 = whole_str.parse().ok()?;
    let frac: u64 = if frac_str.is_empty() {
        0
    } else {
        if frac_str.len() > 8 {
            return None;
        }
        let padded = format!("{:0<8}", frac_str);
        padded.parse().ok()?
    };

    whole.checked_mul(COIN)?.checked_add(frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0), "0.0");
        assert_eq!(format_amount(100_000_000), "1.0");
        assert_eq!(format_amount(123_456_789), "1.23456789");
        assert_eq!(format_amount(100_000_001), "1.00000001");
        assert_eq!(format_amount(50_000_000), "0.5");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("0"), Some(0));
        assert_eq!(parse_amount("1.0"), Some(100_000_000));
        assert_eq!(parse_amount("1.23456789"), Some(123_456_789));
        assert_eq!(parse_amount("0.5"), Some(50_000_000));
        assert_eq!(parse_amount("100"), Some(10_000_000_000));
    }

    #[test]
    fn test_address_data_size() {
        assert_eq!(address_data_size(AddressType::Standard), 64);
        assert_eq!(address_data_size(AddressType::Integrated), 96);
    }

    #[test]
    fn test_minimum_fee_schedule() {
        assert_eq!(MINIMUM_FEE, 5);
        assert_eq!(MINIMUM_FEE_V1_HEIGHT + MINED_MONEY_UNLOCK_WINDOW, 678_540);
    }

    #[test]
    fn test_max_tx_size_caps_out() {
        let uncapped = max_tx_size(100);
        assert_eq!(
            uncapped,
            MAX_BLOCK_SIZE_INITIAL as u64 + 100 * MAX_BLOCK_SIZE_GROWTH_SPEED_NUMERATOR
                - CRYPTONOTE_COINBASE_BLOB_RESERVED_SIZE
        );
        let capped = max_tx_size(10_000_000);
        assert_eq!(capped, MAX_BLOCK_SIZE_CAP - CRYPTONOTE_COINBASE_BLOB_RESERVED_SIZE);
    }

    #[test]
    fn test_mixin_bounds() {
        assert_eq!(min_mixin(0), MIN_MIXIN);
        assert_eq!(max_mixin(0), MAX_MIXIN);
    }
}
