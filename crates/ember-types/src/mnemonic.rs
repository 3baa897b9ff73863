//! 25-word mnemonic seed encoding/decoding.
//!
//! 25 words = 24 data words + 1 checksum word. Each group of 3 words encodes
//! 4 bytes (32 bits) using the CryptoNote base-1626 packing with wraparound,
//! and the final word is a CRC32-selected checksum of the first 24.

use crate::wordlist_en::{ENGLISH_WORDS, PREFIX_LENGTH, WORD_COUNT};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MnemonicError {
    #[error("expected 25 words, got {0}")]
    WrongWordCount(usize),

    #[error("unknown word \"{word}\" at position {position}")]
    UnknownWord { word: String, position: usize },

    #[error("checksum mismatch: expected \"{expected}\", got \"{actual}\"")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("invalid word encoding at position {0}")]
    InvalidEncoding(usize),

    #[error("seed must be 32 bytes, got {0}")]
    InvalidSeedLength(usize),
}

/// CRC32 (same polynomial as zlib/PNG).
fn crc32(data: &str) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for byte in data.bytes() {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xEDB8_8320
            } else {
                crc >> 1
            };
        }
    }
    crc ^ 0xFFFF_FFFF
}

fn find_word(word: &str) -> Option<usize> {
    ENGLISH_WORDS.iter().position(|&w| w == word)
}

/// Decode a 25-word mnemonic to a 256-bit seed.
pub fn mnemonic_to_seed(mnemonic: &str) -> Result<[u8; 32], MnemonicError> {
    let words: Vec<String> = mnemonic
        .to_lowercase()
        .split_whitespace()
        .map(|s| s.to_string())
        .collect();

    if words.len() != 25 {
        return Err(MnemonicError::WrongWordCount(words.len()));
    }

    let mut indices = Vec::with_capacity(25);
    for (i, word) in words.iter().enumerate() {
        let idx = find_word(word).ok_or_else(|| MnemonicError::UnknownWord {
            word: word.clone(),
            position: i + 1,
        })?;
        indices.push(idx as u32);
    }

    let checksum_data: String = words[..24]
        .iter()
        .map(|w| &w[..w.len().min(PREFIX_LENGTH)])
        .collect::<Vec<_>>()
        .join("");
    let checksum_index = (crc32(&checksum_data) % 24) as usize;

    let expected_prefix = &words[checksum_index][..words[checksum_index].len().min(PREFIX_LENGTH)];
    let actual_prefix = &words[24][..words[24].len().min(PREFIX_LENGTH)];

    if expected_prefix != actual_prefix {
        return Err(MnemonicError::ChecksumMismatch {
            expected: words[checksum_index].clone(),
            actual: words[24].clone(),
        });
    }

    let n = WORD_COUNT as u32;
    let mut seed = [0u8; 32];

    for i in 0..8 {
        let w1 = indices[i * 3];
        let w2 = indices[i * 3 + 1];
        let w3 = indices[i * 3 + 2];

        let val = w1 + n * (((n - w1) + w2) % n) + n * n * (((n - w2) + w3) % n);

        if val % n != w1 {
            return Err(MnemonicError::InvalidEncoding(i * 3 + 1));
        }

        seed[i * 4] = (val & 0xFF) as u8;
        seed[i * 4 + 1] = ((val >> 8) & 0xFF) as u8;
        seed[i * 4 + 2] = ((val >> 16) & 0xFF) as u8;
        seed[i * 4 + 3] = ((val >> 24) & 0xFF) as u8;
    }

    Ok(seed)
}

/// Encode a 256-bit seed to a 25-word mnemonic.
pub fn seed_to_mnemonic(seed: &[u8; 32]) -> String {
    let n = WORD_COUNT as u32;
    let mut words = Vec::with_capacity(25);

    for i in 0..8 {
        let val = seed[i * 4] as u32
            | ((seed[i * 4 + 1] as u32) << 8)
            | ((seed[i * 4 + 2] as u32) << 16)
            | ((seed[i * 4 + 3] as u32) << 24);

        let w1 = val % n;
        let w2 = (val / n + w1) % n;
        let w3 = (val / n / n + w2) % n;

        words.push(ENGLISH_WORDS[w1 as usize]);
        words.push(ENGLISH_WORDS[w2 as usize]);
        words.push(ENGLISH_WORDS[w3 as usize]);
    }

    let checksum_data: String = words
        .iter()
        .map(|w| &w[..w.len().min(PREFIX_LENGTH)])
        .collect::<Vec<_>>()
        .join("");
    let checksum_index = (crc32(&checksum_data) % 24) as usize;
    words.push(words[checksum_index]);

    words.join(" ")
}

/// Validate a mnemonic's word count, membership, and checksum without
/// returning the seed.
pub fn validate_mnemonic(mnemonic: &str) -> Result<(), MnemonicError> {
    mnemonic_to_seed(mnemonic).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_known() {
        assert_eq!(crc32(""), 0);
        assert_ne!(crc32("hello"), 0);
    }

    #[test]
    fn test_seed_mnemonic_roundtrip() {
        let seed = [
            0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66,
            0x77, 0x88, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55,
            0x66, 0x77, 0x88, 0x99,
        ];

        let mnemonic = seed_to_mnemonic(&seed);
        let words: Vec<&str> = mnemonic.split_whitespace().collect();
        assert_eq!(words.len(), 25);

        let decoded = mnemonic_to_seed(&mnemonic).unwrap();
        assert_eq!(decoded, seed);
    }

    #[test]
    fn test_zero_seed_roundtrip() {
        let seed = [0u8; 32];
        let mnemonic = seed_to_mnemonic(&seed);
        assert_eq!(mnemonic_to_seed(&mnemonic).unwrap(), seed);
    }

    #[test]
    fn test_wrong_word_count() {
        let result = mnemonic_to_seed("one two three");
        assert!(matches!(result, Err(MnemonicError::WrongWordCount(3))));
    }

    #[test]
    fn test_unknown_word() {
        let mut words = vec!["zzzznotaword".to_string()];
        words.extend((0..24).map(|_| ENGLISH_WORDS[0].to_string()));
        let mnemonic = words.join(" ");
        let result = mnemonic_to_seed(&mnemonic);
        assert!(matches!(result, Err(MnemonicError::UnknownWord { .. })));
    }

    #[test]
    fn test_corrupted_checksum_rejected() {
        let seed = [7u8; 32];
        let mnemonic = seed_to_mnemonic(&seed);
        let mut words: Vec<&str> = mnemonic.split_whitespace().collect();
        let replacement = if words[24] == ENGLISH_WORDS[0] {
            ENGLISH_WORDS[1]
        } else {
            ENGLISH_WORDS[0]
        };
        words[24] = replacement;
        let corrupted = words.join(" ");
        assert!(matches!(
            mnemonic_to_seed(&corrupted),
            Err(MnemonicError::ChecksumMismatch { .. })
        ));
    }
}
