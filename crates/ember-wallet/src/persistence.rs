//! Encrypted wallet file container (C9): magic/version/salt/IV/HMAC header
//! followed by AES-256-CBC ciphertext, keyed by PBKDF2-SHA256 over the
//! wallet password. Plaintext is canonical JSON.
//!
//! Layout (little-endian, byte offsets):
//!
//! ```text
//! 0   8   magic    b"EMBERWLT"
//! 8   1   version  WALLET_FILE_FORMAT_VERSION
//! 9   16  salt     random per save
//! 25  16  IV       random per save
//! 41  32  HMAC-SHA256 over [version..end-of-ciphertext]
//! 73  N   ciphertext (PKCS7-padded AES-256-CBC)
//! ```

use std::io::Write;
use std::path::Path;

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use ember_types::model::{KeyBytes, PreparedTransaction, SynchronizationStatus, Transaction};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use ember_types::constants::{PBKDF2_ITERATIONS, WALLET_FILE_FORMAT_VERSION, WALLET_FILE_MAGIC};

use crate::error::WalletError;

const SALT_LEN: usize = 16;
const IV_LEN: usize = 16;
const HMAC_LEN: usize = 32;
const HEADER_LEN: usize = 8 + 1 + SALT_LEN + IV_LEN + HMAC_LEN;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// The plaintext JSON schema: everything needed to reconstruct a
/// [`crate::container::Wallet`] without talking to a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletFile {
    #[serde(rename = "subWallets")]
    pub subwallets: Vec<ember_types::model::Subwallet>,
    #[serde(rename = "privateViewKey")]
    pub private_view_key: KeyBytes,
    #[serde(rename = "isViewWallet")]
    pub is_view_wallet: bool,
    pub transactions: Vec<Transaction>,
    #[serde(rename = "lockedTransactions")]
    pub locked_transactions: Vec<Transaction>,
    #[serde(rename = "synchronizationStatus")]
    pub synchronization_status: SynchronizationStatus,
    #[serde(rename = "syncStartTimestamp")]
    pub sync_start_timestamp: u64,
    #[serde(rename = "syncStartHeight")]
    pub sync_start_height: u64,
    #[serde(rename = "preparedTransactions")]
    pub prepared_transactions: Vec<PreparedTransaction>,
    #[serde(rename = "txPrivateKeys")]
    pub tx_private_keys: std::collections::HashMap<String, KeyBytes>,
}

fn derive_key(password: &str, salt: &[u8]) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    key
}

/// Encrypt and write `wallet` to `path`, atomically: write to `path.tmp`,
/// fsync, then rename over `path`.
pub fn save(path: &Path, password: &str, wallet: &WalletFile) -> Result<(), WalletError> {
    let plaintext =
        serde_json::to_vec(wallet).map_err(|e| WalletError::Other(format!("serializing wallet: {e}")))?;

    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    rand::thread_rng().fill_bytes(&mut iv);

    let key = derive_key(password, &salt);
    let ciphertext = Aes256CbcEnc::new(&key.into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(&plaintext);

    let mut mac = HmacSha256::new_from_slice(&key).expect("HMAC accepts any key length");
    mac.update(&[WALLET_FILE_FORMAT_VERSION]);
    mac.update(&salt);
    mac.update(&iv);
    mac.update(&ciphertext);
    let tag = mac.finalize().into_bytes();

    let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    out.extend_from_slice(&WALLET_FILE_MAGIC);
    out.push(WALLET_FILE_FORMAT_VERSION);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&iv);
    out.extend_from_slice(&tag);
    out.extend_from_slice(&ciphertext);

    let tmp_path = path.with_extension("tmp");
    let mut file = std::fs::File::create(&tmp_path)?;
    file.write_all(&out)?;
    file.sync_all()?;
    drop(file);
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Decrypt and parse a wallet file. Fails with [`WalletError::BadMagic`],
/// [`WalletError::UnsupportedVersion`], [`WalletError::DecryptionFailed`]
/// (HMAC mismatch — wrong password or corruption), or
/// [`WalletError::CorruptFile`] (truncated header/ciphertext or malformed
/// plaintext JSON).
pub fn load(path: &Path, password: &str) -> Result<WalletFile, WalletError> {
    let raw = std::fs::read(path)?;
    if raw.len() < HEADER_LEN {
        return Err(WalletError::CorruptFile("file shorter than header".into()));
    }

    let magic = &raw[0..8];
    if magic != WALLET_FILE_MAGIC {
        return Err(WalletError::BadMagic);
    }

    let version = raw[8];
    if version != WALLET_FILE_FORMAT_VERSION {
        return Err(WalletError::UnsupportedVersion(version));
    }

    let salt = &raw[9..9 + SALT_LEN];
    let iv = &raw[25..25 + IV_LEN];
    let tag = &raw[41..41 + HMAC_LEN];
    let ciphertext = &raw[HEADER_LEN..];

    let key = derive_key(password, salt);

    let mut mac = HmacSha256::new_from_slice(&key).expect("HMAC accepts any key length");
    mac.update(&[version]);
    mac.update(salt);
    mac.update(iv);
    mac.update(ciphertext);
    mac.verify_slice(tag).map_err(|_| WalletError::DecryptionFailed)?;

    let iv_array: [u8; IV_LEN] = iv.try_into().expect("slice length checked above");
    let plaintext = Aes256CbcDec::new(&key.into(), &iv_array.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| WalletError::DecryptionFailed)?;

    serde_json::from_slice(&plaintext)
        .map_err(|e| WalletError::CorruptFile(format!("plaintext is not a valid wallet file: {e}")))
}

/// Cheap sniff: does this file at least start with the wallet magic? Used
/// by the CLI to distinguish "wrong password" from "not a wallet file".
pub fn is_encrypted_wallet_file(path: &Path) -> bool {
    match std::fs::read(path) {
        Ok(bytes) => bytes.len() >= HEADER_LEN && bytes[0..8] == WALLET_FILE_MAGIC,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WalletFile {
        WalletFile {
            subwallets: vec![ember_types::model::Subwallet::new(
                [1u8; 32],
                [2u8; 32],
                "addr".into(),
                true,
                0,
            )],
            private_view_key: [3u8; 32],
            is_view_wallet: false,
            transactions: vec![],
            locked_transactions: vec![],
            synchronization_status: SynchronizationStatus::new(),
            sync_start_timestamp: 0,
            sync_start_height: 0,
            prepared_transactions: vec![],
            tx_private_keys: Default::default(),
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.bin");
        let wallet = sample();

        save(&path, "hunter2", &wallet).unwrap();
        let loaded = load(&path, "hunter2").unwrap();

        assert_eq!(loaded.subwallets.len(), wallet.subwallets.len());
        assert_eq!(loaded.private_view_key, wallet.private_view_key);
    }

    #[test]
    fn wrong_password_fails_hmac() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.bin");
        save(&path, "correct", &sample()).unwrap();

        let err = load(&path, "incorrect").unwrap_err();
        assert!(matches!(err, WalletError::DecryptionFailed));
    }

    #[test]
    fn truncated_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.bin");
        save(&path, "pw", &sample()).unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        bytes.truncate(10);
        std::fs::write(&path, bytes).unwrap();

        let err = load(&path, "pw").unwrap_err();
        assert!(matches!(err, WalletError::CorruptFile(_)));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.bin");
        std::fs::write(&path, vec![0u8; HEADER_LEN + 16]).unwrap();

        let err = load(&path, "pw").unwrap_err();
        assert!(matches!(err, WalletError::BadMagic));
    }

    #[test]
    fn save_is_atomic_and_leaves_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.bin");
        save(&path, "pw", &sample()).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }
}
