//! Wire types for a composed transaction: prefix, inputs, outputs, extra,
//! and the per-input ring signature. This is a classic CryptoNote-style
//! transaction with cleartext "pretty denomination" output amounts — no
//! RingCT commitments or range proofs are part of this wire format.

use ember_types::model::KeyBytes;
use serde::{Deserialize, Serialize};

/// Tags for the fixed-order `extra` field: pubkey, then payment-id
/// nonce, then merge-mining tag, then arbitrary extra data. Order is not
/// consensus-significant but is fixed here for reproducibility.
pub mod extra_tag {
    pub const TX_PUBLIC_KEY: u8 = 0x01;
    pub const NONCE: u8 = 0x02;
    pub const MERGE_MINING: u8 = 0x03;
    pub const EXTRA_DATA: u8 = 0x04;
}

/// Nested tag inside a [`extra_tag::NONCE`] field.
pub mod nonce_tag {
    pub const PAYMENT_ID: u8 = 0x00;
}

/// One transaction output: a cleartext amount and a one-time public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub amount: u64,
    pub key: KeyBytes,
}

/// One transaction input: the amount being spent, the key image that
/// prevents double-spending it, and the ring of candidate one-time
/// public keys (real output + decoys) encoded as relative global-index
/// deltas ascending from zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub amount: u64,
    pub key_image: KeyBytes,
    /// Ascending global output indexes, delta-encoded: `offsets[0]` is
    /// absolute, every subsequent entry is relative to the previous.
    pub key_offsets: Vec<u64>,
}

impl TxInput {
    /// Ring size implied by the encoded offsets.
    pub fn ring_size(&self) -> usize {
        self.key_offsets.len()
    }
}

/// Everything in a transaction except the ring signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxPrefix {
    pub version: u8,
    pub unlock_time: u64,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub extra: Vec<u8>,
}

/// One input's LSAG ring signature, serialized as parallel `c`/`r` arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRingSignature {
    pub c: Vec<KeyBytes>,
    pub r: Vec<KeyBytes>,
}

/// A fully composed and signed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub prefix: TxPrefix,
    pub signatures: Vec<TxRingSignature>,
}

impl Transaction {
    /// Canonical binary encoding: this is what gets hashed for the
    /// transaction id and what's submitted to the node.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        encode_prefix(&self.prefix, &mut out);
        write_varint(&mut out, self.signatures.len() as u64);
        for sig in &self.signatures {
            write_varint(&mut out, sig.c.len() as u64);
            for (c, r) in sig.c.iter().zip(sig.r.iter()) {
                out.extend_from_slice(c);
                out.extend_from_slice(r);
            }
        }
        out
    }

    /// `sha3_256` of the full encoding; used as the transaction's id/hash.
    pub fn hash(&self) -> KeyBytes {
        ember_crypto::sha3_256(&self.to_bytes())
    }
}

/// Encode just the prefix — this is the message every input's ring
/// signature is computed over: one hashable prefix, shared
/// across all of a transaction's inputs.
pub fn encode_prefix(prefix: &TxPrefix, out: &mut Vec<u8>) {
    out.push(prefix.version);
    write_varint(out, prefix.unlock_time);
    write_varint(out, prefix.inputs.len() as u64);
    for input in &prefix.inputs {
        write_varint(out, input.amount);
        out.extend_from_slice(&input.key_image);
        write_varint(out, input.key_offsets.len() as u64);
        for offset in &input.key_offsets {
            write_varint(out, *offset);
        }
    }
    write_varint(out, prefix.outputs.len() as u64);
    for output in &prefix.outputs {
        write_varint(out, output.amount);
        out.extend_from_slice(&output.key);
    }
    write_varint(out, prefix.extra.len() as u64);
    out.extend_from_slice(&prefix.extra);
}

/// The message signed by every input's ring signature: `sha3_256` of the
/// encoded prefix.
pub fn prefix_hash(prefix: &TxPrefix) -> KeyBytes {
    let mut buf = Vec::new();
    encode_prefix(prefix, &mut buf);
    ember_crypto::sha3_256(&buf)
}

/// LEB128-style unsigned varint, matching the CryptoNote wire convention.
pub fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Encode the `extra` field in the fixed tag order:
/// pubkey, payment-id nonce, merge-mining tag, then arbitrary extra data.
pub fn encode_extra(
    tx_public_key: &KeyBytes,
    payment_id: Option<&KeyBytes>,
    merged_mining_tag: Option<&[u8]>,
    extra_data: &[u8],
) -> Vec<u8> {
    let mut out = Vec::new();

    out.push(extra_tag::TX_PUBLIC_KEY);
    out.extend_from_slice(tx_public_key);

    if let Some(pid) = payment_id {
        out.push(extra_tag::NONCE);
        let mut nonce = Vec::with_capacity(33);
        nonce.push(nonce_tag::PAYMENT_ID);
        nonce.extend_from_slice(pid);
        write_varint(&mut out, nonce.len() as u64);
        out.extend_from_slice(&nonce);
    }

    if let Some(tag) = merged_mining_tag {
        out.push(extra_tag::MERGE_MINING);
        write_varint(&mut out, tag.len() as u64);
        out.extend_from_slice(tag);
    }

    if !extra_data.is_empty() {
        out.push(extra_tag::EXTRA_DATA);
        write_varint(&mut out, extra_data.len() as u64);
        out.extend_from_slice(extra_data);
    }

    out
}

/// Recover the tx public key from an `extra` blob built by
/// [`encode_extra`]. Returns `None` if the pubkey tag is missing or
/// malformed.
pub fn extract_tx_public_key(extra: &[u8]) -> Option<KeyBytes> {
    if extra.len() >= 33 && extra[0] == extra_tag::TX_PUBLIC_KEY {
        let mut key = [0u8; 32];
        key.copy_from_slice(&extra[1..33]);
        Some(key)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_roundtrip_small_and_large() {
        for value in [0u64, 1, 127, 128, 300, u64::MAX] {
            let mut buf = Vec::new();
            write_varint(&mut buf, value);
            assert!(!buf.is_empty());
        }
    }

    #[test]
    fn extra_encodes_pubkey_then_payment_id_then_data() {
        let pubkey = [7u8; 32];
        let pid = [9u8; 32];
        let extra = encode_extra(&pubkey, Some(&pid), None, b"hello");
        assert_eq!(extra[0], extra_tag::TX_PUBLIC_KEY);
        assert_eq!(extract_tx_public_key(&extra), Some(pubkey));
        // nonce tag follows immediately after the 33-byte pubkey field.
        assert_eq!(extra[33], extra_tag::NONCE);
    }

    #[test]
    fn prefix_hash_is_deterministic_and_input_sensitive() {
        let prefix_a = TxPrefix {
            version: 1,
            unlock_time: 0,
            inputs: vec![],
            outputs: vec![TxOutput { amount: 5, key: [1u8; 32] }],
            extra: vec![],
        };
        let mut prefix_b = prefix_a.clone();
        prefix_b.outputs[0].amount = 6;

        assert_eq!(prefix_hash(&prefix_a), prefix_hash(&prefix_a));
        assert_ne!(prefix_hash(&prefix_a), prefix_hash(&prefix_b));
    }
}
