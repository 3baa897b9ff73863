//! Public address parsing, construction, and formatting.
//!
//! An address is `base58_check(prefix_varint || public_spend || public_view)`.
//! An integrated address folds a 32-byte payment ID into the payload and is
//! distinguished by a separate prefix:
//! `base58_check(prefix_varint || payment_id[32] || public_spend || public_view)`.

use crate::base58::{self, Base58Error};
use crate::constants::{
    address_data_size, AddressType, ADDRESS_PREFIX, INTEGRATED_ADDRESS_PREFIX, KEY_SIZE,
    PAYMENT_ID_SIZE,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("base58 decoding failed: {0}")]
    Base58(#[from] Base58Error),

    #[error("unknown address prefix {0}")]
    UnknownPrefix(u64),

    #[error("invalid payload length {actual} for address type (expected {expected})")]
    InvalidDataLength { expected: usize, actual: usize },

    #[error("payment id must be {PAYMENT_ID_SIZE} bytes, got {0}")]
    InvalidPaymentIdSize(usize),

    #[error("a standard address does not carry a payment id")]
    NotIntegrated,
}

/// A parsed public address: a prefix tag, the two public keys, and an
/// optional embedded payment ID for the integrated form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub address_type: AddressType,
    pub public_spend_key: [u8; KEY_SIZE],
    pub public_view_key: [u8; KEY_SIZE],
    pub payment_id: Option<[u8; PAYMENT_ID_SIZE]>,
}

impl ParsedAddress {
    pub fn is_integrated(&self) -> bool {
        matches!(self.address_type, AddressType::Integrated)
    }

    /// Re-encode this address to its base58 string form.
    pub fn to_address_string(&self) -> String {
        match self.address_type {
            AddressType::Standard => {
                create_address_raw(&self.public_spend_key, &self.public_view_key)
            }
            AddressType::Integrated => {
                let payment_id = self.payment_id.expect("integrated address carries a payment id");
                create_integrated_address_raw(&self.public_spend_key, &self.public_view_key, &payment_id)
            }
        }
    }
}

/// Parse a base58 address string, standard or integrated.
pub fn parse_address(address: &str) -> Result<ParsedAddress, AddressError> {
    if address.is_empty() {
        return Err(AddressError::Empty);
    }

    let (tag, data) = base58::decode_address(address)?;

    let address_type = if tag == ADDRESS_PREFIX {
        AddressType::Standard
    } else if tag == INTEGRATED_ADDRESS_PREFIX {
        AddressType::Integrated
    } else {
        return Err(AddressError::UnknownPrefix(tag));
    };

    let expected = address_data_size(address_type);
    if data.len() != expected {
        return Err(AddressError::InvalidDataLength {
            expected,
            actual: data.len(),
        });
    }

    let (payment_id, keys) = match address_type {
        AddressType::Standard => (None, &data[..]),
        AddressType::Integrated => {
            let mut pid = [0u8; PAYMENT_ID_SIZE];
            pid.copy_from_slice(&data[..PAYMENT_ID_SIZE]);
            (Some(pid), &data[PAYMENT_ID_SIZE..])
        }
    };

    let mut public_spend_key = [0u8; KEY_SIZE];
    let mut public_view_key = [0u8; KEY_SIZE];
    public_spend_key.copy_from_slice(&keys[..KEY_SIZE]);
    public_view_key.copy_from_slice(&keys[KEY_SIZE..KEY_SIZE * 2]);

    Ok(ParsedAddress {
        address_type,
        public_spend_key,
        public_view_key,
        payment_id,
    })
}

/// Check whether a string decodes to a well-formed address of either kind.
pub fn is_valid_address(address: &str) -> bool {
    parse_address(address).is_ok()
}

/// Build a standard address string from its two public keys.
pub fn create_address_raw(public_spend_key: &[u8; KEY_SIZE], public_view_key: &[u8; KEY_SIZE]) -> String {
    let mut data = Vec::with_capacity(KEY_SIZE * 2);
    data.extend_from_slice(public_spend_key);
    data.extend_from_slice(public_view_key);
    base58::encode_address(ADDRESS_PREFIX, &data)
}

/// Build an integrated address string from its two public keys and a
/// 32-byte payment ID.
pub fn create_integrated_address_raw(
    public_spend_key: &[u8; KEY_SIZE],
    public_view_key: &[u8; KEY_SIZE],
    payment_id: &[u8; PAYMENT_ID_SIZE],
) -> String {
    let mut data = Vec::with_capacity(PAYMENT_ID_SIZE + KEY_SIZE * 2);
    data.extend_from_slice(payment_id);
    data.extend_from_slice(public_spend_key);
    data.extend_from_slice(public_view_key);
    base58::encode_address(INTEGRATED_ADDRESS_PREFIX, &data)
}

/// Fold a payment ID into a standard address, producing an integrated one.
pub fn to_integrated_address(
    address: &str,
    payment_id: &[u8],
) -> Result<String, AddressError> {
    if payment_id.len() != PAYMENT_ID_SIZE {
        return Err(AddressError::InvalidPaymentIdSize(payment_id.len()));
    }
    let parsed = parse_address(address)?;
    if parsed.is_integrated() {
        return Err(AddressError::UnknownPrefix(INTEGRATED_ADDRESS_PREFIX));
    }
    let mut pid = [0u8; PAYMENT_ID_SIZE];
    pid.copy_from_slice(payment_id);
    Ok(create_integrated_address_raw(
        &parsed.public_spend_key,
        &parsed.public_view_key,
        &pid,
    ))
}

/// Strip the payment ID from an integrated address, recovering the
/// standard address and the payment ID that was embedded in it.
pub fn to_standard_address(address: &str) -> Result<(String, [u8; PAYMENT_ID_SIZE]), AddressError> {
    let parsed = parse_address(address)?;
    let payment_id = parsed.payment_id.ok_or(AddressError::NotIntegrated)?;
    Ok((
        create_address_raw(&parsed.public_spend_key, &parsed.public_view_key),
        payment_id,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> [u8; KEY_SIZE] {
        [byte; KEY_SIZE]
    }

    #[test]
    fn standard_address_roundtrip() {
        let spend = key(1);
        let view = key(2);
        let address = create_address_raw(&spend, &view);
        let parsed = parse_address(&address).unwrap();
        assert_eq!(parsed.address_type, AddressType::Standard);
        assert_eq!(parsed.public_spend_key, spend);
        assert_eq!(parsed.public_view_key, view);
        assert!(parsed.payment_id.is_none());
        assert_eq!(parsed.to_address_string(), address);
    }

    #[test]
    fn integrated_address_roundtrip() {
        let spend = key(3);
        let view = key(4);
        let payment_id = [9u8; PAYMENT_ID_SIZE];
        let address = create_integrated_address_raw(&spend, &view, &payment_id);
        let parsed = parse_address(&address).unwrap();
        assert_eq!(parsed.address_type, AddressType::Integrated);
        assert_eq!(parsed.payment_id, Some(payment_id));
    }

    #[test]
    fn integrated_conversion_roundtrip() {
        let spend = key(5);
        let view = key(6);
        let standard = create_address_raw(&spend, &view);
        let payment_id = [7u8; PAYMENT_ID_SIZE];
        let integrated = to_integrated_address(&standard, &payment_id).unwrap();
        let (recovered_standard, recovered_payment_id) = to_standard_address(&integrated).unwrap();
        assert_eq!(recovered_standard, standard);
        assert_eq!(recovered_payment_id, payment_id);
    }

    #[test]
    fn rejects_unknown_prefix() {
        let bogus = base58::encode_address(42, &[0xAB; 64]);
        assert!(matches!(parse_address(&bogus), Err(AddressError::UnknownPrefix(42))));
    }

    #[test]
    fn rejects_wrong_payload_length() {
        let bogus = base58::encode_address(ADDRESS_PREFIX, &[0xAB; 10]);
        assert!(matches!(
            parse_address(&bogus),
            Err(AddressError::InvalidDataLength { .. })
        ));
    }

    #[test]
    fn rejects_empty_string() {
        assert!(matches!(parse_address(""), Err(AddressError::Empty)));
    }
}
