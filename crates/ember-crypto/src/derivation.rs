//! Stealth-address key derivation and key images.
//!
//! Domain constants here are part of the wire format and must match
//! bit-for-bit what a receiver/sender on the other end computes.

use crate::hash::{hash_to_point, hash_to_scalar};
use crate::point::{point_add, point_mul8, point_scalar_mul, scalar_mul_base, Point};
use crate::scalar::Scalar;

/// `DOMAIN_0`: the 32-byte ASCII string used as the domain separator in
/// `derivation_to_scalar`, padded with spaces to 32 bytes.
pub const DOMAIN_0: &[u8; 32] = b"you funds are inside this box   ";

/// `SUBWALLET_DOMAIN = hash_to_scalar(DOMAIN_0)`; used to derive
/// deterministic sub-wallet spend keys from the primary private spend key.
pub fn subwallet_domain() -> Scalar {
    hash_to_scalar(DOMAIN_0)
}

/// `VIEWKEY_DOMAIN = hash_to_scalar(SUBWALLET_DOMAIN)`.
pub fn viewkey_domain() -> Scalar {
    hash_to_scalar(&subwallet_domain().to_bytes())
}

/// `key_derivation(A, a) = mul8(a·A)`.
pub fn generate_key_derivation(tx_public_key: &Point, view_secret: &Scalar) -> Point {
    point_mul8(&point_scalar_mul(tx_public_key, view_secret))
}

/// `derivation_to_scalar(D, idx) = hash_to_scalar(DOMAIN_0 || D || u64_le(idx))`.
pub fn derivation_to_scalar(derivation: &Point, output_index: u64) -> Scalar {
    let mut buf = Vec::with_capacity(32 + 32 + 8);
    buf.extend_from_slice(DOMAIN_0);
    buf.extend_from_slice(&derivation.compress().to_bytes());
    buf.extend_from_slice(&output_index.to_le_bytes());
    hash_to_scalar(&buf)
}

/// `derive_public_key(D, idx, B) = derivation_to_scalar(D, idx)·G + B`.
pub fn derive_public_key(derivation: &Point, output_index: u64, base_spend_key: &Point) -> Point {
    let scalar = derivation_to_scalar(derivation, output_index);
    point_add(&scalar_mul_base(&scalar), base_spend_key)
}

/// `derive_secret_key(D, idx, b) = derivation_to_scalar(D, idx) + b (mod ℓ)`.
pub fn derive_secret_key(derivation: &Point, output_index: u64, base_spend_secret: &Scalar) -> Scalar {
    derivation_to_scalar(derivation, output_index) + base_spend_secret
}

/// `generate_key_image(P, x) = x · hash_to_point(P_bytes)`.
pub fn generate_key_image(one_time_public_key: &Point, one_time_secret_key: &Scalar) -> Point {
    let hp = hash_to_point(&one_time_public_key.compress().to_bytes());
    point_scalar_mul(&hp, one_time_secret_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::scalar_from_bytes_reduce;

    fn scalar(byte: u8) -> Scalar {
        scalar_from_bytes_reduce(&[byte; 32])
    }

    #[test]
    fn derive_public_then_derive_secret_match() {
        let view_secret = scalar(1);
        let tx_public_key = scalar_mul_base(&scalar(2));
        let derivation = generate_key_derivation(&tx_public_key, &view_secret);

        let spend_secret = scalar(9);
        let spend_public = scalar_mul_base(&spend_secret);

        let public = derive_public_key(&derivation, 0, &spend_public);
        let secret = derive_secret_key(&derivation, 0, &spend_secret);

        assert_eq!(scalar_mul_base(&secret), public);
    }

    #[test]
    fn key_image_is_deterministic() {
        let secret = scalar(3);
        let public = scalar_mul_base(&secret);
        assert_eq!(
            generate_key_image(&public, &secret),
            generate_key_image(&public, &secret)
        );
    }

    #[test]
    fn domain_0_is_32_bytes() {
        assert_eq!(DOMAIN_0.len(), 32);
    }
}
