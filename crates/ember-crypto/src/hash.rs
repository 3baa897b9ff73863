//! Hashing primitives: Keccak-f[1600]-based `sha3_256` (NIST padding) and
//! `keccak256` (CryptoNote "fast hash", legacy Keccak padding), plus the
//! scalar/point hash-to- functions built on top of them.

use crate::point::{point_mul8, scalar_mul_base, Point};
use crate::scalar::{scalar_from_bytes_wide_reduce, Scalar};
use tiny_keccak::{Hasher, Keccak, Sha3};

/// NIST SHA3-256: Keccak-f[1600], rate 1088 / capacity 512, suffix byte
/// 0x06. This is the hash the wire/persistence formats and the `sha3_256`
/// test vector require — it must never be confused with [`keccak256`].
pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3::v256();
    let mut out = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut out);
    out
}

/// CryptoNote "fast hash": Keccak-f[1600] with the original 0x01 padding
/// byte (not the NIST SHA3 0x06 suffix). Kept distinct from `sha3_256`
/// because the two must never be conflated.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut out = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut out);
    out
}

/// `hash_to_scalar(bytes) = sha3_256(bytes) reduced mod ℓ`.
pub fn hash_to_scalar(data: &[u8]) -> Scalar {
    let digest = sha3_256(data);
    let mut wide = [0u8; 64];
    wide[..32].copy_from_slice(&digest);
    scalar_from_bytes_wide_reduce(&wide)
}

/// `hash_to_point(bytes) = mul8(hash_to_scalar(bytes)·G)`. It is domain
/// separated only by caller-supplied bytes; callers on both sides (sender
/// and receiver) MUST agree on this exact definition, since it underlies
/// key-image generation and ring-signature hashing to the curve.
pub fn hash_to_point(data: &[u8]) -> Point {
    point_mul8(&scalar_mul_base(&hash_to_scalar(data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `sha3_256(empty)` locked test vector.
    #[test]
    fn sha3_256_empty_matches_vector() {
        let digest = sha3_256(&[]);
        assert_eq!(
            hex::encode(digest),
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
        );
    }

    #[test]
    fn keccak256_differs_from_sha3_256() {
        assert_ne!(keccak256(b"abc"), sha3_256(b"abc"));
    }

    #[test]
    fn hash_to_point_is_deterministic() {
        assert_eq!(hash_to_point(b"same input"), hash_to_point(b"same input"));
    }

    #[test]
    fn hash_to_point_is_domain_separated_by_input() {
        assert_ne!(hash_to_point(b"a"), hash_to_point(b"b"));
    }
}
