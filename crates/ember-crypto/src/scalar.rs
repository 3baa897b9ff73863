//! `Scalar`: residues modulo the Ed25519 group order
//! `ℓ = 2^252 + 27742317777372353535851937790883648493`.
//!
//! Thin wrappers around `curve25519_dalek::scalar::Scalar` so call sites
//! read in terms of the operation performed (`sc_add`-style CryptoNote
//! naming is intentionally not used; the dalek type already does
//! modular reduction correctly and constant-time by default).

use curve25519_dalek::scalar::Scalar as DalekScalar;
use rand_core::OsRng;
use rand_core::RngCore;

/// A scalar modulo the Ed25519 group order `ℓ`.
pub type Scalar = DalekScalar;

/// Decode 32 little-endian bytes, reducing modulo `ℓ` (never fails: any
/// 256-bit value has a well-defined residue).
pub fn scalar_from_bytes_reduce(bytes: &[u8; 32]) -> Scalar {
    Scalar::from_bytes_mod_order(*bytes)
}

/// Decode 64 little-endian bytes (e.g. a wide hash), reducing modulo `ℓ`.
pub fn scalar_from_bytes_wide_reduce(bytes: &[u8; 64]) -> Scalar {
    Scalar::from_bytes_mod_order_wide(bytes)
}

/// Decode 32 bytes, requiring the canonical (already-reduced) encoding.
pub fn scalar_from_canonical_bytes(bytes: &[u8; 32]) -> Option<Scalar> {
    Scalar::from_canonical_bytes(*bytes).into()
}

/// Canonical 32-byte little-endian encoding.
pub fn scalar_to_bytes(s: &Scalar) -> [u8; 32] {
    s.to_bytes()
}

/// A uniformly random scalar drawn from a cryptographic RNG (`OsRng`),
/// suitable for ring-signature nonces.
pub fn random_scalar() -> Scalar {
    let mut bytes = [0u8; 64];
    OsRng.fill_bytes(&mut bytes);
    Scalar::from_bytes_mod_order_wide(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce_is_idempotent_on_canonical_input() {
        let bytes = scalar_to_bytes(&Scalar::from(42u64));
        assert_eq!(scalar_from_bytes_reduce(&bytes), Scalar::from(42u64));
    }

    #[test]
    fn random_scalars_differ() {
        assert_ne!(random_scalar(), random_scalar());
    }
}
