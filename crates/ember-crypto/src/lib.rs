//! Curve25519/Ed25519 field, scalar, and point arithmetic, Keccak-family
//! hashing, stealth-address key derivation, and LSAG ring signatures.
//!
//! This crate has no knowledge of wire formats, RPC, or persistence — it is
//! pure cryptographic building blocks, consumed by the higher-level wallet
//! and transaction-composer crates.

pub mod derivation;
pub mod elligator2;
pub mod field;
pub mod hash;
pub mod point;
pub mod ring;
pub mod scalar;

pub use derivation::{
    derivation_to_scalar, derive_public_key, derive_secret_key, generate_key_derivation,
    generate_key_image, subwallet_domain, viewkey_domain, DOMAIN_0,
};
pub use field::Fe;
pub use hash::{hash_to_point, hash_to_scalar, keccak256, sha3_256};
pub use point::{
    double_scalar_mul_vartime, point_add, point_from_bytes, point_mul8, point_scalar_mul,
    point_sub, point_to_bytes, scalar_mul_base, Point, PointError,
};
pub use ring::{lsag_sign, lsag_verify, RingSignature, RingSignatureError};
pub use scalar::{
    random_scalar, scalar_from_bytes_reduce, scalar_from_bytes_wide_reduce,
    scalar_from_canonical_bytes, scalar_to_bytes, Scalar,
};
