//! LSAG (linkable spontaneous anonymous group) ring signatures.
//!
//! Signs a message over an n-member ring with a key image: the verifier
//! checks
//! `Σ c_i ≡ c(m, L_0, R_0, …, L_{n-1}, R_{n-1}) (mod ℓ)` where
//! `L_i = r_i·G + c_i·P_i` and `R_i = r_i·Hp(P_i) + c_i·I`.

use crate::hash::{hash_to_point, hash_to_scalar};
use crate::point::{double_scalar_mul_vartime, point_add, point_scalar_mul, point_to_bytes, scalar_mul_base, Point};
use crate::scalar::{random_scalar, Scalar};
use curve25519_dalek::traits::Identity;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct RingSignature {
    pub c: Vec<Scalar>,
    pub r: Vec<Scalar>,
}

#[derive(Debug, Error)]
pub enum RingSignatureError {
    #[error("ring must have at least one member")]
    EmptyRing,

    #[error("signer index {index} out of range for ring of size {ring_size}")]
    SignerIndexOutOfRange { index: usize, ring_size: usize },

    #[error("signature component count does not match ring size")]
    MalformedSignature,
}

/// Aggregate challenge `c(m, L_0, R_0, …, L_{n-1}, R_{n-1})`: hash the
/// message together with every `(L_i, R_i)` pair, reduced mod ℓ.
fn aggregate_challenge(message: &[u8; 32], ls: &[Point], rs: &[Point]) -> Scalar {
    let mut buf = Vec::with_capacity(32 + ls.len() * 64);
    buf.extend_from_slice(message);
    for (l, r) in ls.iter().zip(rs.iter()) {
        buf.extend_from_slice(&point_to_bytes(l));
        buf.extend_from_slice(&point_to_bytes(r));
    }
    hash_to_scalar(&buf)
}

/// Sign `message` over the ring `ring_public_keys`, knowing the private key
/// `signer_secret` at `signer_index` (`ring_public_keys[signer_index] ==
/// signer_secret·G`) and the key image `key_image = signer_secret·Hp(P_s)`.
///
/// All nonces (`alpha`, and the uniform `r_i`/`c_i` for `i != signer_index`)
/// are drawn from a cryptographic RNG.
pub fn lsag_sign(
    message: &[u8; 32],
    ring_public_keys: &[Point],
    signer_index: usize,
    signer_secret: &Scalar,
    key_image: &Point,
) -> Result<RingSignature, RingSignatureError> {
    let n = ring_public_keys.len();
    if n == 0 {
        return Err(RingSignatureError::EmptyRing);
    }
    if signer_index >= n {
        return Err(RingSignatureError::SignerIndexOutOfRange {
            index: signer_index,
            ring_size: n,
        });
    }

    let hp: Vec<Point> = ring_public_keys
        .iter()
        .map(|p| hash_to_point(&point_to_bytes(p)))
        .collect();

    let mut c = vec![Scalar::ZERO; n];
    let mut r = vec![Scalar::ZERO; n];
    let mut ls = vec![Point::identity(); n];
    let mut rs = vec![Point::identity(); n];

    // Decoy members: uniform c_i, r_i, with L_i/R_i derived from them.
    let mut sum_other_c = Scalar::ZERO;
    for i in 0..n {
        if i == signer_index {
            continue;
        }
        c[i] = random_scalar();
        r[i] = random_scalar();
        ls[i] = point_add(&scalar_mul_base(&r[i]), &point_scalar_mul(&ring_public_keys[i], &c[i]));
        rs[i] = point_add(&point_scalar_mul(&hp[i], &r[i]), &point_scalar_mul(key_image, &c[i]));
        sum_other_c += c[i];
    }

    // Signer's member: L_s = alpha*G, R_s = alpha*Hp(P_s), closed once every
    // other (L,R) pair is fixed so the aggregate hash is well-defined.
    let alpha = random_scalar();
    ls[signer_index] = scalar_mul_base(&alpha);
    rs[signer_index] = point_scalar_mul(&hp[signer_index], &alpha);

    let challenge = aggregate_challenge(message, &ls, &rs);
    c[signer_index] = challenge - sum_other_c;
    r[signer_index] = alpha - c[signer_index] * signer_secret;

    Ok(RingSignature { c, r })
}

/// Verify an LSAG ring signature.
pub fn lsag_verify(
    message: &[u8; 32],
    ring_public_keys: &[Point],
    key_image: &Point,
    signature: &RingSignature,
) -> Result<bool, RingSignatureError> {
    let n = ring_public_keys.len();
    if n == 0 {
        return Err(RingSignatureError::EmptyRing);
    }
    if signature.c.len() != n || signature.r.len() != n {
        return Err(RingSignatureError::MalformedSignature);
    }

    let hp: Vec<Point> = ring_public_keys
        .iter()
        .map(|p| hash_to_point(&point_to_bytes(p)))
        .collect();

    let mut ls = vec![Point::identity(); n];
    let mut rs = vec![Point::identity(); n];
    let mut sum_c = Scalar::ZERO;

    for i in 0..n {
        ls[i] = double_scalar_mul_vartime(&signature.c[i], &ring_public_keys[i], &signature.r[i]);
        rs[i] = point_add(
            &point_scalar_mul(&hp[i], &signature.r[i]),
            &point_scalar_mul(key_image, &signature.c[i]),
        );
        sum_c += signature.c[i];
    }

    let expected = aggregate_challenge(message, &ls, &rs);
    Ok(sum_c == expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivation::generate_key_image;
    use crate::point::scalar_mul_base;
    use crate::scalar::scalar_from_bytes_reduce;

    fn scalar(byte: u8) -> Scalar {
        scalar_from_bytes_reduce(&[byte; 32])
    }

    #[test]
    fn sign_then_verify_succeeds() {
        let message = [42u8; 32];
        let signer_secret = scalar(7);
        let signer_public = scalar_mul_base(&signer_secret);
        let decoys: Vec<Point> = (1..5).map(|b| scalar_mul_base(&scalar(b))).collect();

        let mut ring = decoys;
        let signer_index = 2;
        ring.insert(signer_index, signer_public);

        let key_image = generate_key_image(&signer_public, &signer_secret);
        let sig = lsag_sign(&message, &ring, signer_index, &signer_secret, &key_image).unwrap();

        assert!(lsag_verify(&message, &ring, &key_image, &sig).unwrap());
    }

    #[test]
    fn verify_rejects_tampered_signature() {
        let message = [1u8; 32];
        let signer_secret = scalar(3);
        let signer_public = scalar_mul_base(&signer_secret);
        let ring = vec![signer_public, scalar_mul_base(&scalar(9))];

        let key_image = generate_key_image(&signer_public, &signer_secret);
        let mut sig = lsag_sign(&message, &ring, 0, &signer_secret, &key_image).unwrap();
        sig.c[0] += Scalar::from(1u64);

        assert!(!lsag_verify(&message, &ring, &key_image, &sig).unwrap());
    }

    #[test]
    fn verify_rejects_wrong_key_image() {
        let message = [2u8; 32];
        let signer_secret = scalar(5);
        let signer_public = scalar_mul_base(&signer_secret);
        let ring = vec![signer_public, scalar_mul_base(&scalar(11))];

        let key_image = generate_key_image(&signer_public, &signer_secret);
        let sig = lsag_sign(&message, &ring, 0, &signer_secret, &key_image).unwrap();

        let wrong_image = generate_key_image(&signer_public, &scalar(99));
        assert!(!lsag_verify(&message, &ring, &wrong_image, &sig).unwrap());
    }

    #[test]
    fn single_member_ring_signs_and_verifies() {
        let message = [9u8; 32];
        let secret = scalar(1);
        let public = scalar_mul_base(&secret);
        let ring = vec![public];
        let key_image = generate_key_image(&public, &secret);
        let sig = lsag_sign(&message, &ring, 0, &secret, &key_image).unwrap();
        assert!(lsag_verify(&message, &ring, &key_image, &sig).unwrap());
    }
}
