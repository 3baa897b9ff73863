//! `Point`: elements of the Ed25519 group, 32-byte compressed encoding, plus
//! the variable-time double-scalar multiplication used by ring-signature
//! and LSAG verification.

use crate::scalar::Scalar;
use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;
use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::traits::Identity;
use thiserror::Error;

pub type Point = EdwardsPoint;

#[derive(Debug, Error)]
pub enum PointError {
    #[error("not a valid compressed Ed25519 point")]
    InvalidEncoding,
}

pub fn point_from_bytes(bytes: &[u8; 32]) -> Result<Point, PointError> {
    CompressedEdwardsY(*bytes)
        .decompress()
        .ok_or(PointError::InvalidEncoding)
}

pub fn point_to_bytes(p: &Point) -> [u8; 32] {
    p.compress().to_bytes()
}

pub fn point_add(a: &Point, b: &Point) -> Point {
    a + b
}

pub fn point_sub(a: &Point, b: &Point) -> Point {
    a - b
}

/// `s · G`, the fixed Ed25519 base point.
pub fn scalar_mul_base(s: &Scalar) -> Point {
    s * ED25519_BASEPOINT_POINT
}

/// `s · P` for an arbitrary point `P`.
pub fn point_scalar_mul(p: &Point, s: &Scalar) -> Point {
    p * s
}

/// `8 · P`, the cofactor clear used by `generate_key_derivation` and
/// `hash_to_point`.
pub fn point_mul8(p: &Point) -> Point {
    p.mul_by_cofactor()
}

/// Sliding-window recoding of a 256-bit little-endian scalar into signed
/// digits with window width <= 6 and magnitude <= 15.
///
/// Mirrors the classical `ref10`/CryptoNote `slide()` routine: scan the bit
/// string low-to-high, and for each set bit try to merge set bits up to 6
/// positions ahead into the current digit (reversing polarity and
/// propagating a carry if the merge would overflow `[-15, 15]`).
pub fn slide(a: &[u8; 32]) -> [i8; 256] {
    let mut r = [0i8; 256];
    for i in 0..256 {
        r[i] = ((a[i >> 3] >> (i & 7)) & 1) as i8;
    }

    for i in 0..256 {
        if r[i] == 0 {
            continue;
        }
        let mut b = 1usize;
        while b <= 6 && i + b < 256 {
            if r[i + b] != 0 {
                if r[i] + (r[i + b] << b) <= 15 {
                    r[i] += r[i + b] << b;
                    r[i + b] = 0;
                } else if r[i] - (r[i + b] << b) >= -15 {
                    r[i] -= r[i + b] << b;
                    let mut k = i + b;
                    while k < 256 {
                        if r[k] == 0 {
                            r[k] = 1;
                            break;
                        }
                        r[k] = 0;
                        k += 1;
                    }
                } else {
                    break;
                }
            }
            b += 1;
        }
    }

    r
}

/// Precompute odd multiples `1*P, 3*P, 5*P, ..., 15*P` for the sliding
/// window multiplier below.
fn odd_multiples(p: &Point) -> [Point; 8] {
    let p2 = p + p;
    let mut table = [*p; 8];
    for i in 1..8 {
        table[i] = table[i - 1] + p2;
    }
    table
}

/// Variable-time `a·A + b·B`, where `B` is the fixed Ed25519 base point and
/// `A` is an arbitrary point, computed via sliding-window recoding (see
/// [`slide`]). Used to verify LSAG ring signatures without the constant-time
/// overhead the signing path requires.
pub fn double_scalar_mul_vartime(a: &Scalar, point_a: &Point, b: &Scalar) -> Point {
    let slide_a = slide(&a.to_bytes());
    let slide_b = slide(&b.to_bytes());

    let table_a = odd_multiples(point_a);
    let table_b = odd_multiples(&ED25519_BASEPOINT_POINT);

    let mut result = Point::identity();
    let mut i = 255usize;
    loop {
        result = result + result;

        if slide_a[i] > 0 {
            result = result + table_a[(slide_a[i] as usize) / 2];
        } else if slide_a[i] < 0 {
            result = result - table_a[(-slide_a[i] as usize) / 2];
        }

        if slide_b[i] > 0 {
            result = result + table_b[(slide_b[i] as usize) / 2];
        } else if slide_b[i] < 0 {
            result = result - table_b[(-slide_b[i] as usize) / 2];
        }

        if i == 0 {
            break;
        }
        i -= 1;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::scalar_from_bytes_reduce;

    #[test]
    fn point_roundtrip() {
        let s = Scalar::from(7u64);
        let p = scalar_mul_base(&s);
        let bytes = point_to_bytes(&p);
        let decoded = point_from_bytes(&bytes).unwrap();
        assert_eq!(p, decoded);
    }

    #[test]
    fn mul8_matches_eightfold_addition() {
        let s = Scalar::from(3u64);
        let p = scalar_mul_base(&s);
        let mut manual = p;
        for _ in 0..2 {
            manual = manual + manual; // *2, *4
        }
        manual = manual + manual; // *8
        assert_eq!(point_mul8(&p), manual);
    }

    #[test]
    fn double_scalar_mul_matches_naive() {
        let a = scalar_from_bytes_reduce(&[11u8; 32]);
        let b = scalar_from_bytes_reduce(&[22u8; 32]);
        let point_a = scalar_mul_base(&Scalar::from(5u64));

        let expected = point_scalar_mul(&point_a, &a) + scalar_mul_base(&b);
        let actual = double_scalar_mul_vartime(&a, &point_a, &b);
        assert_eq!(actual, expected);
    }

    #[test]
    fn double_scalar_mul_handles_zero_scalars() {
        let zero = Scalar::ZERO;
        let point_a = scalar_mul_base(&Scalar::from(9u64));
        assert_eq!(
            double_scalar_mul_vartime(&zero, &point_a, &zero),
            Point::identity()
        );
    }
}
