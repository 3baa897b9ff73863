//! Ring-signature signing pipeline: every input in a
//! transaction is signed independently with LSAG over the same prefix
//! hash, using `ember-crypto`'s ring module for the actual math.

use ember_crypto::{
    point_from_bytes, scalar_from_canonical_bytes, scalar_to_bytes,
    ring::{lsag_sign, lsag_verify},
};
use ember_types::model::KeyBytes;

use crate::types::{prefix_hash, Transaction, TxPrefix, TxRingSignature};
use crate::TxError;

/// Everything [`sign_inputs`] needs for one input: its ring of candidate
/// one-time public keys, the signer's position and secret key within
/// that ring, and the key image that binds the signature to a unique
/// spend.
pub struct InputSigningData {
    pub ring_public_keys: Vec<KeyBytes>,
    pub signer_index: usize,
    pub signer_secret: KeyBytes,
    pub key_image: KeyBytes,
}

/// Sign every input of `prefix` with LSAG, all over the same prefix hash.
pub fn sign_inputs(prefix: &TxPrefix, inputs: &[InputSigningData]) -> Result<Vec<TxRingSignature>, TxError> {
    let message = prefix_hash(prefix);
    let mut signatures = Vec::with_capacity(inputs.len());

    for input in inputs {
        let ring: Vec<_> = input
            .ring_public_keys
            .iter()
            .map(|key| point_from_bytes(key).map_err(|e| TxError::Crypto(e.to_string())))
            .collect::<Result<_, _>>()?;

        let secret = scalar_from_canonical_bytes(&input.signer_secret)
            .ok_or_else(|| TxError::Crypto("signer secret key is not a canonical scalar".into()))?;
        let key_image = point_from_bytes(&input.key_image).map_err(|e| TxError::Crypto(e.to_string()))?;

        let signature = lsag_sign(&message, &ring, input.signer_index, &secret, &key_image)
            .map_err(|e| TxError::Crypto(e.to_string()))?;

        signatures.push(TxRingSignature {
            c: signature.c.iter().map(scalar_to_bytes).collect(),
            r: signature.r.iter().map(scalar_to_bytes).collect(),
        });
    }

    Ok(signatures)
}

/// Verify every input's ring signature in a fully composed transaction.
/// Returns `Ok(false)` (not an error) if any single signature fails to
/// verify — callers decide whether that's fatal.
pub fn verify_transaction(tx: &Transaction, rings: &[Vec<KeyBytes>], key_images: &[KeyBytes]) -> Result<bool, TxError> {
    if tx.signatures.len() != rings.len() || rings.len() != key_images.len() {
        return Err(TxError::Invalid("signature/ring/key-image count mismatch".into()));
    }

    let message = prefix_hash(&tx.prefix);

    for ((signature, ring), key_image) in tx.signatures.iter().zip(rings).zip(key_images) {
        let ring_points: Vec<_> = ring
            .iter()
            .map(|key| point_from_bytes(key).map_err(|e| TxError::Crypto(e.to_string())))
            .collect::<Result<_, _>>()?;
        let key_image_point = point_from_bytes(key_image).map_err(|e| TxError::Crypto(e.to_string()))?;

        let c: Vec<_> = signature
            .c
            .iter()
            .map(|b| {
                ember_crypto::scalar_from_canonical_bytes(b)
                    .ok_or_else(|| TxError::Crypto("non-canonical c scalar in signature".into()))
            })
            .collect::<Result<_, _>>()?;
        let r: Vec<_> = signature
            .r
            .iter()
            .map(|b| {
                ember_crypto::scalar_from_canonical_bytes(b)
                    .ok_or_else(|| TxError::Crypto("non-canonical r scalar in signature".into()))
            })
            .collect::<Result<_, _>>()?;

        let ring_sig = ember_crypto::ring::RingSignature { c, r };
        let ok = lsag_verify(&message, &ring_points, &key_image_point, &ring_sig)
            .map_err(|e| TxError::Crypto(e.to_string()))?;
        if !ok {
            return Ok(false);
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TxInput, TxOutput};
    use ember_crypto::{generate_key_image, random_scalar, scalar_mul_base};

    fn keypair() -> (KeyBytes, KeyBytes) {
        let secret = random_scalar();
        let public = scalar_mul_base(&secret);
        (scalar_to_bytes(&secret), ember_crypto::point_to_bytes(&public))
    }

    #[test]
    fn sign_then_verify_single_input_ring() {
        let (secret, public) = keypair();
        let secret_scalar = scalar_from_canonical_bytes(&secret).unwrap();
        let public_point = point_from_bytes(&public).unwrap();
        let key_image = generate_key_image(&public_point, &secret_scalar);
        let key_image_bytes = ember_crypto::point_to_bytes(&key_image);

        let (_, decoy1) = keypair();
        let (_, decoy2) = keypair();
        let mut ring = vec![decoy1, public, decoy2];
        let signer_index = 1;

        let prefix = TxPrefix {
            version: 1,
            unlock_time: 0,
            inputs: vec![TxInput {
                amount: 1000,
                key_image: key_image_bytes,
                key_offsets: vec![1, 2, 3],
            }],
            outputs: vec![TxOutput { amount: 900, key: [9u8; 32] }],
            extra: vec![],
        };

        let signatures = sign_inputs(
            &prefix,
            &[InputSigningData {
                ring_public_keys: ring.clone(),
                signer_index,
                signer_secret: secret,
                key_image: key_image_bytes,
            }],
        )
        .unwrap();

        let tx = Transaction { prefix, signatures };
        let ok = verify_transaction(&tx, &[std::mem::take(&mut ring)], &[key_image_bytes]).unwrap();
        assert!(ok, "freshly signed ring signature must verify");
    }

    #[test]
    fn tampered_signature_fails_verification() {
        let (secret, public) = keypair();
        let secret_scalar = scalar_from_canonical_bytes(&secret).unwrap();
        let public_point = point_from_bytes(&public).unwrap();
        let key_image = generate_key_image(&public_point, &secret_scalar);
        let key_image_bytes = ember_crypto::point_to_bytes(&key_image);

        let ring = vec![public];
        let prefix = TxPrefix {
            version: 1,
            unlock_time: 0,
            inputs: vec![TxInput {
                amount: 1000,
                key_image: key_image_bytes,
                key_offsets: vec![1],
            }],
            outputs: vec![TxOutput { amount: 900, key: [9u8; 32] }],
            extra: vec![],
        };

        let mut signatures = sign_inputs(
            &prefix,
            &[InputSigningData {
                ring_public_keys: ring.clone(),
                signer_index: 0,
                signer_secret: secret,
                key_image: key_image_bytes,
            }],
        )
        .unwrap();

        signatures[0].r[0][0] ^= 0xff;

        let tx = Transaction { prefix, signatures };
        let ok = verify_transaction(&tx, &[ring], &[key_image_bytes]).unwrap();
        assert!(!ok, "tampered signature must not verify");
    }
}
