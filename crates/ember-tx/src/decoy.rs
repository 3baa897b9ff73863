//! Ring construction: given the real output being spent and a pool
//! of decoy candidates fetched by the caller (via `ember-rpc`'s
//! `get_random_outs`), assemble the sorted ring, the signer's position
//! within it, and the relative-offset encoding used on the wire.
//!
//! This module is pure and network-free — decoy candidates arrive
//! pre-fetched; the composer itself never talks to a node.

use ember_types::model::KeyBytes;
use rand::seq::SliceRandom;

use crate::TxError;

/// One candidate ring member: its global output index (for ordering and
/// relative-offset encoding) and its one-time public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingCandidate {
    pub global_index: u64,
    pub public_key: KeyBytes,
}

/// A fully assembled ring, ready to drop into a [`crate::types::TxInput`]
/// and sign.
#[derive(Debug, Clone)]
pub struct BuiltRing {
    /// Ascending global indexes, delta-encoded (`offsets[0]` absolute,
    /// every later entry relative to the previous).
    pub key_offsets: Vec<u64>,
    /// Ring member public keys, in the same ascending order as the
    /// (decoded) offsets.
    pub members: Vec<KeyBytes>,
    /// Position of the real output within `members`.
    pub signer_index: usize,
}

/// Build one input's ring from the real output and a pool of decoy
/// candidates. `mixin` is the number of decoys to include (ring size is
/// `mixin + 1`).
///
/// Decoys are deduplicated by global index and the real output's own
/// index is excluded from the candidate pool before sampling, so the
/// same output can never appear twice in a ring.
pub fn build_ring(
    real: RingCandidate,
    decoy_candidates: &[RingCandidate],
    mixin: usize,
) -> Result<BuiltRing, TxError> {
    let mut seen = std::collections::HashSet::new();
    seen.insert(real.global_index);

    let mut unique_decoys = Vec::new();
    for candidate in decoy_candidates {
        if seen.insert(candidate.global_index) {
            unique_decoys.push(*candidate);
        }
    }

    if unique_decoys.len() < mixin {
        return Err(TxError::NotEnoughOutputs {
            needed: mixin,
            available: unique_decoys.len(),
        });
    }

    unique_decoys.shuffle(&mut rand::thread_rng());
    unique_decoys.truncate(mixin);

    let mut ring = unique_decoys;
    ring.push(real);
    ring.sort_unstable_by_key(|c| c.global_index);

    let signer_index = ring
        .iter()
        .position(|c| c.global_index == real.global_index)
        .expect("real output was just inserted into the ring");

    let mut key_offsets = Vec::with_capacity(ring.len());
    let mut previous = 0u64;
    for candidate in &ring {
        key_offsets.push(candidate.global_index - previous);
        previous = candidate.global_index;
    }

    let members = ring.iter().map(|c| c.public_key).collect();

    Ok(BuiltRing {
        key_offsets,
        members,
        signer_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(index: u64) -> RingCandidate {
        RingCandidate {
            global_index: index,
            public_key: [index as u8; 32],
        }
    }

    #[test]
    fn ring_is_sorted_ascending_by_global_index() {
        let real = candidate(500);
        let decoys: Vec<_> = [10, 900, 50, 700].into_iter().map(candidate).collect();
        let ring = build_ring(real, &decoys, 4).unwrap();
        assert_eq!(ring.members.len(), 5);

        let mut reconstructed = Vec::with_capacity(ring.key_offsets.len());
        let mut running = 0u64;
        for delta in &ring.key_offsets {
            running += delta;
            reconstructed.push(running);
        }
        let mut sorted = reconstructed.clone();
        sorted.sort_unstable();
        assert_eq!(reconstructed, sorted);
        assert_eq!(reconstructed[ring.signer_index], 500);
    }

    #[test]
    fn duplicate_decoys_are_deduplicated() {
        let real = candidate(500);
        let decoys: Vec<_> = [10, 10, 10, 20, 20, 30].into_iter().map(candidate).collect();
        let err = build_ring(real, &decoys, 4).unwrap_err();
        assert!(matches!(err, TxError::NotEnoughOutputs { .. }));
    }

    #[test]
    fn real_output_excluded_from_decoy_pool() {
        let real = candidate(500);
        // `500` appears among the "decoys" too (e.g. a stale cache entry);
        // it must not be double-counted as its own decoy.
        let decoys: Vec<_> = [500, 10, 20, 30].into_iter().map(candidate).collect();
        let ring = build_ring(real, &decoys, 3).unwrap();
        assert_eq!(ring.members.len(), 4);
    }

    #[test]
    fn not_enough_unique_decoys_is_an_error() {
        let real = candidate(500);
        let decoys: Vec<_> = [10, 20].into_iter().map(candidate).collect();
        let err = build_ring(real, &decoys, 5).unwrap_err();
        assert!(matches!(err, TxError::NotEnoughOutputs { needed: 5, available: 2 }));
    }
}
