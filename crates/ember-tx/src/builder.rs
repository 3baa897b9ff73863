//! The transaction composer proper: preflight validation, input
//! selection, output denomination, change, stealth output derivation,
//! ring construction, signing, `extra` assembly, and post-construction
//! checks — wired together into one `build_transaction` entry point.

use std::collections::HashMap;

use ember_crypto::{
    derive_public_key, generate_key_derivation, point_from_bytes, point_to_bytes, random_scalar,
    scalar_mul_base,
};
use ember_types::constants::{
    max_mixin, max_tx_size, min_mixin, FUSION_TX_MAX_SIZE, FUSION_TX_MIN_INPUT_COUNT,
    FUSION_TX_MIN_IN_OUT_COUNT_RATIO, MAX_EXTRA_SIZE,
};
use ember_types::model::{KeyBytes, PreparedTransaction, TransactionInput};
use rand::seq::SliceRandom;

use crate::decoy::{build_ring, RingCandidate};
use crate::denom::split_pretty;
use crate::fee::{estimate_tx_size, minimum_fee};
use crate::sign::{sign_inputs, InputSigningData};
use crate::types::{encode_extra, TxInput, TxOutput, TxPrefix, Transaction};
use crate::TxError;

/// A recipient of funds: their address (kept only for the record stored
/// in the returned [`PreparedTransaction`]) and the public keys a stealth
/// output is derived against.
#[derive(Debug, Clone)]
pub struct Destination {
    pub address: String,
    pub public_spend_key: KeyBytes,
    pub public_view_key: KeyBytes,
    pub amount: u64,
    /// Payment id embedded in an integrated address, if this destination
    /// came from one. Must agree with the transaction-wide payment id.
    pub embedded_payment_id: Option<KeyBytes>,
}

/// Either a flat per-transaction fee or a requested per-byte rate; the
/// height-dependent network floor (`fee::minimum_fee`) always applies
/// on top.
#[derive(Debug, Clone, Copy)]
pub enum FeeMode {
    Fixed(u64),
    PerByte(f64),
}

/// Everything needed to compose one transaction.
pub struct BuildRequest<'a> {
    pub destinations: Vec<Destination>,
    pub payment_id: Option<KeyBytes>,
    pub mixin: usize,
    pub height: u64,
    pub fee_mode: FeeMode,
    pub unlock_time: u64,
    pub extra_data: Vec<u8>,
    /// Spendable inputs (unspent ∧ unlocked) of the requested source
    /// subwallets, each with its one-time private key already populated.
    pub spendable_inputs: &'a [TransactionInput],
    /// Change destination; the caller is responsible for preflight
    /// check 6 (that this address belongs to the wallet) before calling.
    pub change_address: Destination,
    /// Decoy candidates, keyed by output amount — fetched by the caller
    /// via `ember-rpc`'s `get_random_outs` ahead of time.
    pub decoys_by_amount: &'a HashMap<u64, Vec<RingCandidate>>,
    /// A node-operator fee tip (from `get_fee_info`), added as an extra
    /// destination when present.
    pub node_fee: Option<Destination>,
    /// A fusion (self-consolidation) build: `destinations` is expected to
    /// be empty and the entire input sum, less the fee floor, becomes a
    /// single change output back to `change_address`.
    pub is_fusion: bool,
}

fn preflight(req: &BuildRequest) -> Result<(), TxError> {
    if req.destinations.is_empty() && !req.is_fusion {
        return Err(TxError::NoDestinations);
    }
    for dest in &req.destinations {
        if dest.amount == 0 {
            return Err(TxError::ZeroAmount);
        }
        if let Some(embedded) = dest.embedded_payment_id {
            if req.payment_id != Some(embedded) {
                return Err(TxError::PaymentIdConflict);
            }
        }
    }

    let min = min_mixin(req.height);
    let max = max_mixin(req.height);
    let mixin = req.mixin as u64;
    if mixin < min || mixin > max {
        return Err(TxError::MixinOutOfRange {
            mixin: req.mixin,
            min,
            max,
        });
    }

    let destination_total: u64 = req
        .destinations
        .iter()
        .try_fold(0u64, |acc, d| acc.checked_add(d.amount))
        .ok_or(TxError::AmountOverflow)?;
    let node_fee_amount = req.node_fee.as_ref().map(|d| d.amount).unwrap_or(0);
    destination_total
        .checked_add(node_fee_amount)
        .ok_or(TxError::AmountOverflow)?;

    Ok(())
}

/// Select spendable inputs greedily (after a uniform shuffle) until their
/// sum covers destinations + node fee + the fee itself, re-estimating the
/// fee as the input count grows.
fn select_inputs_and_fee(
    spendable_inputs: &[TransactionInput],
    base_required: u64,
    fee_mode: FeeMode,
    height: u64,
    ring_size: usize,
    num_outputs_hint: usize,
    extra_len: usize,
    is_fusion: bool,
) -> Result<(Vec<TransactionInput>, u64), TxError> {
    let mut pool: Vec<&TransactionInput> = spendable_inputs.iter().collect();
    pool.shuffle(&mut rand::thread_rng());

    let total_available: u64 = pool.iter().map(|i| i.amount).sum();

    let mut selected: Vec<&TransactionInput> = Vec::new();
    let mut selected_sum = 0u64;
    let mut fee = chosen_fee(fee_mode, height, estimate_tx_size(0, num_outputs_hint, ring_size, extra_len), is_fusion);
    let mut cursor = 0usize;

    loop {
        let required = base_required.saturating_add(fee);
        while selected_sum < required {
            if cursor >= pool.len() {
                return Err(TxError::InsufficientFunds {
                    need: required,
                    have: total_available,
                });
            }
            selected.push(pool[cursor]);
            selected_sum += pool[cursor].amount;
            cursor += 1;
        }

        let size = estimate_tx_size(selected.len(), num_outputs_hint, ring_size, extra_len);
        let new_fee = chosen_fee(fee_mode, height, size, is_fusion);
        if new_fee <= fee {
            fee = new_fee;
            break;
        }
        fee = new_fee;
    }

    Ok((selected.into_iter().cloned().collect(), fee))
}

/// A fusion transaction has `fee == 0` per §4.7 regardless of the requested
/// fee mode or the height-dependent fee floor — fusion is a fee-free
/// self-consolidation operation by definition.
fn chosen_fee(fee_mode: FeeMode, height: u64, estimated_size: u64, is_fusion: bool) -> u64 {
    if is_fusion {
        return 0;
    }
    let floor = minimum_fee(height, estimated_size);
    match fee_mode {
        FeeMode::Fixed(flat) => flat.max(floor),
        FeeMode::PerByte(rate) => {
            let requested = (estimated_size as f64 * rate).ceil() as u64;
            requested.max(floor)
        }
    }
}

/// Derive one stealth output: a random per-transaction keypair has
/// already produced `r`; this computes `D = mul8(r·A)` and
/// `P = derive_public_key(D, output_index, B)` for recipient `(B, A)`.
fn derive_output_key(
    tx_secret: &ember_crypto::Scalar,
    recipient_view_key: &KeyBytes,
    recipient_spend_key: &KeyBytes,
    output_index: u64,
) -> Result<KeyBytes, TxError> {
    let view_point = point_from_bytes(recipient_view_key).map_err(|e| TxError::Crypto(e.to_string()))?;
    let spend_point = point_from_bytes(recipient_spend_key).map_err(|e| TxError::Crypto(e.to_string()))?;
    let derivation = generate_key_derivation(&view_point, tx_secret);
    let one_time = derive_public_key(&derivation, output_index, &spend_point);
    Ok(point_to_bytes(&one_time))
}

/// Build, ring-sign, and serialize a transaction end to end.
pub fn build_transaction(req: BuildRequest) -> Result<(Transaction, PreparedTransaction), TxError> {
    preflight(&req)?;

    let destination_total: u64 = req.destinations.iter().map(|d| d.amount).sum();
    let node_fee_amount = req.node_fee.as_ref().map(|d| d.amount).unwrap_or(0);
    let ring_size = req.mixin + 1;

    // Rough output-count hint for the fee/size estimate before denomination
    // splitting is known: one piece per destination (+ node fee, + change).
    let num_outputs_hint = req.destinations.len()
        + usize::from(req.node_fee.is_some())
        + 1;
    let extra_len = 33 + req.extra_data.len() + req.payment_id.map_or(0, |_| 35);

    let base_required = destination_total.saturating_add(node_fee_amount);
    let (selected_inputs, fee) = select_inputs_and_fee(
        req.spendable_inputs,
        base_required,
        req.fee_mode,
        req.height,
        ring_size,
        num_outputs_hint,
        extra_len,
        req.is_fusion,
    )?;

    let selected_sum: u64 = selected_inputs.iter().map(|i| i.amount).sum();
    let change_amount = selected_sum
        .checked_sub(destination_total)
        .and_then(|v| v.checked_sub(node_fee_amount))
        .and_then(|v| v.checked_sub(fee))
        .ok_or(TxError::InsufficientFunds {
            need: base_required.saturating_add(fee),
            have: selected_sum,
        })?;

    // Assemble every (recipient, piece) pair: real destinations, the
    // node-fee tip, and change, each denominated into pretty pieces.
    let mut pieces: Vec<(&Destination, u64)> = Vec::new();
    for dest in &req.destinations {
        for piece in split_pretty(dest.amount) {
            pieces.push((dest, piece));
        }
    }
    if let Some(node_fee) = &req.node_fee {
        for piece in split_pretty(node_fee.amount) {
            pieces.push((node_fee, piece));
        }
    }
    if change_amount > 0 {
        for piece in split_pretty(change_amount) {
            pieces.push((&req.change_address, piece));
        }
    }

    let tx_secret = random_scalar();
    let tx_public_key = point_to_bytes(&scalar_mul_base(&tx_secret));

    let mut outputs = Vec::with_capacity(pieces.len());
    for (index, (dest, amount)) in pieces.iter().enumerate() {
        let key = derive_output_key(&tx_secret, &dest.public_view_key, &dest.public_spend_key, index as u64)?;
        outputs.push(TxOutput { amount: *amount, key });
    }
    // Outputs are sorted lexicographically by one-time key so their order
    // carries no information about which destination (or index) they
    // belong to.
    outputs.sort_by(|a, b| a.key.cmp(&b.key));

    // Ring construction: one ring per selected input, against the decoy
    // pool for that input's amount.
    let mut tx_inputs = Vec::with_capacity(selected_inputs.len());
    let mut signing_data = Vec::with_capacity(selected_inputs.len());
    for input in &selected_inputs {
        let candidates = req
            .decoys_by_amount
            .get(&input.amount)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let real = RingCandidate {
            global_index: input.global_output_index,
            public_key: input.key,
        };
        let ring = build_ring(real, candidates, req.mixin)?;

        let key_image = input.key_image;
        tx_inputs.push(TxInput {
            amount: input.amount,
            key_image,
            key_offsets: ring.key_offsets,
        });

        let signer_secret = input
            .private_ephemeral
            .ok_or_else(|| TxError::Invalid("view-only input cannot be signed".into()))?;
        signing_data.push(InputSigningData {
            ring_public_keys: ring.members,
            signer_index: ring.signer_index,
            signer_secret,
            key_image,
        });
    }
    // Inputs are ordered by key image descending so ring layout never
    // leaks input-selection order.
    let mut order: Vec<usize> = (0..tx_inputs.len()).collect();
    order.sort_by(|&a, &b| tx_inputs[b].key_image.cmp(&tx_inputs[a].key_image));
    let tx_inputs: Vec<_> = order.iter().map(|&i| tx_inputs[i].clone()).collect();
    let signing_data: Vec<_> = order.into_iter().map(|i| {
        let d = &signing_data[i];
        InputSigningData {
            ring_public_keys: d.ring_public_keys.clone(),
            signer_index: d.signer_index,
            signer_secret: d.signer_secret,
            key_image: d.key_image,
        }
    }).collect();

    let extra = encode_extra(&tx_public_key, req.payment_id.as_ref(), None, &req.extra_data);
    if extra.len() > max_extra_size(req.height) {
        return Err(TxError::Invalid(format!(
            "extra field {} bytes exceeds the height-{} limit",
            extra.len(),
            req.height
        )));
    }

    let prefix = TxPrefix {
        version: 1,
        unlock_time: req.unlock_time,
        inputs: tx_inputs,
        outputs,
        extra,
    };

    let signatures = sign_inputs(&prefix, &signing_data)?;
    let tx = Transaction { prefix, signatures };

    let size = tx.to_bytes().len() as u64;
    let limit = max_tx_size(req.height);
    if size > limit {
        return Err(TxError::TooManyInputsToFitInBlock { size, limit });
    }
    for output in &tx.prefix.outputs {
        if !crate::denom::is_pretty_denomination(output.amount) {
            return Err(TxError::NotPrettyDenomination(output.amount));
        }
    }

    let mut destinations: Vec<(String, u64)> = req
        .destinations
        .iter()
        .map(|d| (d.address.clone(), d.amount))
        .collect();
    if let Some(node_fee) = &req.node_fee {
        destinations.push((node_fee.address.clone(), node_fee.amount));
    }

    let prepared = PreparedTransaction {
        transaction_hash: tx.hash(),
        raw_transaction_bytes: tx.to_bytes(),
        fee,
        change_required: change_amount,
        inputs_used: selected_inputs.iter().map(|i| i.key_image).collect(),
        destinations,
    };

    Ok((tx, prepared))
}

fn max_extra_size(height: u64) -> usize {
    use ember_types::constants::{MAX_EXTRA_SIZE_V2, MAX_EXTRA_SIZE_V2_HEIGHT};
    if height >= MAX_EXTRA_SIZE_V2_HEIGHT {
        MAX_EXTRA_SIZE_V2
    } else {
        MAX_EXTRA_SIZE
    }
}

/// Greedily pick small-denomination inputs for a fusion (self-consolidation,
/// fee-free) transaction: maximize the input/output ratio while keeping the
/// estimated size under `FUSION_TX_MAX_SIZE`.
///
/// `optimize_target`, if given, biases selection toward inputs whose amount
/// rounds to that pretty denomination (ties toward the lower denomination).
pub fn select_fusion_inputs(
    spendable_inputs: &[TransactionInput],
    optimize_target: Option<u64>,
    ring_size: usize,
) -> Result<Vec<TransactionInput>, TxError> {
    let mut candidates: Vec<&TransactionInput> = spendable_inputs.iter().collect();

    if let Some(target) = optimize_target {
        let target_pretty = nearest_pretty_denomination(target);
        candidates.sort_by_key(|i| amount_distance(i.amount, target_pretty));
    } else {
        candidates.sort_by_key(|i| i.amount);
    }

    let mut selected = Vec::new();
    for candidate in candidates {
        selected.push(candidate);
        let output_count = (selected.len() / FUSION_TX_MIN_IN_OUT_COUNT_RATIO).max(1);
        let size = estimate_tx_size(selected.len(), output_count, ring_size, 33);
        if size > FUSION_TX_MAX_SIZE {
            selected.pop();
            break;
        }
    }

    if selected.len() < FUSION_TX_MIN_INPUT_COUNT {
        return Err(TxError::NotEnoughFusionInputs {
            need: FUSION_TX_MIN_INPUT_COUNT,
            have: selected.len(),
        });
    }

    Ok(selected.into_iter().cloned().collect())
}

/// Round `amount` to the nearest pretty denomination, ties toward the
/// lower one.
/// Round `amount` to the nearest pretty denomination `d·10^k`,
/// `d ∈ {1..9}` (ties toward the lower denomination) — per §9's
/// resolution for a fusion `optimize_target` that isn't itself pretty.
fn nearest_pretty_denomination(amount: u64) -> u64 {
    if amount == 0 {
        return 0;
    }
    let mut pow = 1u64;
    while pow * 10 <= amount {
        pow *= 10;
    }
    let mut best = pow;
    let mut best_dist = amount_distance(amount, pow);
    for d in 2..=10u64 {
        let candidate = d * pow;
        let dist = amount_distance(amount, candidate);
        if dist < best_dist {
            best = candidate;
            best_dist = dist;
        }
    }
    best
}

fn amount_distance(amount: u64, target: u64) -> u64 {
    amount.abs_diff(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest(amount: u64) -> Destination {
        Destination {
            address: "addr".into(),
            public_spend_key: [1u8; 32],
            public_view_key: [2u8; 32],
            amount,
            embedded_payment_id: None,
        }
    }

    #[test]
    fn preflight_rejects_empty_destinations() {
        let req = BuildRequest {
            destinations: vec![],
            payment_id: None,
            mixin: 10,
            height: 0,
            fee_mode: FeeMode::Fixed(5),
            unlock_time: 0,
            extra_data: vec![],
            spendable_inputs: &[],
            change_address: dest(0),
            decoys_by_amount: &HashMap::new(),
            node_fee: None,
            is_fusion: false,
        };
        assert!(matches!(preflight(&req), Err(TxError::NoDestinations)));
    }

    #[test]
    fn preflight_rejects_zero_amount() {
        let req = BuildRequest {
            destinations: vec![dest(0)],
            payment_id: None,
            mixin: 10,
            height: 0,
            fee_mode: FeeMode::Fixed(5),
            unlock_time: 0,
            extra_data: vec![],
            spendable_inputs: &[],
            change_address: dest(0),
            decoys_by_amount: &HashMap::new(),
            node_fee: None,
            is_fusion: false,
        };
        assert!(matches!(preflight(&req), Err(TxError::ZeroAmount)));
    }

    #[test]
    fn preflight_rejects_mixin_out_of_range() {
        let req = BuildRequest {
            destinations: vec![dest(100)],
            payment_id: None,
            mixin: 999,
            height: 0,
            fee_mode: FeeMode::Fixed(5),
            unlock_time: 0,
            extra_data: vec![],
            spendable_inputs: &[],
            change_address: dest(0),
            decoys_by_amount: &HashMap::new(),
            node_fee: None,
            is_fusion: false,
        };
        assert!(matches!(preflight(&req), Err(TxError::MixinOutOfRange { .. })));
    }

    #[test]
    fn preflight_rejects_payment_id_conflict() {
        let mut destination = dest(100);
        destination.embedded_payment_id = Some([1u8; 32]);
        let req = BuildRequest {
            destinations: vec![destination],
            payment_id: Some([2u8; 32]),
            mixin: 10,
            height: 0,
            fee_mode: FeeMode::Fixed(5),
            unlock_time: 0,
            extra_data: vec![],
            spendable_inputs: &[],
            change_address: dest(0),
            decoys_by_amount: &HashMap::new(),
            node_fee: None,
            is_fusion: false,
        };
        assert!(matches!(preflight(&req), Err(TxError::PaymentIdConflict)));
    }

    #[test]
    fn nearest_pretty_denomination_ties_to_lower() {
        // 550 is equidistant between 500 and 600; ties go to the lower.
        assert_eq!(nearest_pretty_denomination(550), 500);
        assert_eq!(nearest_pretty_denomination(560), 600);
        assert_eq!(nearest_pretty_denomination(540), 500);
    }

    #[test]
    fn fusion_selection_requires_minimum_input_count() {
        let inputs: Vec<TransactionInput> = (0..5)
            .map(|i| make_input(100 * (i + 1) as u64, i as u64))
            .collect();
        let err = select_fusion_inputs(&inputs, None, 16).unwrap_err();
        assert!(matches!(err, TxError::NotEnoughFusionInputs { .. }));
    }

    #[test]
    fn fusion_selection_picks_smallest_first_without_a_target() {
        let inputs: Vec<TransactionInput> = (0..20)
            .map(|i| make_input(1000 - i as u64, i as u64))
            .collect();
        let selected = select_fusion_inputs(&inputs, None, 16).unwrap();
        assert!(selected.len() >= FUSION_TX_MIN_INPUT_COUNT);
        // Smallest-amount inputs (highest `i`) should be preferred.
        let max_amount = selected.iter().map(|i| i.amount).max().unwrap();
        assert!(max_amount <= 1000);
    }

    #[test]
    fn fusion_fee_is_always_zero_regardless_of_fee_mode_or_floor() {
        // A fusion build bypasses the height-dependent fee floor entirely,
        // even when the requested fee mode would otherwise exceed it.
        assert_eq!(chosen_fee(FeeMode::Fixed(1_000_000), 0, 2000, true), 0);
        assert_eq!(chosen_fee(FeeMode::PerByte(10.0), 1_000_000, 2000, true), 0);
        // Non-fusion builds still see the floor applied.
        assert!(chosen_fee(FeeMode::Fixed(0), 0, 2000, false) > 0);
    }

    fn make_input(amount: u64, global_index: u64) -> TransactionInput {
        TransactionInput {
            key_image: [global_index as u8; 32],
            amount,
            block_height: 1,
            transaction_public_key: [0u8; 32],
            transaction_index: 0,
            global_output_index: global_index,
            key: [0u8; 32],
            unlock_time: 0,
            parent_transaction_hash: [0u8; 32],
            private_ephemeral: Some([7u8; 32]),
            spend_height: 0,
        }
    }
}
