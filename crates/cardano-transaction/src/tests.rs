//! Tests for the cardano-transaction crate.
//!
//! Covers builder balancing (exact balance, change emission, change
//! burning, deposits, minting), fee behavior, signing, and codec
//! round-trips for bodies and complete transactions.

use cardano_address::{Address, Network, StakeCredential};
use cardano_primitives::hash::{Hash28, Hash32};
use cardano_primitives::hd::{harden, ExtendedSigningKey};

use crate::auxiliary::{AuxiliaryData, Metadatum};
use crate::builder::{min_utxo, TxBuilder};
use crate::certificate::Certificate;
use crate::native_script::NativeScript;
use crate::protocol::ProtocolParams;
use crate::transaction::{Tx, TxBody, TxInput, TxOutput};
use crate::value::{AssetName, MultiAsset, Value};
use crate::TransactionError;

/// Mainnet-shaped protocol parameters.
fn protocol() -> ProtocolParams {
    ProtocolParams {
        min_fee_a: 44,
        min_fee_b: 155_381,
        coins_per_utxo_word: 34_482,
        key_deposit: 2_000_000,
        pool_deposit: 500_000_000,
        min_utxo: 1_000_000,
        max_tx_size: 16_384,
        min_pool_cost: 340_000_000,
    }
}

const ADA: u64 = 1_000_000;

fn payment_key() -> ExtendedSigningKey {
    ExtendedSigningKey::from_entropy(b"builder test wallet entropy.....", "")
        .derive(harden(1852))
        .derive(harden(1815))
        .derive(harden(0))
        .derive(0)
        .derive(0)
}

fn change_key() -> ExtendedSigningKey {
    ExtendedSigningKey::from_entropy(b"builder test wallet entropy.....", "")
        .derive(harden(1852))
        .derive(harden(1815))
        .derive(harden(0))
        .derive(0)
        .derive(1)
}

fn enterprise(key: &ExtendedSigningKey) -> Address {
    Address::enterprise(
        Network::Mainnet,
        StakeCredential::from_key(&key.verification_key()),
    )
}

fn input(tag: u8, amount: Value) -> TxInput {
    TxInput::new(Hash32::new([tag; 32]), 0, amount)
}

// ---------------------------------------------------------------------------
// Exact-balance mode (no change address)
// ---------------------------------------------------------------------------

#[test]
fn test_exact_balance_builds() {
    let key = payment_key();
    let mut builder = TxBuilder::new(protocol());
    builder.add_input(input(1, Value::new(100 * ADA)));
    builder.add_output(TxOutput::new(enterprise(&key), Value::new(99 * ADA)));
    builder.set_fee(ADA);
    builder.sign(key.clone());

    let tx = builder.build().expect("balanced transaction should build");
    assert_eq!(tx.body.fee, ADA);
    assert_eq!(tx.body.outputs.len(), 1);
    assert!(tx.is_valid);

    // The single witness must verify against the body hash.
    let hash = tx.hash().unwrap();
    let witness = &tx.witness_set.vkey_witnesses[0];
    let vk = key.verification_key();
    assert_eq!(witness.vkey, vk.key_bytes());
    assert!(vk.verify(hash.as_bytes(), &witness.signature));
}

#[test]
fn test_shortfall_is_insufficient_funds() {
    // Output plus fee exceeds input by exactly one ADA.
    let key = payment_key();
    let mut builder = TxBuilder::new(protocol());
    builder.add_input(input(1, Value::new(99 * ADA)));
    builder.add_output(TxOutput::new(enterprise(&key), Value::new(99 * ADA)));
    builder.set_fee(ADA);
    builder.sign(key);

    let err = builder.build().unwrap_err();
    match err {
        TransactionError::InsufficientFunds { input, required } => {
            assert_eq!(input, 99 * ADA);
            assert_eq!(required, 100 * ADA);
        }
        other => panic!("expected InsufficientFunds, got {other:?}"),
    }
}

#[test]
fn test_excess_input_is_rejected_without_change_address() {
    let key = payment_key();
    let mut builder = TxBuilder::new(protocol());
    builder.add_input(input(1, Value::new(101 * ADA)));
    builder.add_output(TxOutput::new(enterprise(&key), Value::new(99 * ADA)));
    builder.set_fee(ADA);
    builder.sign(key);

    assert!(matches!(
        builder.build().unwrap_err(),
        TransactionError::Unbalanced { input, required }
            if input == 101 * ADA && required == 100 * ADA
    ));
}

#[test]
fn test_build_without_keys_fails() {
    let mut builder = TxBuilder::new(protocol());
    builder.add_input(input(1, Value::new(ADA)));
    builder.add_output(TxOutput::new(enterprise(&payment_key()), Value::new(ADA)));
    assert!(matches!(
        builder.build().unwrap_err(),
        TransactionError::MissingSigningKeys
    ));
}

// ---------------------------------------------------------------------------
// Change balancing
// ---------------------------------------------------------------------------

#[test]
fn test_change_output_is_emitted_and_balances() {
    let key = payment_key();
    let change_addr = enterprise(&change_key());

    let mut builder = TxBuilder::new(protocol());
    builder.add_input(input(1, Value::new(3000 * ADA)));
    builder.add_output(TxOutput::new(enterprise(&key), Value::new(10 * ADA)));
    builder.add_change_if_needed(change_addr.clone());
    builder.sign(key);

    let tx = builder.build().expect("should build with change");
    assert_eq!(tx.body.outputs.len(), 2);
    assert_eq!(tx.body.outputs[0].address, change_addr);

    // input == outputs + fee, exactly.
    let outputs: u64 = tx.body.outputs.iter().map(|o| o.amount.coin).sum();
    assert_eq!(outputs + tx.body.fee, 3000 * ADA);
    assert!(tx.body.fee >= protocol().min_fee_b);
}

#[test]
fn test_fee_covers_witness_bytes() {
    // Registering a second key grows the measured size, so the fee grows.
    let key = payment_key();
    let change_addr = enterprise(&change_key());

    let fee_with_keys = |count: usize| {
        let mut builder = TxBuilder::new(protocol());
        builder.add_input(input(1, Value::new(3000 * ADA)));
        builder.add_output(TxOutput::new(enterprise(&key), Value::new(10 * ADA)));
        builder.add_change_if_needed(change_addr.clone());
        for i in 0..count {
            builder.sign(if i == 0 { key.clone() } else { change_key() });
        }
        builder.build().unwrap().body.fee
    };

    assert!(fee_with_keys(2) > fee_with_keys(1));
}

#[test]
fn test_fee_monotonic_in_outputs() {
    let key = payment_key();
    let mut builder = TxBuilder::new(protocol());
    builder.add_input(input(1, Value::new(3000 * ADA)));
    builder.add_output(TxOutput::new(enterprise(&key), Value::new(10 * ADA)));
    builder.sign(key.clone());

    let base = builder.min_fee().unwrap();
    let extra = TxOutput::new(enterprise(&key), Value::new(100_000));
    assert!(builder.fee_for_output(&extra).unwrap() > base);
}

/// Build a builder with everything but the input amount, probe the fees,
/// then return (base fee, fee delta for a coin-only change output).
fn probe_change_fees(change_addr: &Address) -> (u64, u64) {
    let key = payment_key();
    let mut builder = TxBuilder::new(protocol());
    builder.add_input(input(1, Value::new(0)));
    builder.add_output(TxOutput::new(enterprise(&key), Value::new(10 * ADA)));
    builder.sign(key);

    let base = builder.min_fee().unwrap();
    // Any amount in the 4-byte uint range has the same encoded width.
    let probe_output = TxOutput::new(change_addr.clone(), Value::new(100_000));
    let with_change = builder.fee_for_output(&probe_output).unwrap();
    (base, with_change - base)
}

#[test]
fn test_undersized_coin_change_is_burned() {
    // The change clears the minimum before the fee recomputation but not
    // after: the resized transaction eats the margin, so it must burn.
    let key = payment_key();
    let change_addr = enterprise(&change_key());
    let (base_fee, delta) = probe_change_fees(&change_addr);

    let min_required = min_utxo(&Value::new(0), &protocol());
    let change_target = min_required + delta - 1;

    let mut builder = TxBuilder::new(protocol());
    builder.add_input(input(1, Value::new(10 * ADA + base_fee + change_target)));
    builder.add_output(TxOutput::new(enterprise(&key), Value::new(10 * ADA)));
    builder.add_change_if_needed(change_addr);
    builder.sign(key);

    let tx = builder.build().expect("undersized change should burn");
    assert_eq!(tx.body.outputs.len(), 1, "change output must be dropped");
    assert_eq!(tx.body.fee, base_fee + change_target, "change burns into the fee");

    let outputs: u64 = tx.body.outputs.iter().map(|o| o.amount.coin).sum();
    assert_eq!(outputs + tx.body.fee, 10 * ADA + base_fee + change_target);
}

#[test]
fn test_change_at_minimum_is_emitted() {
    let key = payment_key();
    let change_addr = enterprise(&change_key());
    let (base_fee, delta) = probe_change_fees(&change_addr);

    let min_required = min_utxo(&Value::new(0), &protocol());
    let change_target = min_required + delta;

    let mut builder = TxBuilder::new(protocol());
    builder.add_input(input(1, Value::new(10 * ADA + base_fee + change_target)));
    builder.add_output(TxOutput::new(enterprise(&key), Value::new(10 * ADA)));
    builder.add_change_if_needed(change_addr.clone());
    builder.sign(key);

    let tx = builder.build().expect("change at the minimum should emit");
    assert_eq!(tx.body.outputs.len(), 2);
    assert_eq!(tx.body.outputs[0].address, change_addr);
    assert_eq!(tx.body.outputs[0].amount.coin, min_required);
    assert_eq!(tx.body.fee, base_fee + delta);
}

#[test]
fn test_undersized_multiasset_change_is_an_error() {
    let key = payment_key();
    let change_addr = enterprise(&change_key());

    let leftover_assets = MultiAsset::new().with(
        Hash28::new([7u8; 28]),
        AssetName::from_text("token").unwrap(),
        42,
    );

    // Probe the fee delta for a change output of this exact shape.
    let mut probe = TxBuilder::new(protocol());
    probe.add_input(input(1, Value::new(0)));
    probe.add_output(TxOutput::new(enterprise(&key), Value::new(10 * ADA)));
    probe.sign(key.clone());
    let base_fee = probe.min_fee().unwrap();
    let probe_output = TxOutput::new(
        change_addr.clone(),
        Value::with_assets(100_000, leftover_assets.clone()),
    );
    let delta = probe.fee_for_output(&probe_output).unwrap() - base_fee;

    // Leave a change of 100_000 coin plus the assets: far below the
    // multi-asset minimum, and assets cannot burn.
    let change_coin = 100_000 + delta;
    let mut builder = TxBuilder::new(protocol());
    builder.add_input(input(
        1,
        Value::with_assets(10 * ADA + base_fee + change_coin, leftover_assets),
    ));
    builder.add_output(TxOutput::new(enterprise(&key), Value::new(10 * ADA)));
    builder.add_change_if_needed(change_addr);
    builder.sign(key);

    match builder.build().unwrap_err() {
        TransactionError::ChangeBelowMinUtxo {
            amount,
            min_required,
        } => {
            assert_eq!(amount, 100_000);
            assert!(min_required > amount);
        }
        other => panic!("expected ChangeBelowMinUtxo, got {other:?}"),
    }
}

#[test]
fn test_insufficient_with_change_address_reports_shortfall() {
    let key = payment_key();
    let mut builder = TxBuilder::new(protocol());
    builder.add_input(input(1, Value::new(ADA)));
    builder.add_output(TxOutput::new(enterprise(&key), Value::new(10 * ADA)));
    builder.add_change_if_needed(enterprise(&change_key()));
    builder.sign(key);

    assert!(matches!(
        builder.build().unwrap_err(),
        TransactionError::InsufficientFunds { .. }
    ));
}

// ---------------------------------------------------------------------------
// Certificates and minting
// ---------------------------------------------------------------------------

#[test]
fn test_stake_registration_deposit_counts_as_output() {
    let key = payment_key();
    let stake_cred = StakeCredential::from_key(&change_key().verification_key());

    let mut builder = TxBuilder::new(protocol());
    builder.add_input(input(1, Value::new(10 * ADA + 2_000_000 + ADA)));
    builder.add_output(TxOutput::new(enterprise(&key), Value::new(10 * ADA)));
    builder.add_certificate(Certificate::StakeRegistration {
        stake_credential: stake_cred,
    });
    builder.set_fee(ADA);
    builder.sign(key);

    let tx = builder.build().expect("deposit should balance");
    assert_eq!(tx.body.certificates.len(), 1);
}

#[test]
fn test_minted_assets_count_as_input() {
    let key = payment_key();
    let policy = NativeScript::ScriptPubkey(
        StakeCredential::from_key(&key.verification_key()).hash().to_owned(),
    );
    let minted = MultiAsset::new().with(
        policy.hash(),
        AssetName::from_text("gem").unwrap(),
        1000,
    );

    let mut builder = TxBuilder::new(protocol());
    builder.add_input(input(1, Value::new(5 * ADA)));
    builder.add_output(TxOutput::new(
        enterprise(&key),
        Value::with_assets(4 * ADA, minted.clone()),
    ));
    builder.add_mint(minted);
    builder.add_native_script(policy);
    builder.set_fee(ADA);
    builder.sign(key);

    let tx = builder.build().expect("mint should balance the assets");
    assert!(!tx.body.mint.is_empty());
    assert_eq!(tx.witness_set.native_scripts.len(), 1);
}

// ---------------------------------------------------------------------------
// Hashing and determinism
// ---------------------------------------------------------------------------

#[test]
fn test_build_is_deterministic() {
    let build_once = || {
        let key = payment_key();
        let mut builder = TxBuilder::new(protocol());
        builder.add_input(input(1, Value::new(100 * ADA)));
        builder.add_output(TxOutput::new(enterprise(&key), Value::new(99 * ADA)));
        builder.set_fee(ADA);
        builder.sign(key);
        builder.build().unwrap()
    };

    let a = build_once();
    let b = build_once();
    assert_eq!(a.to_cbor().unwrap(), b.to_cbor().unwrap());
    assert_eq!(a.id().unwrap(), b.id().unwrap());
}

#[test]
fn test_auxiliary_data_hash_lands_in_body() {
    let key = payment_key();
    let mut aux = AuxiliaryData::default();
    aux.set(674, Metadatum::Text("payment memo".to_string()));

    let mut builder = TxBuilder::new(protocol());
    builder.add_input(input(1, Value::new(100 * ADA)));
    builder.add_output(TxOutput::new(enterprise(&key), Value::new(99 * ADA)));
    builder.set_fee(ADA);
    builder.add_auxiliary_data(aux.clone());
    builder.sign(key);

    let tx = builder.build().unwrap();
    assert_eq!(tx.body.auxiliary_data_hash, Some(aux.hash()));
    assert_eq!(tx.auxiliary_data, Some(aux));
}

// ---------------------------------------------------------------------------
// Codec round-trips
// ---------------------------------------------------------------------------

#[test]
fn test_built_tx_roundtrips() {
    let key = payment_key();
    let mut builder = TxBuilder::new(protocol());
    builder.add_input(input(1, Value::new(3000 * ADA)));
    builder.add_output(TxOutput::new(enterprise(&key), Value::new(10 * ADA)));
    builder.set_ttl(12_345_678);
    builder.add_change_if_needed(enterprise(&change_key()));
    builder.sign(key);

    let tx = builder.build().unwrap();
    let bytes = tx.to_cbor().unwrap();
    let back = Tx::from_cbor(&bytes).unwrap();
    assert_eq!(back, tx);
    assert_eq!(back.to_cbor().unwrap(), bytes);
}

#[test]
fn test_full_body_roundtrips() {
    let stake_cred = StakeCredential::from_key(&change_key().verification_key());
    let body = TxBody {
        inputs: vec![input(1, Value::new(0)), input(2, Value::new(0))],
        outputs: vec![TxOutput::new(
            enterprise(&payment_key()),
            Value::with_assets(
                2 * ADA,
                MultiAsset::new().with(
                    Hash28::new([1u8; 28]),
                    AssetName::from_text("nft").unwrap(),
                    1,
                ),
            ),
        )],
        fee: 170_000,
        ttl: Some(9_000_000),
        certificates: vec![
            Certificate::StakeRegistration {
                stake_credential: stake_cred,
            },
            Certificate::StakeDelegation {
                stake_credential: stake_cred,
                pool_keyhash: Hash28::new([5u8; 28]),
            },
        ],
        withdrawals: vec![(
            Address::stake(Network::Mainnet, stake_cred),
            1_500_000,
        )],
        auxiliary_data_hash: Some(Hash32::new([6u8; 32])),
        validity_interval_start: Some(8_500_000),
        mint: MultiAsset::new().with(
            Hash28::new([2u8; 28]),
            AssetName::from_text("mint").unwrap(),
            77,
        ),
        script_data_hash: Some(Hash32::new([7u8; 32])),
        collateral: vec![input(3, Value::new(0))],
        required_signers: vec![Hash28::new([8u8; 28])],
        network_id: Some(1),
    };

    let bytes = body.to_cbor().unwrap();
    let mut reader = cardano_primitives::cbor::CborReader::new(&bytes);
    let back = TxBody::read_cbor(&mut reader).unwrap();
    reader.finish().unwrap();
    assert_eq!(back, body);
    assert_eq!(back.to_cbor().unwrap(), bytes);
}

#[test]
fn test_update_field_is_rejected_on_decode() {
    let mut w = cardano_primitives::cbor::CborWriter::new();
    w.write_map(1);
    w.write_uint(6);
    w.write_null();
    let bytes = w.into_bytes();
    let mut reader = cardano_primitives::cbor::CborReader::new(&bytes);
    assert!(matches!(
        TxBody::read_cbor(&mut reader),
        Err(TransactionError::UnsupportedField("update"))
    ));
}

#[test]
fn test_absent_fields_are_omitted_from_the_map() {
    let body = TxBody {
        inputs: vec![input(1, Value::new(0))],
        outputs: vec![TxOutput::new(enterprise(&payment_key()), Value::new(ADA))],
        fee: 170_000,
        ..Default::default()
    };
    let bytes = body.to_cbor().unwrap();
    // Exactly three entries: inputs, outputs, fee.
    assert_eq!(bytes[0], 0xa3);
}
