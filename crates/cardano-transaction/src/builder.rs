//! Transaction builder.
//!
//! Three phases: accumulation (append-only mutators, no validation),
//! balancing (fee computation and the change decision, run inside
//! `build`), and finalization (body hash computed once, every registered
//! key signs it).
//!
//! The fee is linear in the serialized size, and the serialized size
//! includes the fee field and the change output, so balancing serializes
//! twice: once without the change output to learn the base fee, and once
//! with it to learn the final fee. Change that lands under the minimum
//! output value is burned into the fee when it is coin-only, and is a
//! hard error when it carries assets.

use std::cmp::Ordering;

use cardano_address::Address;
use cardano_primitives::hd::ExtendedSigningKey;

use crate::auxiliary::AuxiliaryData;
use crate::certificate::Certificate;
use crate::native_script::NativeScript;
use crate::protocol::ProtocolParams;
use crate::transaction::{Tx, TxBody, TxInput, TxOutput, VKeyWitness, WitnessSet};
use crate::value::{Coin, MultiAsset, Value};
use crate::TransactionError;

/// Fee written into the body while measuring its serialized size.
const PLACEHOLDER_FEE: Coin = 200_000;

/// Size in words of a UTxO entry before its value.
const UTXO_ENTRY_SIZE_WITHOUT_VAL: u64 = 27;

/// The minimum coin an output with this value must carry.
pub fn min_utxo(amount: &Value, protocol: &ProtocolParams) -> Coin {
    let size_factor = if amount.is_coin_only() {
        1
    } else {
        bundle_size(&amount.multiasset)
    };
    (UTXO_ENTRY_SIZE_WITHOUT_VAL + size_factor) * protocol.coins_per_utxo_word
}

/// Size in words of a multi-asset bundle.
fn bundle_size(multiasset: &MultiAsset) -> u64 {
    let num_assets = multiasset.num_assets();
    let name_bytes = multiasset.asset_name_bytes();
    let num_policies = multiasset.num_policies();
    6 + (12 * num_assets + name_bytes + 28 * num_policies + 7) / 8
}

/// Accumulates transaction pieces and balances them into a signed `Tx`.
///
/// One builder per transaction; the accumulation phase mutates internal
/// vectors in place and is not safe for concurrent use.
#[derive(Clone, Debug)]
pub struct TxBuilder {
    protocol: ProtocolParams,
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
    ttl: Option<u64>,
    fee: Option<Coin>,
    certificates: Vec<Certificate>,
    mint: MultiAsset,
    native_scripts: Vec<NativeScript>,
    auxiliary_data: Option<AuxiliaryData>,
    change_address: Option<Address>,
    signing_keys: Vec<ExtendedSigningKey>,
}

impl TxBuilder {
    /// Create a builder against the given protocol parameters.
    pub fn new(protocol: ProtocolParams) -> Self {
        TxBuilder {
            protocol,
            inputs: Vec::new(),
            outputs: Vec::new(),
            ttl: None,
            fee: None,
            certificates: Vec::new(),
            mint: MultiAsset::new(),
            native_scripts: Vec::new(),
            auxiliary_data: None,
            change_address: None,
            signing_keys: Vec::new(),
        }
    }

    /// Append an input.
    pub fn add_input(&mut self, input: TxInput) {
        self.inputs.push(input);
    }

    /// Append several inputs.
    pub fn add_inputs(&mut self, inputs: &[TxInput]) {
        self.inputs.extend_from_slice(inputs);
    }

    /// Append an output.
    pub fn add_output(&mut self, output: TxOutput) {
        self.outputs.push(output);
    }

    /// Append several outputs.
    pub fn add_outputs(&mut self, outputs: &[TxOutput]) {
        self.outputs.extend_from_slice(outputs);
    }

    /// Set the time-to-live slot.
    pub fn set_ttl(&mut self, ttl: u64) {
        self.ttl = Some(ttl);
    }

    /// Set the fee explicitly. Required when no change address is
    /// registered; ignored during balancing otherwise.
    pub fn set_fee(&mut self, fee: Coin) {
        self.fee = Some(fee);
    }

    /// Append a certificate.
    pub fn add_certificate(&mut self, certificate: Certificate) {
        self.certificates.push(certificate);
    }

    /// Merge assets into the mint field; they count as inputs during
    /// balancing.
    pub fn add_mint(&mut self, mint: MultiAsset) {
        let merged = Value::with_assets(0, self.mint.clone())
            .add(&Value::with_assets(0, mint));
        self.mint = merged.multiasset;
    }

    /// Append a native script to the witness set.
    pub fn add_native_script(&mut self, script: NativeScript) {
        self.native_scripts.push(script);
    }

    /// Attach auxiliary data; its hash lands in the body.
    pub fn add_auxiliary_data(&mut self, data: AuxiliaryData) {
        self.auxiliary_data = Some(data);
    }

    /// Register the address that receives any change. Registering one
    /// switches `build` from exact-balance checking to fee/change
    /// balancing.
    pub fn add_change_if_needed(&mut self, address: Address) {
        self.change_address = Some(address);
    }

    /// Register a signing key. Keys sign the body hash in registration
    /// order.
    pub fn sign(&mut self, key: ExtendedSigningKey) {
        self.signing_keys.push(key);
    }

    /// The minimum fee for the transaction as accumulated so far,
    /// measured with a placeholder fee and dummy witnesses.
    pub fn min_fee(&self) -> Result<Coin, TransactionError> {
        let body = self.build_body(PLACEHOLDER_FEE)?;
        self.min_fee_for_body(&body)
    }

    /// The minimum fee if `output` were also present.
    ///
    /// Works on an immutable body snapshot; the builder itself is not
    /// touched.
    pub fn fee_for_output(&self, output: &TxOutput) -> Result<Coin, TransactionError> {
        let mut body = self.build_body(PLACEHOLDER_FEE)?;
        body.outputs.insert(0, output.clone());
        self.min_fee_for_body(&body)
    }

    /// Balance, hash, and sign the transaction.
    pub fn build(&self) -> Result<Tx, TransactionError> {
        if self.signing_keys.is_empty() {
            return Err(TransactionError::MissingSigningKeys);
        }

        let total_input = self.total_input();
        let total_output = self.total_output();

        let body = match &self.change_address {
            None => self.balance_exact(&total_input, &total_output)?,
            Some(address) => self.balance_with_change(&total_input, &total_output, address)?,
        };

        let hash = body.hash()?;
        let mut witness_set = WitnessSet {
            vkey_witnesses: Vec::with_capacity(self.signing_keys.len()),
            native_scripts: self.native_scripts.clone(),
        };
        for key in &self.signing_keys {
            let signature = key.sign(hash.as_bytes());
            let mut vkey = [0u8; 32];
            vkey.copy_from_slice(key.verification_key().key_bytes());
            witness_set.vkey_witnesses.push(VKeyWitness { vkey, signature });
        }

        Ok(Tx {
            body,
            witness_set,
            is_valid: true,
            auxiliary_data: self.auxiliary_data.clone(),
        })
    }

    /// Inputs plus minted assets.
    fn total_input(&self) -> Value {
        let mut total = Value::with_assets(0, self.mint.clone());
        for input in &self.inputs {
            total = total.add(&input.amount);
        }
        total
    }

    /// Outputs plus certificate deposits (stake registrations only).
    fn total_output(&self) -> Value {
        let mut total = Value::new(self.deposits());
        for output in &self.outputs {
            total = total.add(&output.amount);
        }
        total
    }

    fn deposits(&self) -> Coin {
        let registrations = self
            .certificates
            .iter()
            .filter(|c| matches!(c, Certificate::StakeRegistration { .. }))
            .count() as u64;
        registrations * self.protocol.key_deposit
    }

    /// No change address: the caller-set fee must balance exactly.
    fn balance_exact(
        &self,
        total_input: &Value,
        total_output: &Value,
    ) -> Result<TxBody, TransactionError> {
        let fee = self.fee.unwrap_or(0);
        let required = total_output.add(&Value::new(fee));
        match total_input.try_cmp(&required)? {
            Ordering::Equal => self.build_body(fee),
            Ordering::Less => Err(TransactionError::InsufficientFunds {
                input: total_input.coin,
                required: required.coin,
            }),
            Ordering::Greater => Err(TransactionError::Unbalanced {
                input: total_input.coin,
                required: required.coin,
            }),
        }
    }

    /// Change address registered: compute the fee from the serialized
    /// size and emit, shrink, or burn the change output.
    fn balance_with_change(
        &self,
        total_input: &Value,
        total_output: &Value,
        change_address: &Address,
    ) -> Result<TxBody, TransactionError> {
        let mut body = self.build_body(PLACEHOLDER_FEE)?;
        let min_fee = self.min_fee_for_body(&body)?;

        let required = total_output.add(&Value::new(min_fee));
        match total_input.try_cmp(&required)? {
            Ordering::Less => Err(TransactionError::InsufficientFunds {
                input: total_input.coin,
                required: required.coin,
            }),
            Ordering::Equal => {
                body.fee = min_fee;
                Ok(body)
            }
            Ordering::Greater => {
                let change = total_input.sub(&required);
                body.outputs
                    .insert(0, TxOutput::new(change_address.clone(), change.clone()));
                let new_min_fee = self.min_fee_for_body(&body)?;

                // The extra output grew the fee; the growth comes out of
                // the change.
                if change.coin + min_fee < new_min_fee {
                    return Err(TransactionError::InsufficientFunds {
                        input: total_input.coin,
                        required: total_output.coin + new_min_fee,
                    });
                }
                let adjusted = Value {
                    coin: change.coin + min_fee - new_min_fee,
                    multiasset: change.multiasset,
                };

                let min_required = min_utxo(&adjusted, &self.protocol);
                if adjusted.coin < min_required {
                    if adjusted.is_coin_only() {
                        body.outputs.remove(0);
                        body.fee = new_min_fee + adjusted.coin;
                        return Ok(body);
                    }
                    return Err(TransactionError::ChangeBelowMinUtxo {
                        amount: adjusted.coin,
                        min_required,
                    });
                }

                body.outputs[0].amount = adjusted;
                body.fee = new_min_fee;
                Ok(body)
            }
        }
    }

    /// Assemble a body snapshot from the accumulated state.
    fn build_body(&self, fee: Coin) -> Result<TxBody, TransactionError> {
        Ok(TxBody {
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            fee,
            ttl: self.ttl,
            certificates: self.certificates.clone(),
            withdrawals: Vec::new(),
            auxiliary_data_hash: self.auxiliary_data.as_ref().map(|aux| aux.hash()),
            validity_interval_start: None,
            mint: self.mint.clone(),
            script_data_hash: None,
            collateral: Vec::new(),
            required_signers: Vec::new(),
            network_id: None,
        })
    }

    /// The linear fee for a body, measured on the complete transaction
    /// with one dummy witness per registered key.
    fn min_fee_for_body(&self, body: &TxBody) -> Result<Coin, TransactionError> {
        let tx = Tx {
            body: body.clone(),
            witness_set: self.dummy_witness_set(),
            is_valid: true,
            auxiliary_data: self.auxiliary_data.clone(),
        };
        let size = tx.size()? as u64;
        Ok(self.protocol.min_fee_a * size + self.protocol.min_fee_b)
    }

    /// A witness set of the right shape for size measurement; vkeys and
    /// signatures are fixed-width, so a throwaway key stands in for the
    /// real ones.
    fn dummy_witness_set(&self) -> WitnessSet {
        let throwaway = ExtendedSigningKey::from_entropy(b"fee sizing entropy, never spent!", "");
        let vk = throwaway.verification_key();
        let signature = throwaway.sign(vk.key_bytes());
        let mut vkey = [0u8; 32];
        vkey.copy_from_slice(vk.key_bytes());

        WitnessSet {
            vkey_witnesses: self
                .signing_keys
                .iter()
                .map(|_| VKeyWitness {
                    vkey,
                    signature,
                })
                .collect(),
            native_scripts: self.native_scripts.clone(),
        }
    }
}
