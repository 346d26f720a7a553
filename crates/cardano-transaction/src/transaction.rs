//! Core transaction types and their canonical CBOR codec.
//!
//! Fixed-shape records encode as arrays in field order; the body encodes
//! as a map keyed by small integers with absent fields omitted entirely.
//! The determinism of these bytes is load-bearing: the builder's fee is a
//! function of the serialized length, and the body hash is the signing
//! target.
//!
//! # Body map keys
//!
//! | Key | Field                   |
//! |-----|-------------------------|
//! | 0   | inputs                  |
//! | 1   | outputs                 |
//! | 2   | fee                     |
//! | 3   | ttl                     |
//! | 4   | certificates            |
//! | 5   | withdrawals             |
//! | 6   | update (not carried)    |
//! | 7   | auxiliary data hash     |
//! | 8   | validity interval start |
//! | 9   | mint                    |
//! | 10  | script data hash        |
//! | 11  | collateral              |
//! | 12  | required signers        |
//! | 13  | network id              |

use cardano_address::Address;
use cardano_primitives::cbor::{CborError, CborReader, CborWriter};
use cardano_primitives::hash::{blake2b256, Hash28, Hash32};
use cardano_primitives::hd::Signature;

use crate::auxiliary::AuxiliaryData;
use crate::certificate::Certificate;
use crate::native_script::NativeScript;
use crate::value::{Coin, MultiAsset, Value};
use crate::TransactionError;

/// A reference to a previous transaction output.
///
/// The `amount` is builder-side bookkeeping only and never serialized;
/// the wire form is `[tx_hash, index]`, and equality follows the wire
/// form.
#[derive(Clone, Debug)]
pub struct TxInput {
    /// Hash of the transaction holding the spent output.
    pub tx_hash: Hash32,
    /// Index of the spent output within that transaction.
    pub index: u64,
    /// The spent output's value, for balance bookkeeping.
    pub amount: Value,
}

impl TxInput {
    /// Create an input.
    pub fn new(tx_hash: Hash32, index: u64, amount: Value) -> Self {
        TxInput {
            tx_hash,
            index,
            amount,
        }
    }

    /// Encode as `[tx_hash, index]`.
    pub fn write_cbor(&self, writer: &mut CborWriter) {
        writer.write_array(2);
        writer.write_bytes(self.tx_hash.as_bytes());
        writer.write_uint(self.index);
    }

    /// Decode from `[tx_hash, index]`; the amount comes back zero.
    pub fn read_cbor(reader: &mut CborReader) -> Result<Self, TransactionError> {
        reader.expect_array(2, "transaction input")?;
        let tx_hash = Hash32::from_bytes(reader.read_bytes()?)?;
        let index = reader.read_uint()?;
        Ok(TxInput {
            tx_hash,
            index,
            amount: Value::new(0),
        })
    }
}

impl PartialEq for TxInput {
    fn eq(&self, other: &Self) -> bool {
        self.tx_hash == other.tx_hash && self.index == other.index
    }
}

impl Eq for TxInput {}

/// A transaction output: an address and the value paid to it.
///
/// Wire form `[address bytes, value]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOutput {
    /// The receiving address.
    pub address: Address,
    /// The value paid.
    pub amount: Value,
}

impl TxOutput {
    /// Create an output.
    pub fn new(address: Address, amount: Value) -> Self {
        TxOutput { address, amount }
    }

    /// Encode as `[address bytes, value]`.
    pub fn write_cbor(&self, writer: &mut CborWriter) {
        writer.write_array(2);
        writer.write_bytes(&self.address.to_bytes());
        self.amount.write_cbor(writer);
    }

    /// Decode from `[address bytes, value]`.
    pub fn read_cbor(reader: &mut CborReader) -> Result<Self, TransactionError> {
        reader.expect_array(2, "transaction output")?;
        let address = Address::from_bytes(reader.read_bytes()?)?;
        let amount = Value::read_cbor(reader)?;
        Ok(TxOutput { address, amount })
    }
}

/// A transaction body.
///
/// Optional fields holding their absent value are omitted from the map,
/// never encoded as null.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct TxBody {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub fee: Coin,
    pub ttl: Option<u64>,
    pub certificates: Vec<Certificate>,
    /// Reward withdrawals: stake address -> amount.
    pub withdrawals: Vec<(Address, Coin)>,
    pub auxiliary_data_hash: Option<Hash32>,
    pub validity_interval_start: Option<u64>,
    pub mint: MultiAsset,
    pub script_data_hash: Option<Hash32>,
    pub collateral: Vec<TxInput>,
    pub required_signers: Vec<Hash28>,
    pub network_id: Option<u8>,
}

impl TxBody {
    /// Encode as the canonical integer-keyed map.
    pub fn write_cbor(&self, writer: &mut CborWriter) -> Result<(), TransactionError> {
        let mut entries: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();

        let key = |k: u64| {
            let mut w = CborWriter::new();
            w.write_uint(k);
            w.into_bytes()
        };

        let mut inputs = CborWriter::new();
        inputs.write_array(self.inputs.len() as u64);
        for input in &self.inputs {
            input.write_cbor(&mut inputs);
        }
        entries.push((key(0), inputs.into_bytes()));

        let mut outputs = CborWriter::new();
        outputs.write_array(self.outputs.len() as u64);
        for output in &self.outputs {
            output.write_cbor(&mut outputs);
        }
        entries.push((key(1), outputs.into_bytes()));

        let mut fee = CborWriter::new();
        fee.write_uint(self.fee);
        entries.push((key(2), fee.into_bytes()));

        if let Some(ttl) = self.ttl {
            let mut w = CborWriter::new();
            w.write_uint(ttl);
            entries.push((key(3), w.into_bytes()));
        }

        if !self.certificates.is_empty() {
            let mut w = CborWriter::new();
            w.write_array(self.certificates.len() as u64);
            for cert in &self.certificates {
                cert.write_cbor(&mut w)?;
            }
            entries.push((key(4), w.into_bytes()));
        }

        if !self.withdrawals.is_empty() {
            let mut w = CborWriter::new();
            let mut pairs = Vec::with_capacity(self.withdrawals.len());
            for (address, amount) in &self.withdrawals {
                let mut k = CborWriter::new();
                k.write_bytes(&address.to_bytes());
                let mut v = CborWriter::new();
                v.write_uint(*amount);
                pairs.push((k.into_bytes(), v.into_bytes()));
            }
            w.write_map_canonical(pairs);
            entries.push((key(5), w.into_bytes()));
        }

        if let Some(hash) = &self.auxiliary_data_hash {
            let mut w = CborWriter::new();
            w.write_bytes(hash.as_bytes());
            entries.push((key(7), w.into_bytes()));
        }

        if let Some(start) = self.validity_interval_start {
            let mut w = CborWriter::new();
            w.write_uint(start);
            entries.push((key(8), w.into_bytes()));
        }

        if !self.mint.is_empty() {
            let mut w = CborWriter::new();
            self.mint.write_cbor(&mut w);
            entries.push((key(9), w.into_bytes()));
        }

        if let Some(hash) = &self.script_data_hash {
            let mut w = CborWriter::new();
            w.write_bytes(hash.as_bytes());
            entries.push((key(10), w.into_bytes()));
        }

        if !self.collateral.is_empty() {
            let mut w = CborWriter::new();
            w.write_array(self.collateral.len() as u64);
            for input in &self.collateral {
                input.write_cbor(&mut w);
            }
            entries.push((key(11), w.into_bytes()));
        }

        if !self.required_signers.is_empty() {
            let mut w = CborWriter::new();
            w.write_array(self.required_signers.len() as u64);
            for signer in &self.required_signers {
                w.write_bytes(signer.as_bytes());
            }
            entries.push((key(12), w.into_bytes()));
        }

        if let Some(network_id) = self.network_id {
            let mut w = CborWriter::new();
            w.write_uint(network_id as u64);
            entries.push((key(13), w.into_bytes()));
        }

        writer.write_map_canonical(entries);
        Ok(())
    }

    /// Decode from the integer-keyed map.
    pub fn read_cbor(reader: &mut CborReader) -> Result<Self, TransactionError> {
        let mut body = TxBody::default();
        let entries = reader.read_map()?;
        for _ in 0..entries {
            match reader.read_uint()? {
                0 => {
                    let count = reader.read_array()?;
                    for _ in 0..count {
                        body.inputs.push(TxInput::read_cbor(reader)?);
                    }
                }
                1 => {
                    let count = reader.read_array()?;
                    for _ in 0..count {
                        body.outputs.push(TxOutput::read_cbor(reader)?);
                    }
                }
                2 => body.fee = reader.read_uint()?,
                3 => body.ttl = Some(reader.read_uint()?),
                4 => {
                    let count = reader.read_array()?;
                    for _ in 0..count {
                        body.certificates.push(Certificate::read_cbor(reader)?);
                    }
                }
                5 => {
                    let count = reader.read_map()?;
                    for _ in 0..count {
                        let address = Address::from_bytes(reader.read_bytes()?)?;
                        let amount = reader.read_uint()?;
                        body.withdrawals.push((address, amount));
                    }
                }
                6 => return Err(TransactionError::UnsupportedField("update")),
                7 => {
                    body.auxiliary_data_hash = Some(Hash32::from_bytes(reader.read_bytes()?)?)
                }
                8 => body.validity_interval_start = Some(reader.read_uint()?),
                9 => body.mint = MultiAsset::read_cbor(reader)?,
                10 => body.script_data_hash = Some(Hash32::from_bytes(reader.read_bytes()?)?),
                11 => {
                    let count = reader.read_array()?;
                    for _ in 0..count {
                        body.collateral.push(TxInput::read_cbor(reader)?);
                    }
                }
                12 => {
                    let count = reader.read_array()?;
                    for _ in 0..count {
                        body.required_signers
                            .push(Hash28::from_bytes(reader.read_bytes()?)?);
                    }
                }
                13 => {
                    let id = reader.read_uint()?;
                    body.network_id =
                        Some(u8::try_from(id).map_err(|_| CborError::IntOverflow)?);
                }
                got => {
                    return Err(TransactionError::Cbor(CborError::UnknownDiscriminant {
                        what: "transaction body key",
                        got,
                    }))
                }
            }
        }
        Ok(body)
    }

    /// The canonical bytes of this body.
    pub fn to_cbor(&self) -> Result<Vec<u8>, TransactionError> {
        let mut writer = CborWriter::new();
        self.write_cbor(&mut writer)?;
        Ok(writer.into_bytes())
    }

    /// The Blake2b-256 hash of the canonical bytes: the signing target and
    /// the transaction ID preimage.
    pub fn hash(&self) -> Result<Hash32, TransactionError> {
        Ok(Hash32::new(blake2b256(&self.to_cbor()?)))
    }
}

/// A verification-key witness: the public key and its signature over the
/// body hash. Wire form `[vkey, signature]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VKeyWitness {
    /// The 32-byte public key.
    pub vkey: [u8; 32],
    /// The signature over the body hash.
    pub signature: Signature,
}

impl VKeyWitness {
    fn write_cbor(&self, writer: &mut CborWriter) {
        writer.write_array(2);
        writer.write_bytes(&self.vkey);
        writer.write_bytes(self.signature.as_bytes());
    }

    fn read_cbor(reader: &mut CborReader) -> Result<Self, TransactionError> {
        reader.expect_array(2, "vkey witness")?;
        let vkey_bytes = reader.read_bytes()?;
        let vkey: [u8; 32] =
            vkey_bytes
                .try_into()
                .map_err(|_| TransactionError::Cbor(CborError::TypeMismatch {
                    expected: "32-byte vkey",
                    found: 2,
                }))?;
        let signature = Signature::from_bytes(reader.read_bytes()?)?;
        Ok(VKeyWitness { vkey, signature })
    }
}

/// The witness set: vkey witnesses (key 0) and native scripts (key 1),
/// each omitted when empty. Witness order is call order, never sorted.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct WitnessSet {
    pub vkey_witnesses: Vec<VKeyWitness>,
    pub native_scripts: Vec<NativeScript>,
}

impl WitnessSet {
    /// Encode as the integer-keyed map.
    pub fn write_cbor(&self, writer: &mut CborWriter) {
        let mut entries: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();

        if !self.vkey_witnesses.is_empty() {
            let mut k = CborWriter::new();
            k.write_uint(0);
            let mut v = CborWriter::new();
            v.write_array(self.vkey_witnesses.len() as u64);
            for witness in &self.vkey_witnesses {
                witness.write_cbor(&mut v);
            }
            entries.push((k.into_bytes(), v.into_bytes()));
        }

        if !self.native_scripts.is_empty() {
            let mut k = CborWriter::new();
            k.write_uint(1);
            let mut v = CborWriter::new();
            v.write_array(self.native_scripts.len() as u64);
            for script in &self.native_scripts {
                script.write_cbor(&mut v);
            }
            entries.push((k.into_bytes(), v.into_bytes()));
        }

        writer.write_map_canonical(entries);
    }

    /// Decode from the integer-keyed map.
    pub fn read_cbor(reader: &mut CborReader) -> Result<Self, TransactionError> {
        let mut set = WitnessSet::default();
        let entries = reader.read_map()?;
        for _ in 0..entries {
            match reader.read_uint()? {
                0 => {
                    let count = reader.read_array()?;
                    for _ in 0..count {
                        set.vkey_witnesses.push(VKeyWitness::read_cbor(reader)?);
                    }
                }
                1 => {
                    let count = reader.read_array()?;
                    for _ in 0..count {
                        set.native_scripts.push(NativeScript::read_cbor(reader)?);
                    }
                }
                got => {
                    return Err(TransactionError::Cbor(CborError::UnknownDiscriminant {
                        what: "witness set key",
                        got,
                    }))
                }
            }
        }
        Ok(set)
    }
}

/// A complete transaction.
///
/// Wire form `[body, witness set, validity flag, auxiliary data or null]`.
/// Built once by the builder and treated as immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tx {
    pub body: TxBody,
    pub witness_set: WitnessSet,
    pub is_valid: bool,
    pub auxiliary_data: Option<AuxiliaryData>,
}

impl Tx {
    /// Serialize to canonical bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>, TransactionError> {
        let mut writer = CborWriter::new();
        writer.write_array(4);
        self.body.write_cbor(&mut writer)?;
        self.witness_set.write_cbor(&mut writer);
        writer.write_bool(self.is_valid);
        match &self.auxiliary_data {
            Some(aux) => aux.write_cbor(&mut writer),
            None => writer.write_null(),
        }
        Ok(writer.into_bytes())
    }

    /// Serialize to lowercase hex, the textual submission format.
    pub fn to_hex(&self) -> Result<String, TransactionError> {
        Ok(hex::encode(self.to_cbor()?))
    }

    /// Parse from canonical bytes.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = CborReader::new(bytes);
        reader.expect_array(4, "transaction")?;
        let body = TxBody::read_cbor(&mut reader)?;
        let witness_set = WitnessSet::read_cbor(&mut reader)?;
        let is_valid = reader.read_bool()?;
        let auxiliary_data = if reader.peek_null() {
            reader.read_null()?;
            None
        } else {
            Some(AuxiliaryData::read_cbor(&mut reader)?)
        };
        reader.finish()?;
        Ok(Tx {
            body,
            witness_set,
            is_valid,
            auxiliary_data,
        })
    }

    /// Parse from a hex string.
    pub fn from_hex(text: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(text)
            .map_err(cardano_primitives::PrimitivesError::from)?;
        Self::from_cbor(&bytes)
    }

    /// The transaction hash (the body hash).
    pub fn hash(&self) -> Result<Hash32, TransactionError> {
        self.body.hash()
    }

    /// The transaction ID: the body hash as hex.
    pub fn id(&self) -> Result<String, TransactionError> {
        Ok(self.hash()?.to_hex())
    }

    /// The serialized length in bytes, the input to the fee model.
    pub fn size(&self) -> Result<usize, TransactionError> {
        Ok(self.to_cbor()?.len())
    }
}
