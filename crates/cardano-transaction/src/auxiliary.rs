//! Auxiliary data (transaction metadata).

use std::collections::BTreeMap;

use cardano_primitives::cbor::{CborError, CborReader, CborWriter};
use cardano_primitives::hash::{blake2b256, Hash32};

use crate::TransactionError;

/// A metadata value.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Metadatum {
    Int(i64),
    Bytes(Vec<u8>),
    Text(String),
    List(Vec<Metadatum>),
    Map(BTreeMap<Metadatum, Metadatum>),
}

impl Metadatum {
    fn write_cbor(&self, writer: &mut CborWriter) {
        match self {
            Metadatum::Int(v) => writer.write_int(*v),
            Metadatum::Bytes(b) => writer.write_bytes(b),
            Metadatum::Text(t) => writer.write_text(t),
            Metadatum::List(items) => {
                writer.write_array(items.len() as u64);
                for item in items {
                    item.write_cbor(writer);
                }
            }
            Metadatum::Map(entries) => {
                let mut encoded = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let mut k = CborWriter::new();
                    key.write_cbor(&mut k);
                    let mut v = CborWriter::new();
                    value.write_cbor(&mut v);
                    encoded.push((k.into_bytes(), v.into_bytes()));
                }
                writer.write_map_canonical(encoded);
            }
        }
    }

    fn read_cbor(reader: &mut CborReader) -> Result<Self, TransactionError> {
        match reader.peek_major()? {
            0 | 1 => Ok(Metadatum::Int(reader.read_int()?)),
            2 => Ok(Metadatum::Bytes(reader.read_bytes()?.to_vec())),
            3 => Ok(Metadatum::Text(reader.read_text()?.to_string())),
            4 => {
                let count = reader.read_array()?;
                let mut items = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    items.push(Metadatum::read_cbor(reader)?);
                }
                Ok(Metadatum::List(items))
            }
            5 => {
                let count = reader.read_map()?;
                let mut entries = BTreeMap::new();
                for _ in 0..count {
                    let key = Metadatum::read_cbor(reader)?;
                    let value = Metadatum::read_cbor(reader)?;
                    entries.insert(key, value);
                }
                Ok(Metadatum::Map(entries))
            }
            found => Err(TransactionError::Cbor(CborError::TypeMismatch {
                expected: "metadatum",
                found,
            })),
        }
    }
}

/// Auxiliary data attached to a transaction: a label -> metadatum map.
///
/// The body does not embed it; it carries only the Blake2b-256 hash of
/// these bytes.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AuxiliaryData {
    pub metadata: BTreeMap<u64, Metadatum>,
}

impl AuxiliaryData {
    /// Attach a labeled metadatum.
    pub fn set(&mut self, label: u64, value: Metadatum) {
        self.metadata.insert(label, value);
    }

    /// Encode as a label -> metadatum map in canonical order.
    pub fn write_cbor(&self, writer: &mut CborWriter) {
        let mut entries = Vec::with_capacity(self.metadata.len());
        for (label, value) in &self.metadata {
            let mut k = CborWriter::new();
            k.write_uint(*label);
            let mut v = CborWriter::new();
            value.write_cbor(&mut v);
            entries.push((k.into_bytes(), v.into_bytes()));
        }
        writer.write_map_canonical(entries);
    }

    /// Decode from a label -> metadatum map.
    pub fn read_cbor(reader: &mut CborReader) -> Result<Self, TransactionError> {
        let count = reader.read_map()?;
        let mut metadata = BTreeMap::new();
        for _ in 0..count {
            let label = reader.read_uint()?;
            metadata.insert(label, Metadatum::read_cbor(reader)?);
        }
        Ok(AuxiliaryData { metadata })
    }

    /// The hash embedded into the transaction body.
    pub fn hash(&self) -> Hash32 {
        let mut writer = CborWriter::new();
        self.write_cbor(&mut writer);
        Hash32::new(blake2b256(&writer.into_bytes()))
    }
}
