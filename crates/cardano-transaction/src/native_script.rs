//! Native (phase-1) scripts.
//!
//! A small combinator language over key hashes and validity bounds.
//! Scripts hash with a leading 0x00 domain byte before the CBOR body.

use cardano_primitives::cbor::{CborError, CborReader, CborWriter};
use cardano_primitives::hash::{blake2b224, Hash28};

use crate::TransactionError;

/// A native script term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NativeScript {
    /// `[0, keyhash]` - satisfied by a signature from the named key.
    ScriptPubkey(Hash28),
    /// `[1, [scripts]]` - all sub-scripts must be satisfied.
    ScriptAll(Vec<NativeScript>),
    /// `[2, [scripts]]` - at least one sub-script must be satisfied.
    ScriptAny(Vec<NativeScript>),
    /// `[3, n, [scripts]]` - at least n sub-scripts must be satisfied.
    ScriptNofK(u64, Vec<NativeScript>),
    /// `[4, slot]` - invalid before the given slot.
    InvalidBefore(u64),
    /// `[5, slot]` - invalid at and after the given slot.
    InvalidHereafter(u64),
}

impl NativeScript {
    /// Encode as `[discriminant, ...]`.
    pub fn write_cbor(&self, writer: &mut CborWriter) {
        match self {
            NativeScript::ScriptPubkey(keyhash) => {
                writer.write_array(2);
                writer.write_uint(0);
                writer.write_bytes(keyhash.as_bytes());
            }
            NativeScript::ScriptAll(scripts) => {
                writer.write_array(2);
                writer.write_uint(1);
                write_script_list(writer, scripts);
            }
            NativeScript::ScriptAny(scripts) => {
                writer.write_array(2);
                writer.write_uint(2);
                write_script_list(writer, scripts);
            }
            NativeScript::ScriptNofK(n, scripts) => {
                writer.write_array(3);
                writer.write_uint(3);
                writer.write_uint(*n);
                write_script_list(writer, scripts);
            }
            NativeScript::InvalidBefore(slot) => {
                writer.write_array(2);
                writer.write_uint(4);
                writer.write_uint(*slot);
            }
            NativeScript::InvalidHereafter(slot) => {
                writer.write_array(2);
                writer.write_uint(5);
                writer.write_uint(*slot);
            }
        }
    }

    /// Decode by discriminant, enforcing the variant's field count.
    pub fn read_cbor(reader: &mut CborReader) -> Result<Self, TransactionError> {
        let len = reader.read_array()?;
        let kind = reader.read_uint()?;

        let expect_len = |expected: u64| -> Result<(), TransactionError> {
            if len != expected {
                return Err(TransactionError::Cbor(CborError::WrongFieldCount {
                    what: "native script",
                    expected,
                    got: len,
                }));
            }
            Ok(())
        };

        match kind {
            0 => {
                expect_len(2)?;
                Ok(NativeScript::ScriptPubkey(Hash28::from_bytes(
                    reader.read_bytes()?,
                )?))
            }
            1 => {
                expect_len(2)?;
                Ok(NativeScript::ScriptAll(read_script_list(reader)?))
            }
            2 => {
                expect_len(2)?;
                Ok(NativeScript::ScriptAny(read_script_list(reader)?))
            }
            3 => {
                expect_len(3)?;
                let n = reader.read_uint()?;
                Ok(NativeScript::ScriptNofK(n, read_script_list(reader)?))
            }
            4 => {
                expect_len(2)?;
                Ok(NativeScript::InvalidBefore(reader.read_uint()?))
            }
            5 => {
                expect_len(2)?;
                Ok(NativeScript::InvalidHereafter(reader.read_uint()?))
            }
            got => Err(TransactionError::Cbor(CborError::UnknownDiscriminant {
                what: "native script",
                got,
            })),
        }
    }

    /// The script hash: Blake2b-224 over 0x00 followed by the CBOR body.
    ///
    /// Doubles as the minting policy ID for scripts used as policies.
    pub fn hash(&self) -> Hash28 {
        let mut writer = CborWriter::new();
        self.write_cbor(&mut writer);
        let mut preimage = vec![0x00];
        preimage.extend_from_slice(&writer.into_bytes());
        Hash28::new(blake2b224(&preimage))
    }
}

fn write_script_list(writer: &mut CborWriter, scripts: &[NativeScript]) {
    writer.write_array(scripts.len() as u64);
    for script in scripts {
        script.write_cbor(writer);
    }
}

fn read_script_list(reader: &mut CborReader) -> Result<Vec<NativeScript>, TransactionError> {
    let count = reader.read_array()?;
    let mut scripts = Vec::with_capacity(count as usize);
    for _ in 0..count {
        scripts.push(NativeScript::read_cbor(reader)?);
    }
    Ok(scripts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyhash(byte: u8) -> Hash28 {
        Hash28::new([byte; 28])
    }

    #[test]
    fn test_nested_roundtrip() {
        let script = NativeScript::ScriptAll(vec![
            NativeScript::ScriptPubkey(keyhash(1)),
            NativeScript::ScriptAny(vec![
                NativeScript::ScriptPubkey(keyhash(2)),
                NativeScript::ScriptNofK(
                    1,
                    vec![
                        NativeScript::InvalidBefore(100),
                        NativeScript::InvalidHereafter(10_000),
                    ],
                ),
            ]),
        ]);

        let mut w = CborWriter::new();
        script.write_cbor(&mut w);
        let bytes = w.into_bytes();
        let mut r = CborReader::new(&bytes);
        assert_eq!(NativeScript::read_cbor(&mut r).unwrap(), script);
        r.finish().unwrap();
    }

    #[test]
    fn test_hash_is_domain_separated() {
        let script = NativeScript::ScriptPubkey(keyhash(3));
        let mut w = CborWriter::new();
        script.write_cbor(&mut w);
        // The hash covers 0x00 || cbor, not the bare cbor.
        assert_ne!(
            script.hash().as_bytes(),
            &blake2b224(&w.into_bytes())
        );
    }

    #[test]
    fn test_unknown_discriminant_rejected() {
        let mut w = CborWriter::new();
        w.write_array(2);
        w.write_uint(6);
        w.write_uint(0);
        let bytes = w.into_bytes();
        let mut r = CborReader::new(&bytes);
        assert!(NativeScript::read_cbor(&mut r).is_err());
    }
}
