//! Stake credentials.
//!
//! A credential is a 28-byte Blake2b hash identifying either a public key
//! or a script as the controller of funds or stake. The tag is fixed at
//! construction and never changes.

use cardano_primitives::cbor::{CborError, CborReader, CborWriter};
use cardano_primitives::hash::{blake2b224, Hash28};
use cardano_primitives::hd::ExtendedVerificationKey;

/// Discriminant for key-hash credentials in the wire form.
const KIND_KEY: u64 = 0;
/// Discriminant for script-hash credentials in the wire form.
const KIND_SCRIPT: u64 = 1;

/// A key-hash or script-hash credential.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum StakeCredential {
    /// Blake2b-224 hash of an Ed25519 public key.
    KeyHash(Hash28),
    /// Blake2b-224 hash of a script.
    ScriptHash(Hash28),
}

impl StakeCredential {
    /// Build a key credential from a verification key.
    ///
    /// Hashes the 32-byte public point (the chain code does not
    /// participate).
    pub fn from_key(key: &ExtendedVerificationKey) -> Self {
        StakeCredential::KeyHash(Hash28::new(blake2b224(key.key_bytes())))
    }

    /// Build a key credential from an existing key hash.
    pub fn from_key_hash(hash: Hash28) -> Self {
        StakeCredential::KeyHash(hash)
    }

    /// Build a script credential by hashing opaque script bytes.
    pub fn from_script(script: &[u8]) -> Self {
        StakeCredential::ScriptHash(Hash28::new(blake2b224(script)))
    }

    /// Build a script credential from an existing script hash.
    pub fn from_script_hash(hash: Hash28) -> Self {
        StakeCredential::ScriptHash(hash)
    }

    /// The credential's 28-byte hash, whichever variant holds it.
    pub fn hash(&self) -> &Hash28 {
        match self {
            StakeCredential::KeyHash(h) => h,
            StakeCredential::ScriptHash(h) => h,
        }
    }

    /// Whether this is a script credential (drives the address header
    /// nibble).
    pub fn is_script(&self) -> bool {
        matches!(self, StakeCredential::ScriptHash(_))
    }

    /// Encode as `[discriminant, hash]`.
    pub fn write_cbor(&self, writer: &mut CborWriter) {
        writer.write_array(2);
        match self {
            StakeCredential::KeyHash(h) => {
                writer.write_uint(KIND_KEY);
                writer.write_bytes(h.as_bytes());
            }
            StakeCredential::ScriptHash(h) => {
                writer.write_uint(KIND_SCRIPT);
                writer.write_bytes(h.as_bytes());
            }
        }
    }

    /// Decode from `[discriminant, hash]`.
    pub fn read_cbor(reader: &mut CborReader) -> Result<Self, CborError> {
        reader.expect_array(2, "stake credential")?;
        let kind = reader.read_uint()?;
        let hash = Hash28::from_bytes(reader.read_bytes()?).map_err(|_| {
            CborError::TypeMismatch {
                expected: "28-byte hash",
                found: 2,
            }
        })?;
        match kind {
            KIND_KEY => Ok(StakeCredential::KeyHash(hash)),
            KIND_SCRIPT => Ok(StakeCredential::ScriptHash(hash)),
            got => Err(CborError::UnknownDiscriminant {
                what: "stake credential",
                got,
            }),
        }
    }
}
