use crate::cbor::CborError;

/// Unified error type for all primitives operations.
///
/// Covers errors from hashing, key derivation, signing, and encoding.
#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("invalid hash length: expected {expected}, got {got}")]
    InvalidHashLength { expected: usize, got: usize },

    #[error("invalid signature length: expected {expected}, got {got}")]
    InvalidSignatureLength { expected: usize, got: usize },

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("hardened derivation requires the signing key")]
    HardenedFromPublic,

    #[error("invalid bech32: {0}")]
    InvalidBech32(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("cbor error: {0}")]
    Cbor(#[from] CborError),
}

impl From<hex::FromHexError> for PrimitivesError {
    fn from(e: hex::FromHexError) -> Self {
        PrimitivesError::InvalidHex(e.to_string())
    }
}
