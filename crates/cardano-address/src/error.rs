use cardano_primitives::cbor::CborError;
use cardano_primitives::PrimitivesError;

/// Error types for address construction, encoding, and decoding.
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    /// The bech32 human-readable prefix is not the one the address kind
    /// and network require.
    #[error("wrong address prefix: expected {expected:?}, got {got:?}")]
    WrongPrefix { expected: String, got: String },

    /// The header nibble does not name a known address kind.
    #[error("unknown address kind 0x{0:x}")]
    UnknownAddressKind(u8),

    /// The header's network tag is neither testnet (0) nor mainnet (1).
    #[error("unknown network tag {0}")]
    UnknownNetwork(u8),

    /// The decoded payload length does not match the address kind.
    #[error("invalid {kind} address length: expected {expected}, got {got}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    /// The payload ended inside a variable-length field.
    #[error("truncated address payload")]
    Truncated,

    /// A pointer component does not fit in 64 bits.
    #[error("pointer component overflows 64 bits")]
    PointerOverflow,

    /// An underlying bech32 encoding/decoding error.
    #[error("invalid bech32: {0}")]
    Bech32(String),

    /// An underlying base58 decoding error.
    #[error("invalid base58: {0}")]
    Base58(String),

    /// The legacy address CRC32 does not match its payload.
    #[error("crc32 mismatch: expected {expected:#010x}, got {got:#010x}")]
    ChecksumMismatch { expected: u32, got: u32 },

    /// The HD payload failed to authenticate or decode.
    #[error("hd payload decryption failed")]
    PayloadDecrypt,

    /// An underlying CBOR error (forwarded from `cardano-primitives`).
    #[error("cbor error: {0}")]
    Cbor(#[from] CborError),

    /// An underlying primitives error.
    #[error("primitives error: {0}")]
    Primitives(#[from] PrimitivesError),
}
