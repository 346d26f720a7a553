/// Cardano SDK - Cryptographic primitives, canonical CBOR, and HD keys.
///
/// This crate provides the foundational building blocks for the Cardano SDK:
/// - Hash functions (Blake2b-224/256, SHA-512, HMAC-SHA512, SHA3-512, CRC32)
/// - Fixed-size hash types for key hashes, script hashes, and transaction IDs
/// - Canonical CBOR encoding/decoding with deterministic map ordering
/// - Ed25519-BIP32 hierarchical-deterministic extended keys (modern V2 and
///   legacy V1 derivation schemes), signing and verification

pub mod hash;
pub mod cbor;
pub mod hd;

mod error;
pub use error::PrimitivesError;
