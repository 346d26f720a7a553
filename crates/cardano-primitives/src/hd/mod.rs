//! Ed25519-BIP32 hierarchical-deterministic keys.
//!
//! Provides extended signing/verification keys, master-key generation from
//! entropy, child derivation under the modern (V2) and legacy (V1) tweak
//! schemes, and signing/verification over the extended scalar pair.

mod derivation;
mod extended_key;

pub use extended_key::{
    ExtendedSigningKey, ExtendedVerificationKey, Signature, SIGNATURE_SIZE, XSK_SIZE, XVK_SIZE,
};

/// The hardened-derivation bit: indexes at or above this value require
/// the signing key.
pub const HARDENED: u32 = 0x8000_0000;

/// Mark a derivation index as hardened.
pub const fn harden(index: u32) -> u32 {
    index | HARDENED
}

/// Whether a derivation index has the hardened bit set.
pub const fn is_hardened(index: u32) -> bool {
    index & HARDENED != 0
}
