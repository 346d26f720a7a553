//! Hash function primitives for the Cardano SDK.
//!
//! Provides Blake2b-224, Blake2b-256, SHA-512, HMAC-SHA512, SHA3-512,
//! CRC32, and PBKDF2-HMAC-SHA512 along with the fixed-size `Hash28` and
//! `Hash32` digest types used throughout the chain's data model.

use blake2::digest::consts::{U28, U32};
use blake2::Blake2b;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha512};
use sha3::Sha3_512;

use crate::PrimitivesError;

type Blake2b224 = Blake2b<U28>;
type Blake2b256 = Blake2b<U32>;

/// Compute the Blake2b-224 hash of the input data.
///
/// This is the digest used for key hashes, script hashes, and policy IDs.
///
/// # Arguments
/// * `data` - Byte slice to hash.
///
/// # Returns
/// A 28-byte Blake2b digest.
pub fn blake2b224(data: &[u8]) -> [u8; 28] {
    let mut hasher = Blake2b224::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the Blake2b-256 hash of the input data.
///
/// This is the digest used for transaction body hashes and auxiliary
/// data hashes.
///
/// # Arguments
/// * `data` - Byte slice to hash.
///
/// # Returns
/// A 32-byte Blake2b digest.
pub fn blake2b256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the SHA-512 hash of the input data.
///
/// # Arguments
/// * `data` - Byte slice to hash.
///
/// # Returns
/// A 64-byte SHA-512 digest.
pub fn sha512(data: &[u8]) -> [u8; 64] {
    let mut hasher = Sha512::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 64];
    output.copy_from_slice(&result);
    output
}

/// Compute HMAC-SHA512 of the input data with the given key.
///
/// Used by both HD child-derivation schemes.
///
/// # Arguments
/// * `key` - The HMAC key bytes (the chain code during derivation).
/// * `data` - The message bytes to authenticate.
///
/// # Returns
/// A 64-byte HMAC-SHA512 tag.
pub fn sha512_hmac(key: &[u8], data: &[u8]) -> [u8; 64] {
    type HmacSha512 = Hmac<Sha512>;
    let mut mac = HmacSha512::new_from_slice(key)
        .expect("HMAC accepts any key length");
    mac.update(data);
    let result = mac.finalize();
    let mut output = [0u8; 64];
    output.copy_from_slice(&result.into_bytes());
    output
}

/// Compute the SHA3-512 hash of the input data.
///
/// Only used while computing the root hash of legacy Byron addresses.
///
/// # Arguments
/// * `data` - Byte slice to hash.
///
/// # Returns
/// A 64-byte SHA3-512 digest.
pub fn sha3_512(data: &[u8]) -> [u8; 64] {
    let mut hasher = Sha3_512::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 64];
    output.copy_from_slice(&result);
    output
}

/// Compute the CRC32 (IEEE) checksum of the input data.
///
/// Only used by the legacy Byron address envelope.
///
/// # Arguments
/// * `data` - Byte slice to checksum.
///
/// # Returns
/// The 32-bit checksum value.
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Stretch a password and salt into key material with PBKDF2-HMAC-SHA512.
///
/// Used for master-key generation (4096 rounds, 96 bytes) and for the
/// legacy HD-payload key (500 rounds, 32 bytes).
///
/// # Arguments
/// * `password` - The password bytes.
/// * `salt` - The salt bytes.
/// * `iterations` - The PBKDF2 round count.
/// * `output` - Destination buffer; its length selects the output size.
pub fn pbkdf2_sha512(password: &[u8], salt: &[u8], iterations: u32, output: &mut [u8]) {
    pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, iterations, output);
}

// ---------------------------------------------------------------------------
// Fixed-size digest types
// ---------------------------------------------------------------------------

/// Size of a `Hash28` in bytes.
pub const HASH28_SIZE: usize = 28;

/// Size of a `Hash32` in bytes.
pub const HASH32_SIZE: usize = 32;

/// A 28-byte Blake2b-224 digest.
///
/// Identifies keys, scripts, minting policies, and stake pools.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Hash28([u8; HASH28_SIZE]);

/// A 32-byte Blake2b-256 digest.
///
/// Identifies transactions (via their body hash) and auxiliary data.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Hash32([u8; HASH32_SIZE]);

impl Hash28 {
    /// Create a `Hash28` from a raw 28-byte array.
    pub fn new(bytes: [u8; HASH28_SIZE]) -> Self {
        Hash28(bytes)
    }

    /// Create a `Hash28` from a byte slice.
    ///
    /// # Arguments
    /// * `bytes` - A slice that must be exactly 28 bytes.
    ///
    /// # Returns
    /// `Ok(Hash28)` if the slice is 28 bytes, or an error otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != HASH28_SIZE {
            return Err(PrimitivesError::InvalidHashLength {
                expected: HASH28_SIZE,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; HASH28_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Hash28(arr))
    }

    /// Create a `Hash28` from a hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let decoded = hex::decode(hex_str)?;
        Self::from_bytes(&decoded)
    }

    /// Access the internal byte array.
    pub fn as_bytes(&self) -> &[u8; HASH28_SIZE] {
        &self.0
    }

    /// Serialize the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Hash32 {
    /// Create a `Hash32` from a raw 32-byte array.
    pub fn new(bytes: [u8; HASH32_SIZE]) -> Self {
        Hash32(bytes)
    }

    /// Create a `Hash32` from a byte slice.
    ///
    /// # Arguments
    /// * `bytes` - A slice that must be exactly 32 bytes.
    ///
    /// # Returns
    /// `Ok(Hash32)` if the slice is 32 bytes, or an error otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != HASH32_SIZE {
            return Err(PrimitivesError::InvalidHashLength {
                expected: HASH32_SIZE,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; HASH32_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Hash32(arr))
    }

    /// Create a `Hash32` from a hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let decoded = hex::decode(hex_str)?;
        Self::from_bytes(&decoded)
    }

    /// Access the internal byte array.
    pub fn as_bytes(&self) -> &[u8; HASH32_SIZE] {
        &self.0
    }

    /// Serialize the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for Hash28 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Display for Hash32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Blake2b ----

    #[test]
    fn test_blake2b224_empty_string() {
        let hash = blake2b224(b"");
        assert_eq!(
            hex::encode(hash),
            "836cc68931c2e4e3e838602eca1902591d216837bafddfe6f0c8cb07"
        );
    }

    #[test]
    fn test_blake2b256_empty_string() {
        let hash = blake2b256(b"");
        assert_eq!(
            hex::encode(hash),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }

    // ---- SHA3-512 ----

    #[test]
    fn test_sha3_512_empty_string() {
        let hash = sha3_512(b"");
        assert_eq!(
            hex::encode(hash),
            "a69f73cca23a9ac5c8b567dc185a756e97c982164fe25859e0d1dcc1475c80a6\
             15b2123af1f5f94c11e3e9402c3ac558f500199d95b6d3e301758586281dcd26"
        );
    }

    // ---- CRC32 ----

    #[test]
    fn test_crc32_check_value() {
        // The standard CRC32 check input.
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    // ---- HMAC-SHA512 (RFC 4231 vectors) ----

    #[test]
    fn test_sha512_hmac_case_1() {
        let key = hex::decode("0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b").unwrap();
        let msg = hex::decode("4869205468657265").unwrap(); // "Hi There"
        let mac = sha512_hmac(&key, &msg);
        assert_eq!(
            hex::encode(mac),
            "87aa7cdea5ef619d4ff0b4241a1d6cb02379f4e2ce4ec2787ad0b30545e17cde\
             daa833b7d6b8a702038b274eaea3f4e4be9d914eeb61f1702e696c203a126854"
        );
    }

    #[test]
    fn test_sha512_hmac_case_2() {
        let key = hex::decode("4a656665").unwrap(); // "Jefe"
        let msg = hex::decode("7768617420646f2079612077616e7420666f72206e6f7468696e673f").unwrap();
        let mac = sha512_hmac(&key, &msg);
        assert_eq!(
            hex::encode(mac),
            "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea250554\
             9758bf75c05a994a6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737"
        );
    }

    // ---- Hash types ----

    #[test]
    fn test_hash28_from_bytes_wrong_length() {
        let err = Hash28::from_bytes(&[0u8; 27]).unwrap_err();
        assert!(err.to_string().contains("expected 28, got 27"));
    }

    #[test]
    fn test_hash32_hex_roundtrip() {
        let hex_str = "b59fec079542f4785d3d197ada365e496de932237ae168cba599926dd6f42e31";
        let hash = Hash32::from_hex(hex_str).unwrap();
        assert_eq!(hash.to_hex(), hex_str);
        assert_eq!(format!("{}", hash), hex_str);
    }

    #[test]
    fn test_hash28_ordering_is_bytewise() {
        let a = Hash28::new([0u8; 28]);
        let mut high = [0u8; 28];
        high[0] = 1;
        let b = Hash28::new(high);
        assert!(a < b);
    }
}
