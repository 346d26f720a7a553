//! Legacy Byron bootstrap addresses.
//!
//! A Byron address is a base58-encoded CBOR envelope:
//! `[tag 24(bytes(payload)), crc32(payload)]`, where the payload is
//! `[root, attributes, address type]`. The root is
//! Blake2b-224(SHA3-512(CBOR of the spending data)), and the attribute map
//! may carry an AEAD-sealed HD derivation path and an explicit network
//! magic (testnet only — mainnet is the absence of one).

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};

use cardano_primitives::cbor::{CborError, CborReader, CborWriter};
use cardano_primitives::hash::{blake2b224, crc32, pbkdf2_sha512, sha3_512, Hash28};
use cardano_primitives::hd::ExtendedVerificationKey;

use crate::address::Network;
use crate::AddressError;

/// Spending-data and address-type discriminant for public-key addresses.
const ADDR_TYPE_PUBKEY: u64 = 0;
/// Attribute key holding the sealed HD derivation path.
const ATTR_HD_PAYLOAD: u64 = 1;
/// Attribute key holding the explicit network magic.
const ATTR_NETWORK_MAGIC: u64 = 2;
/// CBOR tag for an embedded CBOR byte string.
const TAG_ENCODED_CBOR: u64 = 24;

/// PBKDF2 salt for the HD-payload key.
const PAYLOAD_KEY_SALT: &[u8] = b"address-hashing";
/// PBKDF2 round count for the HD-payload key.
const PAYLOAD_KEY_ITERATIONS: u32 = 500;
/// Fixed AEAD nonce for the HD payload.
const PAYLOAD_NONCE: &[u8; 12] = b"serokellfore";

/// A legacy bootstrap-era address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ByronAddress {
    /// Blake2b-224 root hash of the spending data.
    root: Hash28,
    /// AEAD ciphertext of the CBOR-encoded derivation path, if present.
    hd_payload: Option<Vec<u8>>,
    /// Explicit network magic; absent on mainnet.
    network_magic: Option<u64>,
}

impl ByronAddress {
    /// Build a legacy address for a public key with no HD payload.
    ///
    /// # Arguments
    /// * `xpub` - The 64-byte extended verification key being paid to.
    /// * `network_magic` - The protocol magic for testnets; `None` on
    ///   mainnet.
    pub fn new(xpub: &ExtendedVerificationKey, network_magic: Option<u64>) -> Self {
        Self::build(xpub, None, network_magic)
    }

    /// Build a legacy address carrying an encrypted derivation path.
    ///
    /// The path is sealed with a key stretched from the wallet's root
    /// verification key, so only the wallet that issued the address can
    /// recognize it.
    ///
    /// # Arguments
    /// * `xpub` - The extended verification key being paid to.
    /// * `root_xpub` - The wallet's root extended verification key.
    /// * `path` - The derivation path to seal into the attributes.
    /// * `network_magic` - The protocol magic for testnets; `None` on
    ///   mainnet.
    pub fn with_payload(
        xpub: &ExtendedVerificationKey,
        root_xpub: &ExtendedVerificationKey,
        path: &[u32],
        network_magic: Option<u64>,
    ) -> Self {
        let sealed = encrypt_derivation_path(root_xpub, path);
        Self::build(xpub, Some(sealed), network_magic)
    }

    fn build(
        xpub: &ExtendedVerificationKey,
        hd_payload: Option<Vec<u8>>,
        network_magic: Option<u64>,
    ) -> Self {
        let mut partial = ByronAddress {
            root: Hash28::new([0u8; 28]),
            hd_payload,
            network_magic,
        };

        // Spending data: [addr_type, [0, xpub], attributes].
        let mut writer = CborWriter::new();
        writer.write_array(3);
        writer.write_uint(ADDR_TYPE_PUBKEY);
        writer.write_array(2);
        writer.write_uint(ADDR_TYPE_PUBKEY);
        writer.write_bytes(xpub.as_bytes());
        partial.write_attributes(&mut writer);

        partial.root = Hash28::new(blake2b224(&sha3_512(&writer.into_bytes())));
        partial
    }

    /// The root hash identifying this address's spending data.
    pub fn root(&self) -> &Hash28 {
        &self.root
    }

    /// The network, inferred from the attribute map.
    pub fn network(&self) -> Network {
        if self.network_magic.is_some() {
            Network::Testnet
        } else {
            Network::Mainnet
        }
    }

    /// The explicit network magic, if the address carries one.
    pub fn network_magic(&self) -> Option<u64> {
        self.network_magic
    }

    fn write_attributes(&self, writer: &mut CborWriter) {
        let len = self.hd_payload.is_some() as u64 + self.network_magic.is_some() as u64;
        writer.write_map(len);
        if let Some(payload) = &self.hd_payload {
            writer.write_uint(ATTR_HD_PAYLOAD);
            let mut inner = CborWriter::new();
            inner.write_bytes(payload);
            writer.write_bytes(&inner.into_bytes());
        }
        if let Some(magic) = self.network_magic {
            writer.write_uint(ATTR_NETWORK_MAGIC);
            let mut inner = CborWriter::new();
            inner.write_uint(magic);
            writer.write_bytes(&inner.into_bytes());
        }
    }

    /// Serialize to the binary envelope.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut payload = CborWriter::new();
        payload.write_array(3);
        payload.write_bytes(self.root.as_bytes());
        self.write_attributes(&mut payload);
        payload.write_uint(ADDR_TYPE_PUBKEY);
        let payload = payload.into_bytes();

        let mut writer = CborWriter::new();
        writer.write_array(2);
        writer.write_tag(TAG_ENCODED_CBOR);
        writer.write_bytes(&payload);
        writer.write_uint(crc32(&payload) as u64);
        writer.into_bytes()
    }

    /// Parse from the binary envelope, validating the CRC32.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
        let mut reader = CborReader::new(bytes);
        reader.expect_array(2, "legacy address envelope")?;
        reader.expect_tag(TAG_ENCODED_CBOR)?;
        let payload = reader.read_bytes()?.to_vec();
        let declared = reader.read_uint()?;
        reader.finish()?;

        let computed = crc32(&payload);
        if declared != computed as u64 {
            return Err(AddressError::ChecksumMismatch {
                expected: computed,
                got: declared as u32,
            });
        }

        let mut reader = CborReader::new(&payload);
        reader.expect_array(3, "legacy address payload")?;
        let root = Hash28::from_bytes(reader.read_bytes()?)?;

        let mut hd_payload = None;
        let mut network_magic = None;
        let attrs = reader.read_map()?;
        for _ in 0..attrs {
            let key = reader.read_uint()?;
            let value = reader.read_bytes()?;
            let mut inner = CborReader::new(value);
            match key {
                ATTR_HD_PAYLOAD => {
                    hd_payload = Some(inner.read_bytes()?.to_vec());
                    inner.finish()?;
                }
                ATTR_NETWORK_MAGIC => {
                    network_magic = Some(inner.read_uint()?);
                    inner.finish()?;
                }
                got => {
                    return Err(AddressError::Cbor(CborError::UnknownDiscriminant {
                        what: "legacy address attribute",
                        got,
                    }))
                }
            }
        }

        let addr_type = reader.read_uint()?;
        if addr_type != ADDR_TYPE_PUBKEY {
            return Err(AddressError::Cbor(CborError::UnknownDiscriminant {
                what: "legacy address type",
                got: addr_type,
            }));
        }
        reader.finish()?;

        Ok(ByronAddress {
            root,
            hd_payload,
            network_magic,
        })
    }

    /// Encode as base58 text (the only text form for legacy addresses).
    pub fn to_base58(&self) -> String {
        bs58::encode(self.to_bytes()).into_string()
    }

    /// Decode from base58 text.
    pub fn from_base58(text: &str) -> Result<Self, AddressError> {
        let bytes = bs58::decode(text)
            .into_vec()
            .map_err(|e| AddressError::Base58(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Recover the HD derivation path sealed into this address.
    ///
    /// Returns `Ok(None)` when the address carries no payload, and
    /// `PayloadDecrypt` when the AEAD tag does not authenticate under the
    /// given root key (the address belongs to another wallet).
    ///
    /// # Arguments
    /// * `root_xpub` - The wallet's root extended verification key.
    pub fn decrypt_derivation_path(
        &self,
        root_xpub: &ExtendedVerificationKey,
    ) -> Result<Option<Vec<u32>>, AddressError> {
        let ciphertext = match &self.hd_payload {
            Some(c) => c,
            None => return Ok(None),
        };

        let key = payload_key(root_xpub);
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(PAYLOAD_NONCE), ciphertext.as_slice())
            .map_err(|_| AddressError::PayloadDecrypt)?;

        let mut reader = CborReader::new(&plaintext);
        let len = reader.read_array()?;
        let mut path = Vec::with_capacity(len as usize);
        for _ in 0..len {
            let index = reader.read_uint()?;
            path.push(
                u32::try_from(index).map_err(|_| AddressError::Cbor(CborError::IntOverflow))?,
            );
        }
        reader.finish()?;
        Ok(Some(path))
    }
}

impl std::fmt::Display for ByronAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

/// Stretch the root verification key into the HD-payload AEAD key.
fn payload_key(root_xpub: &ExtendedVerificationKey) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_sha512(
        root_xpub.as_bytes(),
        PAYLOAD_KEY_SALT,
        PAYLOAD_KEY_ITERATIONS,
        &mut key,
    );
    key
}

/// Seal a derivation path under the wallet's root key.
fn encrypt_derivation_path(root_xpub: &ExtendedVerificationKey, path: &[u32]) -> Vec<u8> {
    let mut writer = CborWriter::new();
    writer.write_array(path.len() as u64);
    for index in path {
        writer.write_uint(*index as u64);
    }

    let key = payload_key(root_xpub);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
    cipher
        .encrypt(Nonce::from_slice(PAYLOAD_NONCE), writer.into_bytes().as_slice())
        .expect("in-memory AEAD encryption cannot fail")
}
