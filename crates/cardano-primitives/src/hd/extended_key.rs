//! Extended signing and verification key types.

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::Scalar;
use sha2::{Digest, Sha512};

use crate::hash::pbkdf2_sha512;
use crate::hd::derivation;
use crate::hd::is_hardened;
use crate::PrimitivesError;

/// Size of an extended signing key: 32-byte kL + 32-byte kR + 32-byte
/// chain code.
pub const XSK_SIZE: usize = 96;

/// Size of an extended verification key: 32-byte public key + 32-byte
/// chain code.
pub const XVK_SIZE: usize = 64;

/// Size of an Ed25519 signature.
pub const SIGNATURE_SIZE: usize = 64;

/// PBKDF2 round count for master-key generation.
const MASTER_KEY_ITERATIONS: u32 = 4096;

/// An extended Ed25519-BIP32 signing key.
///
/// 96 bytes: the clamped scalar kL, the nonce-seed kR, and the chain code.
/// Every derivation step produces a new independent value; keys are never
/// shared across paths.
#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedSigningKey([u8; XSK_SIZE]);

/// An extended Ed25519-BIP32 verification key.
///
/// 64 bytes: the compressed public point and the chain code. Derived
/// deterministically from an `ExtendedSigningKey`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ExtendedVerificationKey([u8; XVK_SIZE]);

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl ExtendedSigningKey {
    /// Generate the master key from entropy and a passphrase.
    ///
    /// Runs PBKDF2-HMAC-SHA512 (password = passphrase, salt = entropy,
    /// 4096 rounds, 96-byte output), then clamps kL for the curve's
    /// cofactor: the bottom 3 bits of the first byte are cleared, and the
    /// last byte keeps only its low 5 bits with bit 6 forced set.
    ///
    /// # Arguments
    /// * `entropy` - Raw entropy bytes (typically from a mnemonic).
    /// * `passphrase` - An optional spending passphrase; may be empty.
    ///
    /// # Returns
    /// The root `ExtendedSigningKey`. Never fails for well-formed input.
    pub fn from_entropy(entropy: &[u8], passphrase: &str) -> Self {
        let mut key = [0u8; XSK_SIZE];
        pbkdf2_sha512(passphrase.as_bytes(), entropy, MASTER_KEY_ITERATIONS, &mut key);
        key[0] &= 0b1111_1000;
        key[31] = (key[31] & 0b0001_1111) | 0b0100_0000;
        ExtendedSigningKey(key)
    }

    /// Create a signing key from raw bytes.
    ///
    /// # Arguments
    /// * `bytes` - A slice that must be exactly 96 bytes.
    ///
    /// # Returns
    /// `Ok(ExtendedSigningKey)` or an `InvalidKeyLength` error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != XSK_SIZE {
            return Err(PrimitivesError::InvalidKeyLength {
                expected: XSK_SIZE,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; XSK_SIZE];
        arr.copy_from_slice(bytes);
        Ok(ExtendedSigningKey(arr))
    }

    /// Create a signing key from a hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let decoded = hex::decode(hex_str)?;
        Self::from_bytes(&decoded)
    }

    /// Create a signing key from its bech32 text form.
    ///
    /// The human-readable prefix is not interpreted; only the payload
    /// length is validated.
    pub fn from_bech32(text: &str) -> Result<Self, PrimitivesError> {
        let (_hrp, data) =
            bech32::decode(text).map_err(|e| PrimitivesError::InvalidBech32(e.to_string()))?;
        Self::from_bytes(&data)
    }

    /// Access the raw 96 bytes.
    pub fn as_bytes(&self) -> &[u8; XSK_SIZE] {
        &self.0
    }

    /// Serialize as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Encode as bech32 with the given human-readable prefix
    /// (e.g. `addr_xsk`, `stake_xsk`, `root_xsk`).
    pub fn to_bech32(&self, prefix: &str) -> Result<String, PrimitivesError> {
        encode_bech32(prefix, &self.0)
    }

    /// Derive the corresponding extended verification key.
    ///
    /// Pure and idempotent: the public point is kL times the basepoint and
    /// the chain code is carried over.
    pub fn verification_key(&self) -> ExtendedVerificationKey {
        let mut kl = [0u8; 32];
        kl.copy_from_slice(&self.0[..32]);
        let mut out = [0u8; XVK_SIZE];
        out[..32].copy_from_slice(&derivation::public_key(&kl));
        out[32..].copy_from_slice(&self.0[64..]);
        ExtendedVerificationKey(out)
    }

    /// Derive a child signing key under the modern (V2) scheme.
    ///
    /// # Arguments
    /// * `index` - The derivation index; the high bit selects hardened
    ///   derivation.
    pub fn derive(&self, index: u32) -> ExtendedSigningKey {
        ExtendedSigningKey(derivation::derive_v2(&self.0, index))
    }

    /// Derive a child signing key under the legacy (V1) scheme.
    ///
    /// Produces a key lineage incompatible with [`derive`](Self::derive);
    /// the two schemes must never be mixed along one path.
    pub fn derive_legacy(&self, index: u32) -> ExtendedSigningKey {
        ExtendedSigningKey(derivation::derive_v1(&self.0, index))
    }

    /// Sign a message with the extended scalar pair.
    ///
    /// Standard Ed25519 with the nonce drawn from kR:
    /// r = H(kR || M), R = r*B, k = H(R || A || M), S = r + k*kL.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let mut kl = [0u8; 32];
        kl.copy_from_slice(&self.0[..32]);
        let a = Scalar::from_bytes_mod_order(kl);
        let public = derivation::public_key(&kl);

        let mut h = Sha512::new();
        h.update(&self.0[32..64]);
        h.update(message);
        let r = Scalar::from_bytes_mod_order_wide(&wide_digest(h));
        let big_r = EdwardsPoint::mul_base(&r).compress();

        let mut h = Sha512::new();
        h.update(big_r.as_bytes());
        h.update(public);
        h.update(message);
        let k = Scalar::from_bytes_mod_order_wide(&wide_digest(h));

        let s = r + k * a;

        let mut sig = [0u8; SIGNATURE_SIZE];
        sig[..32].copy_from_slice(big_r.as_bytes());
        sig[32..].copy_from_slice(s.as_bytes());
        Signature(sig)
    }
}

impl std::fmt::Debug for ExtendedSigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the scalar; the chain code alone identifies the key.
        write!(f, "ExtendedSigningKey(cc={})", hex::encode(&self.0[64..]))
    }
}

impl ExtendedVerificationKey {
    /// Create a verification key from raw bytes.
    ///
    /// # Arguments
    /// * `bytes` - A slice that must be exactly 64 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != XVK_SIZE {
            return Err(PrimitivesError::InvalidKeyLength {
                expected: XVK_SIZE,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; XVK_SIZE];
        arr.copy_from_slice(bytes);
        Ok(ExtendedVerificationKey(arr))
    }

    /// Create a verification key from a hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let decoded = hex::decode(hex_str)?;
        Self::from_bytes(&decoded)
    }

    /// Create a verification key from its bech32 text form.
    ///
    /// Accepts both the 64-byte extended form and the bare 32-byte public
    /// key (as used by the `addr_vk`/`stake_vk` debugging prefixes); the
    /// bare form gets a zero chain code and cannot derive children.
    pub fn from_bech32(text: &str) -> Result<Self, PrimitivesError> {
        let (_hrp, data) =
            bech32::decode(text).map_err(|e| PrimitivesError::InvalidBech32(e.to_string()))?;
        if data.len() == 32 {
            let mut arr = [0u8; XVK_SIZE];
            arr[..32].copy_from_slice(&data);
            return Ok(ExtendedVerificationKey(arr));
        }
        Self::from_bytes(&data)
    }

    /// Access the raw 64 bytes.
    pub fn as_bytes(&self) -> &[u8; XVK_SIZE] {
        &self.0
    }

    /// The 32-byte compressed public point.
    pub fn key_bytes(&self) -> &[u8] {
        &self.0[..32]
    }

    /// The 32-byte chain code.
    pub fn chain_code(&self) -> &[u8] {
        &self.0[32..]
    }

    /// Serialize as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Encode as bech32 with the given human-readable prefix
    /// (e.g. `addr_xvk`, `stake_xvk`).
    pub fn to_bech32(&self, prefix: &str) -> Result<String, PrimitivesError> {
        encode_bech32(prefix, &self.0)
    }

    /// Derive a child verification key under the modern (V2) scheme.
    ///
    /// Only soft derivation is possible without the private scalar.
    ///
    /// # Arguments
    /// * `index` - The derivation index; must not have the hardened bit.
    pub fn derive(&self, index: u32) -> Result<ExtendedVerificationKey, PrimitivesError> {
        if is_hardened(index) {
            return Err(PrimitivesError::HardenedFromPublic);
        }
        derivation::derive_v2_public(&self.0, index)
            .map(ExtendedVerificationKey)
            .ok_or_else(|| {
                PrimitivesError::InvalidPublicKey("point fails to decompress".to_string())
            })
    }

    /// Verify a signature over a message.
    ///
    /// Checks R == S*B - k*A with k = H(R || A || M).
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let mut public = [0u8; 32];
        public.copy_from_slice(&self.0[..32]);
        let point = match CompressedEdwardsY(public).decompress() {
            Some(p) => p,
            None => return false,
        };

        let sig = signature.as_bytes();
        let mut s_bytes = [0u8; 32];
        s_bytes.copy_from_slice(&sig[32..]);
        let s: Scalar = match Option::from(Scalar::from_canonical_bytes(s_bytes)) {
            Some(s) => s,
            None => return false,
        };

        let mut h = Sha512::new();
        h.update(&sig[..32]);
        h.update(public);
        h.update(message);
        let k = Scalar::from_bytes_mod_order_wide(&wide_digest(h));

        let r_check = EdwardsPoint::vartime_double_scalar_mul_basepoint(&k, &-point, &s);
        r_check.compress().to_bytes() == sig[..32]
    }
}

impl std::fmt::Debug for ExtendedVerificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExtendedVerificationKey({})", self.to_hex())
    }
}

impl Signature {
    /// Create a signature from raw bytes.
    ///
    /// # Arguments
    /// * `bytes` - A slice that must be exactly 64 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != SIGNATURE_SIZE {
            return Err(PrimitivesError::InvalidSignatureLength {
                expected: SIGNATURE_SIZE,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; SIGNATURE_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Signature(arr))
    }

    /// Access the raw 64 bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    /// Serialize as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

fn wide_digest(hasher: Sha512) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&hasher.finalize());
    out
}

fn encode_bech32(prefix: &str, data: &[u8]) -> Result<String, PrimitivesError> {
    let hrp =
        bech32::Hrp::parse(prefix).map_err(|e| PrimitivesError::InvalidBech32(e.to_string()))?;
    bech32::encode::<bech32::Bech32>(hrp, data)
        .map_err(|e| PrimitivesError::InvalidBech32(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hd::harden;

    /// The 15-word recovery phrase used across the key fixtures.
    const TEST_MNEMONIC: &str =
        "eight country switch draw meat scout mystery blade tip drift useless good keep usage title";

    fn fixture_entropy() -> Vec<u8> {
        bip39::Mnemonic::parse(TEST_MNEMONIC)
            .expect("valid mnemonic")
            .to_entropy()
    }

    // -----------------------------------------------------------------------
    // Master key generation
    // -----------------------------------------------------------------------

    #[test]
    fn test_master_key_empty_passphrase() {
        let key = ExtendedSigningKey::from_entropy(&fixture_entropy(), "");
        assert_eq!(
            key.to_hex(),
            "c065afd2832cd8b087c4d9ab7011f481ee1e0721e78ea5dd609f3ab3f156d245\
             d176bd8fd4ec60b4731c3918a2a72a0226c0cd119ec35b47e4d55884667f552a\
             23f7fdcd4a10c6cd2c7393ac61d877873e248f417634aa3d812af327ffe9d620"
        );
    }

    #[test]
    fn test_master_key_with_passphrase() {
        let key = ExtendedSigningKey::from_entropy(&fixture_entropy(), "foo");
        assert_eq!(
            key.to_hex(),
            "70531039904019351e1afb361cd1b312a4d0565d4ff9f8062d38acf4b15cce41\
             d7b5738d9c893feea55512a3004acb0d222c35d3e3d5cde943a15a9824cbac59\
             443cf67e589614076ba01e354b1a432e0e6db3b59e37fc56b5fb0222970a010e"
        );
    }

    #[test]
    fn test_master_key_clamping() {
        let key = ExtendedSigningKey::from_entropy(b"some test entropy bytes!", "");
        let bytes = key.as_bytes();
        assert_eq!(bytes[0] & 0b0000_0111, 0);
        assert_eq!(bytes[31] & 0b1010_0000, 0);
        assert_eq!(bytes[31] & 0b0100_0000, 0b0100_0000);
    }

    // -----------------------------------------------------------------------
    // Derivation
    // -----------------------------------------------------------------------

    #[test]
    fn test_derive_is_deterministic() {
        let root = ExtendedSigningKey::from_entropy(&fixture_entropy(), "");
        let a = root.derive(harden(1852)).derive(harden(1815)).derive(harden(0));
        let b = root.derive(harden(1852)).derive(harden(1815)).derive(harden(0));
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_modern_and_legacy_lineages_diverge() {
        let root = ExtendedSigningKey::from_entropy(&fixture_entropy(), "");
        let modern = root.derive(harden(0));
        let legacy = root.derive_legacy(harden(0));
        assert_ne!(modern.as_bytes(), legacy.as_bytes());
    }

    #[test]
    fn test_soft_derivation_commutes_with_public() {
        let root = ExtendedSigningKey::from_entropy(&fixture_entropy(), "");
        let account = root.derive(harden(1852)).derive(harden(1815)).derive(harden(0));

        // Deriving soft on the signing side then taking the public key must
        // match deriving on the verification side directly.
        let via_signing = account.derive(0).derive(7).verification_key();
        let via_public = account
            .verification_key()
            .derive(0)
            .unwrap()
            .derive(7)
            .unwrap();
        assert_eq!(via_signing.as_bytes(), via_public.as_bytes());
    }

    #[test]
    fn test_public_derivation_rejects_hardened() {
        let root = ExtendedSigningKey::from_entropy(&fixture_entropy(), "");
        let err = root.verification_key().derive(harden(0)).unwrap_err();
        assert!(err.to_string().contains("hardened"));
    }

    // -----------------------------------------------------------------------
    // Signing
    // -----------------------------------------------------------------------

    #[test]
    fn test_sign_and_verify() {
        let root = ExtendedSigningKey::from_entropy(&fixture_entropy(), "");
        let key = root.derive(harden(1852)).derive(harden(1815)).derive(harden(0));
        let message = b"the quick brown fox";

        let sig = key.sign(message);
        assert!(key.verification_key().verify(message, &sig));
        assert!(!key.verification_key().verify(b"another message", &sig));
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let root = ExtendedSigningKey::from_entropy(&fixture_entropy(), "");
        let key_a = root.derive(harden(0));
        let key_b = root.derive(harden(1));
        let sig = key_a.sign(b"payload");
        assert!(!key_b.verification_key().verify(b"payload", &sig));
    }

    // -----------------------------------------------------------------------
    // Encoding
    // -----------------------------------------------------------------------

    #[test]
    fn test_bech32_roundtrip() {
        let root = ExtendedSigningKey::from_entropy(&fixture_entropy(), "");
        let text = root.to_bech32("root_xsk").unwrap();
        assert!(text.starts_with("root_xsk1"));
        let back = ExtendedSigningKey::from_bech32(&text).unwrap();
        assert_eq!(back.as_bytes(), root.as_bytes());
    }

    #[test]
    fn test_from_bytes_wrong_length() {
        let err = ExtendedSigningKey::from_bytes(&[0u8; 64]).unwrap_err();
        assert!(err.to_string().contains("expected 96, got 64"));
    }

    #[test]
    fn test_vk_from_cip19_bech32() {
        // Non-extended verification key, 32-byte payload.
        let vk = ExtendedVerificationKey::from_bech32(
            "addr_vk1w0l2sr2zgfm26ztc6nl9xy8ghsk5sh6ldwemlpmp9xylzy4dtf7st80zhd",
        )
        .unwrap();
        assert_eq!(vk.chain_code(), &[0u8; 32]);
    }
}
