//! Child-key tweak arithmetic for both derivation schemes.
//!
//! The modern (V2) scheme updates the scalar with 28-byte add-with-carry
//! arithmetic; the legacy (V1) scheme works over the full group order with
//! big-integer arithmetic and rejection sampling. The two produce
//! incompatible key lineages and must never be mixed along one path.

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use num_bigint::BigUint;

use crate::hash::sha512_hmac;
use crate::hd::is_hardened;

/// Derive the 32-byte compressed public point for an extended key's kL.
///
/// kL is already clamped, so reducing it modulo the group order before the
/// basepoint multiplication leaves the resulting point unchanged.
pub(crate) fn public_key(kl: &[u8; 32]) -> [u8; 32] {
    let scalar = Scalar::from_bytes_mod_order(*kl);
    EdwardsPoint::mul_base(&scalar).compress().to_bytes()
}

fn split(key: &[u8; 96]) -> ([u8; 32], [u8; 32], [u8; 32]) {
    let mut kl = [0u8; 32];
    let mut kr = [0u8; 32];
    let mut cc = [0u8; 32];
    kl.copy_from_slice(&key[..32]);
    kr.copy_from_slice(&key[32..64]);
    cc.copy_from_slice(&key[64..]);
    (kl, kr, cc)
}

fn join(kl: &[u8; 32], kr: &[u8; 32], cc: &[u8; 32]) -> [u8; 96] {
    let mut out = [0u8; 96];
    out[..32].copy_from_slice(kl);
    out[32..64].copy_from_slice(kr);
    out[64..].copy_from_slice(cc);
    out
}

/// kL' = kL + 8*zL over the first 28 bytes, carrying into the last 4.
///
/// Little-endian add-with-carry; only the low 28 bytes of zL contribute,
/// scaled by 8.
fn add28_mul8(kl: &[u8; 32], zl: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry: u16 = 0;
    for i in 0..28 {
        let r = kl[i] as u16 + ((zl[i] as u16) << 3) + carry;
        out[i] = r as u8;
        carry = r >> 8;
    }
    for i in 28..32 {
        let r = kl[i] as u16 + carry;
        out[i] = r as u8;
        carry = r >> 8;
    }
    out
}

/// kR' = kR + zR mod 2^256 (plain little-endian add, overflow discarded).
fn add256(kr: &[u8; 32], zr: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry: u16 = 0;
    for i in 0..32 {
        let r = kr[i] as u16 + zr[i] as u16 + carry;
        out[i] = r as u8;
        carry = r >> 8;
    }
    out
}

/// Derive a child extended signing key under the modern (V2) scheme.
///
/// Hardened steps seed the HMAC with kL||kR under domain prefixes
/// 0x00/0x01; soft steps seed it with the public key under 0x02/0x03.
/// The index is appended little-endian.
pub(crate) fn derive_v2(key: &[u8; 96], index: u32) -> [u8; 96] {
    let (kl, kr, cc) = split(key);
    let idx = index.to_le_bytes();

    let (z, tag) = if is_hardened(index) {
        let mut data = Vec::with_capacity(1 + 64 + 4);
        data.push(0x00);
        data.extend_from_slice(&kl);
        data.extend_from_slice(&kr);
        data.extend_from_slice(&idx);
        let z = sha512_hmac(&cc, &data);
        data[0] = 0x01;
        (z, sha512_hmac(&cc, &data))
    } else {
        let public = public_key(&kl);
        let mut data = Vec::with_capacity(1 + 32 + 4);
        data.push(0x02);
        data.extend_from_slice(&public);
        data.extend_from_slice(&idx);
        let z = sha512_hmac(&cc, &data);
        data[0] = 0x03;
        (z, sha512_hmac(&cc, &data))
    };

    let mut zl = [0u8; 32];
    let mut zr = [0u8; 32];
    zl.copy_from_slice(&z[..32]);
    zr.copy_from_slice(&z[32..]);

    let child_kl = add28_mul8(&kl, &zl);
    let child_kr = add256(&kr, &zr);
    let mut child_cc = [0u8; 32];
    child_cc.copy_from_slice(&tag[32..]);

    join(&child_kl, &child_kr, &child_cc)
}

/// Derive a child extended verification key under the modern (V2) scheme.
///
/// A' = A + (8*zL)*B; the caller guarantees the index is non-hardened.
pub(crate) fn derive_v2_public(key: &[u8; 64], index: u32) -> Option<[u8; 64]> {
    let mut public = [0u8; 32];
    let mut cc = [0u8; 32];
    public.copy_from_slice(&key[..32]);
    cc.copy_from_slice(&key[32..]);

    let idx = index.to_le_bytes();
    let mut data = Vec::with_capacity(1 + 32 + 4);
    data.push(0x02);
    data.extend_from_slice(&public);
    data.extend_from_slice(&idx);
    let z = sha512_hmac(&cc, &data);
    data[0] = 0x03;
    let tag = sha512_hmac(&cc, &data);

    let mut zl8 = [0u8; 32];
    zl8.copy_from_slice(&add28_mul8(&[0u8; 32], z[..32].try_into().expect("32 bytes")));

    let parent = curve25519_dalek::edwards::CompressedEdwardsY(public).decompress()?;
    let tweak = EdwardsPoint::mul_base(&Scalar::from_bytes_mod_order(zl8));
    let child = (parent + tweak).compress().to_bytes();

    let mut out = [0u8; 64];
    out[..32].copy_from_slice(&child);
    out[32..].copy_from_slice(&tag[32..]);
    Some(out)
}

/// The Ed25519 group order N = 2^252 + 27742317777372353535851937790883648493.
fn group_order() -> BigUint {
    BigUint::parse_bytes(
        b"7237005577332262213973186563042994240857116359379907606001950938285454250989",
        10,
    )
    .expect("valid decimal constant")
}

/// kL' = (kL + 8*zL[..28]) mod N as little-endian big integers.
fn add_mod_order(kl: &[u8; 32], zl: &[u8]) -> [u8; 32] {
    let order = group_order();
    let sum = (BigUint::from_bytes_le(kl) + BigUint::from_bytes_le(&zl[..28]) * 8u8) % order;
    let bytes = sum.to_bytes_le();
    let mut out = [0u8; 32];
    out[..bytes.len()].copy_from_slice(&bytes);
    out
}

/// Derive a child extended signing key under the legacy (V1) scheme.
///
/// Same double-tag HMAC structure as V2, but with a big-endian index, the
/// scalar update taken over the full group order, and rejection sampling:
/// a one-byte iteration counter is appended to the HMAC message and bumped
/// until bit 0x20 of the candidate kL's last byte is clear.
pub(crate) fn derive_v1(key: &[u8; 96], index: u32) -> [u8; 96] {
    let (kl, kr, cc) = split(key);
    let idx = index.to_be_bytes();

    let seed: Vec<u8> = if is_hardened(index) {
        let mut s = Vec::with_capacity(64 + 4);
        s.extend_from_slice(&kl);
        s.extend_from_slice(&kr);
        s.extend_from_slice(&idx);
        s
    } else {
        let mut s = Vec::with_capacity(32 + 4);
        s.extend_from_slice(&public_key(&kl));
        s.extend_from_slice(&idx);
        s
    };
    let (z_prefix, cc_prefix) = if is_hardened(index) {
        (0x00u8, 0x01u8)
    } else {
        (0x02u8, 0x03u8)
    };

    let mut iteration: u8 = 0;
    loop {
        let mut data = Vec::with_capacity(1 + seed.len() + 1);
        data.push(z_prefix);
        data.extend_from_slice(&seed);
        data.push(iteration);
        let z = sha512_hmac(&cc, &data);
        data[0] = cc_prefix;
        let tag = sha512_hmac(&cc, &data);

        let child_kl = add_mod_order(&kl, &z[..32]);
        if child_kl[31] & 0x20 != 0 {
            iteration = iteration.wrapping_add(1);
            continue;
        }

        let mut zr = [0u8; 32];
        zr.copy_from_slice(&z[32..]);
        let child_kr = add256(&kr, &zr);
        let mut child_cc = [0u8; 32];
        child_cc.copy_from_slice(&tag[32..]);

        return join(&child_kl, &child_kr, &child_cc);
    }
}
