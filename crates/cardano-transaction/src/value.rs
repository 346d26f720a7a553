//! Multi-asset values.
//!
//! A `Value` is a coin amount plus an ordered map from minting policy to
//! asset name to quantity. Arithmetic prunes zero-quantity entries, and
//! comparison is a partial order: when the two sides disagree in sign
//! direction across assets, the comparison fails rather than guessing.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use cardano_primitives::cbor::{CborError, CborReader, CborWriter};
use cardano_primitives::hash::Hash28;

use crate::TransactionError;

/// The base currency unit (lovelace).
pub type Coin = u64;

/// A minting policy identifier: the hash of the policy script.
pub type PolicyId = Hash28;

/// Maximum length of an asset name in bytes.
pub const MAX_ASSET_NAME_LEN: usize = 32;

/// An asset name: an opaque blob of at most 32 bytes.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct AssetName(Vec<u8>);

impl AssetName {
    /// Create an asset name from raw bytes.
    ///
    /// # Arguments
    /// * `bytes` - At most 32 bytes.
    pub fn new(bytes: &[u8]) -> Result<Self, TransactionError> {
        if bytes.len() > MAX_ASSET_NAME_LEN {
            return Err(TransactionError::AssetNameTooLong {
                got: bytes.len(),
                max: MAX_ASSET_NAME_LEN,
            });
        }
        Ok(AssetName(bytes.to_vec()))
    }

    /// Create an asset name from a UTF-8 string.
    pub fn from_text(text: &str) -> Result<Self, TransactionError> {
        Self::new(text.as_bytes())
    }

    /// The raw name bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The name as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

/// An ordered policy -> asset -> quantity map.
///
/// Never holds a zero-quantity entry after arithmetic.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct MultiAsset(BTreeMap<PolicyId, BTreeMap<AssetName, u64>>);

impl MultiAsset {
    /// Create an empty multi-asset map.
    pub fn new() -> Self {
        MultiAsset(BTreeMap::new())
    }

    /// Set the quantity for `(policy, asset)`, inserting or overwriting.
    ///
    /// Setting zero removes the entry (and the policy, once empty).
    pub fn set(&mut self, policy: PolicyId, asset: AssetName, quantity: u64) {
        if quantity == 0 {
            if let Some(assets) = self.0.get_mut(&policy) {
                assets.remove(&asset);
                if assets.is_empty() {
                    self.0.remove(&policy);
                }
            }
            return;
        }
        self.0.entry(policy).or_default().insert(asset, quantity);
    }

    /// Chainable form of [`set`](Self::set) for building literals.
    pub fn with(mut self, policy: PolicyId, asset: AssetName, quantity: u64) -> Self {
        self.set(policy, asset, quantity);
        self
    }

    /// The quantity for `(policy, asset)`; absent entries are zero.
    pub fn get(&self, policy: &PolicyId, asset: &AssetName) -> u64 {
        self.0
            .get(policy)
            .and_then(|assets| assets.get(asset))
            .copied()
            .unwrap_or(0)
    }

    /// Whether the map holds no assets at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct policies.
    pub fn num_policies(&self) -> u64 {
        self.0.len() as u64
    }

    /// Number of distinct (policy, asset) pairs.
    pub fn num_assets(&self) -> u64 {
        self.0.values().map(|assets| assets.len() as u64).sum()
    }

    /// Total byte length of all asset names.
    pub fn asset_name_bytes(&self) -> u64 {
        self.0
            .values()
            .flat_map(|assets| assets.keys())
            .map(|name| name.as_bytes().len() as u64)
            .sum()
    }

    /// Iterate over `(policy, asset, quantity)` triples in map order.
    pub fn iter(&self) -> impl Iterator<Item = (&PolicyId, &AssetName, u64)> {
        self.0.iter().flat_map(|(policy, assets)| {
            assets.iter().map(move |(name, qty)| (policy, name, *qty))
        })
    }

    /// Encode as a policy -> asset -> quantity map in canonical order.
    pub fn write_cbor(&self, writer: &mut CborWriter) {
        let mut policies = Vec::with_capacity(self.0.len());
        for (policy, assets) in &self.0 {
            let mut key = CborWriter::new();
            key.write_bytes(policy.as_bytes());

            let mut value = CborWriter::new();
            let mut entries = Vec::with_capacity(assets.len());
            for (name, qty) in assets {
                let mut k = CborWriter::new();
                k.write_bytes(name.as_bytes());
                let mut v = CborWriter::new();
                v.write_uint(*qty);
                entries.push((k.into_bytes(), v.into_bytes()));
            }
            value.write_map_canonical(entries);

            policies.push((key.into_bytes(), value.into_bytes()));
        }
        writer.write_map_canonical(policies);
    }

    /// Decode from a policy -> asset -> quantity map.
    pub fn read_cbor(reader: &mut CborReader) -> Result<Self, TransactionError> {
        let mut out = MultiAsset::new();
        let policies = reader.read_map()?;
        for _ in 0..policies {
            let policy = Hash28::from_bytes(reader.read_bytes()?)?;
            let assets = reader.read_map()?;
            for _ in 0..assets {
                let name = AssetName::new(reader.read_bytes()?)?;
                let quantity = reader.read_uint()?;
                out.set(policy, name, quantity);
            }
        }
        Ok(out)
    }
}

/// A coin amount plus optional multi-asset holdings.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Value {
    /// The lovelace amount.
    pub coin: Coin,
    /// Native assets; empty means a coin-only value.
    pub multiasset: MultiAsset,
}

impl Value {
    /// A coin-only value.
    pub fn new(coin: Coin) -> Self {
        Value {
            coin,
            multiasset: MultiAsset::new(),
        }
    }

    /// A value carrying native assets.
    pub fn with_assets(coin: Coin, multiasset: MultiAsset) -> Self {
        Value { coin, multiasset }
    }

    /// Whether the value carries no native assets.
    pub fn is_coin_only(&self) -> bool {
        self.multiasset.is_empty()
    }

    /// Whether the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.coin == 0 && self.multiasset.is_empty()
    }

    /// Component-wise addition.
    pub fn add(&self, other: &Value) -> Value {
        let mut multiasset = self.multiasset.clone();
        for (policy, name, qty) in other.multiasset.iter() {
            let current = multiasset.get(policy, name);
            multiasset.set(*policy, name.clone(), current + qty);
        }
        Value {
            coin: self.coin + other.coin,
            multiasset,
        }
    }

    /// Component-wise saturating subtraction; entries that reach zero are
    /// pruned.
    pub fn sub(&self, other: &Value) -> Value {
        let mut multiasset = self.multiasset.clone();
        for (policy, name, qty) in other.multiasset.iter() {
            let current = multiasset.get(policy, name);
            multiasset.set(*policy, name.clone(), current.saturating_sub(qty));
        }
        Value {
            coin: self.coin.saturating_sub(other.coin),
            multiasset,
        }
    }

    /// Partial-order comparison.
    ///
    /// Compares the coin and every asset quantity across the union of both
    /// asset sets (absent entries count as zero). When one component is
    /// larger on one side and another is larger on the other, the values
    /// are incomparable and an error is returned.
    pub fn try_cmp(&self, other: &Value) -> Result<Ordering, TransactionError> {
        let mut less = false;
        let mut greater = false;

        let mut note = |ord: Ordering| match ord {
            Ordering::Less => less = true,
            Ordering::Greater => greater = true,
            Ordering::Equal => {}
        };

        note(self.coin.cmp(&other.coin));
        for (policy, name, qty) in self.multiasset.iter() {
            note(qty.cmp(&other.multiasset.get(policy, name)));
        }
        for (policy, name, qty) in other.multiasset.iter() {
            note(self.multiasset.get(policy, name).cmp(&qty));
        }

        match (less, greater) {
            (true, true) => Err(TransactionError::IncomparableValue),
            (true, false) => Ok(Ordering::Less),
            (false, true) => Ok(Ordering::Greater),
            (false, false) => Ok(Ordering::Equal),
        }
    }

    /// Encode as a bare uint when coin-only, else `[coin, multiasset]`.
    pub fn write_cbor(&self, writer: &mut CborWriter) {
        if self.is_coin_only() {
            writer.write_uint(self.coin);
        } else {
            writer.write_array(2);
            writer.write_uint(self.coin);
            self.multiasset.write_cbor(writer);
        }
    }

    /// Decode from either encoding.
    pub fn read_cbor(reader: &mut CborReader) -> Result<Self, TransactionError> {
        match reader.peek_major()? {
            0 => Ok(Value::new(reader.read_uint()?)),
            4 => {
                reader.expect_array(2, "value")?;
                let coin = reader.read_uint()?;
                let multiasset = MultiAsset::read_cbor(reader)?;
                Ok(Value { coin, multiasset })
            }
            found => Err(TransactionError::Cbor(CborError::TypeMismatch {
                expected: "value",
                found,
            })),
        }
    }
}
