//! Property tests for the value model.

use proptest::prelude::*;
use std::cmp::Ordering;

use cardano_primitives::cbor::{CborReader, CborWriter};
use cardano_primitives::hash::Hash28;
use cardano_transaction::value::{AssetName, MultiAsset, Value};

fn arb_multiasset(policy_tag: u8) -> impl Strategy<Value = MultiAsset> {
    prop::collection::vec(
        (any::<u8>(), prop::collection::vec(any::<u8>(), 0..=8), 1..u32::MAX as u64),
        0..4,
    )
    .prop_map(move |entries| {
        let mut ma = MultiAsset::new();
        for (asset_tag, name, qty) in entries {
            let mut policy = [policy_tag; 28];
            policy[27] = asset_tag;
            ma.set(
                Hash28::new(policy),
                AssetName::new(&name).expect("8 bytes is under the limit"),
                qty,
            );
        }
        ma
    })
}

fn arb_value(policy_tag: u8) -> impl Strategy<Value = Value> {
    (0..u32::MAX as u64, arb_multiasset(policy_tag))
        .prop_map(|(coin, ma)| Value::with_assets(coin, ma))
}

proptest! {
    /// x + y - y == x when the asset sets are disjoint by construction.
    #[test]
    fn add_sub_roundtrips(x in arb_value(1), y in arb_value(2)) {
        let back = x.add(&y).sub(&y);
        prop_assert_eq!(back.try_cmp(&x).unwrap(), Ordering::Equal);
        prop_assert_eq!(back, x);
    }

    /// Addition is commutative on every component.
    #[test]
    fn add_commutes(x in arb_value(1), y in arb_value(2)) {
        prop_assert_eq!(x.add(&y), y.add(&x));
    }

    /// Every value survives the codec byte-for-byte.
    #[test]
    fn cbor_roundtrips(x in arb_value(3)) {
        let mut w = CborWriter::new();
        x.write_cbor(&mut w);
        let bytes = w.into_bytes();

        let mut r = CborReader::new(&bytes);
        let back = Value::read_cbor(&mut r).unwrap();
        r.finish().unwrap();
        prop_assert_eq!(&back, &x);

        let mut w = CborWriter::new();
        back.write_cbor(&mut w);
        prop_assert_eq!(w.into_bytes(), bytes);
    }

    /// A value never compares below itself plus something.
    #[test]
    fn add_never_decreases(x in arb_value(1), y in arb_value(2)) {
        let sum = x.add(&y);
        prop_assert_ne!(sum.try_cmp(&x).unwrap(), Ordering::Less);
    }
}
