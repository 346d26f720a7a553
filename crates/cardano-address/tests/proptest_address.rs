//! Property tests for address encoding.

use proptest::prelude::*;

use cardano_address::{Address, Network, Pointer, StakeCredential};
use cardano_primitives::hash::Hash28;

fn arb_credential() -> impl Strategy<Value = StakeCredential> {
    (any::<[u8; 28]>(), any::<bool>()).prop_map(|(hash, script)| {
        if script {
            StakeCredential::from_script_hash(Hash28::new(hash))
        } else {
            StakeCredential::from_key_hash(Hash28::new(hash))
        }
    })
}

fn arb_network() -> impl Strategy<Value = Network> {
    any::<bool>().prop_map(|mainnet| {
        if mainnet {
            Network::Mainnet
        } else {
            Network::Testnet
        }
    })
}

proptest! {
    /// Every base address survives bytes and bech32 round-trips.
    #[test]
    fn base_address_roundtrips(
        network in arb_network(),
        payment in arb_credential(),
        stake in arb_credential(),
    ) {
        let addr = Address::base(network, payment, stake);
        prop_assert_eq!(Address::from_bytes(&addr.to_bytes()).unwrap(), addr.clone());
        let text = addr.to_bech32().unwrap();
        prop_assert_eq!(Address::from_bech32(&text).unwrap(), addr);
    }

    /// Pointer components of any magnitude survive the var-nat encoding.
    #[test]
    fn pointer_address_roundtrips(
        network in arb_network(),
        payment in arb_credential(),
        slot in any::<u64>(),
        tx_index in any::<u64>(),
        cert_index in any::<u64>(),
    ) {
        let addr = Address::pointer(network, payment, Pointer { slot, tx_index, cert_index });
        prop_assert_eq!(Address::from_bytes(&addr.to_bytes()).unwrap(), addr.clone());
        let text = addr.to_bech32().unwrap();
        prop_assert_eq!(Address::from_bech32(&text).unwrap(), addr);
    }

    /// Enterprise and stake addresses round-trip and land under the right
    /// prefix.
    #[test]
    fn single_credential_addresses_roundtrip(
        network in arb_network(),
        credential in arb_credential(),
    ) {
        let enterprise = Address::enterprise(network, credential);
        let stake = Address::stake(network, credential);

        let enterprise_text = enterprise.to_bech32().unwrap();
        let stake_text = stake.to_bech32().unwrap();
        prop_assert!(enterprise_text.starts_with("addr"));
        prop_assert!(stake_text.starts_with("stake"));

        prop_assert_eq!(Address::from_bech32(&enterprise_text).unwrap(), enterprise);
        prop_assert_eq!(Address::from_bech32(&stake_text).unwrap(), stake);
    }
}
