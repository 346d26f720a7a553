//! HD account wallet.
//!
//! Keys follow the CIP-1852 path m/1852'/1815'/0'/0/i; each payment key
//! backs one enterprise address. The wallet never touches the network
//! itself; every query and submission goes through a caller-supplied
//! `Node`.

use bip39::Mnemonic;
use rand::RngCore;

use cardano_address::{Address, Network, StakeCredential};
use cardano_primitives::hash::Hash32;
use cardano_primitives::hd::{harden, ExtendedSigningKey};
use cardano_transaction::protocol::Node;
use cardano_transaction::value::{Coin, Value};
use cardano_transaction::{TxBuilder, TxInput, TxOutput};

use crate::WalletError;

/// CIP-1852 purpose index.
const PURPOSE: u32 = harden(1852);
/// Registered coin type for the chain.
const COIN_TYPE: u32 = harden(1815);
/// First account.
const ACCOUNT: u32 = harden(0);
/// External (receive) chain role.
const EXTERNAL_CHAIN: u32 = 0;

/// Entropy drawn for a fresh wallet: 160 bits, a 15-word phrase.
const ENTROPY_SIZE: usize = 20;

/// An HD wallet: a named bundle of sequentially derived payment keys.
pub struct Wallet {
    name: String,
    network: Network,
    chain_key: ExtendedSigningKey,
    payment_keys: Vec<ExtendedSigningKey>,
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("name", &self.name)
            .field("network", &self.network)
            .field("payment_keys", &self.payment_keys.len())
            .finish_non_exhaustive()
    }
}

impl Wallet {
    /// Create a wallet from fresh OS entropy.
    ///
    /// Returns the wallet and the recovery phrase that restores it.
    ///
    /// # Arguments
    /// * `name` - A caller-chosen label.
    /// * `passphrase` - The spending passphrase mixed into the master key;
    ///   may be empty.
    /// * `network` - The network addresses are issued for.
    pub fn new(name: &str, passphrase: &str, network: Network) -> (Self, String) {
        let mut entropy = [0u8; ENTROPY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut entropy);
        let mnemonic =
            Mnemonic::from_entropy(&entropy).expect("160-bit entropy is a valid phrase size");
        let wallet = Self::from_entropy(name, &entropy, passphrase, network);
        (wallet, mnemonic.to_string())
    }

    /// Restore a wallet from its recovery phrase.
    pub fn from_mnemonic(
        name: &str,
        mnemonic: &str,
        passphrase: &str,
        network: Network,
    ) -> Result<Self, WalletError> {
        let parsed =
            Mnemonic::parse(mnemonic).map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
        Ok(Self::from_entropy(
            name,
            &parsed.to_entropy(),
            passphrase,
            network,
        ))
    }

    fn from_entropy(name: &str, entropy: &[u8], passphrase: &str, network: Network) -> Self {
        let root = ExtendedSigningKey::from_entropy(entropy, passphrase);
        let chain_key = root
            .derive(PURPOSE)
            .derive(COIN_TYPE)
            .derive(ACCOUNT)
            .derive(EXTERNAL_CHAIN);
        let mut wallet = Wallet {
            name: name.to_string(),
            network,
            chain_key,
            payment_keys: Vec::new(),
        };
        wallet.add_address();
        wallet
    }

    /// The wallet's label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Derive the next payment key and return its address.
    pub fn add_address(&mut self) -> Address {
        let index = self.payment_keys.len() as u32;
        self.payment_keys.push(self.chain_key.derive(index));
        self.address_at(self.payment_keys.len() - 1)
    }

    /// The wallet's addresses, in derivation order.
    pub fn addresses(&self) -> Vec<Address> {
        (0..self.payment_keys.len())
            .map(|i| self.address_at(i))
            .collect()
    }

    fn address_at(&self, index: usize) -> Address {
        Address::enterprise(
            self.network,
            StakeCredential::from_key(&self.payment_keys[index].verification_key()),
        )
    }

    /// The spendable coin across all wallet addresses.
    pub fn balance(&self, node: &impl Node) -> Result<Coin, WalletError> {
        let mut total = 0;
        for address in self.addresses() {
            for utxo in node.utxos(&address)? {
                total += utxo.amount.coin;
            }
        }
        Ok(total)
    }

    /// Send `amount` to `receiver`, returning the submitted transaction
    /// hash.
    ///
    /// Picks unspent outputs until the amount is covered, balances the
    /// fee against a change output back to the wallet's first address,
    /// signs with every key whose output is spent, and submits.
    pub fn transfer(
        &self,
        node: &impl Node,
        receiver: &Address,
        amount: Coin,
    ) -> Result<Hash32, WalletError> {
        let mut picked = Vec::new();
        let mut picked_amount = Value::new(0);
        let mut available: Coin = 0;
        for address in self.addresses() {
            for utxo in node.utxos(&address)? {
                available += utxo.amount.coin;
                if picked_amount.coin <= amount {
                    picked_amount = picked_amount.add(&utxo.amount);
                    picked.push(utxo);
                }
            }
        }

        let protocol = node.protocol_params()?;
        let mut builder = TxBuilder::new(protocol);
        for utxo in &picked {
            builder.add_input(TxInput::new(utxo.tx_hash, utxo.index, utxo.amount.clone()));
        }
        builder.add_output(TxOutput::new(receiver.clone(), Value::new(amount)));
        let tip = node.tip()?;
        builder.set_ttl(tip.slot + 1200);
        builder.add_change_if_needed(self.address_at(0));
        for key in self.keys_for(&picked)? {
            builder.sign(key);
        }

        let min_fee = builder.min_fee()?;
        if picked_amount.coin < amount + min_fee {
            return Err(WalletError::InsufficientBalance {
                available,
                required: amount + min_fee,
            });
        }

        let tx = builder.build()?;
        Ok(node.submit_tx(&tx)?)
    }

    /// The signing keys controlling the picked outputs, deduplicated and
    /// in derivation order.
    fn keys_for(
        &self,
        picked: &[cardano_transaction::protocol::UTxO],
    ) -> Result<Vec<ExtendedSigningKey>, WalletError> {
        let addresses = self.addresses();
        let mut used = vec![false; addresses.len()];
        for utxo in picked {
            let index = addresses
                .iter()
                .position(|a| *a == utxo.spender)
                .ok_or_else(|| WalletError::UnknownAddress(utxo.spender.to_string()))?;
            used[index] = true;
        }
        Ok(used
            .iter()
            .enumerate()
            .filter(|(_, used)| **used)
            .map(|(i, _)| self.payment_keys[i].clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use cardano_transaction::protocol::{NodeTip, ProtocolParams, UTxO};
    use cardano_transaction::{TransactionError, Tx};

    const ADA: u64 = 1_000_000;

    const TEST_MNEMONIC: &str =
        "eight country switch draw meat scout mystery blade tip drift useless good keep usage title";

    /// An in-memory backend for driving the wallet.
    struct TestNode {
        utxos: Vec<UTxO>,
        submitted: RefCell<Vec<Tx>>,
    }

    impl TestNode {
        fn new(utxos: Vec<UTxO>) -> Self {
            TestNode {
                utxos,
                submitted: RefCell::new(Vec::new()),
            }
        }
    }

    impl Node for TestNode {
        fn utxos(&self, address: &Address) -> Result<Vec<UTxO>, TransactionError> {
            Ok(self
                .utxos
                .iter()
                .filter(|u| u.spender == *address)
                .cloned()
                .collect())
        }

        fn tip(&self) -> Result<NodeTip, TransactionError> {
            Ok(NodeTip {
                block: 7_000_000,
                epoch: 330,
                slot: 50_000_000,
            })
        }

        fn submit_tx(&self, tx: &Tx) -> Result<Hash32, TransactionError> {
            let hash = tx.hash()?;
            self.submitted.borrow_mut().push(tx.clone());
            Ok(hash)
        }

        fn protocol_params(&self) -> Result<ProtocolParams, TransactionError> {
            Ok(ProtocolParams {
                min_fee_a: 44,
                min_fee_b: 155_381,
                coins_per_utxo_word: 34_482,
                key_deposit: 2_000_000,
                pool_deposit: 500_000_000,
                min_utxo: 1_000_000,
                max_tx_size: 16_384,
                min_pool_cost: 340_000_000,
            })
        }

        fn network(&self) -> Network {
            Network::Mainnet
        }
    }

    fn test_wallet() -> Wallet {
        Wallet::from_mnemonic("alice", TEST_MNEMONIC, "", Network::Mainnet).unwrap()
    }

    fn utxo_at(address: &Address, tag: u8, coin: Coin) -> UTxO {
        UTxO {
            tx_hash: Hash32::new([tag; 32]),
            index: 0,
            amount: Value::new(coin),
            spender: address.clone(),
        }
    }

    #[test]
    fn test_restore_is_deterministic() {
        let a = test_wallet();
        let b = test_wallet();
        assert_eq!(a.addresses(), b.addresses());
    }

    #[test]
    fn test_new_wallet_phrase_restores_it() {
        let (wallet, phrase) = Wallet::new("bob", "pw", Network::Testnet);
        assert_eq!(phrase.split_whitespace().count(), 15);
        let restored = Wallet::from_mnemonic("bob", &phrase, "pw", Network::Testnet).unwrap();
        assert_eq!(wallet.addresses(), restored.addresses());
    }

    #[test]
    fn test_invalid_mnemonic_rejected() {
        let err = Wallet::from_mnemonic("x", "not a real phrase", "", Network::Mainnet)
            .unwrap_err();
        assert!(matches!(err, WalletError::InvalidMnemonic(_)));
    }

    #[test]
    fn test_add_address_extends_the_chain() {
        let mut wallet = test_wallet();
        assert_eq!(wallet.addresses().len(), 1);
        let second = wallet.add_address();
        assert_eq!(wallet.addresses().len(), 2);
        assert_ne!(wallet.addresses()[0], second);
        assert!(second.to_bech32().unwrap().starts_with("addr1"));
    }

    #[test]
    fn test_balance_sums_utxos() {
        let mut wallet = test_wallet();
        let second = wallet.add_address();
        let node = TestNode::new(vec![
            utxo_at(&wallet.addresses()[0], 1, 30 * ADA),
            utxo_at(&second, 2, 12 * ADA),
        ]);
        assert_eq!(wallet.balance(&node).unwrap(), 42 * ADA);
    }

    #[test]
    fn test_transfer_builds_signs_and_submits() {
        let wallet = test_wallet();
        let first = wallet.addresses()[0].clone();
        let node = TestNode::new(vec![utxo_at(&first, 1, 100 * ADA)]);

        let receiver = Wallet::from_mnemonic("carol", TEST_MNEMONIC, "other", Network::Mainnet)
            .unwrap()
            .addresses()[0]
            .clone();

        let hash = wallet.transfer(&node, &receiver, 25 * ADA).unwrap();

        let submitted = node.submitted.borrow();
        assert_eq!(submitted.len(), 1);
        let tx = &submitted[0];
        assert_eq!(tx.hash().unwrap(), hash);

        // Paid output plus change output, balancing against the fee.
        assert_eq!(tx.body.outputs.len(), 2);
        assert_eq!(tx.body.outputs[1].amount.coin, 25 * ADA);
        assert_eq!(tx.body.outputs[1].address, receiver);
        assert_eq!(tx.body.outputs[0].address, first);
        let outputs: u64 = tx.body.outputs.iter().map(|o| o.amount.coin).sum();
        assert_eq!(outputs + tx.body.fee, 100 * ADA);
        assert_eq!(tx.witness_set.vkey_witnesses.len(), 1);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let wallet = test_wallet();
        let first = wallet.addresses()[0].clone();
        let node = TestNode::new(vec![utxo_at(&first, 1, 2 * ADA)]);

        let err = wallet
            .transfer(&node, &first, 10 * ADA)
            .unwrap_err();
        match err {
            WalletError::InsufficientBalance {
                available,
                required,
            } => {
                assert_eq!(available, 2 * ADA);
                assert!(required > 10 * ADA);
            }
            other => panic!("expected InsufficientBalance, got {other:?}"),
        }
    }
}
