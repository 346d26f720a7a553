//! Protocol parameters and the node-backend boundary.
//!
//! The core never performs I/O itself; backends implement `Node` and the
//! builder consumes only these shapes.

use serde::{Deserialize, Serialize};

use cardano_address::{Address, Network};
use cardano_primitives::hash::Hash32;

use crate::transaction::Tx;
use crate::value::{Coin, Value};
use crate::TransactionError;

/// The protocol parameters the builder depends on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// Linear fee coefficient (per byte).
    pub min_fee_a: Coin,
    /// Linear fee constant.
    pub min_fee_b: Coin,
    /// Cost per 8-byte word of UTxO storage; scales the minimum coin an
    /// output must carry.
    pub coins_per_utxo_word: Coin,
    /// Deposit for registering a stake credential.
    pub key_deposit: Coin,
    /// Deposit for registering a stake pool.
    pub pool_deposit: Coin,
    /// Legacy flat minimum output value.
    pub min_utxo: Coin,
    /// Maximum transaction size in bytes.
    pub max_tx_size: u64,
    /// Minimum pool cost per epoch.
    pub min_pool_cost: Coin,
}

/// The chain tip as reported by a backend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTip {
    pub block: u64,
    pub epoch: u64,
    pub slot: u64,
}

/// An unspent transaction output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UTxO {
    /// Hash of the transaction holding the output.
    pub tx_hash: Hash32,
    /// Index of the output within that transaction.
    pub index: u64,
    /// The output's value.
    pub amount: Value,
    /// The address controlling the output.
    pub spender: Address,
}

/// A synchronous backend able to query the chain and submit transactions.
///
/// Backends own their retry and timeout policy; no cancellation crosses
/// this boundary.
pub trait Node {
    /// The unspent outputs controlled by an address.
    fn utxos(&self, address: &Address) -> Result<Vec<UTxO>, TransactionError>;

    /// The current chain tip.
    fn tip(&self) -> Result<NodeTip, TransactionError>;

    /// Submit a signed transaction, returning its hash.
    fn submit_tx(&self, tx: &Tx) -> Result<Hash32, TransactionError>;

    /// The current protocol parameters.
    fn protocol_params(&self) -> Result<ProtocolParams, TransactionError>;

    /// The network this backend talks to.
    fn network(&self) -> Network;
}
