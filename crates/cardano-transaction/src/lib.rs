/// Cardano SDK - Transaction building, signing, and serialization.
///
/// Provides the multi-asset value model, every transaction entity with its
/// canonical CBOR codec (inputs, outputs, certificates, native scripts,
/// auxiliary data, witness sets, bodies), the protocol-parameter and
/// node-backend boundary types, and the fee/change-balancing `TxBuilder`.

pub mod auxiliary;
pub mod builder;
pub mod certificate;
pub mod native_script;
pub mod protocol;
pub mod transaction;
pub mod value;

mod error;
pub use builder::TxBuilder;
pub use error::TransactionError;
pub use transaction::{Tx, TxBody, TxInput, TxOutput, VKeyWitness, WitnessSet};
pub use value::{AssetName, Coin, MultiAsset, PolicyId, Value};

#[cfg(test)]
mod tests;
