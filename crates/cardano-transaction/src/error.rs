use cardano_address::AddressError;
use cardano_primitives::cbor::CborError;
use cardano_primitives::PrimitivesError;

use crate::value::Coin;

/// Error types for transaction construction, balancing, and serialization.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// The inputs cannot cover the outputs, deposits, and fee.
    #[error("insufficient input: total input {input} is short of total output plus fee {required}")]
    InsufficientFunds { input: Coin, required: Coin },

    /// With no change address registered, inputs must balance outputs
    /// plus the caller-set fee exactly; this reports the excess side.
    #[error("unbalanced transaction: total input {input} exceeds total output plus fee {required}")]
    Unbalanced { input: Coin, required: Coin },

    /// A change output carrying native assets fell below the minimum coin
    /// requirement; burning it into the fee would lose the assets.
    #[error("multi-asset change of {amount} is below the minimum of {min_required} and cannot be burned")]
    ChangeBelowMinUtxo { amount: Coin, min_required: Coin },

    /// Two values disagree in sign direction across their asset sets, so
    /// no ordering exists.
    #[error("values are incomparable: asset sets disagree in sign direction")]
    IncomparableValue,

    /// An asset name longer than the protocol allows.
    #[error("asset name too long: {got} bytes, maximum {max}")]
    AssetNameTooLong { got: usize, max: usize },

    /// `build` was called before any signing key was registered.
    #[error("no signing keys registered")]
    MissingSigningKeys,

    /// A certificate kind this codec does not carry.
    #[error("certificate kind {0} is not supported")]
    UnsupportedCertificate(&'static str),

    /// A transaction-body field this codec does not carry.
    #[error("transaction body field {0} is not supported")]
    UnsupportedField(&'static str),

    /// An underlying CBOR error.
    #[error("cbor error: {0}")]
    Cbor(#[from] CborError),

    /// An underlying address error.
    #[error("address error: {0}")]
    Address(#[from] AddressError),

    /// An underlying primitives error.
    #[error("primitives error: {0}")]
    Primitives(#[from] PrimitivesError),
}
