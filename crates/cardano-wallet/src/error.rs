use cardano_address::AddressError;
use cardano_transaction::value::Coin;
use cardano_transaction::TransactionError;

/// Error types for wallet operations.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// The recovery phrase failed word-list validation.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// The wallet's unspent outputs cannot cover the requested amount
    /// plus the fee.
    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: Coin, required: Coin },

    /// A UTxO points at an address no wallet key controls.
    #[error("no key controls address {0}")]
    UnknownAddress(String),

    /// A builder or backend error (forwarded from `cardano-transaction`).
    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),

    /// An address error (forwarded from `cardano-address`).
    #[error("address error: {0}")]
    Address(#[from] AddressError),
}
