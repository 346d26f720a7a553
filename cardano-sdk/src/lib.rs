#![deny(missing_docs)]

//! Cardano SDK - Complete SDK.
//!
//! Re-exports all Cardano SDK components for convenient single-crate usage.

pub use cardano_address as address;
pub use cardano_primitives as primitives;
pub use cardano_transaction as transaction;
pub use cardano_wallet as wallet;
