/// Cardano SDK - HD account wallet.
///
/// Derives payment keys along the CIP-1852 path, tracks their enterprise
/// addresses, and moves funds through a `Node` backend using the
/// transaction builder.

pub mod wallet;

mod error;
pub use error::WalletError;
pub use wallet::Wallet;
