/// Cardano SDK - Address model.
///
/// Provides stake credentials (key-hash or script-hash), the Shelley
/// address forms (base, pointer, enterprise, stake) with their bech32 text
/// encoding, and legacy Byron addresses with their base58/CBOR/CRC32
/// envelope and encrypted HD derivation-path payload.

pub mod address;
pub mod byron;
pub mod credential;

mod error;
pub use address::{Address, Network, Pointer};
pub use byron::ByronAddress;
pub use credential::StakeCredential;
pub use error::AddressError;
