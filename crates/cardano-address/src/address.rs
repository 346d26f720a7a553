//! Shelley address forms and their binary/bech32 encodings.
//!
//! The first byte of every modern address packs the address kind into the
//! high nibble and the network tag into the low nibble. Credential hashes
//! follow in fixed order (payment first), and pointer components use a
//! base-128 big-endian variable-length natural encoding.

use std::fmt;
use std::str::FromStr;

use crate::byron::ByronAddress;
use crate::credential::StakeCredential;
use crate::AddressError;

/// Payment-address prefix on mainnet.
const HRP_ADDR: &str = "addr";
/// Payment-address prefix on testnet.
const HRP_ADDR_TEST: &str = "addr_test";
/// Stake-address prefix on mainnet.
const HRP_STAKE: &str = "stake";
/// Stake-address prefix on testnet.
const HRP_STAKE_TEST: &str = "stake_test";

/// Length of a base address: header + two credential hashes.
const BASE_ADDR_LEN: usize = 57;
/// Length of an enterprise or stake address: header + one credential hash.
const SINGLE_CRED_ADDR_LEN: usize = 29;

/// The network an address belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    /// Testnet (network tag 0).
    Testnet,
    /// Mainnet (network tag 1).
    Mainnet,
}

impl Network {
    /// The network tag carried in the address header's low nibble.
    pub fn id(&self) -> u8 {
        match self {
            Network::Testnet => 0,
            Network::Mainnet => 1,
        }
    }
}

/// A chain pointer locating a stake registration certificate by
/// (slot, transaction index, certificate index).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pointer {
    /// Absolute slot of the block holding the registration.
    pub slot: u64,
    /// Transaction index within that block.
    pub tx_index: u64,
    /// Certificate index within that transaction.
    pub cert_index: u64,
}

/// A Cardano address.
///
/// The script-vs-key distinction lives in the credentials, so these five
/// variants cover all eight modern header kinds plus the legacy form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Address {
    /// Payment credential plus stake credential (header kinds 0-3).
    Base {
        network: Network,
        payment: StakeCredential,
        stake: StakeCredential,
    },
    /// Payment credential plus a chain pointer (header kinds 4-5).
    Pointer {
        network: Network,
        payment: StakeCredential,
        pointer: Pointer,
    },
    /// Payment credential only (header kinds 6-7).
    Enterprise {
        network: Network,
        payment: StakeCredential,
    },
    /// Stake credential only; a reward-account address (header kinds
    /// 14-15).
    Stake {
        network: Network,
        stake: StakeCredential,
    },
    /// Legacy bootstrap-era address.
    Byron(ByronAddress),
}

impl Address {
    /// Build a base address from payment and stake credentials.
    pub fn base(network: Network, payment: StakeCredential, stake: StakeCredential) -> Self {
        Address::Base {
            network,
            payment,
            stake,
        }
    }

    /// Build a pointer address from a payment credential and a chain
    /// pointer.
    pub fn pointer(network: Network, payment: StakeCredential, pointer: Pointer) -> Self {
        Address::Pointer {
            network,
            payment,
            pointer,
        }
    }

    /// Build an enterprise address from a payment credential alone.
    pub fn enterprise(network: Network, payment: StakeCredential) -> Self {
        Address::Enterprise { network, payment }
    }

    /// Build a stake (reward-account) address from a stake credential.
    pub fn stake(network: Network, stake: StakeCredential) -> Self {
        Address::Stake { network, stake }
    }

    /// The network the address carries.
    ///
    /// Legacy addresses infer it from their attribute map: an explicit
    /// network magic means testnet, absence means mainnet.
    pub fn network(&self) -> Network {
        match self {
            Address::Base { network, .. }
            | Address::Pointer { network, .. }
            | Address::Enterprise { network, .. }
            | Address::Stake { network, .. } => *network,
            Address::Byron(byron) => byron.network(),
        }
    }

    /// The address-kind nibble of the header byte.
    fn kind(&self) -> u8 {
        match self {
            Address::Base { payment, stake, .. } => {
                0b0000 | payment.is_script() as u8 | (stake.is_script() as u8) << 1
            }
            Address::Pointer { payment, .. } => 0b0100 | payment.is_script() as u8,
            Address::Enterprise { payment, .. } => 0b0110 | payment.is_script() as u8,
            Address::Stake { stake, .. } => 0b1110 | stake.is_script() as u8,
            Address::Byron(_) => 0b1000,
        }
    }

    /// Serialize the address to its binary form.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Address::Base {
                network,
                payment,
                stake,
            } => {
                let mut out = Vec::with_capacity(BASE_ADDR_LEN);
                out.push(self.kind() << 4 | network.id());
                out.extend_from_slice(payment.hash().as_bytes());
                out.extend_from_slice(stake.hash().as_bytes());
                out
            }
            Address::Pointer {
                network,
                payment,
                pointer,
            } => {
                let mut out = Vec::with_capacity(SINGLE_CRED_ADDR_LEN + 6);
                out.push(self.kind() << 4 | network.id());
                out.extend_from_slice(payment.hash().as_bytes());
                push_varnat(&mut out, pointer.slot);
                push_varnat(&mut out, pointer.tx_index);
                push_varnat(&mut out, pointer.cert_index);
                out
            }
            Address::Enterprise { network, payment } => {
                let mut out = Vec::with_capacity(SINGLE_CRED_ADDR_LEN);
                out.push(self.kind() << 4 | network.id());
                out.extend_from_slice(payment.hash().as_bytes());
                out
            }
            Address::Stake { network, stake } => {
                let mut out = Vec::with_capacity(SINGLE_CRED_ADDR_LEN);
                out.push(self.kind() << 4 | network.id());
                out.extend_from_slice(stake.hash().as_bytes());
                out
            }
            Address::Byron(byron) => byron.to_bytes(),
        }
    }

    /// Parse an address from its binary form.
    ///
    /// # Arguments
    /// * `bytes` - The header byte followed by the kind-specific payload.
    ///
    /// # Returns
    /// The decoded `Address`, or an error naming the offending kind,
    /// network tag, or length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
        let header = *bytes.first().ok_or(AddressError::Truncated)?;
        let kind = header >> 4;

        if kind == 0b1000 {
            return Ok(Address::Byron(ByronAddress::from_bytes(bytes)?));
        }

        let network = match header & 0x0f {
            0 => Network::Testnet,
            1 => Network::Mainnet,
            other => return Err(AddressError::UnknownNetwork(other)),
        };

        let credential = |slice: &[u8], script: bool| -> Result<StakeCredential, AddressError> {
            let hash = cardano_primitives::hash::Hash28::from_bytes(slice)?;
            Ok(if script {
                StakeCredential::from_script_hash(hash)
            } else {
                StakeCredential::from_key_hash(hash)
            })
        };

        match kind {
            0b0000..=0b0011 => {
                if bytes.len() != BASE_ADDR_LEN {
                    return Err(AddressError::InvalidLength {
                        kind: "base",
                        expected: BASE_ADDR_LEN,
                        got: bytes.len(),
                    });
                }
                Ok(Address::Base {
                    network,
                    payment: credential(&bytes[1..29], kind & 0b01 != 0)?,
                    stake: credential(&bytes[29..57], kind & 0b10 != 0)?,
                })
            }
            0b0100 | 0b0101 => {
                if bytes.len() < SINGLE_CRED_ADDR_LEN + 3 {
                    return Err(AddressError::InvalidLength {
                        kind: "pointer",
                        expected: SINGLE_CRED_ADDR_LEN + 3,
                        got: bytes.len(),
                    });
                }
                let payment = credential(&bytes[1..29], kind & 0b01 != 0)?;
                let mut pos = 29;
                let slot = read_varnat(bytes, &mut pos)?;
                let tx_index = read_varnat(bytes, &mut pos)?;
                let cert_index = read_varnat(bytes, &mut pos)?;
                if pos != bytes.len() {
                    return Err(AddressError::InvalidLength {
                        kind: "pointer",
                        expected: pos,
                        got: bytes.len(),
                    });
                }
                Ok(Address::Pointer {
                    network,
                    payment,
                    pointer: Pointer {
                        slot,
                        tx_index,
                        cert_index,
                    },
                })
            }
            0b0110 | 0b0111 => {
                if bytes.len() != SINGLE_CRED_ADDR_LEN {
                    return Err(AddressError::InvalidLength {
                        kind: "enterprise",
                        expected: SINGLE_CRED_ADDR_LEN,
                        got: bytes.len(),
                    });
                }
                Ok(Address::Enterprise {
                    network,
                    payment: credential(&bytes[1..29], kind & 0b01 != 0)?,
                })
            }
            0b1110 | 0b1111 => {
                if bytes.len() != SINGLE_CRED_ADDR_LEN {
                    return Err(AddressError::InvalidLength {
                        kind: "stake",
                        expected: SINGLE_CRED_ADDR_LEN,
                        got: bytes.len(),
                    });
                }
                Ok(Address::Stake {
                    network,
                    stake: credential(&bytes[1..29], kind & 0b01 != 0)?,
                })
            }
            _ => Err(AddressError::UnknownAddressKind(kind)),
        }
    }

    /// The bech32 human-readable prefix this address must carry.
    fn bech32_prefix(&self) -> Result<&'static str, AddressError> {
        match self {
            Address::Base { network, .. }
            | Address::Pointer { network, .. }
            | Address::Enterprise { network, .. } => Ok(match network {
                Network::Mainnet => HRP_ADDR,
                Network::Testnet => HRP_ADDR_TEST,
            }),
            Address::Stake { network, .. } => Ok(match network {
                Network::Mainnet => HRP_STAKE,
                Network::Testnet => HRP_STAKE_TEST,
            }),
            Address::Byron(_) => Err(AddressError::UnknownAddressKind(0b1000)),
        }
    }

    /// Encode a modern address as bech32.
    ///
    /// Legacy addresses have no bech32 form; use
    /// [`ByronAddress::to_base58`] instead.
    pub fn to_bech32(&self) -> Result<String, AddressError> {
        let prefix = self.bech32_prefix()?;
        let hrp = bech32::Hrp::parse(prefix).map_err(|e| AddressError::Bech32(e.to_string()))?;
        bech32::encode::<bech32::Bech32>(hrp, &self.to_bytes())
            .map_err(|e| AddressError::Bech32(e.to_string()))
    }

    /// Decode a modern address from bech32 text.
    ///
    /// Rejects a bad checksum, a prefix outside the known table, a prefix
    /// that disagrees with the decoded header's network or kind, and a
    /// payload of the wrong length for its kind.
    pub fn from_bech32(text: &str) -> Result<Self, AddressError> {
        let (hrp, data) = bech32::decode(text).map_err(|e| AddressError::Bech32(e.to_string()))?;
        let address = Self::from_bytes(&data)?;
        let expected = address.bech32_prefix()?;
        let got = hrp.to_string();
        if got != expected {
            return Err(AddressError::WrongPrefix {
                expected: expected.to_string(),
                got,
            });
        }
        Ok(address)
    }
}

impl fmt::Display for Address {
    /// Display as the canonical text form: bech32 for modern addresses,
    /// base58 for legacy ones.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Byron(byron) => write!(f, "{}", byron.to_base58()),
            _ => write!(f, "{}", self.to_bech32().map_err(|_| fmt::Error)?),
        }
    }
}

impl FromStr for Address {
    type Err = AddressError;

    /// Parse either text form: bech32 first, base58 as the legacy
    /// fallback.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from_bech32(s) {
            Ok(address) => Ok(address),
            Err(AddressError::Bech32(_)) => {
                Ok(Address::Byron(ByronAddress::from_base58(s)?))
            }
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Variable-length natural numbers
// ---------------------------------------------------------------------------

/// Append a base-128 big-endian natural number, continuation bit set on
/// every byte but the last.
fn push_varnat(buf: &mut Vec<u8>, mut value: u64) {
    let mut digits = [0u8; 10];
    let mut count = 0;
    loop {
        digits[count] = (value & 0x7f) as u8;
        value >>= 7;
        count += 1;
        if value == 0 {
            break;
        }
    }
    for i in (1..count).rev() {
        buf.push(digits[i] | 0x80);
    }
    buf.push(digits[0]);
}

/// Read a base-128 big-endian natural number starting at `*pos`.
fn read_varnat(data: &[u8], pos: &mut usize) -> Result<u64, AddressError> {
    let mut out: u64 = 0;
    let mut shifts = 0;
    loop {
        let byte = *data.get(*pos).ok_or(AddressError::Truncated)?;
        *pos += 1;
        if shifts >= 10 {
            return Err(AddressError::PointerOverflow);
        }
        out = (out << 7) | (byte & 0x7f) as u64;
        shifts += 1;
        if byte & 0x80 == 0 {
            return Ok(out);
        }
    }
}
