//! Delegation and pool certificates.
//!
//! Certificates encode as `[discriminant, ...]` arrays; decoding peeks the
//! discriminant and dispatches to the matching fixed shape. The
//! instantaneous-rewards kind exists in the ledger but is not carried by
//! this codec: both directions surface an error.

use cardano_address::{Address, StakeCredential};
use cardano_primitives::cbor::{CborError, CborReader, CborWriter};
use cardano_primitives::hash::{Hash28, Hash32};

use crate::value::Coin;
use crate::TransactionError;

/// CBOR tag for rational numbers.
const TAG_RATIONAL: u64 = 30;

/// A rational in [0, 1], e.g. a pool's margin.
///
/// Encodes as tag 30 wrapping `[numerator, denominator]`; for
/// interoperability with older encoders the decoder also accepts the bare
/// two-element array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitInterval {
    pub numerator: u64,
    pub denominator: u64,
}

impl UnitInterval {
    /// Encode as tag 30 over `[numerator, denominator]`.
    pub fn write_cbor(&self, writer: &mut CborWriter) {
        writer.write_tag(TAG_RATIONAL);
        writer.write_array(2);
        writer.write_uint(self.numerator);
        writer.write_uint(self.denominator);
    }

    /// Decode from the tagged form or the bare-array fallback.
    pub fn read_cbor(reader: &mut CborReader) -> Result<Self, CborError> {
        if reader.peek_tag(TAG_RATIONAL) {
            reader.expect_tag(TAG_RATIONAL)?;
        }
        reader.expect_array(2, "unit interval")?;
        Ok(UnitInterval {
            numerator: reader.read_uint()?,
            denominator: reader.read_uint()?,
        })
    }
}

/// A relay a stake pool is reachable through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Relay {
    /// `[0, port?, ipv4?, ipv6?]`
    SingleHostAddr {
        port: Option<u32>,
        ipv4: Option<[u8; 4]>,
        ipv6: Option<[u8; 16]>,
    },
    /// `[1, port?, dns_name]` - an A or AAAA record.
    SingleHostName { port: Option<u32>, dns_name: String },
    /// `[2, dns_name]` - an SRV record.
    MultiHostName { dns_name: String },
}

impl Relay {
    fn write_cbor(&self, writer: &mut CborWriter) {
        match self {
            Relay::SingleHostAddr { port, ipv4, ipv6 } => {
                writer.write_array(4);
                writer.write_uint(0);
                write_opt_uint(writer, port.map(u64::from));
                match ipv4 {
                    Some(ip) => writer.write_bytes(ip),
                    None => writer.write_null(),
                }
                match ipv6 {
                    Some(ip) => writer.write_bytes(ip),
                    None => writer.write_null(),
                }
            }
            Relay::SingleHostName { port, dns_name } => {
                writer.write_array(3);
                writer.write_uint(1);
                write_opt_uint(writer, port.map(u64::from));
                writer.write_text(dns_name);
            }
            Relay::MultiHostName { dns_name } => {
                writer.write_array(2);
                writer.write_uint(2);
                writer.write_text(dns_name);
            }
        }
    }

    fn read_cbor(reader: &mut CborReader) -> Result<Self, TransactionError> {
        let len = reader.read_array()?;
        let kind = reader.read_uint()?;
        match (kind, len) {
            (0, 4) => {
                let port = read_opt_uint(reader)?;
                let ipv4 = read_opt_ip::<4>(reader)?;
                let ipv6 = read_opt_ip::<16>(reader)?;
                Ok(Relay::SingleHostAddr {
                    port: port.map(|p| p as u32),
                    ipv4,
                    ipv6,
                })
            }
            (1, 3) => {
                let port = read_opt_uint(reader)?;
                let dns_name = reader.read_text()?.to_string();
                Ok(Relay::SingleHostName {
                    port: port.map(|p| p as u32),
                    dns_name,
                })
            }
            (2, 2) => Ok(Relay::MultiHostName {
                dns_name: reader.read_text()?.to_string(),
            }),
            (0..=2, got) => Err(TransactionError::Cbor(CborError::WrongFieldCount {
                what: "relay",
                expected: match kind {
                    0 => 4,
                    1 => 3,
                    _ => 2,
                },
                got,
            })),
            (got, _) => Err(TransactionError::Cbor(CborError::UnknownDiscriminant {
                what: "relay",
                got,
            })),
        }
    }
}

/// Off-chain pool metadata: a URL and the hash of the document behind it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolMetadata {
    pub url: String,
    pub hash: Hash32,
}

/// A transaction certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Certificate {
    /// `[0, credential]` - register a stake credential (pays the key
    /// deposit).
    StakeRegistration { stake_credential: StakeCredential },
    /// `[1, credential]` - deregister a stake credential.
    StakeDeregistration { stake_credential: StakeCredential },
    /// `[2, credential, pool]` - delegate a credential to a pool.
    StakeDelegation {
        stake_credential: StakeCredential,
        pool_keyhash: Hash28,
    },
    /// `[3, operator, vrf, pledge, cost, margin, reward_account, owners,
    /// relays, metadata?]` - register or update a stake pool.
    PoolRegistration {
        operator: Hash28,
        vrf_keyhash: Hash32,
        pledge: Coin,
        cost: Coin,
        margin: UnitInterval,
        reward_account: Address,
        owners: Vec<Hash28>,
        relays: Vec<Relay>,
        metadata: Option<PoolMetadata>,
    },
    /// `[4, pool, epoch]` - retire a pool at the given epoch.
    PoolRetirement { pool_keyhash: Hash28, epoch: u64 },
    /// `[5, genesis, delegate, vrf]` - genesis key delegation.
    GenesisKeyDelegation {
        genesis_hash: Hash28,
        delegate_hash: Hash28,
        vrf_keyhash: Hash32,
    },
    /// Instantaneous rewards movement; not carried by this codec.
    MoveInstantaneousRewards,
}

impl Certificate {
    /// Encode as `[discriminant, ...]`.
    ///
    /// `MoveInstantaneousRewards` is rejected.
    pub fn write_cbor(&self, writer: &mut CborWriter) -> Result<(), TransactionError> {
        match self {
            Certificate::StakeRegistration { stake_credential } => {
                writer.write_array(2);
                writer.write_uint(0);
                stake_credential.write_cbor(writer);
            }
            Certificate::StakeDeregistration { stake_credential } => {
                writer.write_array(2);
                writer.write_uint(1);
                stake_credential.write_cbor(writer);
            }
            Certificate::StakeDelegation {
                stake_credential,
                pool_keyhash,
            } => {
                writer.write_array(3);
                writer.write_uint(2);
                stake_credential.write_cbor(writer);
                writer.write_bytes(pool_keyhash.as_bytes());
            }
            Certificate::PoolRegistration {
                operator,
                vrf_keyhash,
                pledge,
                cost,
                margin,
                reward_account,
                owners,
                relays,
                metadata,
            } => {
                writer.write_array(10);
                writer.write_uint(3);
                writer.write_bytes(operator.as_bytes());
                writer.write_bytes(vrf_keyhash.as_bytes());
                writer.write_uint(*pledge);
                writer.write_uint(*cost);
                margin.write_cbor(writer);
                writer.write_bytes(&reward_account.to_bytes());
                writer.write_array(owners.len() as u64);
                for owner in owners {
                    writer.write_bytes(owner.as_bytes());
                }
                writer.write_array(relays.len() as u64);
                for relay in relays {
                    relay.write_cbor(writer);
                }
                match metadata {
                    Some(meta) => {
                        writer.write_array(2);
                        writer.write_text(&meta.url);
                        writer.write_bytes(meta.hash.as_bytes());
                    }
                    None => writer.write_null(),
                }
            }
            Certificate::PoolRetirement {
                pool_keyhash,
                epoch,
            } => {
                writer.write_array(3);
                writer.write_uint(4);
                writer.write_bytes(pool_keyhash.as_bytes());
                writer.write_uint(*epoch);
            }
            Certificate::GenesisKeyDelegation {
                genesis_hash,
                delegate_hash,
                vrf_keyhash,
            } => {
                writer.write_array(4);
                writer.write_uint(5);
                writer.write_bytes(genesis_hash.as_bytes());
                writer.write_bytes(delegate_hash.as_bytes());
                writer.write_bytes(vrf_keyhash.as_bytes());
            }
            Certificate::MoveInstantaneousRewards => {
                return Err(TransactionError::UnsupportedCertificate(
                    "move instantaneous rewards",
                ));
            }
        }
        Ok(())
    }

    /// Decode by discriminant, enforcing the kind's field count.
    pub fn read_cbor(reader: &mut CborReader) -> Result<Self, TransactionError> {
        let len = reader.read_array()?;
        let kind = reader.read_uint()?;

        let expect_len = |expected: u64| -> Result<(), TransactionError> {
            if len != expected {
                return Err(TransactionError::Cbor(CborError::WrongFieldCount {
                    what: "certificate",
                    expected,
                    got: len,
                }));
            }
            Ok(())
        };

        match kind {
            0 => {
                expect_len(2)?;
                Ok(Certificate::StakeRegistration {
                    stake_credential: StakeCredential::read_cbor(reader)?,
                })
            }
            1 => {
                expect_len(2)?;
                Ok(Certificate::StakeDeregistration {
                    stake_credential: StakeCredential::read_cbor(reader)?,
                })
            }
            2 => {
                expect_len(3)?;
                Ok(Certificate::StakeDelegation {
                    stake_credential: StakeCredential::read_cbor(reader)?,
                    pool_keyhash: Hash28::from_bytes(reader.read_bytes()?)?,
                })
            }
            3 => {
                expect_len(10)?;
                let operator = Hash28::from_bytes(reader.read_bytes()?)?;
                let vrf_keyhash = Hash32::from_bytes(reader.read_bytes()?)?;
                let pledge = reader.read_uint()?;
                let cost = reader.read_uint()?;
                let margin = UnitInterval::read_cbor(reader)?;
                let reward_account = Address::from_bytes(reader.read_bytes()?)?;

                let owner_count = reader.read_array()?;
                let mut owners = Vec::with_capacity(owner_count as usize);
                for _ in 0..owner_count {
                    owners.push(Hash28::from_bytes(reader.read_bytes()?)?);
                }

                let relay_count = reader.read_array()?;
                let mut relays = Vec::with_capacity(relay_count as usize);
                for _ in 0..relay_count {
                    relays.push(Relay::read_cbor(reader)?);
                }

                let metadata = if reader.peek_null() {
                    reader.read_null()?;
                    None
                } else {
                    reader.expect_array(2, "pool metadata")?;
                    Some(PoolMetadata {
                        url: reader.read_text()?.to_string(),
                        hash: Hash32::from_bytes(reader.read_bytes()?)?,
                    })
                };

                Ok(Certificate::PoolRegistration {
                    operator,
                    vrf_keyhash,
                    pledge,
                    cost,
                    margin,
                    reward_account,
                    owners,
                    relays,
                    metadata,
                })
            }
            4 => {
                expect_len(3)?;
                Ok(Certificate::PoolRetirement {
                    pool_keyhash: Hash28::from_bytes(reader.read_bytes()?)?,
                    epoch: reader.read_uint()?,
                })
            }
            5 => {
                expect_len(4)?;
                Ok(Certificate::GenesisKeyDelegation {
                    genesis_hash: Hash28::from_bytes(reader.read_bytes()?)?,
                    delegate_hash: Hash28::from_bytes(reader.read_bytes()?)?,
                    vrf_keyhash: Hash32::from_bytes(reader.read_bytes()?)?,
                })
            }
            6 => Err(TransactionError::UnsupportedCertificate(
                "move instantaneous rewards",
            )),
            got => Err(TransactionError::Cbor(CborError::UnknownDiscriminant {
                what: "certificate",
                got,
            })),
        }
    }
}

fn write_opt_uint(writer: &mut CborWriter, value: Option<u64>) {
    match value {
        Some(v) => writer.write_uint(v),
        None => writer.write_null(),
    }
}

fn read_opt_uint(reader: &mut CborReader) -> Result<Option<u64>, CborError> {
    if reader.peek_null() {
        reader.read_null()?;
        return Ok(None);
    }
    Ok(Some(reader.read_uint()?))
}

fn read_opt_ip<const N: usize>(reader: &mut CborReader) -> Result<Option<[u8; N]>, TransactionError> {
    if reader.peek_null() {
        reader.read_null()?;
        return Ok(None);
    }
    let bytes = reader.read_bytes()?;
    let arr: [u8; N] = bytes.try_into().map_err(|_| {
        TransactionError::Cbor(CborError::TypeMismatch {
            expected: "ip address bytes",
            found: 2,
        })
    })?;
    Ok(Some(arr))
}
