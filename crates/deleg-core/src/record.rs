// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Record kinds and payload rules.
//!
//! Payloads are opaque bytes. The registry only enforces the few length and
//! shape rules listed on [`RecordKind::validate`]; everything else (address
//! formats, DNS wire records, multicodec content hashes) belongs to callers.
//! An empty payload is the "unset" state: writing one deletes the record.

use std::fmt;

use crate::error::RegistryError;
use crate::ident::NodeId;
use crate::interface::InterfaceId;

/// Coin type of the default address record (SLIP-44 ETH).
pub const COIN_TYPE_DEFAULT: u64 = 60;

/// Length of a public key payload (`x || y`).
pub const PUBKEY_LEN: usize = 64;

/// Length of an address-shaped payload.
pub const ADDRESS_LEN: usize = 20;

/// Closed set of record kinds, each carrying its sub-key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum RecordKind {
    /// Address for a coin type.
    Addr {
        /// SLIP-44 coin type.
        coin_type: u64,
    },
    /// Reverse-resolution name.
    Name,
    /// Contract ABI in a single encoding.
    Abi {
        /// Encoding bit; exactly one bit must be set.
        content_type: u64,
    },
    /// Public key `x || y`.
    Pubkey,
    /// Free-form text record.
    Text {
        /// Text record key (e.g. `url`, `avatar`).
        key: String,
    },
    /// Content hash.
    Contenthash,
    /// DNS resource record set.
    DnsRecord {
        /// Id of the DNS owner name of the record set.
        name: NodeId,
        /// DNS resource type (e.g. 1 for `A`).
        resource: u16,
    },
    /// DNS zone hash.
    DnsZonehash,
    /// Contract implementing an interface on behalf of the name.
    Interface {
        /// Interface selector.
        interface_id: InterfaceId,
    },
}

impl RecordKind {
    /// Default-coin address record.
    pub const fn addr() -> Self {
        Self::Addr {
            coin_type: COIN_TYPE_DEFAULT,
        }
    }

    /// Text record under `key`.
    pub fn text(key: impl Into<String>) -> Self {
        Self::Text { key: key.into() }
    }

    /// Short stable label used in logs and errors.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Addr { .. } => "addr",
            Self::Name => "name",
            Self::Abi { .. } => "abi",
            Self::Pubkey => "pubkey",
            Self::Text { .. } => "text",
            Self::Contenthash => "contenthash",
            Self::DnsRecord { .. } => "dns_record",
            Self::DnsZonehash => "dns_zonehash",
            Self::Interface { .. } => "interface",
        }
    }

    /// Checks kind-specific payload rules.
    ///
    /// - ABI content types must be a single set bit.
    /// - Pubkeys are empty or 64 bytes.
    /// - Default-coin addresses and interface implementers are empty or 20 bytes.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidContentType`] or [`RegistryError::InvalidPayload`].
    pub fn validate(&self, payload: &[u8]) -> Result<(), RegistryError> {
        let fixed = match self {
            Self::Abi { content_type } => {
                if !content_type.is_power_of_two() {
                    return Err(RegistryError::InvalidContentType(*content_type));
                }
                None
            }
            Self::Pubkey => Some(PUBKEY_LEN),
            Self::Addr { coin_type } if *coin_type == COIN_TYPE_DEFAULT => Some(ADDRESS_LEN),
            Self::Interface { .. } => Some(ADDRESS_LEN),
            _ => None,
        };
        match fixed {
            Some(len) if !payload.is_empty() && payload.len() != len => {
                Err(RegistryError::InvalidPayload {
                    kind: self.label(),
                    len: payload.len(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Addr { coin_type } => write!(f, "addr[{coin_type}]"),
            Self::Abi { content_type } => write!(f, "abi[{content_type}]"),
            Self::Text { key } => write!(f, "text[{key}]"),
            Self::DnsRecord { name, resource } => write!(f, "dns_record[{name}/{resource}]"),
            Self::Interface { interface_id } => write!(f, "interface[{interface_id}]"),
            other => f.write_str(other.label()),
        }
    }
}
