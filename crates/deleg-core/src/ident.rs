// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier and hashing utilities.
use blake3::Hasher;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Canonical 256-bit hash used for addressing names and labels.
pub type Hash = [u8; 32];

/// Identifier of a fully-qualified name.
///
/// Every suffix of a name has its own `NodeId`; the empty suffix (the root
/// name) is [`ROOT_NODE_ID`]. Ids are one-way: tooling must not assume a
/// `NodeId` can be turned back into its labels.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(pub Hash);

/// The well-known id of the root name (zero hash).
pub const ROOT_NODE_ID: NodeId = NodeId([0u8; 32]);

impl NodeId {
    /// Returns the canonical byte representation of this id.
    #[must_use]
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }

    /// Returns `true` for [`ROOT_NODE_ID`].
    #[must_use]
    pub fn is_root(&self) -> bool {
        *self == ROOT_NODE_ID
    }

    /// Derives the id of the child `label` directly beneath `self`.
    #[must_use]
    pub fn child(&self, label: &[u8]) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(b"node:");
        hasher.update(&self.0);
        hasher.update(&label_hash(label));
        NodeId(hasher.finalize().into())
    }
}

/// Produces a stable, domain‑separated label hash (prefix `b"label:"`) using BLAKE3.
pub fn label_hash(label: &[u8]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(b"label:");
    hasher.update(label);
    hasher.finalize().into()
}

/// An acting party in authorization checks.
///
/// A 20-byte, address-like identifier. The registry never interprets its
/// contents beyond equality.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Principal(pub [u8; 20]);

impl Principal {
    /// Returns the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Builds a principal whose every byte is `b`. Handy for fixtures.
    #[must_use]
    pub const fn repeat(b: u8) -> Self {
        Self([b; 20])
    }
}

/// Failure to parse a hex-encoded identifier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseIdError {
    /// Input was not valid hexadecimal.
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    /// Decoded byte length did not match the identifier width.
    #[error("expected {expected} bytes, got {actual}")]
    Length {
        /// Width of the identifier.
        expected: usize,
        /// Bytes actually decoded.
        actual: usize,
    },
}

pub(crate) fn parse_hex<const N: usize>(s: &str) -> Result<[u8; N], ParseIdError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let bytes = hex::decode(digits)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| ParseIdError::Length {
        expected: N,
        actual: bytes.len(),
    })
}

macro_rules! hex_id {
    ($ty:ident, $len:expr) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl FromStr for $ty {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_hex::<{ $len }>(s).map(Self)
            }
        }

        #[cfg(feature = "serde")]
        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = <std::borrow::Cow<'de, str> as serde::Deserialize<'de>>::deserialize(
                    deserializer,
                )?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use hex_id;

hex_id!(NodeId, 32);
hex_id!(Principal, 20);

/// Byte strings as `0x`-prefixed hex.
#[cfg(feature = "serde")]
pub(crate) mod hex_bytes {
    pub(crate) fn serialize<S, B>(bytes: &B, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
        B: AsRef<[u8]>,
    {
        serializer.collect_str(&format_args!("0x{}", hex::encode(bytes.as_ref())))
    }

    pub(crate) fn deserialize<'de, D, B>(deserializer: D) -> Result<B, D::Error>
    where
        D: serde::Deserializer<'de>,
        B: From<Vec<u8>>,
    {
        let s = <std::borrow::Cow<'de, str> as serde::Deserialize<'de>>::deserialize(
            deserializer,
        )?;
        let digits = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(digits)
            .map(B::from)
            .map_err(serde::de::Error::custom)
    }
}
