// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Capability introspection.
//!
//! A static table mapping 4-byte capability ids to the capability groups this
//! registry implements. Unknown ids answer `false`; the query never fails.

use std::fmt;
use std::str::FromStr;

use crate::ident::{hex_id, parse_hex, ParseIdError};

/// 4-byte capability (interface) selector.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct InterfaceId(pub [u8; 4]);

hex_id!(InterfaceId, 4);

impl InterfaceId {
    /// Builds an id from its big-endian `u32` form (`0x3b3b57de`).
    pub const fn from_u32(value: u32) -> Self {
        Self(value.to_be_bytes())
    }
}

/// A named capability group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capability {
    /// Selector callers query with.
    pub id: InterfaceId,
    /// Human-readable group name.
    pub name: &'static str,
}

/// Every capability group the registry implements.
pub const CAPABILITIES: &[Capability] = &[
    Capability {
        id: InterfaceId::from_u32(0x3b3b_57de),
        name: "addr",
    },
    Capability {
        id: InterfaceId::from_u32(0xf1cb_7e06),
        name: "address",
    },
    Capability {
        id: InterfaceId::from_u32(0x691f_3431),
        name: "name",
    },
    Capability {
        id: InterfaceId::from_u32(0x2203_ab56),
        name: "abi",
    },
    Capability {
        id: InterfaceId::from_u32(0xc869_0233),
        name: "pubkey",
    },
    Capability {
        id: InterfaceId::from_u32(0x59d1_d43c),
        name: "text",
    },
    Capability {
        id: InterfaceId::from_u32(0xbc1c_58d1),
        name: "contenthash",
    },
    Capability {
        id: InterfaceId::from_u32(0xa8fa_5682),
        name: "dns_record",
    },
    Capability {
        id: InterfaceId::from_u32(0x5c98_042b),
        name: "dns_zone",
    },
    Capability {
        id: InterfaceId::from_u32(0x01ff_c9a7),
        name: "interface",
    },
    Capability {
        id: InterfaceId::from_u32(0x4fbf_0433),
        name: "multicall",
    },
    Capability {
        id: InterfaceId::from_u32(0xf21c_e672),
        name: "delegatable",
    },
];

/// Returns `true` if `id` names an implemented capability group.
pub fn supports_interface(id: InterfaceId) -> bool {
    CAPABILITIES.iter().any(|c| c.id == id)
}

/// Looks up the capability group for `id`.
pub fn capability(id: InterfaceId) -> Option<&'static Capability> {
    CAPABILITIES.iter().find(|c| c.id == id)
}
