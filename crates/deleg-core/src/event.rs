// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Events emitted by committed mutations.

use std::sync::Arc;

use crate::ident::{NodeId, Principal};
use crate::record::RecordKind;
use crate::tx::TxId;

/// Observable effect of one successful mutation.
///
/// Events are staged with their transaction and published only on commit, so
/// an aborted batch emits nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(tag = "event", rename_all = "snake_case")
)]
pub enum RegistryEvent {
    /// Delegated authority was granted or revoked.
    Approval {
        /// Node the approval is rooted at.
        node: NodeId,
        /// Principal whose authority changed.
        operator: Principal,
        /// Wire-format name the caller supplied.
        #[cfg_attr(feature = "serde", serde(with = "crate::ident::hex_bytes"))]
        name: Vec<u8>,
        /// New approval state.
        approved: bool,
    },
    /// A record was written (an empty payload means it was unset).
    RecordChanged {
        /// Node the record is attached to.
        node: NodeId,
        /// Record kind including its sub-key.
        kind: RecordKind,
        /// New payload.
        #[cfg_attr(feature = "serde", serde(with = "crate::ident::hex_bytes"))]
        payload: Arc<[u8]>,
    },
    /// All records of a node were cleared by moving to a new version.
    VersionChanged {
        /// Node whose records were cleared.
        node: NodeId,
        /// New record version.
        version: u64,
    },
    /// A top-level name received its owner.
    TopLevelRegistered {
        /// Id of the top-level name.
        node: NodeId,
        /// Its owner.
        owner: Principal,
    },
}

impl RegistryEvent {
    /// Node the event concerns.
    pub fn node(&self) -> NodeId {
        match self {
            Self::Approval { node, .. }
            | Self::RecordChanged { node, .. }
            | Self::VersionChanged { node, .. }
            | Self::TopLevelRegistered { node, .. } => *node,
        }
    }
}

/// An event together with the transaction that committed it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EventRecord {
    /// Committing transaction.
    pub tx: TxId,
    /// The event itself.
    pub event: RegistryEvent,
}
