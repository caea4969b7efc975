// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Batched writes.
//!
//! A batch is an ordered list of [`Call`]s executed inside one transaction.
//! Each call is authorized on its own, since calls may target different nodes.
//! The first failing call aborts the batch and nothing in it takes effect.

use crate::auth::Authority;
use crate::error::RegistryError;
use crate::ident::{NodeId, Principal};
use crate::name::Labels;
use crate::record::RecordKind;
use crate::records;
use crate::resolver::Authorization;
use crate::store::KvStore;
use crate::tx::Transaction;

/// One write operation inside a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "call", rename_all = "snake_case")
)]
pub enum Call {
    /// Write (or, with an empty payload, unset) one record.
    SetRecord {
        /// Target name.
        name: Labels,
        /// Record kind and sub-key.
        kind: RecordKind,
        /// New payload.
        #[cfg_attr(feature = "serde", serde(with = "crate::ident::hex_bytes"))]
        payload: Vec<u8>,
    },
    /// Clear every record of a name.
    ClearRecords {
        /// Target name.
        name: Labels,
    },
    /// Grant or revoke delegated authority.
    Approve {
        /// Name the approval is rooted at.
        name: Labels,
        /// Principal whose authority changes.
        operator: Principal,
        /// New approval state.
        approved: bool,
    },
}

impl Call {
    /// Name the call targets.
    pub fn name(&self) -> &Labels {
        match self {
            Self::SetRecord { name, .. }
            | Self::ClearRecords { name }
            | Self::Approve { name, .. } => name,
        }
    }

    /// Node the call targets.
    pub fn target(&self) -> NodeId {
        self.name().namehash()
    }
}

/// Result of one successful call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(tag = "outcome", rename_all = "snake_case")
)]
pub enum CallOutcome {
    /// A record was written.
    Written {
        /// How the write was authorized.
        authorization: Authorization,
    },
    /// A node's records were cleared.
    Cleared {
        /// How the clear was authorized.
        authorization: Authorization,
        /// New record version.
        version: u64,
    },
    /// An approval changed.
    Approval {
        /// Node the approval is rooted at.
        node: NodeId,
    },
}

/// Runs one call against an open transaction.
pub(crate) fn execute<S: KvStore + ?Sized>(
    authority: &Authority,
    tx: &mut Transaction<'_, S>,
    caller: Principal,
    call: &Call,
) -> Result<CallOutcome, RegistryError> {
    match call {
        Call::SetRecord {
            name,
            kind,
            payload,
        } => records::set_record(authority, tx, name, kind, payload, caller)
            .map(|authorization| CallOutcome::Written { authorization }),
        Call::ClearRecords { name } => records::clear_records(authority, tx, name, caller)
            .map(|(authorization, version)| CallOutcome::Cleared {
                authorization,
                version,
            }),
        Call::Approve {
            name,
            operator,
            approved,
        } => authority
            .set_approval(tx, name, *operator, *approved, caller)
            .map(|node| CallOutcome::Approval { node }),
    }
}

/// Runs every call in order, stopping at the first failure.
///
/// With `restrict_to`, a call targeting any other node fails with
/// [`RegistryError::NodeMismatch`] before it runs.
///
/// # Errors
///
/// [`RegistryError::BatchAborted`] carrying the index and error of the first
/// failing call. The caller must discard `tx`.
pub(crate) fn execute_all<S: KvStore + ?Sized>(
    authority: &Authority,
    tx: &mut Transaction<'_, S>,
    caller: Principal,
    restrict_to: Option<NodeId>,
    calls: &[Call],
) -> Result<Vec<CallOutcome>, RegistryError> {
    let mut outcomes = Vec::with_capacity(calls.len());
    for (index, call) in calls.iter().enumerate() {
        let result = match restrict_to {
            Some(expected) if call.target() != expected => Err(RegistryError::NodeMismatch {
                expected,
                actual: call.target(),
            }),
            _ => execute(authority, tx, caller, call),
        };
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(source) => {
                return Err(RegistryError::BatchAborted {
                    index,
                    source: Box::new(source),
                })
            }
        }
    }
    Ok(outcomes)
}
