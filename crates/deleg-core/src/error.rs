// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy for registry operations.

use thiserror::Error;

use crate::ident::{NodeId, Principal};
use crate::name::NameError;

/// Errors surfaced by [`Registry`](crate::Registry) operations.
///
/// Every error is synchronous and leaves state untouched: a failed write or
/// batch never commits any of its staged effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The principal holds no authority at any level of the name's hierarchy.
    #[error("{principal} is not authorized for node {node}")]
    NotAuthorized {
        /// Node the write targeted.
        node: NodeId,
        /// Acting principal.
        principal: Principal,
    },
    /// The input name could not be decoded into labels.
    #[error("malformed name: {0}")]
    MalformedName(#[from] NameError),
    /// ABI content type was zero or had more than one bit set.
    #[error("invalid ABI content type {0:#x}")]
    InvalidContentType(u64),
    /// Payload length is not legal for the record kind.
    #[error("invalid {kind} payload of {len} bytes")]
    InvalidPayload {
        /// Record kind label.
        kind: &'static str,
        /// Offending payload length.
        len: usize,
    },
    /// The top-level name already has an owner.
    #[error("top-level name {0} is already registered")]
    TopLevelExists(NodeId),
    /// Owners can only be registered for single-label names.
    #[error("owners can only be registered for a single non-empty label")]
    NotTopLevel,
    /// A node-checked batch contained a call targeting another node.
    #[error("call targets {actual} but the batch is restricted to {expected}")]
    NodeMismatch {
        /// Node the batch was restricted to.
        expected: NodeId,
        /// Node the call targeted.
        actual: NodeId,
    },
    /// A call inside a batch failed; no call in the batch took effect.
    #[error("batch aborted at call {index}: {source}")]
    BatchAborted {
        /// Zero-based position of the first failing call.
        index: usize,
        /// Failure of that call.
        source: Box<RegistryError>,
    },
}

impl RegistryError {
    /// Unwraps [`BatchAborted`](Self::BatchAborted) to the underlying failure.
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::BatchAborted { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
