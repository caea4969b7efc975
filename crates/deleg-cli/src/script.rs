// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Registry scripts: a JSON list of steps run against one registry.
//!
//! ```json
//! { "steps": [
//!   { "caller": "0x11..", "op": { "type": "approve", "name": "a.eth", "operator": "0x22.." } },
//!   { "caller": "0x22..", "op": { "type": "set", "name": "a.eth",
//!                                 "kind": { "kind": "text", "key": "url" }, "payload": "https://a" } },
//!   { "op": { "type": "get", "name": "a.eth", "kind": { "kind": "text", "key": "url" } } }
//! ] }
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use deleg_core::{
    Authorization, Call, CallOutcome, Labels, NodeId, Principal, RecordKind, Registry,
    RegistryError,
};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// A parsed script.
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// Steps in execution order.
    pub steps: Vec<Step>,
}

impl Script {
    /// Parses a script document.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("parsing registry script")
    }
}

/// One step: an operation and the principal performing it.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// Acting principal. Required for every operation except `get`.
    #[serde(default)]
    pub caller: Option<Principal>,
    /// The operation.
    pub op: Op,
}

/// Script operations.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Op {
    /// Write one record; an empty payload unsets it.
    Set {
        /// Target name.
        name: Labels,
        /// Record kind.
        kind: RecordKind,
        /// Payload; `0x`-prefixed strings are hex, anything else is UTF-8.
        #[serde(default)]
        payload: Payload,
    },
    /// Clear every record of a name.
    Clear {
        /// Target name.
        name: Labels,
    },
    /// Grant (default) or revoke authority.
    Approve {
        /// Name the approval is rooted at.
        name: Labels,
        /// Principal whose authority changes.
        operator: Principal,
        /// New approval state.
        #[serde(default = "granted")]
        approved: bool,
    },
    /// All-or-nothing batch.
    Batch {
        /// Calls in order.
        calls: Vec<Call>,
    },
    /// Batch restricted to the node of `name`.
    BatchChecked {
        /// Name every call must target.
        name: Labels,
        /// Calls in order.
        calls: Vec<Call>,
    },
    /// Authorization query; `principal` defaults to the caller.
    Authorize {
        /// Name to resolve.
        name: Labels,
        /// Label offset of the suffix to resolve.
        #[serde(default)]
        offset: usize,
        /// Principal to check.
        #[serde(default)]
        principal: Option<Principal>,
    },
    /// Public record read.
    Get {
        /// Target name.
        name: Labels,
        /// Record kind.
        kind: RecordKind,
    },
}

const fn granted() -> bool {
    true
}

impl Op {
    /// Short operation name used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::Clear { .. } => "clear",
            Self::Approve { .. } => "approve",
            Self::Batch { .. } => "batch",
            Self::BatchChecked { .. } => "batch_checked",
            Self::Authorize { .. } => "authorize",
            Self::Get { .. } => "get",
        }
    }

    /// Name the operation is about.
    pub fn name(&self) -> Option<&Labels> {
        match self {
            Self::Set { name, .. }
            | Self::Clear { name }
            | Self::Approve { name, .. }
            | Self::BatchChecked { name, .. }
            | Self::Authorize { name, .. }
            | Self::Get { name, .. } => Some(name),
            Self::Batch { .. } => None,
        }
    }
}

/// Record payload as written in scripts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload(pub Vec<u8>);

impl Payload {
    /// Parses `0x`-prefixed hex, or takes the string's UTF-8 bytes.
    pub fn parse(s: &str) -> Result<Self> {
        match s.strip_prefix("0x") {
            Some(digits) => Ok(Self(
                hex::decode(digits).with_context(|| format!("invalid hex payload {s:?}"))?,
            )),
            None => Ok(Self(s.as_bytes().to_vec())),
        }
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// What a successful step produced.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepResult {
    /// A record write committed.
    Written {
        /// How it was authorized.
        authorization: Authorization,
    },
    /// Records were cleared.
    Cleared {
        /// New record version.
        version: u64,
    },
    /// An approval changed.
    Approval {
        /// Node the approval is rooted at.
        node: NodeId,
        /// New state.
        approved: bool,
    },
    /// A batch committed.
    Batch {
        /// Per-call outcomes.
        outcomes: Vec<CallOutcome>,
    },
    /// An authorization query answered.
    Authorization {
        /// The decision.
        authorization: Authorization,
    },
    /// A record was read.
    Record {
        /// Node read from.
        node: NodeId,
        /// Raw payload, hex.
        payload: String,
        /// Payload as text when it is valid UTF-8 and non-empty.
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
}

impl StepResult {
    fn record(node: NodeId, bytes: &Arc<[u8]>) -> Self {
        let text = if bytes.is_empty() {
            None
        } else {
            std::str::from_utf8(bytes).ok().map(str::to_owned)
        };
        Self::Record {
            node,
            payload: format!("0x{}", hex::encode(bytes)),
            text,
        }
    }
}

/// Why a step failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// The operation needs a caller and the step has none.
    #[error("step has no caller")]
    MissingCaller,
    /// The registry rejected the operation.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Outcome of one step.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Zero-based step index.
    pub index: usize,
    /// Operation name.
    pub op: &'static str,
    /// Name the step was about, dotted.
    pub name: Option<String>,
    /// Result or failure.
    pub outcome: std::result::Result<StepResult, StepError>,
}

impl StepReport {
    /// Returns `true` if the step succeeded.
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Runs every step in order. A failing step is reported and the run continues.
pub fn run(registry: &mut Registry, script: &Script) -> Vec<StepReport> {
    script
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let outcome = run_step(registry, step);
            match &outcome {
                Ok(_) => debug!(index, op = step.op.label(), "step succeeded"),
                Err(err) => warn!(index, op = step.op.label(), error = %err, "step failed"),
            }
            StepReport {
                index,
                op: step.op.label(),
                name: step.op.name().map(ToString::to_string),
                outcome,
            }
        })
        .collect()
}

fn run_step(registry: &mut Registry, step: &Step) -> std::result::Result<StepResult, StepError> {
    let caller = || step.caller.ok_or(StepError::MissingCaller);
    match &step.op {
        Op::Set {
            name,
            kind,
            payload,
        } => {
            let authorization = registry.set_record(name, kind, &payload.0, caller()?)?;
            Ok(StepResult::Written { authorization })
        }
        Op::Clear { name } => {
            let version = registry.clear_records(name, caller()?)?;
            Ok(StepResult::Cleared { version })
        }
        Op::Approve {
            name,
            operator,
            approved,
        } => {
            let node = registry.approve(&name.to_wire(), *operator, *approved, caller()?)?;
            Ok(StepResult::Approval {
                node,
                approved: *approved,
            })
        }
        Op::Batch { calls } => {
            let outcomes = registry.multicall(caller()?, calls)?;
            Ok(StepResult::Batch { outcomes })
        }
        Op::BatchChecked { name, calls } => {
            let outcomes = registry.multicall_with_node_check(caller()?, name.namehash(), calls)?;
            Ok(StepResult::Batch { outcomes })
        }
        Op::Authorize {
            name,
            offset,
            principal,
        } => {
            let principal = match principal {
                Some(p) => *p,
                None => caller()?,
            };
            let authorization = registry.authorized_node(&name.to_wire(), *offset, &principal)?;
            Ok(StepResult::Authorization { authorization })
        }
        Op::Get { name, kind } => {
            let node = name.namehash();
            Ok(StepResult::record(node, &registry.record(&node, kind)))
        }
    }
}
