// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Authorized record writes and public record reads.
//!
//! Records are keyed by `(node, version, kind)`. The version of a node starts
//! at zero and only moves forward through [`clear_records`]; records written
//! under an older version are unreachable afterwards.

use std::sync::Arc;

use tracing::warn;

use crate::auth::Authority;
use crate::error::RegistryError;
use crate::event::RegistryEvent;
use crate::ident::{NodeId, Principal};
use crate::name::Labels;
use crate::record::RecordKind;
use crate::resolver::{authorize, Authorization};
use crate::store::{KvStore, StoreKey};
use crate::tx::Transaction;

/// Current record version of `node` (zero when never cleared).
pub fn version_of<S: KvStore + ?Sized>(kv: &S, node: &NodeId) -> u64 {
    kv.get(&StoreKey::Version(*node))
        .and_then(|bytes| <[u8; 8]>::try_from(&*bytes).ok())
        .map_or(0, u64::from_le_bytes)
}

/// Reads a record; absent records read as an empty payload.
pub fn read<S: KvStore + ?Sized>(kv: &S, node: &NodeId, kind: &RecordKind) -> Arc<[u8]> {
    let key = StoreKey::Record {
        node: *node,
        version: version_of(kv, node),
        kind: kind.clone(),
    };
    kv.get(&key).unwrap_or_else(|| Arc::from(&[][..]))
}

fn require(
    authority: &Authority,
    kv: &impl KvStore,
    name: &Labels,
    caller: Principal,
) -> Result<Authorization, RegistryError> {
    let authorization = authorize(authority, kv, &name.hierarchy(), &caller);
    if authorization.is_authorized() {
        Ok(authorization)
    } else {
        warn!(%name, %caller, "write rejected");
        Err(RegistryError::NotAuthorized {
            node: authorization.node,
            principal: caller,
        })
    }
}

/// Authorizes and stages one record write.
///
/// An empty payload removes the record.
pub(crate) fn set_record<S: KvStore + ?Sized>(
    authority: &Authority,
    tx: &mut Transaction<'_, S>,
    name: &Labels,
    kind: &RecordKind,
    payload: &[u8],
    caller: Principal,
) -> Result<Authorization, RegistryError> {
    let authorization = require(authority, &*tx, name, caller)?;
    kind.validate(payload)?;
    let node = authorization.node;
    let key = StoreKey::Record {
        node,
        version: version_of(&*tx, &node),
        kind: kind.clone(),
    };
    let payload: Arc<[u8]> = Arc::from(payload);
    if payload.is_empty() {
        tx.remove(&key);
    } else {
        tx.put(key, Arc::clone(&payload));
    }
    tx.emit(RegistryEvent::RecordChanged {
        node,
        kind: kind.clone(),
        payload,
    });
    Ok(authorization)
}

/// Authorizes and stages a version bump for `name`.
pub(crate) fn clear_records<S: KvStore + ?Sized>(
    authority: &Authority,
    tx: &mut Transaction<'_, S>,
    name: &Labels,
    caller: Principal,
) -> Result<(Authorization, u64), RegistryError> {
    let authorization = require(authority, &*tx, name, caller)?;
    let node = authorization.node;
    let version = version_of(&*tx, &node) + 1;
    tx.put(StoreKey::Version(node), Arc::from(&version.to_le_bytes()[..]));
    tx.emit(RegistryEvent::VersionChanged { node, version });
    Ok((authorization, version))
}
