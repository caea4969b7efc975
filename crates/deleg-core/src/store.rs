// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Key-value substrate holding owners, approvals, and records.
//!
//! All registry state lives behind [`KvStore`]. Keys are typed ([`StoreKey`]);
//! values are opaque bytes. The registry never writes to a store directly: it
//! stages writes in a [`Transaction`](crate::tx::Transaction) and flushes them
//! only after the whole request succeeds.
//!
//! # Absence Semantics
//!
//! [`get`](KvStore::get) returns `None` for missing keys. This is **not** an
//! error: an unset record, an absent approval, and an unregistered owner are
//! all ordinary states.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ident::{NodeId, Principal};
use crate::record::RecordKind;

/// Typed key into the registry's state.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StoreKey {
    /// Owner of a top-level name. Value: 20 principal bytes.
    Owner(NodeId),
    /// Delegated authority of a principal rooted at a node. Value: `[1]`.
    Approval(NodeId, Principal),
    /// Current record version of a node. Value: `u64` little-endian.
    Version(NodeId),
    /// A record under a given version of a node.
    Record {
        /// Node the record is attached to.
        node: NodeId,
        /// Record version the entry was written under.
        version: u64,
        /// Record kind including its sub-key.
        kind: RecordKind,
    },
}

/// Synchronous key-value storage port.
pub trait KvStore {
    /// Returns the value stored under `key`; `None` if absent.
    fn get(&self, key: &StoreKey) -> Option<Arc<[u8]>>;

    /// Inserts or overwrites `key`.
    fn put(&mut self, key: StoreKey, value: Arc<[u8]>);

    /// Removes `key`. No-op when absent.
    fn remove(&mut self, key: &StoreKey);

    /// Returns `true` if `key` holds a value.
    fn contains(&self, key: &StoreKey) -> bool {
        self.get(key).is_some()
    }
}

/// In-memory store backed by a `BTreeMap`.
///
/// Iteration order is the key order, so [`iter`](MemoryStore::iter) is
/// deterministic.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<StoreKey, Arc<[u8]>>,
    byte_count: usize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total value bytes stored.
    pub fn byte_count(&self) -> usize {
        self.byte_count
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&StoreKey, &Arc<[u8]>)> {
        self.entries.iter()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &StoreKey) -> Option<Arc<[u8]>> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: StoreKey, value: Arc<[u8]>) {
        self.byte_count += value.len();
        if let Some(old) = self.entries.insert(key, value) {
            self.byte_count -= old.len();
        }
    }

    fn remove(&mut self, key: &StoreKey) {
        if let Some(old) = self.entries.remove(key) {
            self.byte_count -= old.len();
        }
    }
}
