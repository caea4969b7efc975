// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Transaction identifiers and the staging buffer that makes requests atomic.
//!
//! Every external request (a single write, an approval, or a whole batch) runs
//! inside one [`Transaction`]. Reads see the committed store overlaid with the
//! transaction's own writes. Nothing reaches the store until the request has
//! fully succeeded; on failure the transaction is dropped and its writes and
//! events vanish with it.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::event::{EventRecord, RegistryEvent};
use crate::store::{KvStore, StoreKey};

/// Thin wrapper around a transaction identifier.
///
/// The registry issues monotonically increasing identifiers, one per request.
///
/// # Invariants
/// - The underlying `u64` may wrap at `u64::MAX`; when it does the registry
///   resumes at `1`.
/// - Zero (`TxId(0)`) is never issued.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct TxId(u64);

impl TxId {
    /// Constructs a `TxId` from a raw `u64` value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying raw value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The identifier following `self`, skipping zero on wrap.
    #[must_use]
    pub(crate) const fn next(self) -> Self {
        let next = self.0.wrapping_add(1);
        if next == 0 {
            Self(1)
        } else {
            Self(next)
        }
    }
}

impl core::fmt::Display for TxId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Write-ahead staging buffer over a committed store.
///
/// `None` in the write map records a staged removal.
pub struct Transaction<'a, S: ?Sized> {
    id: TxId,
    base: &'a S,
    writes: BTreeMap<StoreKey, Option<Arc<[u8]>>>,
    events: Vec<RegistryEvent>,
}

impl<'a, S: KvStore + ?Sized> Transaction<'a, S> {
    /// Opens a transaction reading through to `base`.
    pub fn begin(id: TxId, base: &'a S) -> Self {
        Self {
            id,
            base,
            writes: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Identifier of this transaction.
    pub fn id(&self) -> TxId {
        self.id
    }

    /// Stages an event for publication on commit.
    pub fn emit(&mut self, event: RegistryEvent) {
        self.events.push(event);
    }

    /// Number of staged writes.
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    /// Events staged so far.
    pub fn events(&self) -> &[RegistryEvent] {
        &self.events
    }

    /// Closes the transaction, releasing the borrow of the base store.
    ///
    /// Dropping a transaction instead of finishing it aborts it.
    pub fn finish(self) -> Staged {
        Staged {
            id: self.id,
            writes: self.writes,
            events: self.events,
        }
    }
}

impl<S: KvStore + ?Sized> KvStore for Transaction<'_, S> {
    fn get(&self, key: &StoreKey) -> Option<Arc<[u8]>> {
        match self.writes.get(key) {
            Some(staged) => staged.clone(),
            None => self.base.get(key),
        }
    }

    fn put(&mut self, key: StoreKey, value: Arc<[u8]>) {
        self.writes.insert(key, Some(value));
    }

    fn remove(&mut self, key: &StoreKey) {
        self.writes.insert(key.clone(), None);
    }
}

/// Writes and events of a finished transaction, ready to be flushed.
#[derive(Debug)]
pub struct Staged {
    id: TxId,
    writes: BTreeMap<StoreKey, Option<Arc<[u8]>>>,
    events: Vec<RegistryEvent>,
}

impl Staged {
    /// Identifier of the originating transaction.
    pub fn id(&self) -> TxId {
        self.id
    }

    /// Flushes every staged write into `store` and returns the events tagged
    /// with this transaction's id.
    pub fn commit<S: KvStore + ?Sized>(self, store: &mut S) -> Vec<EventRecord> {
        for (key, value) in self.writes {
            match value {
                Some(value) => store.put(key, value),
                None => store.remove(&key),
            }
        }
        let tx = self.id;
        self.events
            .into_iter()
            .map(|event| EventRecord { tx, event })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::ROOT_NODE_ID;
    use crate::store::MemoryStore;

    fn version_key() -> StoreKey {
        StoreKey::Version(ROOT_NODE_ID)
    }

    #[test]
    fn ids_skip_zero_on_wrap() {
        assert_eq!(TxId::from_raw(u64::MAX).next(), TxId::from_raw(1));
        assert_eq!(TxId::from_raw(0).next(), TxId::from_raw(1));
        assert_eq!(TxId::from_raw(7).next().value(), 8);
    }

    #[test]
    fn reads_see_staged_writes_and_removals() {
        let mut base = MemoryStore::new();
        base.put(version_key(), Arc::from(&[1u8][..]));

        let mut tx = Transaction::begin(TxId::from_raw(1), &base);
        assert_eq!(tx.get(&version_key()).as_deref(), Some(&[1u8][..]));
        tx.put(version_key(), Arc::from(&[2u8][..]));
        assert_eq!(tx.get(&version_key()).as_deref(), Some(&[2u8][..]));
        tx.remove(&version_key());
        assert!(tx.get(&version_key()).is_none());
        // Base is untouched until commit.
        assert_eq!(base.get(&version_key()).as_deref(), Some(&[1u8][..]));
    }

    #[test]
    fn dropping_a_transaction_discards_it() {
        let base = MemoryStore::new();
        {
            let mut tx = Transaction::begin(TxId::from_raw(1), &base);
            tx.put(version_key(), Arc::from(&[2u8][..]));
        }
        assert!(base.is_empty());
    }

    #[test]
    fn commit_flushes_writes_and_tags_events() {
        let mut base = MemoryStore::new();
        base.put(version_key(), Arc::from(&[1u8][..]));
        let mut tx = Transaction::begin(TxId::from_raw(9), &base);
        tx.remove(&version_key());
        tx.emit(RegistryEvent::VersionChanged {
            node: ROOT_NODE_ID,
            version: 1,
        });
        let staged = tx.finish();
        let events = staged.commit(&mut base);
        assert!(base.is_empty());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tx, TxId::from_raw(9));
    }
}
