// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The registry: authorized records over a transactional store.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::auth::Authority;
use crate::batch::{self, Call, CallOutcome};
use crate::error::RegistryError;
use crate::event::EventRecord;
use crate::ident::{NodeId, Principal, ROOT_NODE_ID};
use crate::interface::{self, InterfaceId};
use crate::name::{decode_name, Labels};
use crate::record::{RecordKind, ADDRESS_LEN, COIN_TYPE_DEFAULT};
use crate::records;
use crate::resolver::{authorize, authorize_from, Authorization};
use crate::store::{KvStore, MemoryStore};
use crate::tx::{Transaction, TxId};

/// Name registry with delegated write authority.
///
/// Owns its store and an append-only log of committed events. Every mutating
/// method runs in its own transaction: it either commits all of its writes and
/// events, or returns an error and changes nothing.
///
/// Reads never check authorization.
#[derive(Debug)]
pub struct Registry<S = MemoryStore> {
    store: S,
    authority: Authority,
    last_tx: TxId,
    events: Vec<EventRecord>,
}

impl Registry<MemoryStore> {
    /// Creates an empty in-memory registry deployed by `admin`.
    pub fn new(admin: Principal) -> Self {
        Self::with_store(admin, MemoryStore::new())
    }
}

impl<S: KvStore> Registry<S> {
    /// Creates a registry over an existing store.
    pub fn with_store(admin: Principal, store: S) -> Self {
        Self {
            store,
            authority: Authority::new(admin),
            last_tx: TxId::from_raw(0),
            events: Vec::new(),
        }
    }

    /// The deploying principal (owner of the root name).
    pub fn admin(&self) -> Principal {
        self.authority.admin()
    }

    /// The committed store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Committed events, oldest first.
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Takes the committed event log, leaving it empty.
    pub fn drain_events(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.events)
    }

    fn atomically<T>(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&Authority, &mut Transaction<'_, S>) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        self.last_tx = self.last_tx.next();
        let mut tx = Transaction::begin(self.last_tx, &self.store);
        match f(&self.authority, &mut tx) {
            Ok(value) => {
                let writes = tx.write_count();
                let staged = tx.finish();
                let tx_id = staged.id();
                let events = staged.commit(&mut self.store);
                info!(tx = %tx_id, op, writes, events = events.len(), "committed");
                self.events.extend(events);
                Ok(value)
            }
            Err(err) => {
                warn!(tx = %tx.id(), op, error = %err, "aborted");
                Err(err)
            }
        }
    }

    /// Records the owner of the top-level name `label`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotTopLevel`] or [`RegistryError::TopLevelExists`].
    #[instrument(skip_all, fields(label = %label, owner = %owner))]
    pub fn register_top_level(
        &mut self,
        label: &str,
        owner: Principal,
    ) -> Result<NodeId, RegistryError> {
        self.atomically("register_top_level", |_, tx| {
            Authority::register_owner(tx, label, owner)
        })
    }

    /// Grants or revokes `operator`'s authority over the wire-format `name`
    /// and everything beneath it.
    ///
    /// # Errors
    ///
    /// [`RegistryError::MalformedName`] if `name` does not decode;
    /// [`RegistryError::NotAuthorized`] unless `caller` owns the top-level name.
    #[instrument(skip_all, fields(operator = %operator, caller = %caller))]
    pub fn approve(
        &mut self,
        name: &[u8],
        operator: Principal,
        approved: bool,
        caller: Principal,
    ) -> Result<NodeId, RegistryError> {
        let labels = decode_name(name)?;
        self.atomically("approve", |authority, tx| {
            authority.set_approval(tx, &labels, operator, approved, caller)
        })
    }

    /// Direct approval lookup at exactly `node`.
    pub fn is_approved(&self, node: &NodeId, principal: &Principal) -> bool {
        Authority::is_approved(&self.store, node, principal)
    }

    /// Root ownership: the admin, or anyone approved at the root.
    pub fn is_owner(&self, principal: &Principal) -> bool {
        self.authority.is_owner(&self.store, None, principal)
    }

    /// Ownership of the top-level name covering `name`.
    pub fn is_owner_of(&self, name: &Labels, principal: &Principal) -> bool {
        let top = name.hierarchy().top_level();
        self.authority.is_owner(&self.store, top.as_ref(), principal)
    }

    /// Registered owner of the top-level name covering `name`.
    pub fn owner_of(&self, name: &Labels) -> Option<Principal> {
        let top = name.hierarchy().top_level().unwrap_or(ROOT_NODE_ID);
        self.authority.owner_of(&self.store, &top)
    }

    /// Resolves whether `principal` may write at `name`.
    pub fn authorize(&self, name: &Labels, principal: &Principal) -> Authorization {
        authorize(&self.authority, &self.store, &name.hierarchy(), principal)
    }

    /// Resolves the suffix of the wire-format `name` starting at label
    /// `offset`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::MalformedName`] if `name` does not decode.
    pub fn authorized_node(
        &self,
        name: &[u8],
        offset: usize,
        principal: &Principal,
    ) -> Result<Authorization, RegistryError> {
        let labels = decode_name(name)?;
        Ok(authorize_from(
            &self.authority,
            &self.store,
            &labels.hierarchy(),
            offset,
            principal,
        ))
    }

    /// Writes one record. An empty payload unsets it.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotAuthorized`], or a payload rule violation from
    /// [`RecordKind::validate`].
    #[instrument(skip_all, fields(name = %name, kind = %kind, caller = %caller))]
    pub fn set_record(
        &mut self,
        name: &Labels,
        kind: &RecordKind,
        payload: &[u8],
        caller: Principal,
    ) -> Result<Authorization, RegistryError> {
        self.atomically("set_record", |authority, tx| {
            records::set_record(authority, tx, name, kind, payload, caller)
        })
    }

    /// Clears every record of `name` by moving it to a new record version.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotAuthorized`].
    #[instrument(skip_all, fields(name = %name, caller = %caller))]
    pub fn clear_records(
        &mut self,
        name: &Labels,
        caller: Principal,
    ) -> Result<u64, RegistryError> {
        self.atomically("clear_records", |authority, tx| {
            records::clear_records(authority, tx, name, caller).map(|(_, version)| version)
        })
    }

    /// Current record version of `node`.
    pub fn record_version(&self, node: &NodeId) -> u64 {
        records::version_of(&self.store, node)
    }

    /// Reads a record by node id. Unset records read as empty.
    pub fn record(&self, node: &NodeId, kind: &RecordKind) -> Arc<[u8]> {
        records::read(&self.store, node, kind)
    }

    /// Reads a record by name. Unset records read as empty.
    pub fn get_record(&self, name: &Labels, kind: &RecordKind) -> Arc<[u8]> {
        self.record(&name.namehash(), kind)
    }

    /// Default-coin address of `node`, if set.
    pub fn addr(&self, node: &NodeId) -> Option<Principal> {
        let bytes = self.record(node, &RecordKind::Addr {
            coin_type: COIN_TYPE_DEFAULT,
        });
        <[u8; ADDRESS_LEN]>::try_from(&*bytes).ok().map(Principal)
    }

    /// First ABI of `node` whose content type bit is set in `content_types`,
    /// lowest bit first.
    pub fn abi(&self, node: &NodeId, content_types: u64) -> Option<(u64, Arc<[u8]>)> {
        (0..u64::BITS)
            .map(|bit| 1u64 << bit)
            .filter(|content_type| content_types & content_type != 0)
            .map(|content_type| {
                let bytes = self.record(node, &RecordKind::Abi { content_type });
                (content_type, bytes)
            })
            .find(|(_, bytes)| !bytes.is_empty())
    }

    /// Text record `key` of `node` as UTF-8, if set and valid.
    pub fn text(&self, node: &NodeId, key: &str) -> Option<String> {
        let bytes = self.record(node, &RecordKind::text(key));
        if bytes.is_empty() {
            return None;
        }
        String::from_utf8(bytes.to_vec()).ok()
    }

    /// Runs `calls` as one all-or-nothing batch.
    ///
    /// # Errors
    ///
    /// [`RegistryError::BatchAborted`] naming the first failing call; no call
    /// in the batch takes effect.
    #[instrument(skip_all, fields(caller = %caller, calls = calls.len()))]
    pub fn multicall(
        &mut self,
        caller: Principal,
        calls: &[Call],
    ) -> Result<Vec<CallOutcome>, RegistryError> {
        self.atomically("multicall", |authority, tx| {
            batch::execute_all(authority, tx, caller, None, calls)
        })
    }

    /// Like [`multicall`](Self::multicall) but every call must target `node`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::BatchAborted`] wrapping [`RegistryError::NodeMismatch`]
    /// for the first call that targets another node, or any other call failure.
    #[instrument(skip_all, fields(caller = %caller, node = %node, calls = calls.len()))]
    pub fn multicall_with_node_check(
        &mut self,
        caller: Principal,
        node: NodeId,
        calls: &[Call],
    ) -> Result<Vec<CallOutcome>, RegistryError> {
        self.atomically("multicall_with_node_check", |authority, tx| {
            batch::execute_all(authority, tx, caller, Some(node), calls)
        })
    }

    /// Capability introspection; unknown ids answer `false`.
    pub fn supports_interface(&self, id: InterfaceId) -> bool {
        interface::supports_interface(id)
    }
}
