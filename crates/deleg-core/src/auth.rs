// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Owners and delegated approvals.
//!
//! Two facts decide who may write:
//! - **Owners**: one principal per top-level name, fixed at registration. The
//!   registry's admin owns the root and therefore every top-level name.
//! - **Approvals**: `(node, principal) -> bool` entries granting authority over
//!   `node` and everything beneath it. Absence means `false`.
//!
//! An approval at the root is equivalent to being the admin. Only owners may
//! grant or revoke approvals.

use std::sync::Arc;

use tracing::debug;

use crate::error::RegistryError;
use crate::event::RegistryEvent;
use crate::ident::{NodeId, Principal, ROOT_NODE_ID};
use crate::name::Labels;
use crate::store::{KvStore, StoreKey};
use crate::tx::Transaction;

/// Owner and approval rules over a [`KvStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Authority {
    admin: Principal,
}

impl Authority {
    /// Creates the rules for a registry deployed by `admin`.
    pub const fn new(admin: Principal) -> Self {
        Self { admin }
    }

    /// The deploying principal, owner of the root name.
    pub const fn admin(&self) -> Principal {
        self.admin
    }

    /// Direct approval lookup at exactly `node`; no hierarchy walk.
    pub fn is_approved<S: KvStore + ?Sized>(kv: &S, node: &NodeId, principal: &Principal) -> bool {
        kv.contains(&StoreKey::Approval(*node, *principal))
    }

    /// Registered owner of a top-level name. The root is owned by the admin.
    pub fn owner_of<S: KvStore + ?Sized>(&self, kv: &S, top: &NodeId) -> Option<Principal> {
        if top.is_root() {
            return Some(self.admin);
        }
        let bytes = kv.get(&StoreKey::Owner(*top))?;
        <[u8; 20]>::try_from(&*bytes).ok().map(Principal)
    }

    /// Ownership check for the top-level name `top` (`None` is the root).
    ///
    /// True if `principal` is the registered owner of `top`, is the admin, or
    /// holds an approval at the root.
    pub fn is_owner<S: KvStore + ?Sized>(
        &self,
        kv: &S,
        top: Option<&NodeId>,
        principal: &Principal,
    ) -> bool {
        if *principal == self.admin || Self::is_approved(kv, &ROOT_NODE_ID, principal) {
            return true;
        }
        top.and_then(|t| self.owner_of(kv, t))
            .is_some_and(|owner| owner == *principal)
    }

    /// Records `owner` for the single-label name `label`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotTopLevel`] unless `label` is exactly one label;
    /// [`RegistryError::TopLevelExists`] if an owner is already recorded.
    pub fn register_owner<S: KvStore + ?Sized>(
        tx: &mut Transaction<'_, S>,
        label: &str,
        owner: Principal,
    ) -> Result<NodeId, RegistryError> {
        let labels = Labels::from_dotted(label)?;
        if labels.len() != 1 {
            return Err(RegistryError::NotTopLevel);
        }
        let node = labels.namehash();
        let key = StoreKey::Owner(node);
        if tx.contains(&key) {
            return Err(RegistryError::TopLevelExists(node));
        }
        tx.put(key, Arc::from(&owner.0[..]));
        tx.emit(RegistryEvent::TopLevelRegistered { node, owner });
        Ok(node)
    }

    /// Grants or revokes `operator`'s authority rooted at `name`.
    ///
    /// Emits exactly one [`RegistryEvent::Approval`] carrying the wire form of
    /// `name`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotAuthorized`] unless `caller` owns the top-level name
    /// covering `name` (the root owner for the root name itself).
    pub fn set_approval<S: KvStore + ?Sized>(
        &self,
        tx: &mut Transaction<'_, S>,
        name: &Labels,
        operator: Principal,
        approved: bool,
        caller: Principal,
    ) -> Result<NodeId, RegistryError> {
        let hierarchy = name.hierarchy();
        let node = hierarchy.node();
        if !self.is_owner(&*tx, hierarchy.top_level().as_ref(), &caller) {
            return Err(RegistryError::NotAuthorized {
                node,
                principal: caller,
            });
        }
        let key = StoreKey::Approval(node, operator);
        if approved {
            tx.put(key, Arc::from(&[1u8][..]));
        } else {
            tx.remove(&key);
        }
        debug!(%node, %operator, approved, "approval staged");
        tx.emit(RegistryEvent::Approval {
            node,
            operator,
            name: name.to_wire(),
            approved,
        });
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::tx::TxId;

    const ADMIN: Principal = Principal::repeat(0xaa);
    const ALICE: Principal = Principal::repeat(0x01);
    const BOB: Principal = Principal::repeat(0x02);

    fn eth() -> Labels {
        Labels::from_dotted("eth").unwrap()
    }

    fn registered(owner: Principal) -> MemoryStore {
        let mut store = MemoryStore::new();
        let mut tx = Transaction::begin(TxId::from_raw(1), &store);
        Authority::register_owner(&mut tx, "eth", owner).unwrap();
        let staged = tx.finish();
        staged.commit(&mut store);
        store
    }

    #[test]
    fn admin_owns_every_top_level_name() {
        let auth = Authority::new(ADMIN);
        let store = registered(ALICE);
        let top = eth().namehash();
        assert!(auth.is_owner(&store, Some(&top), &ADMIN));
        assert!(auth.is_owner(&store, Some(&top), &ALICE));
        assert!(!auth.is_owner(&store, Some(&top), &BOB));
        assert!(!auth.is_owner(&store, None, &ALICE));
        assert_eq!(auth.owner_of(&store, &ROOT_NODE_ID), Some(ADMIN));
    }

    #[test]
    fn double_registration_is_rejected() {
        let store = registered(ALICE);
        let mut tx = Transaction::begin(TxId::from_raw(2), &store);
        assert_eq!(
            Authority::register_owner(&mut tx, "eth", BOB),
            Err(RegistryError::TopLevelExists(eth().namehash()))
        );
        assert_eq!(
            Authority::register_owner(&mut tx, "a.eth", BOB),
            Err(RegistryError::NotTopLevel)
        );
        assert_eq!(
            Authority::register_owner(&mut tx, "", BOB),
            Err(RegistryError::NotTopLevel)
        );
    }

    #[test]
    fn non_owner_cannot_approve_and_stages_nothing() {
        let auth = Authority::new(ADMIN);
        let store = registered(ALICE);
        let mut tx = Transaction::begin(TxId::from_raw(2), &store);
        let err = auth
            .set_approval(&mut tx, &eth(), BOB, true, BOB)
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotAuthorized { .. }));
        assert_eq!(tx.write_count(), 0);
        assert!(tx.events().is_empty());
    }

    #[test]
    fn owner_grants_then_revokes() {
        let auth = Authority::new(ADMIN);
        let store = registered(ALICE);
        let mut tx = Transaction::begin(TxId::from_raw(2), &store);
        let node = auth.set_approval(&mut tx, &eth(), BOB, true, ALICE).unwrap();
        assert!(Authority::is_approved(&tx, &node, &BOB));
        auth.set_approval(&mut tx, &eth(), BOB, false, ALICE).unwrap();
        assert!(!Authority::is_approved(&tx, &node, &BOB));
        assert_eq!(tx.events().len(), 2);
    }

    #[test]
    fn root_approval_is_ownership() {
        let auth = Authority::new(ADMIN);
        let store = registered(ALICE);
        let mut tx = Transaction::begin(TxId::from_raw(2), &store);
        auth.set_approval(&mut tx, &Labels::root(), BOB, true, ADMIN)
            .unwrap();
        assert!(auth.is_owner(&tx, None, &BOB));
        assert!(auth.is_owner(&tx, Some(&eth().namehash()), &BOB));
    }
}
