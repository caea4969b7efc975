// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Authorization resolution over a name's hierarchy.
//!
//! A principal may write at a name if it is approved at the name itself, at
//! any ancestor, or at the root, or if it owns the name's top-level name. The
//! levels are OR'd together; walking from the most specific level only decides
//! which node is reported as the deciding level and lets the walk stop early.

use tracing::debug;

use crate::auth::Authority;
use crate::ident::{NodeId, Principal};
use crate::name::Hierarchy;
use crate::store::KvStore;

/// Why a principal was (or was not) authorized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(tag = "decision", rename_all = "snake_case")
)]
pub enum Decision {
    /// Approved at the suffix starting at label `offset`.
    Approved {
        /// Label offset of the approving level.
        offset: usize,
    },
    /// Owner of the top-level name (or root owner).
    Owner,
    /// No level grants authority.
    Denied,
}

/// Outcome of [`authorize`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Authorization {
    /// Node the request targets.
    pub node: NodeId,
    /// Level at which the decision was made; `node` unless an ancestor
    /// approval decided it.
    pub decided_at: NodeId,
    /// The decision itself.
    pub decision: Decision,
}

impl Authorization {
    /// Returns `true` unless the decision is [`Decision::Denied`].
    pub fn is_authorized(&self) -> bool {
        !matches!(self.decision, Decision::Denied)
    }
}

/// Resolves whether `principal` may write at the full name of `hierarchy`.
pub fn authorize<S: KvStore + ?Sized>(
    authority: &Authority,
    kv: &S,
    hierarchy: &Hierarchy,
    principal: &Principal,
) -> Authorization {
    authorize_from(authority, kv, hierarchy, 0, principal)
}

/// Like [`authorize`] for the suffix starting at label `offset`.
///
/// Offsets at or past the name's depth resolve the root, where only the root
/// owner (admin or root-approved principal) is authorized.
pub fn authorize_from<S: KvStore + ?Sized>(
    authority: &Authority,
    kv: &S,
    hierarchy: &Hierarchy,
    offset: usize,
    principal: &Principal,
) -> Authorization {
    let node = hierarchy.suffix(offset);
    let approved = hierarchy
        .suffixes_from(offset)
        .find(|(_, level)| Authority::is_approved(kv, level, principal));

    let (decided_at, decision) = match approved {
        Some((at, level)) => (level, Decision::Approved { offset: at }),
        None => {
            let top = if offset < hierarchy.depth() {
                hierarchy.top_level()
            } else {
                None
            };
            if authority.is_owner(kv, top.as_ref(), principal) {
                (node, Decision::Owner)
            } else {
                (node, Decision::Denied)
            }
        }
    };
    debug!(%node, %decided_at, %principal, ?decision, "authorization resolved");
    Authorization {
        node,
        decided_at,
        decision,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ident::ROOT_NODE_ID;
    use crate::name::Labels;
    use crate::store::{MemoryStore, StoreKey};

    const ADMIN: Principal = Principal::repeat(0xaa);
    const P: Principal = Principal::repeat(0x01);
    const Q: Principal = Principal::repeat(0x02);

    fn approve(store: &mut MemoryStore, name: &str, who: Principal) {
        let node = Labels::from_dotted(name).unwrap().namehash();
        store.put(StoreKey::Approval(node, who), Arc::from(&[1u8][..]));
    }

    fn check(store: &MemoryStore, name: &str, who: Principal) -> Authorization {
        let h = Labels::from_dotted(name).unwrap().hierarchy();
        authorize(&Authority::new(ADMIN), store, &h, &who)
    }

    #[test]
    fn most_specific_approval_decides() {
        let mut store = MemoryStore::new();
        approve(&mut store, "b.eth", P);
        approve(&mut store, "eth", P);
        let auth = check(&store, "a.b.eth", P);
        assert!(auth.is_authorized());
        assert_eq!(auth.decided_at, Labels::from_dotted("b.eth").unwrap().namehash());
        assert_eq!(auth.decision, Decision::Approved { offset: 1 });
        assert_eq!(auth.node, Labels::from_dotted("a.b.eth").unwrap().namehash());
    }

    #[test]
    fn approvals_never_flow_upward() {
        let mut store = MemoryStore::new();
        approve(&mut store, "a.b.c.eth", P);
        assert!(check(&store, "x.a.b.c.eth", P).is_authorized());
        assert!(!check(&store, "b.c.eth", P).is_authorized());
        assert!(!check(&store, "eth", P).is_authorized());
    }

    #[test]
    fn approvals_are_per_principal() {
        let mut store = MemoryStore::new();
        approve(&mut store, "eth", Q);
        approve(&mut store, "a.eth", P);
        assert!(check(&store, "a.eth", P).is_authorized());
        assert!(!check(&store, "b.eth", P).is_authorized());
        assert!(check(&store, "b.eth", Q).is_authorized());
    }

    #[test]
    fn admin_falls_back_to_ownership_at_the_full_name() {
        let store = MemoryStore::new();
        let auth = check(&store, "a.eth", ADMIN);
        assert_eq!(auth.decision, Decision::Owner);
        assert_eq!(auth.decided_at, auth.node);
    }

    #[test]
    fn root_name_reduces_to_ownership() {
        let mut store = MemoryStore::new();
        assert_eq!(check(&store, "", P).decision, Decision::Denied);
        approve(&mut store, "", P);
        let auth = check(&store, "", P);
        assert_eq!(auth.decision, Decision::Approved { offset: 0 });
        assert_eq!(auth.decided_at, ROOT_NODE_ID);
    }

    #[test]
    fn offset_resolves_a_suffix() {
        let mut store = MemoryStore::new();
        approve(&mut store, "b.eth", P);
        let h = Labels::from_dotted("a.b.eth").unwrap().hierarchy();
        let authority = Authority::new(ADMIN);
        let at_b = authorize_from(&authority, &store, &h, 1, &P);
        assert_eq!(at_b.node, h.suffix(1));
        assert!(at_b.is_authorized());
        assert!(!authorize_from(&authority, &store, &h, 2, &P).is_authorized());
        assert_eq!(authorize_from(&authority, &store, &h, 7, &P).node, ROOT_NODE_ID);
    }
}
