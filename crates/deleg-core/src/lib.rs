// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! deleg-core: name registry with hierarchical delegated write authority.
//!
//! A name owner can delegate write authority over any part of its namespace
//! without transferring ownership. Authority granted at a name extends to every
//! name beneath it; authority granted at the root is equivalent to ownership.
//!
//! The crate is organised leaves first:
//! - [`name`]: label sequences, wire-format names, and the suffix hierarchy.
//! - [`Authority`]: owners per top-level name and `(node, principal)` approvals.
//! - [`authorize`]: the hierarchy walk deciding whether a principal may write.
//! - [`Registry`]: authorized record writes, public reads, and atomic batches
//!   over a [`KvStore`], each request staged in its own [`Transaction`].
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::cognitive_complexity,
    clippy::option_if_let_else,
    clippy::significant_drop_tightening,
    clippy::doc_markdown,
    clippy::too_many_lines,
    clippy::too_long_first_doc_paragraph,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::similar_names,
    clippy::trivially_copy_pass_by_ref,
    clippy::needless_collect,
    clippy::manual_let_else,
    clippy::needless_pass_by_value,
    clippy::multiple_crate_versions
)]

mod auth;
mod batch;
mod error;
mod event;
mod ident;
mod interface;
pub mod name;
mod record;
mod records;
mod registry;
mod resolver;
mod store;
mod tx;

/// Owner and approval rules.
pub use auth::Authority;
/// Batched calls and their outcomes.
pub use batch::{Call, CallOutcome};
/// Error taxonomy.
pub use error::RegistryError;
/// Committed events.
pub use event::{EventRecord, RegistryEvent};
/// Identifiers and hashing.
pub use ident::{label_hash, Hash, NodeId, ParseIdError, Principal, ROOT_NODE_ID};
/// Capability introspection.
pub use interface::{capability, supports_interface, Capability, InterfaceId, CAPABILITIES};
/// Name model re-exports.
pub use name::{decode_name, encode_name, Hierarchy, Labels, NameError, Suffixes};
/// Record kinds and payload limits.
pub use record::{RecordKind, ADDRESS_LEN, COIN_TYPE_DEFAULT, PUBKEY_LEN};
/// Registry facade.
pub use registry::Registry;
/// Authorization resolution.
pub use resolver::{authorize, authorize_from, Authorization, Decision};
/// Key-value substrate.
pub use store::{KvStore, MemoryStore, StoreKey};
/// Transactions.
pub use tx::{Staged, Transaction, TxId};
