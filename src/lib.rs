// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! # txlog: pending edits with a transaction log and undo/redo
//!
//! This crate keeps track of edits to a collection of records before they are written back to
//! the data they came from. It is the bookkeeping behind "batch editing" in a data grid: the user
//! edits, adds and deletes rows, the grid renders the pending edits, the user can undo and redo
//! them, and eventually the whole batch is committed (or thrown away).
//!
//! Records are plain [`serde_json::Value`]s identified by an id of your choosing.
//!
//! ## Core Concepts
//!
//! - A [`Transaction`] is one requested edit: add, update or delete the record with a given id.
//!   Updates of object records only carry the fields that changed.
//! - A [`State`] is the aggregate of all transactions for one record id. There is at most one
//!   per id; it is what a consumer renders as the pending edit of a row.
//! - An [`Action`] is a transaction paired with the original record it was applied against. Undo
//!   and redo operate on batches of actions.
//!
//! Folding transactions into states follows a small set of rules (see the
//! [`transaction`](mod@crate::transaction) module). An added record that is deleted again
//! disappears. An updated record that is deleted becomes a delete. A deleted record can't be
//! edited any more, and an edit that sets every changed field back to its original value
//! disappears too.
//!
//! ## Getting Started
//!
//! ```rust
//! use txlog::{Transaction, TransactionService, Transactions};
//! use serde_json::json;
//!
//! let mut data = vec![json!({"id": 1, "name": "Alice"}), json!({"id": 2, "name": "Bob"})];
//! let mut service = TransactionService::<u32>::new();
//!
//! // edit a row: the first edit of an existing record needs a snapshot of it
//! service.add(Transaction::update(1, json!({"name": "Alicia"})), Some(data[0].clone()))?;
//! // delete another one
//! service.add(Transaction::delete(2), Some(data[1].clone()))?;
//! // and add a new one
//! service.add(Transaction::add(3, json!({"id": 3, "name": "Carol"})), None)?;
//!
//! // changed my mind about Carol
//! service.undo();
//! // no, I didn't
//! service.redo();
//!
//! // a grid would render these as pending edits
//! let pending = service.aggregated_changes(true);
//! assert_eq!(pending.len(), 3);
//!
//! service.commit(&mut data, None);
//! assert_eq!(
//!     data,
//!     vec![json!({"id": 1, "name": "Alicia"}), json!({"id": 3, "name": "Carol"})]
//! );
//! assert!(!service.can_undo());
//! # Ok::<(), txlog::TransactionError>(())
//! ```
//!
//! ## Scope of this Crate
//!
//! This crate is single-threaded, in-memory bookkeeping. It does no rendering, persistence or I/O
//! of its own, and it never modifies your data except through an explicit
//! [`commit`](Transactions::commit).
//!
//! Events are logged through [`tracing`]; install a subscriber to see them.
//!
//! ## Features
//!
//! - `serde`: Provides `serde` support for transactions, states, actions and [`ServiceKind`].
//!   This feature is enabled by default.
//! - `arbitrary`: Implements `quickcheck::Arbitrary` for [`TransactionType`], useful for
//!   property-based testing.
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

pub mod clone_strategy;
pub use clone_strategy::{CloneStrategy, DefaultCloneStrategy};
pub mod config;
pub use config::{ServiceKind, TransactionConfig, create_service};
mod error;
pub use error::{Result, TransactionError};
pub mod merge;
pub mod observer;
pub use observer::{DummyObserver, RecordingObserver, StateObserver, StateUpdateEvent};
/// Transaction services and the types they operate on.
///
/// See [`transaction`](mod@crate::transaction) module documentation for details and examples.
pub mod transaction;
pub use transaction::{
    Action, BaseTransactionService, Batch, State, StateMap, Transaction, TransactionEventOrigin,
    TransactionService, TransactionType, Transactions,
};
/// Macros usable for tests and initialization
pub mod macros;

// re-export for the transaction! macro
pub use serde_json;

#[cfg(test)]
mod test_util;
