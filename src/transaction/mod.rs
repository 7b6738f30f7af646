//! Transaction services for pending record edits.
//!
//! A consumer (typically a data grid) reports every edit a user makes to a record as a
//! [`Transaction`]. The service folds all transactions for the same record id into a single
//! [`State`], which is what the consumer renders as "pending" until it decides to write the edits
//! back to its data with [`Transactions::commit`].
//!
//! Two services are provided:
//!
//! - [`BaseTransactionService`] only stages edits while in pending mode and keeps no history.
//! - [`TransactionService`] keeps a transaction log and an undo/redo history on top of that.
//!
//! Both implement the [`Transactions`] trait, so a consumer can pick one at runtime through
//! [`create_service`](crate::config::create_service).
//!
//! # Example
//!
//! ```
//! use txlog::{Transaction, TransactionService, Transactions};
//! use serde_json::json;
//!
//! let mut service = TransactionService::<u32>::new();
//! let original = json!({"name": "Alice", "age": 30});
//!
//! service.add(Transaction::update(1, json!({"age": 31})), Some(original.clone()))?;
//! service.add(Transaction::add(2, json!({"name": "Bob", "age": 25})), None)?;
//!
//! // only the changed fields are pending for record 1
//! assert_eq!(service.aggregated_value(&1, false), Some(json!({"age": 31})));
//! // merged against the original record, the full row comes back
//! assert_eq!(
//!     service.aggregated_value(&1, true),
//!     Some(json!({"name": "Alice", "age": 31}))
//! );
//!
//! service.undo();
//! assert!(service.state(&2).is_none());
//! service.redo();
//!
//! let mut data = vec![original];
//! service.commit(&mut data, None);
//! assert_eq!(
//!     data,
//!     vec![json!({"name": "Alice", "age": 31}), json!({"name": "Bob", "age": 25})]
//! );
//! # Ok::<(), txlog::TransactionError>(())
//! ```
//!
//! # State rules
//!
//! Per record id, the aggregated state moves through these transitions:
//!
//! | Existing state | Incoming | Result                                   |
//! |----------------|----------|------------------------------------------|
//! | none           | any      | fresh state of the incoming type         |
//! | add            | update   | add, with the update merged in           |
//! | add            | delete   | state removed (nothing left to persist)  |
//! | update         | update   | update, merged in place                  |
//! | update         | delete   | delete                                   |
//! | delete         | any      | rejected with an error                   |
//! | any            | add      | rejected with an error                   |
//!
//! After every committed (non-pending) transaction, fields that are equal to the original
//! record again are dropped, and a state with nothing left is removed entirely.
//!
//! # Pending mode
//!
//! Between [`Transactions::start_pending`] and [`Transactions::end_pending`], transactions are
//! staged in a separate layer. Ending pending mode with `commit = true` flushes them into the
//! committed state as a single undo step; `commit = false` discards them.
//!
//! # Undo and redo
//!
//! Undo pops the latest step and rebuilds the whole state map by replaying every remaining step
//! from scratch. Redo re-applies the popped step. Any new transaction clears the redo history.

mod base;
mod logged;
mod states;
mod types;

pub use base::BaseTransactionService;
pub use logged::TransactionService;
pub use states::StateMap;
pub use types::{Action, Batch, State, Transaction, TransactionEventOrigin, TransactionType};

use crate::error::Result;
use serde_json::Value;

/// Operations shared by all transaction services.
pub trait Transactions<K> {
    /// Records `transaction` against the record with the same id.
    ///
    /// `record_ref` is a snapshot of the original record and is required for the first update or
    /// delete of an existing record outside of pending mode.
    fn add(&mut self, transaction: Transaction<K>, record_ref: Option<Value>) -> Result<()>;

    /// All recorded transactions in order, or only those for `id`.
    fn transaction_log(&self, id: Option<&K>) -> Vec<&Transaction<K>>;

    /// Reverts the latest undo step.
    fn undo(&mut self);

    /// Re-applies the latest undone step.
    fn redo(&mut self);

    /// One transaction per record with pending changes.
    ///
    /// With `merge_changes`, each value is merged on top of its original record.
    fn aggregated_changes(&self, merge_changes: bool) -> Vec<Transaction<K>>;

    fn state(&self, id: &K) -> Option<&State>;

    /// The merged pending value for `id`, optionally merged on top of the original record.
    fn aggregated_value(&self, id: &K, merge_changes: bool) -> Option<Value>;

    /// Writes the aggregated changes (for `id`, or all records) into `data` and clears them.
    fn commit(&mut self, data: &mut Vec<Value>, id: Option<&K>);

    /// Drops transactions and state for `id`, or everything.
    fn clear(&mut self, id: Option<&K>);

    fn start_pending(&mut self);

    /// Leaves pending mode, flushing the staged transactions if `commit` is set.
    fn end_pending(&mut self, commit: bool);

    fn can_undo(&self) -> bool;

    fn can_redo(&self) -> bool;

    /// Whether transactions are currently being recorded.
    fn enabled(&self) -> bool;
}
