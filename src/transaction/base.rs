use super::{Action, State, StateMap, Transaction, Transactions};
use crate::{config::TransactionConfig, error::Result, merge::merge_values};
use serde_json::Value;
use std::{fmt, hash::Hash};

/// A transaction service that only stages edits while in pending mode.
///
/// Outside of pending mode, [`add`](Transactions::add) does nothing: the consumer is expected to
/// apply edits to its data directly. There is no transaction log and no undo/redo history, and
/// [`commit`](Transactions::commit) simply drops whatever was staged.
///
/// # Example
///
/// ```
/// use txlog::{BaseTransactionService, Transaction, Transactions};
/// use serde_json::json;
///
/// let mut service = BaseTransactionService::<u32>::new();
/// service.start_pending();
/// service.add(Transaction::update(1, json!({"a": 1})), Some(json!({"a": 0, "b": 2})))?;
/// assert_eq!(service.aggregated_value(&1, true), Some(json!({"a": 1, "b": 2})));
/// service.end_pending(false);
/// assert!(service.state(&1).is_none());
/// # Ok::<(), txlog::TransactionError>(())
/// ```
pub struct BaseTransactionService<K> {
    pub(super) config: TransactionConfig,
    pub(super) pending: StateMap<K>,
    pub(super) pending_actions: Vec<Action<K>>,
    pub(super) is_pending: bool,
}

impl<K> Default for BaseTransactionService<K> {
    fn default() -> Self {
        Self::with_config(TransactionConfig::default())
    }
}

impl<K: fmt::Debug> fmt::Debug for BaseTransactionService<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseTransactionService")
            .field("is_pending", &self.is_pending)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl<K> BaseTransactionService<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TransactionConfig) -> Self {
        Self {
            config,
            pending: StateMap::default(),
            pending_actions: Vec::new(),
            is_pending: false,
        }
    }

    pub fn config(&self) -> &TransactionConfig {
        &self.config
    }

    pub fn is_pending(&self) -> bool {
        self.is_pending
    }
}

impl<K> BaseTransactionService<K>
where
    K: Hash + Eq + fmt::Debug + Clone,
{
    /// The staged value for `id`, merged on top of its original record if asked to and one is
    /// known.
    pub(super) fn pending_value(&self, id: &K, merge_changes: bool) -> Option<Value> {
        let state = self.pending.get(id)?;
        if merge_changes && state.record_ref.is_some() {
            return merge_values(
                state.record_ref.as_ref(),
                Some(&state.value),
                self.config.clone_strategy(),
            );
        }
        Some(state.value.clone())
    }

    pub(super) fn reset_pending(&mut self) {
        self.pending.clear();
        self.pending_actions.clear();
    }
}

impl<K> Transactions<K> for BaseTransactionService<K>
where
    K: Hash + Eq + fmt::Debug + Clone,
{
    fn add(&mut self, transaction: Transaction<K>, record_ref: Option<Value>) -> Result<()> {
        if !self.is_pending {
            tracing::trace!(id = ?transaction.id, "not pending, transaction ignored");
            return Ok(());
        }

        tracing::debug!(
            id = ?transaction.id,
            kind = %transaction.kind,
            "staging pending transaction"
        );
        self.pending.apply_plain(
            &transaction,
            record_ref.as_ref(),
            self.config.clone_strategy(),
        );
        self.pending_actions.push(Action {
            transaction,
            record_ref,
        });
        Ok(())
    }

    fn transaction_log(&self, _id: Option<&K>) -> Vec<&Transaction<K>> {
        Vec::new()
    }

    fn undo(&mut self) {}

    fn redo(&mut self) {}

    fn aggregated_changes(&self, merge_changes: bool) -> Vec<Transaction<K>> {
        self.pending
            .iter()
            .map(|(id, state)| Transaction {
                id: id.clone(),
                kind: state.kind,
                new_value: self
                    .pending_value(id, merge_changes)
                    .unwrap_or(Value::Null),
            })
            .collect()
    }

    fn state(&self, id: &K) -> Option<&State> {
        self.pending.get(id)
    }

    fn aggregated_value(&self, id: &K, merge_changes: bool) -> Option<Value> {
        self.pending_value(id, merge_changes)
    }

    fn commit(&mut self, _data: &mut Vec<Value>, id: Option<&K>) {
        self.clear(id);
    }

    /// Drops everything that was staged, regardless of `id`.
    fn clear(&mut self, _id: Option<&K>) {
        tracing::debug!("clearing pending transactions");
        self.reset_pending();
    }

    fn start_pending(&mut self) {
        tracing::debug!("pending mode started");
        self.is_pending = true;
    }

    fn end_pending(&mut self, commit: bool) {
        tracing::debug!(
            commit,
            staged = self.pending_actions.len(),
            "pending mode ended"
        );
        self.is_pending = false;
        self.reset_pending();
    }

    fn can_undo(&self) -> bool {
        false
    }

    fn can_redo(&self) -> bool {
        false
    }

    fn enabled(&self) -> bool {
        self.is_pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ignores_transactions_outside_pending() {
        let mut service = BaseTransactionService::<u32>::new();
        assert!(!service.enabled());
        service
            .add(Transaction::add(1, json!({"x": 1})), None)
            .unwrap();
        assert!(service.state(&1).is_none());
        assert!(service.aggregated_changes(false).is_empty());
    }

    #[test]
    fn stages_and_merges_while_pending() {
        let mut service = BaseTransactionService::<u32>::new();
        service.start_pending();
        assert!(service.enabled());

        let record = json!({"a": 0, "b": 2});
        service
            .add(Transaction::update(1, json!({"a": 1})), Some(record.clone()))
            .unwrap();
        service
            .add(Transaction::update(1, json!({"b": 3})), None)
            .unwrap();

        assert_eq!(service.aggregated_value(&1, false), Some(json!({"a": 1, "b": 3})));
        assert_eq!(service.aggregated_value(&1, true), Some(json!({"a": 1, "b": 3})));

        let changes = service.aggregated_changes(false);
        assert_eq!(changes, vec![Transaction::update(1, json!({"a": 1, "b": 3}))]);
    }

    #[test]
    fn has_no_history() {
        let mut service = BaseTransactionService::<u32>::new();
        service.start_pending();
        service
            .add(Transaction::add(1, json!({"x": 1})), None)
            .unwrap();
        assert!(service.transaction_log(None).is_empty());
        assert!(!service.can_undo());
        service.undo();
        assert!(service.state(&1).is_some());
    }

    #[test]
    fn commit_discards_staged_edits() {
        let mut service = BaseTransactionService::<u32>::new();
        service.start_pending();
        service
            .add(Transaction::add(1, json!({"x": 1})), None)
            .unwrap();
        let mut data = vec![];
        service.commit(&mut data, None);
        assert!(data.is_empty());
        assert!(service.state(&1).is_none());
        assert!(service.is_pending());
    }

    #[test]
    fn end_pending_resets() {
        let mut service = BaseTransactionService::<u32>::new();
        service.start_pending();
        service
            .add(Transaction::add(1, json!({"x": 1})), None)
            .unwrap();
        service.end_pending(true);
        assert!(!service.enabled());
        assert!(service.state(&1).is_none());
    }
}
