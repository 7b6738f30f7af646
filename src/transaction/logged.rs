use super::{
    Action, BaseTransactionService, Batch, State, StateMap, Transaction, TransactionEventOrigin,
    TransactionType, Transactions,
};
use crate::{
    config::TransactionConfig,
    error::Result,
    merge::merge_values,
    observer::{DummyObserver, StateObserver, StateUpdateEvent},
};
use serde_json::Value;
use smallvec::smallvec;
use std::{fmt, hash::Hash};

/// A transaction service with a transaction log and undo/redo history.
///
/// Every [`add`](Transactions::add) outside of pending mode is one undo step. A whole pending
/// session, once committed through [`end_pending(true)`](Transactions::end_pending), is one undo
/// step as well.
///
/// Undo does not invert the latest step; it rebuilds the state map from scratch by replaying all
/// remaining steps. This keeps the merge rules the only source of truth for what a state looks
/// like, at the cost of O(steps × actions) work per undo.
///
/// Changes are reported to an optional [`StateObserver`].
///
/// # Example
///
/// ```
/// use txlog::{Transaction, TransactionService, Transactions};
/// use serde_json::json;
///
/// let mut service = TransactionService::<&str>::new();
/// service.add(Transaction::update("a", json!({"v": 1})), Some(json!({"v": 0})))?;
/// service.add(Transaction::update("a", json!({"v": 2})), None)?;
/// assert_eq!(service.transaction_log(None).len(), 2);
///
/// service.undo();
/// assert_eq!(service.aggregated_value(&"a", false), Some(json!({"v": 1})));
/// assert!(service.can_redo());
/// # Ok::<(), txlog::TransactionError>(())
/// ```
pub struct TransactionService<K, O = DummyObserver> {
    base: BaseTransactionService<K>,
    states: StateMap<K>,
    transactions: Vec<Transaction<K>>,
    undo_stack: Vec<Batch<K>>,
    redo_stack: Vec<Batch<K>>,
    observer: O,
}

impl<K> Default for TransactionService<K> {
    fn default() -> Self {
        Self::with_config(TransactionConfig::default())
    }
}

impl<K> TransactionService<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TransactionConfig) -> Self {
        Self::with_observer(config, DummyObserver)
    }
}

impl<K: fmt::Debug, O> fmt::Debug for TransactionService<K, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionService")
            .field("states", &self.states)
            .field("transactions", &self.transactions)
            .field("undo_steps", &self.undo_stack.len())
            .field("redo_steps", &self.redo_stack.len())
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl<K, O> TransactionService<K, O> {
    pub fn with_observer(config: TransactionConfig, observer: O) -> Self {
        Self {
            base: BaseTransactionService::with_config(config),
            states: StateMap::default(),
            transactions: Vec::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            observer,
        }
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn config(&self) -> &TransactionConfig {
        self.base.config()
    }

    pub fn is_pending(&self) -> bool {
        self.base.is_pending()
    }

    /// The committed (non-pending) state map.
    pub fn states(&self) -> &StateMap<K> {
        &self.states
    }

    /// Number of steps that [`undo`](Transactions::undo) can revert.
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of steps that [`redo`](Transactions::redo) can re-apply.
    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }
}

impl<K, O> TransactionService<K, O>
where
    K: Hash + Eq + fmt::Debug + Clone,
    O: StateObserver<K>,
{
    /// The staged state for `id` while in pending mode.
    pub fn pending_state(&self, id: &K) -> Option<&State> {
        self.base.pending.get(id)
    }

    fn emit(observer: &mut O, origin: TransactionEventOrigin, actions: &[Action<K>]) {
        observer.state_updated(StateUpdateEvent { origin, actions });
    }

    /// Writes the aggregated `state` into `data`.
    ///
    /// The original record is located by structural equality with `record_ref`; updates and
    /// deletes of records that can't be found are skipped.
    fn update_record(&self, data: &mut Vec<Value>, state: &State) {
        let index = || {
            let record_ref = state.record_ref.as_ref()?;
            data.iter().position(|record| record == record_ref)
        };
        match state.kind {
            TransactionType::Add => data.push(state.value.clone()),
            TransactionType::Delete => match index() {
                Some(i) => {
                    data.remove(i);
                }
                None => tracing::debug!("record to delete not found in data"),
            },
            TransactionType::Update => match index() {
                Some(i) => {
                    if let Some(merged) = merge_values(
                        state.record_ref.as_ref(),
                        Some(&state.value),
                        self.base.config.clone_strategy(),
                    ) {
                        data[i] = merged;
                    }
                }
                None => tracing::debug!("record to update not found in data"),
            },
        }
    }
}

impl<K, O> Transactions<K> for TransactionService<K, O>
where
    K: Hash + Eq + fmt::Debug + Clone,
    O: StateObserver<K>,
{
    fn add(&mut self, transaction: Transaction<K>, record_ref: Option<Value>) -> Result<()> {
        let strategy = self.base.config.clone_strategy();

        if self.base.is_pending {
            self.base.pending.verify(&transaction, record_ref.as_ref(), true)?;
            tracing::debug!(
                id = ?transaction.id,
                kind = %transaction.kind,
                "staging pending transaction"
            );
            self.base.pending.apply(&transaction, record_ref.as_ref(), strategy, false);
            self.base.pending_actions.push(Action {
                transaction,
                record_ref,
            });
            return Ok(());
        }

        self.states.verify(&transaction, record_ref.as_ref(), false)?;
        tracing::debug!(
            id = ?transaction.id,
            kind = %transaction.kind,
            "adding transaction"
        );
        self.states.apply(&transaction, record_ref.as_ref(), strategy, true);
        self.transactions.push(transaction.clone());

        let batch: Batch<K> = smallvec![Action {
            transaction,
            record_ref,
        }];
        Self::emit(&mut self.observer, TransactionEventOrigin::Add, &batch);
        self.undo_stack.push(batch);
        self.redo_stack.clear();
        Ok(())
    }

    fn transaction_log(&self, id: Option<&K>) -> Vec<&Transaction<K>> {
        match id {
            Some(id) => self.transactions.iter().filter(|t| &t.id == id).collect(),
            None => self.transactions.iter().collect(),
        }
    }

    fn undo(&mut self) {
        let Some(batch) = self.undo_stack.pop() else {
            tracing::trace!("nothing to undo");
            return;
        };
        tracing::debug!(
            actions = batch.len(),
            remaining = self.undo_stack.len(),
            "undoing step"
        );

        let kept = self.transactions.len().saturating_sub(batch.len());
        self.transactions.truncate(kept);

        let strategy = self.base.config.clone_strategy();
        self.states.clear();
        for action in self.undo_stack.iter().flatten() {
            self.states.apply(
                &action.transaction,
                action.record_ref.as_ref(),
                strategy,
                true,
            );
        }

        Self::emit(&mut self.observer, TransactionEventOrigin::Undo, &batch);
        self.redo_stack.push(batch);
    }

    fn redo(&mut self) {
        let Some(batch) = self.redo_stack.pop() else {
            tracing::trace!("nothing to redo");
            return;
        };
        tracing::debug!(actions = batch.len(), "redoing step");

        let strategy = self.base.config.clone_strategy();
        for action in &batch {
            self.states.apply(
                &action.transaction,
                action.record_ref.as_ref(),
                strategy,
                true,
            );
            self.transactions.push(action.transaction.clone());
        }

        Self::emit(&mut self.observer, TransactionEventOrigin::Redo, &batch);
        self.undo_stack.push(batch);
    }

    fn aggregated_changes(&self, merge_changes: bool) -> Vec<Transaction<K>> {
        let strategy = self.base.config.clone_strategy();
        self.states
            .iter()
            .map(|(id, state)| {
                let new_value = if merge_changes {
                    merge_values(state.record_ref.as_ref(), Some(&state.value), strategy)
                        .unwrap_or(Value::Null)
                } else {
                    state.value.clone()
                };
                Transaction {
                    id: id.clone(),
                    kind: state.kind,
                    new_value,
                }
            })
            .collect()
    }

    fn state(&self, id: &K) -> Option<&State> {
        self.states.get(id)
    }

    /// Folds the committed and the pending layer for `id`, pending on top.
    ///
    /// With `merge_changes`, the result is further merged on top of the original record (taken
    /// from the committed state if there is one, otherwise from the pending state).
    fn aggregated_value(&self, id: &K, merge_changes: bool) -> Option<Value> {
        let state = self.states.get(id);
        let pending_state = self.base.pending.get(id);
        if state.is_none() && pending_state.is_none() {
            return None;
        }

        let strategy = self.base.config.clone_strategy();
        let pending_change = self.base.pending_value(id, false);
        let change = state.map(|s| &s.value);
        let aggregated = merge_values(change, pending_change.as_ref(), strategy);
        if !merge_changes {
            return aggregated;
        }

        let original = match state {
            Some(state) => state.record_ref.as_ref(),
            None => pending_state.and_then(|s| s.record_ref.as_ref()),
        };
        merge_values(original, aggregated.as_ref(), strategy)
    }

    fn commit(&mut self, data: &mut Vec<Value>, id: Option<&K>) {
        tracing::debug!(id = ?id, "committing transactions");
        match id {
            Some(id) => {
                if let Some(state) = self.states.get(id) {
                    self.update_record(data, state);
                }
            }
            None => {
                for (_, state) in self.states.iter() {
                    self.update_record(data, state);
                }
            }
        }
        self.clear(id);
    }

    fn clear(&mut self, id: Option<&K>) {
        tracing::debug!(id = ?id, "clearing transactions");
        match id {
            Some(id) => {
                self.transactions.retain(|t| &t.id != id);
                self.states.remove(id);
                for batch in &mut self.undo_stack {
                    batch.retain(|action| &action.transaction.id != id);
                }
                self.undo_stack.retain(|batch| !batch.is_empty());
            }
            None => {
                self.transactions.clear();
                self.states.clear();
                self.undo_stack.clear();
            }
        }
        self.redo_stack.clear();
        Self::emit(&mut self.observer, TransactionEventOrigin::Clear, &[]);
    }

    fn start_pending(&mut self) {
        self.base.start_pending();
    }

    /// Leaves pending mode.
    ///
    /// With `commit`, every staged transaction is replayed into the committed state and the
    /// whole session becomes a single undo step. Each replayed action carries the original record
    /// of its staged state, falling back to the one it was staged with when that state no longer
    /// exists (an add that was deleted again).
    fn end_pending(&mut self, commit: bool) {
        if commit {
            let strategy = self.base.config.clone_strategy();
            let mut batch: Batch<K> = Batch::with_capacity(self.base.pending_actions.len());
            for Action {
                transaction,
                record_ref,
            } in self.base.pending_actions.drain(..)
            {
                let record_ref = self
                    .base
                    .pending
                    .get(&transaction.id)
                    .and_then(|s| s.record_ref.clone())
                    .or(record_ref);
                self.states.apply(&transaction, record_ref.as_ref(), strategy, true);
                self.transactions.push(transaction.clone());
                batch.push(Action {
                    transaction,
                    record_ref,
                });
            }

            if batch.is_empty() {
                tracing::debug!("pending session committed without transactions");
            } else {
                tracing::debug!(actions = batch.len(), "pending session committed");
                Self::emit(&mut self.observer, TransactionEventOrigin::End, &batch);
                self.undo_stack.push(batch);
                self.redo_stack.clear();
            }
        }
        self.base.end_pending(commit);
    }

    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn enabled(&self) -> bool {
        true
    }
}
