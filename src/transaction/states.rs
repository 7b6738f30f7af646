// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The per-record state map and the rules for folding transactions into it.

use super::{State, Transaction, TransactionType};
use crate::{
    clone_strategy::CloneStrategy,
    error::{Result, TransactionError},
    merge::{merge_objects, merge_values},
};
use indexmap::IndexMap;
use serde_json::Value;
use std::{fmt, hash::Hash};

/// Insertion-ordered map from record id to its aggregated [`State`].
///
/// Iteration yields records in the order they were first touched; removing a record keeps the
/// relative order of the rest.
#[derive(Clone)]
pub struct StateMap<K> {
    entries: IndexMap<K, State, ahash::RandomState>,
}

impl<K> Default for StateMap<K> {
    fn default() -> Self {
        Self {
            entries: IndexMap::with_hasher(ahash::RandomState::new()),
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for StateMap<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<K> PartialEq for StateMap<K>
where
    K: Hash + Eq,
{
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K> StateMap<K>
where
    K: Hash + Eq + fmt::Debug + Clone,
{
    pub fn get(&self, id: &K) -> Option<&State> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &K) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &State)> {
        self.entries.iter()
    }

    pub(crate) fn remove(&mut self, id: &K) -> Option<State> {
        self.entries.shift_remove(id)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Checks that `transaction` may be folded into this map.
    ///
    /// A first edit to an existing record needs a `record_ref` snapshot, unless the edit is only
    /// staged (`pending`).
    pub(crate) fn verify(
        &self,
        transaction: &Transaction<K>,
        record_ref: Option<&Value>,
        pending: bool,
    ) -> Result<()> {
        let state = self.entries.get(&transaction.id);
        match transaction.kind {
            TransactionType::Add => {
                if state.is_some() {
                    return Err(TransactionError::already_added(&transaction.id));
                }
            }
            TransactionType::Delete | TransactionType::Update => {
                if state.is_some_and(|s| s.kind == TransactionType::Delete) {
                    return Err(TransactionError::already_deleted(&transaction.id));
                }
                if state.is_none() && record_ref.is_none() && !pending {
                    return Err(TransactionError::missing_record_ref(&transaction.id));
                }
            }
        }
        Ok(())
    }

    /// Folds `transaction` into the state of its record.
    ///
    /// * delete after add drops the state, delete after update turns it into a delete
    /// * update merges into an object value (in place for updates, into a fresh object for adds)
    ///   and overwrites a primitive one
    /// * without an existing state, a fresh one is created from a copy of the new value
    ///
    /// With `clean` set, fields that ended up equal to the original record are dropped again
    /// afterwards, see [`StateMap::clean`].
    pub(crate) fn apply(
        &mut self,
        transaction: &Transaction<K>,
        record_ref: Option<&Value>,
        strategy: &dyn CloneStrategy,
        clean: bool,
    ) {
        let id = &transaction.id;
        let mut collapsed = false;
        match self.entries.get_mut(id) {
            Some(state) => match transaction.kind {
                TransactionType::Delete => match state.kind {
                    TransactionType::Add => collapsed = true,
                    TransactionType::Update => {
                        state.value = transaction.new_value.clone();
                        state.kind = TransactionType::Delete;
                    }
                    TransactionType::Delete => {}
                },
                TransactionType::Update => {
                    if state.value.is_object() {
                        match state.kind {
                            TransactionType::Add => {
                                if let Some(merged) = merge_values(
                                    Some(&state.value),
                                    Some(&transaction.new_value),
                                    strategy,
                                ) {
                                    state.value = merged;
                                }
                            }
                            TransactionType::Update => {
                                merge_objects(&mut state.value, &transaction.new_value);
                            }
                            TransactionType::Delete => {}
                        }
                    } else {
                        state.value = transaction.new_value.clone();
                    }
                }
                // rejected by `verify`; a second add never merges
                TransactionType::Add => {}
            },
            None => {
                self.entries.insert(
                    id.clone(),
                    State {
                        value: strategy.clone_value(&transaction.new_value),
                        record_ref: record_ref.cloned(),
                        kind: transaction.kind,
                    },
                );
            }
        }

        if collapsed {
            tracing::trace!(?id, "added record deleted again, dropping state");
            self.entries.shift_remove(id);
            return;
        }

        if clean {
            self.clean(id);
        }
    }

    /// Folds `transaction` in without any type rules: objects merge, everything else overwrites.
    ///
    /// This is all a service without a transaction log does.
    pub(crate) fn apply_plain(
        &mut self,
        transaction: &Transaction<K>,
        record_ref: Option<&Value>,
        strategy: &dyn CloneStrategy,
    ) {
        match self.entries.get_mut(&transaction.id) {
            Some(state) if state.value.is_object() => {
                merge_objects(&mut state.value, &transaction.new_value);
            }
            Some(state) => state.value = transaction.new_value.clone(),
            None => {
                self.entries.insert(
                    transaction.id.clone(),
                    State {
                        value: strategy.clone_value(&transaction.new_value),
                        record_ref: record_ref.cloned(),
                        kind: transaction.kind,
                    },
                );
            }
        }
    }

    /// Removes the parts of a state that no longer differ from the original record.
    ///
    /// Object fields equal to the corresponding `record_ref` field are dropped; once nothing is
    /// left, the whole state goes (deletes are kept). A primitive value equal to its primitive
    /// `record_ref` also removes the state. States without a value or without a `record_ref` are
    /// left alone.
    ///
    /// Equality is structural, so field order never matters.
    pub(crate) fn clean(&mut self, id: &K) {
        let Some(State {
            value,
            record_ref: Some(record_ref),
            kind,
        }) = self.entries.get_mut(id)
        else {
            return;
        };
        if value.is_null() {
            return;
        }

        let unchanged = match (record_ref, value) {
            (Value::Object(original), Value::Object(fields)) => {
                fields.retain(|key, field| original.get(key) != Some(&*field));
                *kind != TransactionType::Delete && fields.is_empty()
            }
            (record_ref, value) => record_ref == value,
        };

        if unchanged {
            tracing::trace!(?id, "edit no longer differs from the record, dropping state");
            self.entries.shift_remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clone_strategy::DefaultCloneStrategy;
    use serde_json::json;

    fn apply(states: &mut StateMap<u32>, tx: Transaction<u32>, record_ref: Option<Value>) {
        states
            .verify(&tx, record_ref.as_ref(), false)
            .expect("legal transaction");
        states.apply(&tx, record_ref.as_ref(), &DefaultCloneStrategy, true);
    }

    #[test]
    fn add_then_delete_collapses() {
        let mut states = StateMap::default();
        apply(&mut states, Transaction::add(1, json!({"x": 1})), None);
        assert!(states.contains(&1));
        apply(&mut states, Transaction::delete(1), None);
        assert!(states.is_empty());
    }

    #[test]
    fn update_then_delete_becomes_delete() {
        let mut states = StateMap::default();
        let record = json!({"a": 0, "b": 2});
        apply(&mut states, Transaction::update(1, json!({"a": 1})), Some(record));
        apply(&mut states, Transaction::delete(1), None);
        let state = states.get(&1).unwrap();
        assert_eq!(state.kind, TransactionType::Delete);
        assert_eq!(state.value, Value::Null);
    }

    #[test]
    fn updates_merge_latest_wins() {
        let mut states = StateMap::default();
        let record = json!({"a": 0, "b": 0, "c": 0});
        apply(
            &mut states,
            Transaction::update(1, json!({"a": 1, "b": 1})),
            Some(record),
        );
        apply(&mut states, Transaction::update(1, json!({"b": 2, "c": 2})), None);
        assert_eq!(states.get(&1).unwrap().value, json!({"a": 1, "b": 2, "c": 2}));
    }

    #[test]
    fn update_onto_add_merges() {
        let mut states = StateMap::default();
        apply(&mut states, Transaction::add(1, json!({"x": 1, "y": 1})), None);
        apply(&mut states, Transaction::update(1, json!({"y": 2})), None);
        let state = states.get(&1).unwrap();
        assert_eq!(state.kind, TransactionType::Add);
        assert_eq!(state.value, json!({"x": 1, "y": 2}));
    }

    #[test]
    fn primitive_update_overwrites() {
        let mut states = StateMap::default();
        apply(&mut states, Transaction::update(1, json!(5)), Some(json!(3)));
        apply(&mut states, Transaction::update(1, json!(6)), None);
        assert_eq!(states.get(&1).unwrap().value, json!(6));
    }

    #[test]
    fn reverting_fields_cleans_state() {
        let mut states = StateMap::default();
        let record = json!({"a": 0, "b": 2});
        apply(&mut states, Transaction::update(1, json!({"a": 1, "b": 3})), Some(record));
        apply(&mut states, Transaction::update(1, json!({"b": 2})), None);
        assert_eq!(states.get(&1).unwrap().value, json!({"a": 1}));
        apply(&mut states, Transaction::update(1, json!({"a": 0})), None);
        assert!(states.get(&1).is_none());
    }

    #[test]
    fn no_op_first_update_leaves_no_state() {
        let mut states = StateMap::default();
        apply(
            &mut states,
            Transaction::update(1, json!({"a": 0})),
            Some(json!({"a": 0, "b": 2})),
        );
        assert!(states.is_empty());
    }

    #[test]
    fn primitive_revert_cleans_state() {
        let mut states = StateMap::default();
        apply(&mut states, Transaction::update(1, json!("new")), Some(json!("old")));
        assert!(states.contains(&1));
        apply(&mut states, Transaction::update(1, json!("old")), None);
        assert!(!states.contains(&1));
    }

    #[test]
    fn delete_with_object_value_is_kept_when_emptied() {
        let mut states = StateMap::default();
        apply(
            &mut states,
            Transaction::new(1, TransactionType::Delete, json!({"a": 0})),
            Some(json!({"a": 0})),
        );
        let state = states.get(&1).unwrap();
        assert_eq!(state.kind, TransactionType::Delete);
        assert_eq!(state.value, json!({}));
    }

    #[test]
    fn verify_rules() {
        let mut states = StateMap::default();
        apply(&mut states, Transaction::add(1, json!({})), None);
        assert_eq!(
            states.verify(&Transaction::add(1, json!({})), None, false),
            Err(TransactionError::already_added(&1))
        );

        apply(&mut states, Transaction::delete(2), Some(json!({"a": 1})));
        assert_eq!(
            states.verify(&Transaction::update(2, json!({})), None, false),
            Err(TransactionError::already_deleted(&2))
        );
        assert_eq!(
            states.verify(&Transaction::delete(2), Some(&json!({})), true),
            Err(TransactionError::already_deleted(&2))
        );

        assert_eq!(
            states.verify(&Transaction::update(3, json!({})), None, false),
            Err(TransactionError::missing_record_ref(&3))
        );
        assert_eq!(
            states.verify(&Transaction::update(3, json!({})), None, true),
            Ok(())
        );
    }

    #[test]
    fn order_follows_first_touch() {
        let mut states = StateMap::default();
        for id in [3, 1, 2] {
            apply(&mut states, Transaction::add(id, json!({"id": id})), None);
        }
        apply(&mut states, Transaction::delete(1), None);
        let ids: Vec<_> = states.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn plain_apply_has_no_type_rules() {
        let mut states = StateMap::default();
        let s = &DefaultCloneStrategy;
        states.apply_plain(&Transaction::add(1, json!({"a": 1})), None, s);
        states.apply_plain(&Transaction::add(1, json!({"b": 2})), None, s);
        states.apply_plain(&Transaction::delete(1), None, s);
        let state = states.get(&1).unwrap();
        assert_eq!(state.kind, TransactionType::Add);
        assert_eq!(state.value, json!({"a": 1, "b": 2}));
    }
}
