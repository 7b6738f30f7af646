// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Observe changes to a [`TransactionService`](crate::TransactionService).
//!
//! Observers are called synchronously after every operation that changes what a consumer would
//! render: adding a transaction, flushing pending transactions, undo, redo and clearing. A grid
//! would use this to refresh the rows that carry pending edits; it is equally useful for logging
//! or for tests.
//!
//! Implement [`StateObserver`] and pass it to
//! [`TransactionService::with_observer`](crate::TransactionService::with_observer).

use crate::transaction::{Action, TransactionEventOrigin};
use std::fmt::Debug;

/// A notification that the aggregated state changed.
#[derive(Debug, Clone, Copy)]
pub struct StateUpdateEvent<'a, K> {
    pub origin: TransactionEventOrigin,
    /// The actions that were applied, undone or redone. Empty for [`TransactionEventOrigin::Clear`].
    pub actions: &'a [Action<K>],
}

/// Receives [`StateUpdateEvent`]s.
#[expect(unused_variables)]
pub trait StateObserver<K> {
    fn state_updated(&mut self, event: StateUpdateEvent<'_, K>) {}
}

/// An observer that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummyObserver;

impl<K> StateObserver<K> for DummyObserver {}

/// An observer that records every event in a human readable form.
///
/// This is mostly useful for tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    /// One line per event, e.g. `Add [update 1]`.
    pub events_seen: Vec<String>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K: Debug> StateObserver<K> for RecordingObserver {
    fn state_updated(&mut self, event: StateUpdateEvent<'_, K>) {
        let actions: Vec<_> = event
            .actions
            .iter()
            .map(|a| format!("{} {:?}", a.transaction.kind, a.transaction.id))
            .collect();
        self.events_seen
            .push(format!("{:?} [{}]", event.origin, actions.join(", ")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Transaction;
    use serde_json::json;

    #[test]
    fn recording_observer_formats_events() {
        let mut observer = RecordingObserver::new();
        let actions = [
            Action {
                transaction: Transaction::update(1, json!({"a": 1})),
                record_ref: Some(json!({"a": 0})),
            },
            Action {
                transaction: Transaction::delete(2),
                record_ref: Some(json!({})),
            },
        ];
        observer.state_updated(StateUpdateEvent {
            origin: TransactionEventOrigin::End,
            actions: &actions,
        });
        observer.state_updated(StateUpdateEvent::<u32> {
            origin: TransactionEventOrigin::Clear,
            actions: &[],
        });
        assert_eq!(
            observer.events_seen,
            vec!["End [update 1, delete 2]".to_string(), "Clear []".to_string()]
        );
    }
}
