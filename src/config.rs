// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Construction-time configuration of transaction services.

use crate::{
    clone_strategy::{CloneStrategy, DefaultCloneStrategy},
    transaction::{BaseTransactionService, TransactionService, Transactions},
};
use std::{fmt, hash::Hash, sync::Arc};

/// Settings shared by all transaction services.
///
/// Cloning a config is cheap; services built from clones share the same clone strategy.
#[derive(Debug, Clone)]
pub struct TransactionConfig {
    clone_strategy: Arc<dyn CloneStrategy>,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            clone_strategy: Arc::new(DefaultCloneStrategy),
        }
    }
}

impl TransactionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the strategy used to copy incoming values into fresh states.
    pub fn with_clone_strategy(mut self, strategy: impl CloneStrategy + 'static) -> Self {
        self.clone_strategy = Arc::new(strategy);
        self
    }

    pub fn clone_strategy(&self) -> &dyn CloneStrategy {
        self.clone_strategy.as_ref()
    }
}

/// Which transaction service a consumer should use.
///
/// Consumers that apply edits immediately only need [`ServiceKind::Base`]; consumers that batch
/// edits and offer undo/redo want [`ServiceKind::Logged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ServiceKind {
    /// [`BaseTransactionService`]: pending mode only, no history.
    #[default]
    Base,
    /// [`TransactionService`]: transaction log with undo/redo.
    Logged,
}

/// Builds the service selected by `kind`.
///
/// ```
/// use txlog::{ServiceKind, Transaction, TransactionConfig, Transactions, create_service};
/// use serde_json::json;
///
/// let mut service = create_service::<u32>(ServiceKind::Logged, TransactionConfig::default());
/// service.add(Transaction::add(1, json!({"x": 1})), None)?;
/// assert!(service.can_undo());
/// # Ok::<(), txlog::TransactionError>(())
/// ```
pub fn create_service<K>(kind: ServiceKind, config: TransactionConfig) -> Box<dyn Transactions<K>>
where
    K: Hash + Eq + fmt::Debug + Clone + 'static,
{
    tracing::debug!(?kind, "creating transaction service");
    match kind {
        ServiceKind::Base => Box::new(BaseTransactionService::with_config(config)),
        ServiceKind::Logged => Box::new(TransactionService::with_config(config)),
    }
}
