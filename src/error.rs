// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Errors returned when a transaction sequence is illegal.
//!
//! These are contract violations by the caller (adding the same record twice, editing a record
//! that was already deleted, ...). They are reported immediately and leave the service untouched.

use thiserror::Error;

/// Result type alias for transaction operations.
pub type Result<T> = std::result::Result<T, TransactionError>;

/// Reasons a [`Transaction`](crate::Transaction) can be rejected.
///
/// The offending id is rendered with its `Debug` implementation so the error stays independent of
/// the id type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Cannot add entry with already existing transaction id {id}")]
    AlreadyAdded { id: String },

    #[error("Cannot add entry with already deleted transaction id {id}")]
    AlreadyDeleted { id: String },

    #[error("Cannot add entry with no record reference and no existing transaction with id {id}")]
    MissingRecordRef { id: String },
}

impl TransactionError {
    pub(crate) fn already_added(id: &impl std::fmt::Debug) -> Self {
        Self::AlreadyAdded {
            id: format!("{id:?}"),
        }
    }

    pub(crate) fn already_deleted(id: &impl std::fmt::Debug) -> Self {
        Self::AlreadyDeleted {
            id: format!("{id:?}"),
        }
    }

    pub(crate) fn missing_record_ref(id: &impl std::fmt::Debug) -> Self {
        Self::MissingRecordRef {
            id: format!("{id:?}"),
        }
    }

    /// The rendered id of the rejected transaction.
    pub fn id(&self) -> &str {
        match self {
            Self::AlreadyAdded { id }
            | Self::AlreadyDeleted { id }
            | Self::MissingRecordRef { id } => id,
        }
    }
}
