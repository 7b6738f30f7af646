// (c) Copyright 2025 Helsing GmbH. All rights reserved.
/// Convenience macro for creating a [`Transaction`](crate::Transaction) from a JSON literal.
///
/// The value uses [`serde_json::json!`] syntax. Deletes don't need a value.
///
/// ```rust
/// # use txlog::{transaction, TransactionType};
/// let add = transaction!(1, add, { "name": "Alice", "age": 30 });
/// let update = transaction!(1, update, { "age": 31 });
/// let delete = transaction!(1, delete);
///
/// assert_eq!(add.kind, TransactionType::Add);
/// assert_eq!(update.new_value["age"], 31);
/// assert!(delete.new_value.is_null());
/// ```
#[macro_export]
macro_rules! transaction {
    ($id:expr, add, $($value:tt)+) => {
        $crate::Transaction::new(
            $id,
            $crate::TransactionType::Add,
            $crate::serde_json::json!($($value)+),
        )
    };
    ($id:expr, update, $($value:tt)+) => {
        $crate::Transaction::new(
            $id,
            $crate::TransactionType::Update,
            $crate::serde_json::json!($($value)+),
        )
    };
    ($id:expr, delete, $($value:tt)+) => {
        $crate::Transaction::new(
            $id,
            $crate::TransactionType::Delete,
            $crate::serde_json::json!($($value)+),
        )
    };
    ($id:expr, delete) => {
        $crate::Transaction::delete($id)
    };
}
