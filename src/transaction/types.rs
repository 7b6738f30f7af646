use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;

/// The kind of edit a [`Transaction`] requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TransactionType {
    Add,
    Delete,
    Update,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Delete => "delete",
            Self::Update => "update",
        })
    }
}

/// One discrete edit request against the record identified by `id`.
///
/// For [`TransactionType::Update`], `new_value` only needs to carry the changed fields of an
/// object record. Deletes usually carry [`Value::Null`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Transaction<K> {
    pub id: K,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: TransactionType,
    pub new_value: Value,
}

impl<K> Transaction<K> {
    pub fn new(id: K, kind: TransactionType, new_value: Value) -> Self {
        Self {
            id,
            kind,
            new_value,
        }
    }

    pub fn add(id: K, value: Value) -> Self {
        Self::new(id, TransactionType::Add, value)
    }

    pub fn update(id: K, value: Value) -> Self {
        Self::new(id, TransactionType::Update, value)
    }

    pub fn delete(id: K) -> Self {
        Self::new(id, TransactionType::Delete, Value::Null)
    }
}

/// The aggregated pending change for a single record.
///
/// `value` is everything merged so far, `record_ref` the snapshot of the original record (absent
/// for records that were added), and `kind` the dominant operation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct State {
    pub value: Value,
    pub record_ref: Option<Value>,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: TransactionType,
}

/// An applied transaction together with the original record it was applied against.
///
/// Actions are what the undo and redo stacks hold; replaying them rebuilds the state map.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Action<K> {
    pub transaction: Transaction<K>,
    pub record_ref: Option<Value>,
}

/// The actions of one undo step.
///
/// Almost every step is a single `add`, so one action is stored inline.
pub type Batch<K> = SmallVec<[Action<K>; 1]>;

/// What caused a [`StateUpdateEvent`](crate::observer::StateUpdateEvent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionEventOrigin {
    /// A transaction was added outside of pending mode.
    Add,
    /// Transactions (and possibly state) were cleared, including after a commit.
    Clear,
    /// Pending mode ended and its transactions were flushed.
    End,
    Redo,
    Undo,
}

#[cfg(any(test, feature = "arbitrary"))]
impl quickcheck::Arbitrary for TransactionType {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        // updates are what exercise the merge rules, so skew towards them
        *g.choose(&[Self::Add, Self::Delete, Self::Update, Self::Update])
            .expect("non-empty choices")
    }
}
