// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use crate::{Transaction, TransactionType};
use quickcheck::{Arbitrary, Gen};
use serde_json::{Map, Value, json};

/// A random edit against a small, fixed table of records.
///
/// Ids and field values are drawn from tiny ranges so that sequences hit the same record
/// repeatedly and regularly set fields back to their original value.
#[derive(Clone, Debug)]
pub(crate) struct Edit {
    pub id: u8,
    pub kind: TransactionType,
    pub field: &'static str,
    pub value: u8,
}

impl Edit {
    /// The original record with the given id, as the data source would hold it.
    pub fn record(id: u8) -> Value {
        json!({"id": id, "a": 0, "b": 0})
    }

    pub fn transaction(&self) -> Transaction<u8> {
        let mut fields = Map::new();
        fields.insert(self.field.to_string(), Value::from(self.value));
        match self.kind {
            TransactionType::Add => {
                fields.insert("id".to_string(), Value::from(self.id));
                Transaction::add(self.id, Value::Object(fields))
            }
            TransactionType::Update => Transaction::update(self.id, Value::Object(fields)),
            TransactionType::Delete => Transaction::delete(self.id),
        }
    }

    pub fn record_ref(&self) -> Option<Value> {
        match self.kind {
            TransactionType::Add => None,
            _ => Some(Self::record(self.id)),
        }
    }
}

impl Arbitrary for Edit {
    fn arbitrary(g: &mut Gen) -> Self {
        Self {
            id: *g.choose(&[0, 1, 2, 3]).unwrap(),
            kind: TransactionType::arbitrary(g),
            field: *g.choose(&["a", "b"]).unwrap(),
            value: *g.choose(&[0, 1, 2]).unwrap(),
        }
    }
}
