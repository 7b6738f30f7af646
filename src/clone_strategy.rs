// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Pluggable cloning of incoming values.
//!
//! When a transaction creates a fresh [`State`](crate::State), its value is copied out of the
//! transaction through a [`CloneStrategy`]. The default deep-copies the value; custom strategies
//! can normalise records on the way in (for example by stripping client-side bookkeeping fields).

use serde_json::Value;
use std::fmt;

/// Produces the copy of a value that a service stores.
pub trait CloneStrategy: fmt::Debug + Send + Sync {
    fn clone_value(&self, value: &Value) -> Value;
}

/// Deep-copies the value as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCloneStrategy;

impl CloneStrategy for DefaultCloneStrategy {
    fn clone_value(&self, value: &Value) -> Value {
        value.clone()
    }
}
