// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Value-level merging of record edits.
//!
//! Records are plain JSON values. An edit to an object record only carries the fields that
//! changed, so successive edits (and the original record) are folded together with a deep merge:
//!
//! ```json
//! original:  { "name": "Alice", "address": { "city": "Berlin", "zip": "10115" } }
//! edit:      { "address": { "city": "Munich" } }
//! merged:    { "name": "Alice", "address": { "city": "Munich", "zip": "10115" } }
//! ```
//!
//! Arrays are not merged element-wise; an array in the newer value replaces the older one.

use crate::clone_strategy::CloneStrategy;
use serde_json::{Map, Value};

/// Deep-merges `source` into `target`.
///
/// Nested objects present on both sides merge recursively; every other field of `source`
/// (primitives, arrays, `null`) overwrites the corresponding field of `target`. If either side is
/// not an object, `target` is left untouched.
pub fn merge_objects(target: &mut Value, source: &Value) {
    let (Value::Object(target), Value::Object(source)) = (target, source) else {
        return;
    };
    merge_maps(target, source);
}

fn merge_maps(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, incoming) in source {
        match (target.get_mut(key), incoming) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_maps(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), incoming.clone());
            }
        }
    }
}

/// Folds `second` on top of `first`, returning a new value.
///
/// * If either side is an object, the result is a clone of `first` (or an empty object when
///   `first` is not one) with `second` deep-merged in.
/// * Otherwise `second` wins unless it is absent or `null`, in which case `first` is returned.
pub fn merge_values(
    first: Option<&Value>,
    second: Option<&Value>,
    strategy: &dyn CloneStrategy,
) -> Option<Value> {
    let is_object = |v: Option<&Value>| v.is_some_and(Value::is_object);
    if is_object(first) || is_object(second) {
        let mut merged = match first {
            Some(first @ Value::Object(_)) => strategy.clone_value(first),
            _ => Value::Object(Map::new()),
        };
        if let Some(second) = second {
            merge_objects(&mut merged, second);
        }
        return Some(merged);
    }

    second.filter(|v| !v.is_null()).or(first).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clone_strategy::DefaultCloneStrategy;
    use serde_json::json;

    #[test]
    fn nested_objects_merge_recursively() {
        let mut target = json!({"name": "Alice", "address": {"city": "Berlin", "zip": "10115"}});
        merge_objects(&mut target, &json!({"address": {"city": "Munich"}}));
        assert_eq!(
            target,
            json!({"name": "Alice", "address": {"city": "Munich", "zip": "10115"}})
        );
    }

    #[test]
    fn arrays_are_replaced() {
        let mut target = json!({"tags": ["a", "b", "c"]});
        merge_objects(&mut target, &json!({"tags": ["z"]}));
        assert_eq!(target, json!({"tags": ["z"]}));
    }

    #[test]
    fn null_fields_overwrite() {
        let mut target = json!({"a": 1, "b": 2});
        merge_objects(&mut target, &json!({"a": null}));
        assert_eq!(target, json!({"a": null, "b": 2}));
    }

    #[test]
    fn non_object_source_is_ignored() {
        let mut target = json!({"a": 1});
        merge_objects(&mut target, &Value::Null);
        merge_objects(&mut target, &json!(5));
        assert_eq!(target, json!({"a": 1}));
    }

    #[test]
    fn merge_values_does_not_touch_inputs() {
        let first = json!({"a": 0, "b": 2});
        let second = json!({"a": 1});
        let merged = merge_values(Some(&first), Some(&second), &DefaultCloneStrategy);
        assert_eq!(merged, Some(json!({"a": 1, "b": 2})));
        assert_eq!(first, json!({"a": 0, "b": 2}));
    }

    #[test]
    fn merge_values_with_missing_sides() {
        let s = &DefaultCloneStrategy;
        assert_eq!(merge_values(None, None, s), None);
        assert_eq!(
            merge_values(None, Some(&json!({"x": 1})), s),
            Some(json!({"x": 1}))
        );
        assert_eq!(
            merge_values(Some(&json!({"x": 1})), None, s),
            Some(json!({"x": 1}))
        );
        assert_eq!(
            merge_values(Some(&json!({"x": 1})), Some(&Value::Null), s),
            Some(json!({"x": 1}))
        );
    }

    #[test]
    fn merge_values_primitives() {
        let s = &DefaultCloneStrategy;
        assert_eq!(
            merge_values(Some(&json!(1)), Some(&json!(2)), s),
            Some(json!(2))
        );
        assert_eq!(
            merge_values(Some(&json!(1)), Some(&Value::Null), s),
            Some(json!(1))
        );
        assert_eq!(merge_values(None, Some(&json!("x")), s), Some(json!("x")));
        // falsy but present values still win
        assert_eq!(
            merge_values(Some(&json!(true)), Some(&json!(false)), s),
            Some(json!(false))
        );
    }
}
