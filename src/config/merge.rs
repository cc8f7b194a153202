//! Selective deep merge of configuration trees.
//!
//! The delta always wins at leaves. Mappings are merged key by key so that
//! branches the delta does not mention survive untouched.

use serde_json::{Map, Value};

/// Merge `delta` into `base`, with `delta` taking precedence.
///
/// - If `base` is not a mapping, `delta` replaces it wholesale
/// - If both are mappings, shared keys are merged recursively, keys only in
///   `delta` are inserted and keys only in `base` are kept
/// - A mapping in `base` is replaced when `delta` is a scalar, array or null
///
/// # Example
/// ```
/// use serde_json::json;
/// use configuration_builder::config::selective_merge;
///
/// let base = json!({"a": {"b": 1, "c": 2}});
/// let delta = json!({"a": {"b": 9}});
/// assert_eq!(selective_merge(base, delta), json!({"a": {"b": 9, "c": 2}}));
/// ```
pub fn selective_merge(base: Value, delta: Value) -> Value {
    match (base, delta) {
        (Value::Object(base_map), Value::Object(delta_map)) => {
            Value::Object(merge_maps(base_map, delta_map))
        }
        (_, delta) => delta,
    }
}

/// [`selective_merge`] specialised to two mappings.
pub fn merge_maps(mut base: Map<String, Value>, delta: Map<String, Value>) -> Map<String, Value> {
    for (key, delta_value) in delta {
        let merged = match base.remove(&key) {
            Some(base_value) => selective_merge(base_value, delta_value),
            None => delta_value,
        };
        base.insert(key, merged);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_overrides_leaf_and_keeps_sibling() {
        let base = json!({"a": {"b": 1, "c": 2}});
        let delta = json!({"a": {"b": 9}});
        assert_eq!(selective_merge(base, delta), json!({"a": {"b": 9, "c": 2}}));
    }

    #[test]
    fn test_scalar_base_replaced_by_tree() {
        let base = json!({"a": 1});
        let delta = json!({"a": {"b": 2}});
        assert_eq!(selective_merge(base, delta), json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_tree_base_replaced_by_scalar() {
        let base = json!({"a": {"b": 2}});
        let delta = json!({"a": "flat"});
        assert_eq!(selective_merge(base, delta), json!({"a": "flat"}));
    }

    #[test]
    fn test_null_delta_replaces_leaf() {
        let base = json!({"a": 1, "b": 2});
        let delta = json!({"a": null});
        assert_eq!(selective_merge(base, delta), json!({"a": null, "b": 2}));
    }

    #[test]
    fn test_arrays_are_leaves() {
        let base = json!({"hosts": ["a", "b"]});
        let delta = json!({"hosts": ["c"]});
        assert_eq!(selective_merge(base, delta), json!({"hosts": ["c"]}));
    }

    #[test]
    fn test_new_keys_are_added() {
        let base = json!({"a": 1});
        let delta = json!({"b": {"c": 3}});
        assert_eq!(selective_merge(base, delta), json!({"a": 1, "b": {"c": 3}}));
    }

    #[test]
    fn test_deep_nested_merge() {
        let base = json!({"l1": {"l2": {"l3": {"a": 1, "b": 2}}, "keep": true}});
        let delta = json!({"l1": {"l2": {"l3": {"b": 3, "c": 4}}}});
        assert_eq!(
            selective_merge(base, delta),
            json!({"l1": {"l2": {"l3": {"a": 1, "b": 3, "c": 4}}, "keep": true}})
        );
    }

    #[test]
    fn test_merge_is_not_commutative() {
        let a = json!({"x": 1});
        let b = json!({"x": 2});
        assert_eq!(selective_merge(a.clone(), b.clone()), json!({"x": 2}));
        assert_eq!(selective_merge(b, a), json!({"x": 1}));
    }

    #[test]
    fn test_merging_same_delta_twice_is_idempotent() {
        let tree = json!({"a": {"b": 1, "c": 2}, "d": "x"});
        let delta = json!({"a": {"b": 5, "e": {"f": 6}}});
        let once = selective_merge(tree, delta.clone());
        let twice = selective_merge(once.clone(), delta);
        assert_eq!(once, twice);
    }
}
