//! Nested record flattening
//!
//! Only string and integer leaves survive. Floats, booleans, nulls and arrays
//! are dropped so every output row stays a plain scalar.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::models::Scalar;

/// Flatten a JSON object into `dot.joined.path -> scalar`, sorted by path
///
/// `prefix` segments are prepended to every path. Non-object input yields an
/// empty map.
pub fn flatten(value: &Value, prefix: &[&str]) -> BTreeMap<String, Scalar> {
    let mut out = BTreeMap::new();
    if let Value::Object(map) = value {
        let mut path: Vec<&str> = prefix.to_vec();
        walk(map, &mut path, &mut out);
    }
    out
}

fn walk<'a>(map: &'a Map<String, Value>, path: &mut Vec<&'a str>, out: &mut BTreeMap<String, Scalar>) {
    for (key, value) in map {
        path.push(key);
        match value {
            Value::String(s) => {
                out.insert(path.join("."), Scalar::Str(s.clone()));
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    out.insert(path.join("."), Scalar::Int(i128::from(i)));
                } else if let Some(u) = n.as_u64() {
                    out.insert(path.join("."), Scalar::Int(i128::from(u)));
                }
            }
            Value::Object(inner) => walk(inner, path, out),
            Value::Bool(_) | Value::Array(_) | Value::Null => {}
        }
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_keeps_only_string_and_int_leaves() {
        let input = json!({"a": {"b": 1, "c": "x", "d": 1.5, "e": [1, 2]}});
        let flat = flatten(&input, &[]);

        let expected: BTreeMap<String, Scalar> = [
            ("a.b".to_string(), Scalar::Int(1)),
            ("a.c".to_string(), Scalar::from("x")),
        ]
        .into_iter()
        .collect();
        assert_eq!(flat, expected);
    }

    #[test]
    fn test_flatten_drops_bool_and_null() {
        let input = json!({"enabled": true, "tags": null, "name": "db1"});
        let flat = flatten(&input, &[]);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat["name"], Scalar::from("db1"));
    }

    #[test]
    fn test_flatten_with_prefix() {
        let input = json!({"properties": {"publicAccess": "None", "leaseState": "Available"}});
        let flat = flatten(&input, &["container", "logs"]);

        let keys: Vec<&str> = flat.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "container.logs.properties.leaseState",
                "container.logs.properties.publicAccess"
            ]
        );
    }

    #[test]
    fn test_flatten_deep_nesting_and_large_ints() {
        let input = json!({"a": {"b": {"c": {"d": u64::MAX}}}, "neg": -3});
        let flat = flatten(&input, &[]);
        assert_eq!(flat["a.b.c.d"], Scalar::Int(i128::from(u64::MAX)));
        assert_eq!(flat["neg"].to_string(), "-3");
    }

    #[test]
    fn test_flatten_non_object_is_empty() {
        assert!(flatten(&json!([1, 2, 3]), &["x"]).is_empty());
        assert!(flatten(&json!("scalar"), &[]).is_empty());
    }

    #[test]
    fn test_flatten_empty_nested_object_emits_nothing() {
        let flat = flatten(&json!({"tags": {}, "sku": {"name": "B1"}}), &[]);
        assert_eq!(flat.keys().collect::<Vec<_>>(), vec!["sku.name"]);
    }
}
