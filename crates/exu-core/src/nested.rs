//! Dotted-path access over nested [`serde_json::Value`] trees.
//!
//! Paths separate mapping levels with `.` and address array elements with
//! `[i]` segments, e.g. `optimizer.layers.[0].units`. Traversal order over
//! objects is always sorted by key (the `serde_json` object representation
//! guarantees it), which makes flattening reproducible; the permutation
//! engine relies on that ordering for its digit assignment.

use serde_json::{Map, Value};

use crate::errors::{ErrorInfo, ExuError};

/// One segment of a dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPart {
    /// A mapping key segment.
    Key(String),
    /// A `[i]` array index segment.
    Index(usize),
}

/// Parses a dotted path into its segments.
pub fn parse_path(path: &str) -> Result<Vec<PathPart>, ExuError> {
    let mut parts = Vec::new();
    for segment in path.split('.') {
        if segment.starts_with('[') {
            let digits: String = segment
                .chars()
                .filter(|c| *c != '[' && *c != ']' && *c != ',')
                .collect();
            let idx = digits.parse::<usize>().map_err(|err| {
                ExuError::Sweep(
                    ErrorInfo::new("path-bad-index", "malformed array index segment")
                        .with_context("segment", segment.to_string())
                        .with_context("path", path.to_string())
                        .with_hint(err.to_string()),
                )
            })?;
            parts.push(PathPart::Index(idx));
        } else {
            parts.push(PathPart::Key(segment.to_string()));
        }
    }
    Ok(parts)
}

/// Resolves a dotted path against a tree.
///
/// Missing intermediate keys, out-of-range indices, and malformed paths all
/// yield `None`; callers substitute their own defaults.
pub fn get<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    let parts = parse_path(path).ok()?;
    let mut node = tree;
    for part in &parts {
        node = match part {
            PathPart::Key(key) => node.as_object()?.get(key)?,
            PathPart::Index(idx) => node.as_array()?.get(*idx)?,
        };
    }
    Some(node)
}

/// Writes a value at a dotted path, creating intermediate nodes on demand.
///
/// Index segments overwrite in place when the index already exists and
/// append a fresh element otherwise. A scalar already present at the final
/// key segment is left untouched (first write wins), matching how decoded
/// permutations are reassembled from non-colliding axis paths.
pub fn set_at_path(tree: &mut Value, path: &str, value: Value) -> Result<(), ExuError> {
    if path.is_empty() {
        return Ok(());
    }
    let parts = parse_path(path)?;
    assign(tree, &parts, value, path)
}

fn assign(node: &mut Value, parts: &[PathPart], value: Value, full: &str) -> Result<(), ExuError> {
    match &parts[0] {
        PathPart::Key(key) => {
            let map = as_object_mut(node, full)?;
            if parts.len() == 1 {
                map.entry(key.clone()).or_insert(value);
                return Ok(());
            }
            let child = match parts[1] {
                PathPart::Index(_) => map.entry(key.clone()).or_insert_with(|| Value::Array(vec![])),
                PathPart::Key(_) => {
                    map.entry(key.clone()).or_insert_with(|| Value::Object(Map::new()))
                }
            };
            assign(child, &parts[1..], value, full)
        }
        PathPart::Index(idx) => {
            let arr = as_array_mut(node, full)?;
            if *idx < arr.len() {
                if parts.len() == 1 {
                    arr[*idx] = value;
                    return Ok(());
                }
                assign(&mut arr[*idx], &parts[1..], value, full)
            } else {
                if parts.len() == 1 {
                    arr.push(value);
                    return Ok(());
                }
                arr.push(Value::Object(Map::new()));
                let last = arr.len() - 1;
                assign(&mut arr[last], &parts[1..], value, full)
            }
        }
    }
}

fn as_object_mut<'a>(
    node: &'a mut Value,
    full: &str,
) -> Result<&'a mut Map<String, Value>, ExuError> {
    if node.is_null() {
        *node = Value::Object(Map::new());
    }
    node.as_object_mut().ok_or_else(|| {
        ExuError::Sweep(
            ErrorInfo::new("path-not-object", "expected a mapping at path segment")
                .with_context("path", full.to_string()),
        )
    })
}

fn as_array_mut<'a>(node: &'a mut Value, full: &str) -> Result<&'a mut Vec<Value>, ExuError> {
    node.as_array_mut().ok_or_else(|| {
        ExuError::Sweep(
            ErrorInfo::new("path-not-array", "expected an array at path segment")
                .with_context("path", full.to_string()),
        )
    })
}

/// Flattens a tree into `(path, leaf value)` pairs.
///
/// Objects are visited in sorted key order, arrays whose first element is
/// an object are recursed element-wise with synthesized `[i]` segments, and
/// arrays of scalars are themselves leaves. The ordering is identical to
/// the permutation engine's axis ordering.
pub fn flatten_values(tree: &Value) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    walk(tree, String::new(), &mut out);
    out
}

/// Lists the leaf paths of a tree in deterministic traversal order.
pub fn flatten_keys(tree: &Value) -> Vec<String> {
    flatten_values(tree).into_iter().map(|(p, _)| p).collect()
}

fn walk(node: &Value, path: String, out: &mut Vec<(String, Value)>) {
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                let next = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                walk(child, next, out);
            }
        }
        Value::Array(items) => {
            if items.first().map(Value::is_object).unwrap_or(false) {
                for (i, child) in items.iter().enumerate() {
                    walk(child, format!("{path}.[{i}]"), out);
                }
            } else {
                out.push((path, node.clone()));
            }
        }
        _ => out.push((path, node.clone())),
    }
}

/// Renders a tree as a sorted `key-value` string joined with `_`.
///
/// Two structurally equal trees always stringify identically, which is what
/// makes interpolated save paths unique per parameter setting.
pub fn hyphenated_stringify(tree: &Value) -> String {
    let mut pairs = flatten_values(tree);
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
        .iter()
        .map(|(path, value)| format!("{path}-{}", format_scalar(value)))
        .collect::<Vec<_>>()
        .join("_")
}

/// Renders a leaf value for use inside paths and parameter strings.
///
/// Strings render bare (no quotes); everything else renders as compact JSON.
pub fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_then_get_roundtrip() {
        let mut tree = json!({});
        set_at_path(&mut tree, "optimizer.layers.[0].units", json!(64)).unwrap();
        set_at_path(&mut tree, "optimizer.layers.[1].units", json!(32)).unwrap();
        set_at_path(&mut tree, "optimizer.lr", json!(0.01)).unwrap();

        assert_eq!(get(&tree, "optimizer.layers.[0].units"), Some(&json!(64)));
        assert_eq!(get(&tree, "optimizer.layers.[1].units"), Some(&json!(32)));
        assert_eq!(get(&tree, "optimizer.lr"), Some(&json!(0.01)));
        assert_eq!(get(&tree, "optimizer.momentum"), None);
    }

    #[test]
    fn flatten_keys_contains_written_path() {
        let mut tree = json!({});
        set_at_path(&mut tree, "a.b.[0].c", json!(1)).unwrap();
        let keys = flatten_keys(&tree);
        assert!(keys.contains(&"a.b.[0].c".to_string()));
    }

    #[test]
    fn flatten_orders_keys_lexically() {
        let tree = json!({"lambda": 0.99, "alpha": 0.5});
        let keys = flatten_keys(&tree);
        assert_eq!(keys, vec!["alpha", "lambda"]);
    }

    #[test]
    fn stringify_is_stable_and_sorted() {
        let tree = json!({"lambda": 1.0, "alpha": 0.5, "agent": "sarsa"});
        assert_eq!(
            hyphenated_stringify(&tree),
            "agent-sarsa_alpha-0.5_lambda-1.0"
        );
    }

    #[test]
    fn stringify_flattens_nested_trees() {
        let tree = json!({"opt": {"lr": 0.1, "decay": 0.9}});
        assert_eq!(hyphenated_stringify(&tree), "opt.decay-0.9_opt.lr-0.1");
    }

    #[test]
    fn empty_array_is_a_leaf() {
        let tree = json!({"axis": []});
        let pairs = flatten_values(&tree);
        assert_eq!(pairs, vec![("axis".to_string(), json!([]))]);
    }
}
