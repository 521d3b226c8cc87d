//! Mixed-radix bijection between sweep specifications and integer indices.
//!
//! A sweep specification is a nested tree whose leaves are either a scalar
//! or a list of candidate values. Flattening the tree in sorted-key order
//! produces the axis list; the same specification always yields the same
//! axis ordering, and that ordering defines which axis is the
//! fastest-varying digit when an index is decoded.

use serde_json::{json, Value};

use exu_core::errors::ExuError;
use exu_core::nested::set_at_path;

/// One `(path, candidate values)` pair extracted from a sweep specification.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatAxis {
    /// Dotted path addressing the swept leaf.
    pub path: String,
    /// Candidate values for this axis. May be empty (a degenerate axis).
    pub values: Vec<Value>,
}

/// Flattens a sweep specification into its ordered axis list.
///
/// Object keys are visited in sorted order. An array whose first element is
/// an object is recursed element-wise with synthesized `[i]` segments; an
/// array of scalars is a single axis; a bare scalar wraps as a length-1
/// axis. An empty array is an empty axis and degenerates to width 1.
pub fn flatten(spec: &Value) -> Vec<FlatAxis> {
    let mut out = Vec::new();
    walk(spec, String::new(), &mut out);
    out
}

fn walk(node: &Value, path: String, out: &mut Vec<FlatAxis>) {
    match node {
        Value::Array(items) => {
            if items.first().map(Value::is_object).unwrap_or(false) {
                for (i, sub) in items.iter().enumerate() {
                    walk(sub, format!("{path}.[{i}]"), out);
                }
                return;
            }
            out.push(FlatAxis {
                path,
                values: items.clone(),
            });
        }
        Value::Object(map) => {
            for (key, sub) in map {
                let next = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                walk(sub, next, out);
            }
        }
        scalar => out.push(FlatAxis {
            path,
            values: vec![scalar.clone()],
        }),
    }
}

/// Total number of distinct permutations of a sweep specification.
///
/// The product of `max(len, 1)` over all axes; 1 for an empty
/// specification, and empty axes contribute a factor of 1.
pub fn count_permutations(spec: &Value) -> u64 {
    flatten(spec)
        .iter()
        .map(|axis| axis.values.len().max(1) as u64)
        .product()
}

/// Decodes an index into one concrete value per axis.
///
/// Axis `k` selects `values[(idx / accum) % len]` where `accum` is the
/// running product of prior axis cardinalities, so indices beyond the
/// permutation count wrap around. An empty axis records an empty list and
/// leaves the radix untouched. Pure function of `(spec, idx)`.
pub fn decode(spec: &Value, idx: u64) -> Result<Value, ExuError> {
    let mut perm: Vec<(String, Value)> = Vec::new();
    let mut accum: u64 = 1;

    for axis in flatten(spec) {
        let num = axis.values.len() as u64;
        if num == 0 {
            // a swept parameter with no candidates comes back as an empty list
            perm.push((axis.path, json!([])));
            continue;
        }
        let value = axis.values[((idx / accum) % num) as usize].clone();
        perm.push((axis.path, value));
        accum *= num;
    }

    reconstruct(perm)
}

/// Reassembles `(path, value)` assignments into a nested tree.
pub fn reconstruct(assignments: Vec<(String, Value)>) -> Result<Value, ExuError> {
    let mut tree = json!({});
    for (path, value) in assignments {
        set_at_path(&mut tree, &path, value)?;
    }
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_leaves_wrap_as_width_one_axes() {
        let spec = json!({"gamma": 0.9, "alpha": [0.1, 0.2]});
        let axes = flatten(&spec);
        assert_eq!(axes.len(), 2);
        assert_eq!(axes[0].path, "alpha");
        assert_eq!(axes[0].values.len(), 2);
        assert_eq!(axes[1].path, "gamma");
        assert_eq!(axes[1].values, vec![json!(0.9)]);
        assert_eq!(count_permutations(&spec), 2);
    }

    #[test]
    fn object_lists_recurse_per_element() {
        let spec = json!({"layers": [{"units": [16, 32]}, {"units": [8]}]});
        let axes = flatten(&spec);
        let paths: Vec<&str> = axes.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["layers.[0].units", "layers.[1].units"]);
        assert_eq!(count_permutations(&spec), 2);
    }

    #[test]
    fn empty_axis_degenerates_to_one_permutation() {
        let spec = json!({"alpha": [], "beta": [1, 2]});
        assert_eq!(count_permutations(&spec), 2);
        let perm = decode(&spec, 0).unwrap();
        assert_eq!(perm, json!({"alpha": [], "beta": 1}));
    }

    #[test]
    fn empty_spec_has_one_permutation() {
        assert_eq!(count_permutations(&json!({})), 1);
        assert_eq!(decode(&json!({}), 0).unwrap(), json!({}));
    }
}
