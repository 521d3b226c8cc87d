//! Task-index enumeration for external scheduler layers.

use std::ops::Range;

use crate::experiment::ExperimentDescription;

/// Iterates the permutation indices of an experiment, cycling the full
/// permutation space once per run.
///
/// The run number of each yielded index is `idx / num_permutations`, so
/// `runs = 2` yields every parameter setting twice with run numbers 0 and 1.
pub fn list_indices(exp: &ExperimentDescription, runs: u64) -> Range<u64> {
    0..exp.num_permutations() * runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cycles_once_per_run() {
        let doc = json!({"metaParameters": {"alpha": [0.1, 0.2], "beta": [1, 2]}});
        let exp = ExperimentDescription::new(doc, None).unwrap();
        let indices: Vec<u64> = list_indices(&exp, 2).collect();
        assert_eq!(indices.len(), 8);
        assert_eq!(exp.get_run(indices[3]), 0);
        assert_eq!(exp.get_run(indices[4]), 1);
    }
}
