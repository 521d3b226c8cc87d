//! Missing-result detection over partially-complete sweeps.
//!
//! Jobs crash and clusters preempt; analysis code therefore asks which
//! results exist rather than assuming all of them do. Misses are reported,
//! never raised.

use std::path::Path;

use exu_core::errors::ExuError;
use exu_core::paths;
use exu_sweep::{list_indices, ExperimentDescription, Settings};

/// Every interpolated save path for `runs` cycles of the sweep.
pub fn list_result_paths(
    exp: &ExperimentDescription,
    settings: &Settings,
    runs: u64,
) -> Result<Vec<String>, ExuError> {
    list_indices(exp, runs)
        .map(|idx| exp.interpolate_save_path(idx, settings))
        .collect()
}

/// Save paths whose result directories do not exist under `base`.
pub fn list_missing_results(
    exp: &ExperimentDescription,
    settings: &Settings,
    base: &str,
    runs: u64,
) -> Result<Vec<String>, ExuError> {
    let mut missing = Vec::new();
    for idx in list_indices(exp, runs) {
        let path = exp.interpolate_save_path(idx, settings)?;
        let resolved = paths::join([base, &path]);
        if !Path::new(&resolved).exists() {
            missing.push(path);
        }
    }
    Ok(missing)
}

/// Task indices whose results are absent, the plain-data form consumed by
/// scheduler layers resubmitting failed jobs.
pub fn missing_indices(
    exp: &ExperimentDescription,
    settings: &Settings,
    base: &str,
    runs: u64,
) -> Result<Vec<u64>, ExuError> {
    let mut missing = Vec::new();
    for idx in list_indices(exp, runs) {
        let path = exp.interpolate_save_path(idx, settings)?;
        let resolved = paths::join([base, &path]);
        if !Path::new(&resolved).exists() {
            missing.push(idx);
        }
    }
    Ok(missing)
}
