//! Frame-based metric collection keyed by sweep index.

use std::collections::{BTreeMap, BTreeSet};

use exu_core::errors::{ErrorInfo, ExuError};

use crate::sampler::Sampler;

/// Accumulates reduced metric frames keyed by `(name, sweep index)`.
///
/// The collector stores context (which sweep index is currently being
/// processed) and associates collected values with it. Each metric name is
/// routed through its configured reducer; names without configuration use a
/// per-name clone of the default reducer, silently. Switching the active
/// index flushes every reducer's residual into the old index first, so a
/// half-full window is never attributed to the wrong run.
///
/// One collector belongs to one worker processing one index at a time; it
/// holds per-process mutable state and is not synchronized.
#[derive(Debug, Clone)]
pub struct Collector {
    default: Sampler,
    ignored: BTreeSet<String>,
    samplers: BTreeMap<String, Sampler>,
    series: BTreeMap<String, BTreeMap<u64, Vec<f64>>>,
    idx: Option<u64>,
    names: BTreeSet<String>,
    indices: BTreeSet<u64>,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new(BTreeMap::new(), Sampler::identity())
    }
}

impl Collector {
    /// Creates a collector with per-name reducers and a default for
    /// everything else.
    pub fn new(config: BTreeMap<String, Sampler>, default: Sampler) -> Self {
        let mut ignored = BTreeSet::new();
        let mut samplers = BTreeMap::new();
        for (name, sampler) in config {
            if sampler.is_ignore() {
                ignored.insert(name);
            } else {
                samplers.insert(name, sampler);
            }
        }
        Self {
            default,
            ignored,
            samplers,
            series: BTreeMap::new(),
            idx: None,
            names: BTreeSet::new(),
            indices: BTreeSet::new(),
        }
    }

    /// Switches the active sweep index.
    ///
    /// When an index is already active this first performs the end-of-run
    /// flush: every reducer is asked for its residual and any non-empty
    /// value is appended to that name's series at the old index. The flush
    /// strictly precedes any collection under the new index.
    pub fn set_idx(&mut self, idx: u64) {
        if self.idx.is_some() {
            self.end_run();
        }
        self.indices.insert(idx);
        self.idx = Some(idx);
    }

    /// The currently active sweep index.
    pub fn current_idx(&self) -> Option<u64> {
        self.idx
    }

    /// Flushes reducer residuals into the active index without switching.
    ///
    /// Call once after the final run so trailing partial windows are not
    /// lost; reducers whose state persists across runs emit nothing.
    pub fn end_run(&mut self) {
        let Some(idx) = self.idx else { return };
        for (name, sampler) in self.samplers.iter_mut() {
            if let Some(residual) = sampler.end() {
                self.names.insert(name.clone());
                self.series
                    .entry(name.clone())
                    .or_default()
                    .entry(idx)
                    .or_default()
                    .push(residual);
            }
        }
    }

    /// Routes one observation through the name's reducer.
    ///
    /// Collecting under a name marked ignore is a silent no-op; collecting
    /// with no active index is an error.
    pub fn collect(&mut self, name: &str, value: f64) -> Result<(), ExuError> {
        if self.ignored.contains(name) {
            return Ok(());
        }
        let idx = self.require_idx()?;
        let sampler = self.sampler_for(name);
        if let Some(out) = sampler.next(value) {
            self.append(name, idx, out);
        }
        Ok(())
    }

    /// Routes a lazily-evaluated observation through the name's reducer.
    ///
    /// The closure runs only when the reducer actually samples this step,
    /// so expensive evaluation metrics are skipped on dropped steps.
    pub fn evaluate(&mut self, name: &str, f: impl FnOnce() -> f64) -> Result<(), ExuError> {
        if self.ignored.contains(name) {
            return Ok(());
        }
        let idx = self.require_idx()?;
        let sampler = self.sampler_for(name);
        if let Some(out) = sampler.next_eval(f) {
            self.append(name, idx, out);
        }
        Ok(())
    }

    /// Applies the same observation `times` times through the reducer's
    /// bulk path. Equivalent to `times` calls of [`collect`](Self::collect)
    /// but reducers may exploit the repetition to run in sublinear time.
    pub fn repeat(&mut self, name: &str, value: f64, times: usize) -> Result<(), ExuError> {
        if self.ignored.contains(name) {
            return Ok(());
        }
        let idx = self.require_idx()?;
        let sampler = self.sampler_for(name);
        let emitted = sampler.repeat(value, times);
        for out in emitted {
            self.append(name, idx, out);
        }
        Ok(())
    }

    /// Feeds each element of a slice through [`collect`](Self::collect),
    /// respecting the reducer state between elements.
    pub fn collect_list(&mut self, name: &str, values: &[f64]) -> Result<(), ExuError> {
        for value in values {
            self.collect(name, *value)?;
        }
        Ok(())
    }

    /// The stored series for one `(name, index)` pair, empty when nothing
    /// was recorded.
    pub fn get(&self, name: &str, idx: u64) -> &[f64] {
        self.series
            .get(name)
            .and_then(|by_idx| by_idx.get(&idx))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All stored series for a name, sorted by index.
    pub fn get_all(&self, name: &str) -> BTreeMap<u64, Vec<f64>> {
        self.series.get(name).cloned().unwrap_or_default()
    }

    /// The most recent frame recorded for a name at the active index.
    pub fn get_last(&self, name: &str) -> Option<f64> {
        let idx = self.idx?;
        self.get(name, idx).last().copied()
    }

    /// Names that have recorded at least one frame.
    pub fn keys(&self) -> &BTreeSet<String> {
        &self.names
    }

    /// Every index that has been made active.
    pub fn indices(&self) -> &BTreeSet<u64> {
        &self.indices
    }

    fn require_idx(&self) -> Result<u64, ExuError> {
        self.idx.ok_or_else(|| {
            ExuError::Collect(ErrorInfo::new(
                "collect-no-idx",
                "no active sweep index; call set_idx first",
            ))
        })
    }

    fn sampler_for(&mut self, name: &str) -> &mut Sampler {
        self.samplers
            .entry(name.to_string())
            .or_insert_with(|| self.default.clone())
    }

    fn append(&mut self, name: &str, idx: u64, value: f64) {
        self.names.insert(name.to_string());
        self.series
            .entry(name.to_string())
            .or_default()
            .entry(idx)
            .or_default()
            .push(value);
    }
}
