//! Filesystem context: resolving logical save paths against a base
//! directory and creating or tearing down result trees.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use exu_core::errors::{ErrorInfo, ExuError};
use exu_core::paths;
use exu_sweep::{ExperimentDescription, Settings};

/// Resolves logical save paths for one experiment's results.
///
/// The context pairs a logical save path (typically produced by template
/// interpolation) with a base directory. An optional process-scoped
/// temporary root redirects resolution under `tmp/<pid>` so concurrent
/// workers can stage results without touching the shared tree; the logical
/// path itself never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSystemContext {
    path: String,
    base: String,
    temp_root: Option<String>,
}

impl FileSystemContext {
    /// Creates a context for a logical path under a base directory.
    pub fn new(path: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            base: base.into(),
            temp_root: None,
        }
    }

    /// Stages all resolution under `tmp_root/<pid>`.
    pub fn with_temp(mut self, tmp_root: impl Into<String>) -> Self {
        self.temp_root = Some(tmp_root.into());
        self
    }

    /// The base directory.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The logical save path.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn effective_base(&self) -> String {
        match &self.temp_root {
            Some(root) => paths::join([root.as_str(), &process::id().to_string(), &self.base]),
            None => self.base.clone(),
        }
    }

    /// Resolves a sub-path against the context.
    ///
    /// A sub-path that already repeats the resolved base has the duplicate
    /// prefix stripped; leading `../` segments walk the base upward. An
    /// empty sub-path resolves to the context root itself.
    pub fn resolve(&self, sub: &str) -> String {
        let mut base = paths::join([self.effective_base().as_str(), &self.path]);
        let mut sub = sub.replace(&format!("{base}/"), "");

        while let Some(stripped) = sub.strip_prefix("../") {
            sub = stripped.to_string();
            base = paths::up(&base);
        }

        if sub.is_empty() {
            return base;
        }
        paths::join([base.as_str(), &sub])
    }

    /// Creates the resolved directory (and parents) if needed.
    pub fn ensure_exists(&self, sub: &str) -> Result<String, ExuError> {
        let resolved = self.resolve(sub);
        fs::create_dir_all(&resolved).map_err(|err| {
            ExuError::Store(
                ErrorInfo::new("fs-create", "failed to create result directory")
                    .with_context("path", resolved.clone())
                    .with_hint(err.to_string()),
            )
        })?;
        Ok(resolved)
    }

    /// Recursively removes the resolved tree.
    pub fn remove(&self, sub: &str) -> Result<(), ExuError> {
        let resolved = self.resolve(sub);
        fs::remove_dir_all(&resolved).map_err(|err| {
            ExuError::Store(
                ErrorInfo::new("fs-remove", "failed to remove result tree")
                    .with_context("path", resolved)
                    .with_hint(err.to_string()),
            )
        })
    }

    /// The resolved path as a [`PathBuf`] for direct filesystem use.
    pub fn resolve_path(&self, sub: &str) -> PathBuf {
        PathBuf::from(self.resolve(sub))
    }

    /// Whether the resolved path exists on disk.
    pub fn exists(&self, sub: &str) -> bool {
        Path::new(&self.resolve(sub)).exists()
    }
}

/// Builds the save context for one permutation index of an experiment.
pub fn build_save_context(
    exp: &ExperimentDescription,
    idx: u64,
    base: impl Into<String>,
    settings: &Settings,
) -> Result<FileSystemContext, ExuError> {
    let path = exp.interpolate_save_path(idx, settings)?;
    Ok(FileSystemContext::new(path, base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_joins_base_and_sub() {
        let ctx = FileSystemContext::new("results/Cliff/sarsa", "/scratch");
        assert_eq!(
            ctx.resolve("returns.csv"),
            "/scratch/results/Cliff/sarsa/returns.csv"
        );
        assert_eq!(ctx.resolve(""), "/scratch/results/Cliff/sarsa");
    }

    #[test]
    fn resolve_strips_duplicated_prefix() {
        let ctx = FileSystemContext::new("results/Cliff", "");
        assert_eq!(ctx.resolve("results/Cliff/data.csv"), "results/Cliff/data.csv");
    }

    #[test]
    fn parent_segments_walk_the_base_up() {
        let ctx = FileSystemContext::new("results/Cliff/sarsa", "");
        assert_eq!(ctx.resolve("../shared.csv"), "results/Cliff/shared.csv");
        assert_eq!(ctx.resolve("../../all.csv"), "results/all.csv");
    }

    #[test]
    fn temp_staging_prefixes_the_base() {
        let ctx = FileSystemContext::new("results/Cliff", "scratch").with_temp("/tmp/stage");
        let resolved = ctx.resolve("data.csv");
        let expected = format!(
            "/tmp/stage/{}/scratch/results/Cliff/data.csv",
            std::process::id()
        );
        assert_eq!(resolved, expected);
        // the logical path is unchanged
        assert_eq!(ctx.path(), "results/Cliff");
    }
}
