//! Archiving finished result trees and answering membership queries.

use std::fs::File;
use std::io;
use std::path::Path;

use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use exu_core::errors::{ErrorInfo, ExuError};
use exu_core::Cache;

/// Zips a result tree into `dest`.
///
/// Members are stored with paths relative to `src` and visited in sorted
/// order, so archiving the same tree twice produces the same member list.
pub fn archive_tree(src: &Path, dest: &Path) -> Result<(), ExuError> {
    let file = File::create(dest).map_err(|err| {
        ExuError::Store(
            ErrorInfo::new("archive-create", "failed to create archive")
                .with_context("path", dest.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default();

    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            ExuError::Store(
                ErrorInfo::new("archive-walk", "failed to walk result tree")
                    .with_context("path", src.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|err| {
                ExuError::Store(
                    ErrorInfo::new("archive-member", "member escapes the source tree")
                        .with_context("path", entry.path().display().to_string())
                        .with_hint(err.to_string()),
                )
            })?
            .to_string_lossy()
            .replace('\\', "/");

        writer
            .start_file(&relative, options)
            .map_err(|err| wrap_zip("archive-start", &relative, err.to_string()))?;
        let mut input = File::open(entry.path()).map_err(|err| {
            wrap_zip("archive-read", &relative, err.to_string())
        })?;
        io::copy(&mut input, &mut writer)
            .map_err(|err| wrap_zip("archive-copy", &relative, err.to_string()))?;
    }

    writer
        .finish()
        .map_err(|err| wrap_zip("archive-finish", "", err.to_string()))?;
    Ok(())
}

/// Answers whether `member` exists inside the archive at `path`.
///
/// Never fails: a missing or unreadable archive simply answers `false`,
/// because callers probe archives that other jobs may not have produced
/// yet.
pub fn in_archive(path: &Path, member: &str) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    let Ok(mut archive) = ZipArchive::new(file) else {
        return false;
    };
    let found = archive.by_name(member).is_ok();
    found
}

fn wrap_zip(code: &str, member: &str, hint: String) -> ExuError {
    ExuError::Store(
        ErrorInfo::new(code, "archive write failure")
            .with_context("member", member.to_string())
            .with_hint(hint),
    )
}

/// Memoizes archive membership lookups for the life of one sweep run.
///
/// Missing-result scans probe the same archives thousands of times; the
/// cache is owned by the scan and dropped with it, so there is no
/// process-wide state to invalidate.
#[derive(Debug, Default)]
pub struct ArchiveCache {
    lookups: Cache<bool>,
}

impl ArchiveCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            lookups: Cache::new(),
        }
    }

    /// Cached form of [`in_archive`].
    pub fn in_archive(&mut self, path: &Path, member: &str) -> bool {
        let key = format!("{}::{member}", path.display());
        *self
            .lookups
            .get_or_build(&key, |_| in_archive(path, member))
    }
}
