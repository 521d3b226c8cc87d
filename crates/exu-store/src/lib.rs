//! Result persistence: filesystem contexts, archives, and registry
//! backends for experiment sweeps.

mod archive;
mod fs;
mod missing;
mod registry;

pub use archive::{archive_tree, in_archive, ArchiveCache};
pub use fs::{build_save_context, FileSystemContext};
pub use missing::{list_missing_results, list_result_paths, missing_indices};
pub use registry::{
    append_rows, has_result, has_result_for, query, Backend, Query, ResultRow, Table,
};
