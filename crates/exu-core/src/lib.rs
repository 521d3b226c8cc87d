#![deny(missing_docs)]
#![doc = "Core error types and tree/path utilities shared by the exu experiment toolkit."]

pub mod cache;
pub mod errors;
pub mod interp;
pub mod nested;
pub mod paths;

pub use cache::Cache;
pub use errors::{ErrorInfo, ExuError};
pub use interp::interpolate;
pub use nested::{
    flatten_keys, flatten_values, format_scalar, get, hyphenated_stringify, parse_path,
    set_at_path, PathPart,
};
