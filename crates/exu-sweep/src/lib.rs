//! Deterministic parameter sweeps: flattening, counting, and index decoding
//! over nested experiment documents.

mod experiment;
mod hash;
mod indices;
mod permute;
mod settings;

pub use experiment::{load_experiment, ExperimentDescription, DEFAULT_PERMUTABLE_KEY};
pub use hash::{stable_hash_string, to_canonical_json_bytes};
pub use indices::list_indices;
pub use permute::{count_permutations, decode, flatten, reconstruct, FlatAxis};
pub use settings::Settings;
