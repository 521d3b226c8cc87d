//! Experiment descriptions: a configuration document plus the designation
//! of which sub-trees are swept.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use exu_core::errors::{ErrorInfo, ExuError};
use exu_core::interp::interpolate;
use exu_core::nested::{format_scalar, hyphenated_stringify};
use exu_core::paths;

use crate::permute::{count_permutations, decode, flatten, FlatAxis};
use crate::settings::Settings;

/// Default key designating the permutable sub-tree of a document.
pub const DEFAULT_PERMUTABLE_KEY: &str = "metaParameters";

/// A parsed experiment document together with its sweep designation.
///
/// The description is immutable for the life of a sweep. The flattened axis
/// list and permutation count are computed once at construction; every
/// [`get_permutation`](Self::get_permutation) call returns an independent
/// deep copy so callers may freely mutate the result.
#[derive(Debug, Clone)]
pub struct ExperimentDescription {
    document: Value,
    keys: Vec<String>,
    source: Option<PathBuf>,
    save_key: Option<String>,
    permutable: Value,
    axes: Vec<FlatAxis>,
    count: u64,
}

impl ExperimentDescription {
    /// Builds a description sweeping over the default `metaParameters` key.
    pub fn new(document: Value, source: Option<PathBuf>) -> Result<Self, ExuError> {
        Self::with_keys(document, source, vec![DEFAULT_PERMUTABLE_KEY.to_string()])
    }

    /// Builds a description sweeping over an explicit list of top-level keys.
    ///
    /// Fails fast when a designated key is absent from the document.
    pub fn with_keys(
        document: Value,
        source: Option<PathBuf>,
        keys: Vec<String>,
    ) -> Result<Self, ExuError> {
        let mut sweeps = Map::new();
        for key in &keys {
            let sub = document.get(key).ok_or_else(|| {
                ExuError::Config(
                    ErrorInfo::new("exp-missing-key", "permutable key absent from document")
                        .with_context("key", key.clone()),
                )
            })?;
            sweeps.insert(key.clone(), sub.clone());
        }
        let permutable = Value::Object(sweeps);
        let axes = flatten(&permutable);
        let count = count_permutations(&permutable);
        Ok(Self {
            document,
            keys,
            source,
            save_key: None,
            permutable,
            axes,
            count,
        })
    }

    /// Overrides the save-path template for this description only.
    pub fn with_save_key(mut self, save_key: impl Into<String>) -> Self {
        self.save_key = Some(save_key.into());
        self
    }

    /// The raw configuration document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// The keys designated as permutable.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Path of the file this description was loaded from, when known.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The permutable sub-tree(s), keyed by their designating key.
    pub fn permutable(&self) -> &Value {
        &self.permutable
    }

    /// The memoized flattened axis list.
    pub fn axes(&self) -> &[FlatAxis] {
        &self.axes
    }

    /// Total number of parameter permutations.
    pub fn num_permutations(&self) -> u64 {
        self.count
    }

    /// Run number for an index: how many times the index has wrapped
    /// around the permutation space.
    pub fn get_run(&self, idx: u64) -> u64 {
        idx / self.count
    }

    /// The full document with the permutable sub-tree(s) replaced by the
    /// concrete assignment for `idx`. Indices wrap.
    pub fn get_permutation(&self, idx: u64) -> Result<Value, ExuError> {
        let decoded = decode(&self.permutable, idx)?;
        let mut out = self.document.clone();
        if let (Some(doc), Some(dec)) = (out.as_object_mut(), decoded.as_object()) {
            for key in &self.keys {
                if let Some(sub) = dec.get(key) {
                    doc.insert(key.clone(), sub.clone());
                }
            }
        }
        Ok(out)
    }

    /// The concrete swept values for `idx`, without the surrounding
    /// document. For a single designated key this is the bare sub-tree.
    pub fn swept_values(&self, idx: u64) -> Result<Value, ExuError> {
        let decoded = decode(&self.permutable, idx)?;
        if self.keys.len() == 1 {
            return Ok(decoded
                .get(&self.keys[0])
                .cloned()
                .unwrap_or(Value::Null));
        }
        Ok(decoded)
    }

    /// Human-readable experiment identifier.
    ///
    /// An explicit top-level `name` field always wins. Otherwise the name
    /// is derived from the source path with the working directory, the
    /// configured experiment root, and any `./` prefix removed by literal
    /// substring replacement, and the trailing filename stripped. The
    /// literal replacement is a known fragility kept for compatibility
    /// with existing result trees.
    pub fn experiment_name(&self, settings: &Settings) -> String {
        if let Some(name) = self.document.get("name") {
            return format_scalar(name);
        }
        let Some(source) = &self.source else {
            return "unnamed".to_string();
        };

        let mut path = source.to_string_lossy().to_string();
        if let Ok(cwd) = env::current_dir() {
            path = path.replace(&format!("{}/", cwd.display()), "");
        }
        if let Some(dir) = &settings.experiment_directory {
            path = path.replace(&format!("{dir}/"), "");
        }
        path = path.replace("./", "");

        paths::up(&path)
    }

    /// Interpolates the save-path template for an index.
    ///
    /// The template is the per-description override when set, otherwise the
    /// settings template. Tokens resolve against the document's top-level
    /// scalar fields merged with the specials `params` (hyphenated swept
    /// values), `run`, and `name`; an unknown token is a hard error.
    pub fn interpolate_save_path(&self, idx: u64, settings: &Settings) -> Result<String, ExuError> {
        let template = self
            .save_key
            .clone()
            .unwrap_or_else(|| settings.save_path.clone());

        let mut values: BTreeMap<String, String> = BTreeMap::new();
        if let Some(doc) = self.document.as_object() {
            for (key, value) in doc {
                if !value.is_object() && !value.is_array() {
                    values.insert(key.clone(), format_scalar(value));
                }
            }
        }
        values.insert(
            "params".to_string(),
            hyphenated_stringify(&self.swept_values(idx)?),
        );
        values.insert("run".to_string(), self.get_run(idx).to_string());
        values.insert("name".to_string(), self.experiment_name(settings));

        interpolate(&template, &values)
    }
}

/// Loads an experiment description from a JSON or YAML document on disk.
///
/// The format is chosen by extension (`.yaml`/`.yml` parse as YAML,
/// anything else as JSON) and the file path is retained for
/// experiment-name derivation.
pub fn load_experiment(path: impl Into<PathBuf>) -> Result<ExperimentDescription, ExuError> {
    let path = path.into();
    let text = fs::read_to_string(&path).map_err(|err| {
        ExuError::Config(
            ErrorInfo::new("exp-read", "failed to read experiment document")
                .with_context("path", path.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );
    let document: Value = if is_yaml {
        serde_yaml::from_str(&text).map_err(|err| parse_error(&path, err.to_string()))?
    } else {
        serde_json::from_str(&text).map_err(|err| parse_error(&path, err.to_string()))?
    };
    ExperimentDescription::new(document, Some(path))
}

fn parse_error(path: &Path, hint: String) -> ExuError {
    ExuError::Config(
        ErrorInfo::new("exp-parse", "failed to parse experiment document")
            .with_context("path", path.display().to_string())
            .with_hint(hint),
    )
}
