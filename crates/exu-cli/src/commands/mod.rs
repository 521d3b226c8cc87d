pub mod count;
pub mod decode;
pub mod indices;
pub mod missing;
pub mod paths;

use std::error::Error;
use std::path::PathBuf;

use exu_sweep::Settings;

/// Loads CLI settings from `--config` when given, defaults otherwise.
pub fn load_settings(config: &Option<PathBuf>) -> Result<Settings, Box<dyn Error>> {
    match config {
        Some(path) => Settings::from_file(path).map_err(|err| Box::new(err) as Box<dyn Error>),
        None => Ok(Settings::default()),
    }
}
