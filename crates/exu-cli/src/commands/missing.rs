use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use exu_store::list_missing_results;
use exu_sweep::load_experiment;

use super::load_settings;

#[derive(Args, Debug)]
pub struct MissingArgs {
    /// Experiment document (JSON or YAML).
    #[arg(long)]
    pub exp: PathBuf,
    /// Settings document providing the save-path template.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Base directory holding the result tree.
    #[arg(long, default_value = "")]
    pub base: String,
    /// Number of runs to cycle over the permutation space.
    #[arg(long, default_value_t = 1)]
    pub runs: u64,
}

pub fn run(args: &MissingArgs) -> Result<(), Box<dyn Error>> {
    let exp = load_experiment(&args.exp)?;
    let settings = load_settings(&args.config)?;
    for path in list_missing_results(&exp, &settings, &args.base, args.runs)? {
        println!("{path}");
    }
    Ok(())
}
