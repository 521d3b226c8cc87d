use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use exu_store::missing_indices;
use exu_sweep::{list_indices, load_experiment};

use super::load_settings;

#[derive(Args, Debug)]
pub struct IndicesArgs {
    /// Experiment document (JSON or YAML).
    #[arg(long)]
    pub exp: PathBuf,
    /// Number of runs to cycle over the permutation space.
    #[arg(long, default_value_t = 1)]
    pub runs: u64,
    /// Only list indices whose results are absent under --base.
    #[arg(long)]
    pub missing: bool,
    /// Base directory holding the result tree.
    #[arg(long, default_value = "")]
    pub base: String,
    /// Settings document providing the save-path template.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &IndicesArgs) -> Result<(), Box<dyn Error>> {
    let exp = load_experiment(&args.exp)?;
    let indices: Vec<u64> = if args.missing {
        let settings = load_settings(&args.config)?;
        missing_indices(&exp, &settings, &args.base, args.runs)?
    } else {
        list_indices(&exp, args.runs).collect()
    };
    let rendered: Vec<String> = indices.iter().map(|idx| idx.to_string()).collect();
    println!("{}", rendered.join(","));
    Ok(())
}
