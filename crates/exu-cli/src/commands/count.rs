use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use exu_sweep::load_experiment;

#[derive(Args, Debug)]
pub struct CountArgs {
    /// Experiment document (JSON or YAML).
    #[arg(long)]
    pub exp: PathBuf,
}

pub fn run(args: &CountArgs) -> Result<(), Box<dyn Error>> {
    let exp = load_experiment(&args.exp)?;
    println!("{}", exp.num_permutations());
    Ok(())
}
