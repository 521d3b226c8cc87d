use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use exu_sweep::{load_experiment, to_canonical_json_bytes};

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Experiment document (JSON or YAML).
    #[arg(long)]
    pub exp: PathBuf,
    /// Permutation index to decode; wraps past the permutation count.
    #[arg(long)]
    pub idx: u64,
}

pub fn run(args: &DecodeArgs) -> Result<(), Box<dyn Error>> {
    let exp = load_experiment(&args.exp)?;
    let permutation = exp.get_permutation(args.idx)?;
    let bytes = to_canonical_json_bytes(&permutation)?;
    println!("{}", String::from_utf8(bytes)?);
    Ok(())
}
