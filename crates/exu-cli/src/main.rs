use clap::{Parser, Subcommand};
use commands::{
    count::{self, CountArgs},
    decode::{self, DecodeArgs},
    indices::{self, IndicesArgs},
    missing::{self, MissingArgs},
    paths::{self, PathsArgs},
};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "exu", about = "Experiment sweep utilities CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the total permutation count of an experiment document.
    Count(CountArgs),
    /// Print the concrete parameter permutation for one index.
    Decode(DecodeArgs),
    /// Print every interpolated save path for the sweep.
    Paths(PathsArgs),
    /// Print the save paths whose results are absent.
    Missing(MissingArgs),
    /// Print the task index list consumed by scheduler tooling.
    Indices(IndicesArgs),
}

fn main() {
    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Count(args) => count::run(args),
        Command::Decode(args) => decode::run(args),
        Command::Paths(args) => paths::run(args),
        Command::Missing(args) => missing::run(args),
        Command::Indices(args) => indices::run(args),
    };
    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
