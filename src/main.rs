use clap::Parser;
use navsim::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
