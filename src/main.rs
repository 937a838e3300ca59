mod config;
mod discovery;
mod driver;
mod executor;
mod logger;
mod report;
mod snapshot;
mod state;

use std::process::ExitCode;

use clap::Parser;

use crate::driver::RunArgs;

#[derive(Parser)]
#[command(
    name = "mccsnap",
    version,
    about = "Snapshot test driver for the mcc C compiler: compiles every .c fixture, runs it, and records the exit code."
)]
struct Cli {
    #[command(flatten)]
    args: RunArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match driver::run(&cli.args) {
        Ok(summary) => summary.exit_code(),
        Err(e) => {
            eprintln!("mccsnap: {e}");
            ExitCode::from(2)
        }
    }
}
