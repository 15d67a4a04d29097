use anyhow::Context;
use clap::Parser;
use roster_splitter::cli::{run, Cli};
use roster_splitter::utils::{init_logging, GENERIC_FAILURE_MESSAGE};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match try_main(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", GENERIC_FAILURE_MESSAGE);
            eprintln!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn try_main(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref()).context("failed to initialise logging")?;
    run(cli)?;
    Ok(())
}
