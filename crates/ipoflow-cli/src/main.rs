mod cli;
mod commands;
mod error;
mod logging;
mod metadata;
mod output;

use clap::Parser;
use std::process::ExitCode;

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    let outcome = commands::run(cli).await?;
    output::render(&outcome.envelope, &outcome.table, cli.format, cli.pretty)?;

    // The envelope already carries the error for machine consumers.
    match outcome.failure {
        Some(error) => Err(CliError::Resolve(error)),
        None => Ok(()),
    }
}
