use std::process::ExitCode;

use super::command::{Cli, Commands};
use super::output::{self, OutputConfig};
use super::{check, provision, routes};
use crate::error::Result;

/// Dispatch a parsed command line.
///
/// # Errors
///
/// Returns whatever fatal error the command hit; the caller maps it to
/// exit code 1.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose));

    match cli.command {
        Commands::Provision(args) => provision::execute(&args).await,
        Commands::Check(command) => check::command::execute(&command)
            .await
            .map(|()| ExitCode::SUCCESS),
        Commands::Routes(arg) => routes::execute(arg.config).map(|()| ExitCode::SUCCESS),
    }
}
