use super::{broker, config};
use crate::adapter::inbound::cli::command::CheckCommand;
use crate::error::Result;

/// Execute a `check` subcommand.
///
/// # Errors
///
/// Returns the first failed check.
pub async fn execute(command: &CheckCommand) -> Result<()> {
    match command {
        CheckCommand::Config(arg) => config::execute(arg.config.clone()),
        CheckCommand::Broker(arg) => broker::execute(arg.config.clone()).await,
    }
}
