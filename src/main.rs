use std::process::ExitCode;

use clap::Parser;
use meshprov::adapter::inbound::cli::{command::Cli, entry, output};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match entry::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
