//! Command-line interface definitions.
//!
//! `meshprov provision` runs a full provisioning session; `check` and
//! `routes` inspect the configuration or the broker without changing
//! anything.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Declarative Pub/Sub topology provisioner
#[derive(Parser, Debug)]
#[command(name = "meshprov")]
#[command(version)]
pub struct Cli {
    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create topics and push subscriptions, then verify them
    Provision(ProvisionArgs),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),

    /// Print the topic to push-endpoint fan-out map from the configuration
    Routes(ConfigPathArg),
}

/// Subcommands for `meshprov check`.
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Load and validate the configuration without touching the network.
    Config(ConfigPathArg),
    /// Probe the broker once.
    Broker(ConfigPathArg),
}

/// Configuration document selection shared by every command.
///
/// Without `--config`, `MESHPROV_CONFIG` is used, then `pubsub-config.json`.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to the topology document (JSON, or TOML by extension).
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the `provision` subcommand.
#[derive(Parser, Debug)]
pub struct ProvisionArgs {
    /// Path to the topology document (JSON, or TOML by extension).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Exit right after the report: 0 when ready, 2 when degraded.
    #[arg(long)]
    pub once: bool,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty-printed logs.
    #[arg(long)]
    pub json_logs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provision_with_flags() {
        let cli = Cli::try_parse_from([
            "meshprov",
            "--json",
            "provision",
            "--config",
            "mesh.toml",
            "--once",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Provision(args) => {
                assert_eq!(args.config, Some(PathBuf::from("mesh.toml")));
                assert!(args.once);
                assert!(!args.json_logs);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_check_subcommands() {
        let cli = Cli::try_parse_from(["meshprov", "check", "broker", "-c", "x.json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Check(CheckCommand::Broker(ConfigPathArg { config: Some(_) }))
        ));

        let cli = Cli::try_parse_from(["meshprov", "-vv", "routes"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::Routes(ConfigPathArg { config: None })
        ));
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["meshprov", "teardown"]).is_err());
    }
}
