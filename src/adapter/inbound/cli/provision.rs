//! Handler for the `provision` command.

use std::process::ExitCode;

use tokio::signal;
use tokio::sync::watch;
use tracing::info;

use super::command::ProvisionArgs;
use super::{output, report};
use crate::domain::report::SessionState;
use crate::error::{Error, Result};
use crate::infrastructure::config::settings::{ConfigLoader, Settings};
use crate::infrastructure::factory::connector::{Connector, HttpConnector};
use crate::infrastructure::orchestration::session::ProvisioningSession;

/// Exit code for a run that finished degraded under `--once`.
pub const EXIT_DEGRADED: u8 = 2;

/// Execute the provision command against the real broker.
///
/// # Errors
///
/// Returns the fatal error (configuration or unreachable broker) that ended
/// the run.
pub async fn execute(args: &ProvisionArgs) -> Result<ExitCode> {
    let loader = ConfigLoader::resolve(args.config.clone());
    execute_with(args, &loader, &HttpConnector).await
}

/// Execute the provision command with an explicit loader and connector.
///
/// # Errors
///
/// See [`execute`].
pub async fn execute_with(
    args: &ProvisionArgs,
    loader: &ConfigLoader,
    connector: &dyn Connector,
) -> Result<ExitCode> {
    let mut session = ProvisioningSession::new();
    let mut settings = session.load(loader)?;
    apply_overrides(&mut settings, args, output::is_json());
    settings.logging.init();

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Config", loader.path().display());
    output::field("Project", &settings.topology.project_id);
    output::field("Broker", &settings.topology.broker_endpoint);
    if output::verbosity() > 0 {
        output::field("Run", session.run_id());
        output::field(
            "Retry",
            format!(
                "{} attempts, {}ms apart",
                settings.retry.max_attempts, settings.retry.delay_ms
            ),
        );
    }
    output::action("Provisioning", &settings.topology.project_id);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let run = session.provision(&settings, connector, shutdown_rx);
    tokio::pin!(run);

    let result = tokio::select! {
        result = &mut run => result,
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received (Ctrl+C)");
            let _ = shutdown_tx.send(true);
            run.await
        }
    };

    let report = match result {
        Ok(report) => report,
        Err(Error::Cancelled) => {
            output::warning("Provisioning cancelled");
            return Ok(ExitCode::SUCCESS);
        }
        Err(err) => return Err(err),
    };

    report::print_report(&report)?;

    match report.state {
        SessionState::Ready => Ok(ExitCode::SUCCESS),
        _ if args.once => Ok(ExitCode::from(EXIT_DEGRADED)),
        _ => {
            output::hint("topology is degraded; staying up until Ctrl+C");
            let _ = signal::ctrl_c().await;
            info!("Shutdown signal received (Ctrl+C)");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn apply_overrides(settings: &mut Settings, args: &ProvisionArgs, machine_output: bool) {
    if let Some(ref level) = args.log_level {
        settings.logging.level = level.clone();
    }
    if args.json_logs || machine_output {
        settings.logging.format = "json".to_string();
    }
}
