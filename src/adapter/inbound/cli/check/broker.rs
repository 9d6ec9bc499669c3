use std::path::PathBuf;

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::error::{Error, Result};
use crate::infrastructure::config::settings::ConfigLoader;
use crate::infrastructure::factory::connector::{Connector, HttpConnector};

/// Probe the configured broker once.
///
/// # Errors
///
/// Returns a configuration error, or [`Error::BrokerUnavailable`] when the
/// broker does not answer.
pub async fn execute(config: Option<PathBuf>) -> Result<()> {
    let settings = ConfigLoader::resolve(config).load()?;
    settings.logging.init();
    let broker = HttpConnector.broker(&settings);

    output::action("Probing", broker.endpoint());
    broker
        .ping()
        .await
        .map_err(|err| Error::BrokerUnavailable {
            endpoint: broker.endpoint().to_string(),
            attempts: 1,
            reason: err.to_string(),
        })?;

    if output::is_json() {
        output::json_output(json!({
            "command": "check.broker",
            "endpoint": broker.endpoint(),
            "reachable": true,
        }));
    } else {
        output::success(&format!("Broker at {} is reachable", broker.endpoint()));
    }
    Ok(())
}
