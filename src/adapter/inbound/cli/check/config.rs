use std::path::PathBuf;

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::domain::routing::RoutingMap;
use crate::error::Result;
use crate::infrastructure::config::settings::{ConfigLoader, Settings};

/// Validate the configuration without any network call.
///
/// # Errors
///
/// Returns the configuration error, if any.
pub fn execute(config: Option<PathBuf>) -> Result<()> {
    let loader = ConfigLoader::resolve(config);
    let settings = loader.load()?;
    settings.logging.init();

    if output::is_json() {
        output::json_output(summary(&settings, &loader));
        return Ok(());
    }

    let topology = &settings.topology;
    let routing = topology.routing_map();
    output::section("Configuration Check");
    output::field("Config", loader.path().display());
    output::success("Configuration file is valid");

    output::section("Summary");
    output::field("Project", &topology.project_id);
    output::field("Broker", &topology.broker_endpoint);
    output::field("Topics", topology.topics.len());
    output::field("Subscriptions", topology.subscriptions.len());
    output::field("Pipes", routing.pipe_count());
    output::field("Health checks", topology.health_checks.len());
    output::field(
        "Retry",
        format!(
            "{} attempts, {}ms apart",
            settings.retry.max_attempts, settings.retry.delay_ms
        ),
    );

    let idle = idle_topics(&routing);
    if !idle.is_empty() {
        output::warning(&format!("Topics without subscribers: {}", idle.join(", ")));
    }

    Ok(())
}

/// Topics that no subscription pushes from.
fn idle_topics(routing: &RoutingMap) -> Vec<&str> {
    routing
        .routes()
        .iter()
        .filter(|route| route.endpoints.is_empty())
        .map(|route| route.topic.as_str())
        .collect()
}

fn summary(settings: &Settings, loader: &ConfigLoader) -> serde_json::Value {
    let topology = &settings.topology;
    json!({
        "command": "check.config",
        "valid": true,
        "config": loader.path().display().to_string(),
        "project_id": topology.project_id,
        "broker_endpoint": topology.broker_endpoint,
        "topics": topology.topics.len(),
        "subscriptions": topology.subscriptions.len(),
        "pipes": topology.routing_map().pipe_count(),
        "health_checks": topology.health_checks.len(),
    })
}
