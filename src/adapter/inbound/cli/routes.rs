//! Handler for the `routes` command.

use std::path::PathBuf;

use serde_json::json;

use super::{output, report};
use crate::error::Result;
use crate::infrastructure::config::settings::ConfigLoader;

/// Print the fan-out map declared by the configuration. No broker calls.
///
/// # Errors
///
/// Returns the configuration error, if any.
pub fn execute(config: Option<PathBuf>) -> Result<()> {
    let settings = ConfigLoader::resolve(config).load()?;
    settings.logging.init();
    let routing = settings.topology.routing_map();

    if output::is_json() {
        output::json_output(json!({
            "command": "routes",
            "project_id": settings.topology.project_id,
            "routes": serde_json::to_value(&routing)?,
        }));
        return Ok(());
    }

    output::section("Routing");
    report::print_routes(&routing);
    output::field("Pipes", routing.pipe_count());
    Ok(())
}
