//! Rendering of provisioning reports and routing maps.

use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::output;
use crate::domain::report::{
    HealthOutcome, Presence, ProvisioningReport, ResourceKind, ResourceOutcome, ResourceReport,
    SessionState,
};
use crate::domain::routing::RoutingMap;
use crate::error::Result;

#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Verified")]
    verified: &'static str,
}

impl From<&ResourceReport> for ResourceRow {
    fn from(resource: &ResourceReport) -> Self {
        let outcome = match &resource.outcome {
            ResourceOutcome::Failed { reason } => format!("failed: {reason}"),
            other => other.label().to_string(),
        };
        Self {
            kind: resource.kind.to_string(),
            name: resource.name.clone(),
            outcome,
            verified: presence_label(resource.presence),
        }
    }
}

fn presence_label(presence: Presence) -> &'static str {
    match presence {
        Presence::Present => "present",
        Presence::Absent => "absent",
        Presence::Unverified => "-",
    }
}

/// Render the resources of a report as a table.
#[must_use]
pub fn resource_table(report: &ProvisioningReport) -> String {
    let rows: Vec<ResourceRow> = report.resources().map(ResourceRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// One line per topic: `topic -> endpoint, endpoint`.
#[must_use]
pub fn route_lines(routing: &RoutingMap) -> Vec<String> {
    routing
        .routes()
        .iter()
        .map(|route| {
            let endpoints = if route.endpoints.is_empty() {
                "(no subscribers)".to_string()
            } else {
                route.endpoints.join(", ")
            };
            format!("{} -> {endpoints}", route.topic)
        })
        .collect()
}

/// Print the routing map.
pub fn print_routes(routing: &RoutingMap) {
    for line in route_lines(routing) {
        output::field("route", line);
    }
}

/// Print a full provisioning report.
///
/// # Errors
///
/// Returns an error if the report cannot be serialized in JSON mode.
pub fn print_report(report: &ProvisioningReport) -> Result<()> {
    if output::is_json() {
        output::json_output(json!({
            "command": "provision",
            "report": serde_json::to_value(report)?,
        }));
        return Ok(());
    }

    if !report.health.is_empty() {
        output::section("Dependencies");
        for health in &report.health {
            match &health.outcome {
                HealthOutcome::Ready { attempts } => output::success(&format!(
                    "{} ready ({} after {attempts} attempt(s))",
                    health.service,
                    output::muted(&health.endpoint)
                )),
                HealthOutcome::TimedOut {
                    attempts,
                    last_error,
                } => output::warning(&format!(
                    "{} not ready after {attempts} attempt(s): {last_error}",
                    health.service
                )),
            }
        }
    }

    output::section("Resources");
    output::table(&resource_table(report));
    output::field("Topics", summary(report, ResourceKind::Topic));
    output::field("Subscriptions", summary(report, ResourceKind::Subscription));

    output::section("Routing");
    print_routes(&report.routing);

    if !report.issues.is_empty() {
        output::section("Issues");
        for issue in &report.issues {
            output::warning(&issue.to_string());
        }
    }

    output::section("Result");
    match report.state {
        SessionState::Ready => output::success(&format!(
            "Topology {} ({} pipe(s))",
            output::positive("ready"),
            report.routing.pipe_count()
        )),
        state => output::warning(&format!(
            "Topology {} with {} issue(s)",
            output::negative(state),
            report.issues.len()
        )),
    }
    Ok(())
}

fn summary(report: &ProvisioningReport, kind: ResourceKind) -> String {
    format!(
        "{} created, {} already existed, {} failed",
        report.count(kind, "created"),
        report.count(kind, "already-existed"),
        report.count(kind, "failed")
    )
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::testkit::config::{mesh_topology, order_topology};

    #[test]
    fn route_lines_follow_declaration_order() {
        let lines = route_lines(&mesh_topology().routing_map());
        assert_eq!(
            lines[0],
            "order-created -> audit:3000/events, projection:3001/events, stock:3002/events"
        );
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn topic_without_subscribers_is_marked() {
        let mut topology = order_topology();
        topology.topics.push("order-archived".into());
        let lines = route_lines(&topology.routing_map());
        assert_eq!(lines[1], "order-archived -> (no subscribers)");
    }

    #[test]
    fn resource_table_lists_every_resource() {
        let topology = order_topology();
        let mut report = ProvisioningReport::new(Uuid::new_v4(), &topology);
        report.topics.push(ResourceReport::new(
            ResourceKind::Topic,
            "order-created",
            ResourceOutcome::Created,
        ));
        report.subscriptions.push(ResourceReport::new(
            ResourceKind::Subscription,
            "audit-sub",
            ResourceOutcome::Failed {
                reason: "broker rejected request (400): bad endpoint".into(),
            },
        ));

        let table = resource_table(&report);
        assert!(table.contains("order-created"));
        assert!(table.contains("failed: broker rejected request (400): bad endpoint"));
        assert!(table.contains("Verified"));
    }
}
