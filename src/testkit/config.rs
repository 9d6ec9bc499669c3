//! Canonical test topologies and settings.
//!
//! Single source of truth for configs used across tests.

use std::time::Duration;

use crate::domain::topology::{HealthCheck, Subscription, TopologyConfig};
use crate::infrastructure::config::retry::RetryConfig;
use crate::infrastructure::config::settings::Settings;

/// One topic fanned out to two push subscriptions, no health checks.
#[must_use]
pub fn order_topology() -> TopologyConfig {
    TopologyConfig {
        project_id: "local-project".into(),
        broker_endpoint: "localhost:8085".into(),
        topics: vec!["order-created".into()],
        subscriptions: vec![
            Subscription::new("audit-sub", "order-created", "audit:3000"),
            Subscription::new("notify-sub", "order-created", "notify:3000"),
        ],
        health_checks: Vec::new(),
    }
}

/// Several topics with uneven fan-out plus two health checks.
#[must_use]
pub fn mesh_topology() -> TopologyConfig {
    TopologyConfig {
        project_id: "local-project".into(),
        broker_endpoint: "localhost:8085".into(),
        topics: vec![
            "order-created".into(),
            "order-cancelled".into(),
            "client-registered".into(),
        ],
        subscriptions: vec![
            Subscription::new("audit-orders", "order-created", "audit:3000/events"),
            Subscription::new("projection-orders", "order-created", "projection:3001/events"),
            Subscription::new("stock-orders", "order-created", "stock:3002/events")
                .with_ack_deadline(30),
            Subscription::new("audit-cancellations", "order-cancelled", "audit:3000/events"),
            Subscription::new("audit-clients", "client-registered", "audit:3000/events"),
        ],
        health_checks: vec![
            HealthCheck::new("audit", "audit:3000/health"),
            HealthCheck::new("projection", "projection:3001/health"),
        ],
    }
}

/// Retry policy with millisecond delays, so gates give up quickly.
#[must_use]
pub fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        delay_ms: 1,
    }
}

/// Default settings around `topology` with [`fast_retry`] of three attempts.
#[must_use]
pub fn fast_settings(topology: TopologyConfig) -> Settings {
    let mut settings = Settings::with_topology(topology);
    settings.retry = fast_retry(3);
    settings
}

/// The JSON document describing [`order_topology`].
pub const ORDER_DOCUMENT: &str = r#"{
    "project_id": "local-project",
    "emulator_host": "localhost:8085",
    "topics": ["order-created"],
    "subscriptions": [
        {"name": "audit-sub", "topic": "order-created", "pushEndpoint": "audit:3000"},
        {"name": "notify-sub", "topic": "order-created", "pushEndpoint": "notify:3000"}
    ],
    "retry": {"max_attempts": 3, "delay_ms": 1}
}"#;

/// Upper bound for anything a test awaits.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);
