//! Declared event-mesh topology.
//!
//! A [`TopologyConfig`] is produced once per run by the config loader and is
//! immutable afterwards. It names the broker namespace, the topics to create,
//! the push subscriptions that fan events out to consumers, and the health
//! endpoints used for readiness gating.

use std::collections::HashSet;

use serde::Serialize;
use url::Url;

use super::routing::RoutingMap;
use crate::error::ConfigError;

/// Ack deadline applied when a subscription does not declare one.
pub const DEFAULT_ACK_DEADLINE_SECONDS: u32 = 60;

/// Largest ack deadline the broker accepts.
pub const MAX_ACK_DEADLINE_SECONDS: u32 = 600;

/// Length bounds of a broker resource name.
const NAME_LENGTH: std::ops::RangeInclusive<usize> = 3..=255;

/// A push subscription delivering one topic's messages to an HTTP endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscription {
    pub name: String,
    pub topic: String,
    /// `host:port[/path]` the broker will POST to.
    pub push_endpoint: String,
    pub ack_deadline_seconds: u32,
}

impl Subscription {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        topic: impl Into<String>,
        push_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            topic: topic.into(),
            push_endpoint: push_endpoint.into(),
            ack_deadline_seconds: DEFAULT_ACK_DEADLINE_SECONDS,
        }
    }

    #[must_use]
    pub fn with_ack_deadline(mut self, seconds: u32) -> Self {
        self.ack_deadline_seconds = seconds;
        self
    }

    /// Push target URL sent to the broker.
    #[must_use]
    pub fn push_url(&self) -> String {
        endpoint_url(&self.push_endpoint)
    }
}

/// A downstream service whose readiness gates provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub service_name: String,
    /// `host:port/path` of the service health endpoint.
    pub endpoint: String,
}

impl HealthCheck {
    #[must_use]
    pub fn new(service_name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            endpoint: endpoint.into(),
        }
    }

    #[must_use]
    pub fn url(&self) -> String {
        endpoint_url(&self.endpoint)
    }
}

/// Validated declarative description of the event mesh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyConfig {
    /// Namespace for every broker resource.
    pub project_id: String,
    /// `host:port` of the broker admin API.
    pub broker_endpoint: String,
    pub topics: Vec<String>,
    pub subscriptions: Vec<Subscription>,
    pub health_checks: Vec<HealthCheck>,
}

impl TopologyConfig {
    /// Fully-qualified topic name, e.g. `projects/local-project/topics/order-created`.
    #[must_use]
    pub fn topic_path(&self, topic: &str) -> String {
        format!("projects/{}/topics/{}", self.project_id, topic)
    }

    #[must_use]
    pub fn subscription_path(&self, subscription: &str) -> String {
        format!("projects/{}/subscriptions/{}", self.project_id, subscription)
    }

    /// Subscriptions bound to `topic`, in declaration order.
    pub fn subscriptions_for<'a>(
        &'a self,
        topic: &'a str,
    ) -> impl Iterator<Item = &'a Subscription> + 'a {
        self.subscriptions.iter().filter(move |s| s.topic == topic)
    }

    /// Fan-out table derived from the declared subscriptions.
    #[must_use]
    pub fn routing_map(&self) -> RoutingMap {
        RoutingMap::from_topology(self)
    }

    /// Check the structural invariants of the topology.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant: empty namespace or endpoint,
    /// malformed or duplicate names, subscriptions bound to undeclared topics,
    /// ack deadlines outside `1..=600`, or unparsable endpoints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "project_id",
            });
        }
        if self.broker_endpoint.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "emulator_host",
            });
        }
        check_endpoint("emulator_host", &self.broker_endpoint)?;

        let mut topics = HashSet::new();
        for topic in &self.topics {
            check_resource_name("topics", topic)?;
            if !topics.insert(topic.as_str()) {
                return Err(ConfigError::Duplicate {
                    kind: "topic",
                    name: topic.clone(),
                });
            }
        }

        let mut names = HashSet::new();
        for subscription in &self.subscriptions {
            check_resource_name("subscriptions", &subscription.name)?;
            if !names.insert(subscription.name.as_str()) {
                return Err(ConfigError::Duplicate {
                    kind: "subscription",
                    name: subscription.name.clone(),
                });
            }
            if !topics.contains(subscription.topic.as_str()) {
                return Err(ConfigError::UnknownTopic {
                    subscription: subscription.name.clone(),
                    topic: subscription.topic.clone(),
                });
            }
            if !(1..=MAX_ACK_DEADLINE_SECONDS).contains(&subscription.ack_deadline_seconds) {
                return Err(ack_deadline_error(
                    &subscription.name,
                    subscription.ack_deadline_seconds,
                ));
            }
            check_endpoint("pushEndpoint", &subscription.push_endpoint)?;
        }

        for check in &self.health_checks {
            if check.service_name.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: "healthChecks.service",
                });
            }
            check_endpoint("healthChecks.endpoint", &check.endpoint)?;
        }

        Ok(())
    }
}

/// Turn a `host:port[/path]` declaration into an HTTP URL.
///
/// Values that already carry a scheme are returned unchanged.
#[must_use]
pub fn endpoint_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}

/// Error for an ack deadline outside `1..=600`.
#[must_use]
pub fn ack_deadline_error(subscription: &str, seconds: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        field: "ackDeadlineSeconds",
        reason: format!(
            "{seconds} for subscription '{subscription}' must be between 1 and {MAX_ACK_DEADLINE_SECONDS}"
        ),
    }
}

/// Broker resource names start with a letter, are 3 to 255 characters long,
/// use only `[A-Za-z0-9-_.~+%]` and must not start with `goog`.
fn check_resource_name(field: &'static str, name: &str) -> Result<(), ConfigError> {
    let well_formed = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && NAME_LENGTH.contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.~+%".contains(c))
        && !name.to_ascii_lowercase().starts_with("goog");
    if well_formed {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!(
                "'{name}' is not a valid resource name (3-255 of [A-Za-z0-9-_.~+%], starting with a letter, not 'goog')"
            ),
        })
    }
}

fn check_endpoint(field: &'static str, endpoint: &str) -> Result<(), ConfigError> {
    let url = Url::parse(&endpoint_url(endpoint)).map_err(|e| ConfigError::InvalidValue {
        field,
        reason: format!("'{endpoint}': {e}"),
    })?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidValue {
            field,
            reason: format!("'{endpoint}' has no host"),
        });
    }
    Ok(())
}
