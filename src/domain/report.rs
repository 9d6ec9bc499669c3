//! Session state and the final provisioning report.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::routing::RoutingMap;
use super::topology::TopologyConfig;

/// Phases of a provisioning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Loading,
    GatingBroker,
    GatingDependencies,
    ReconcilingTopics,
    ReconcilingSubscriptions,
    Verifying,
    /// Every declared resource verified present.
    Ready,
    /// The run completed but at least one resource is missing or failed.
    Degraded,
    /// Config error or unreachable broker.
    Fatal,
}

impl SessionState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Degraded | Self::Fatal)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::GatingBroker => "gating_broker",
            Self::GatingDependencies => "gating_dependencies",
            Self::ReconcilingTopics => "reconciling_topics",
            Self::ReconcilingSubscriptions => "reconciling_subscriptions",
            Self::Verifying => "verifying",
            Self::Ready => "ready",
            Self::Degraded => "degraded",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Topic,
    Subscription,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topic => f.write_str("topic"),
            Self::Subscription => f.write_str("subscription"),
        }
    }
}

/// Result of one idempotent create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResourceOutcome {
    Created,
    AlreadyExisted,
    Failed { reason: String },
}

impl ResourceOutcome {
    /// Created and already-existed both count as success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::AlreadyExisted => "already-existed",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Whether the verifier saw a resource in the broker listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    #[default]
    Unverified,
    Present,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceReport {
    pub kind: ResourceKind,
    pub name: String,
    pub outcome: ResourceOutcome,
    pub presence: Presence,
}

impl ResourceReport {
    #[must_use]
    pub fn new(kind: ResourceKind, name: impl Into<String>, outcome: ResourceOutcome) -> Self {
        Self {
            kind,
            name: name.into(),
            outcome,
            presence: Presence::Unverified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HealthOutcome {
    Ready { attempts: u32 },
    TimedOut { attempts: u32, last_error: String },
}

impl HealthOutcome {
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Ready { attempts } | Self::TimedOut { attempts, .. } => *attempts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub service: String,
    pub endpoint: String,
    pub outcome: HealthOutcome,
}

/// Non-fatal problems accumulated during a run.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    #[error("dependency {service} not ready after {attempts} attempts: {reason}")]
    DependencyTimeout {
        service: String,
        attempts: u32,
        reason: String,
    },

    #[error("failed to create {resource} {name}: {reason}")]
    ResourceCreation {
        resource: ResourceKind,
        name: String,
        reason: String,
    },

    #[error("{resource} {name} missing from broker listing")]
    VerificationMismatch { resource: ResourceKind, name: String },

    #[error("{resource} listing failed: {reason}")]
    ListingFailed {
        resource: ResourceKind,
        reason: String,
    },

    /// The broker holds a subscription under the declared name but bound to
    /// another topic. It is left untouched.
    #[error("subscription {name} is bound to {actual}, declared {declared}")]
    TopicDrift {
        name: String,
        declared: String,
        actual: String,
    },

    #[error("subscription {name} pushes to {actual}, declared {declared}")]
    EndpointDrift {
        name: String,
        declared: String,
        actual: String,
    },
}

impl Issue {
    /// Whether this issue prevents the run from reaching `Ready`.
    #[must_use]
    pub const fn degrades(&self) -> bool {
        !matches!(
            self,
            Self::TopicDrift { .. } | Self::EndpointDrift { .. } | Self::DependencyTimeout { .. }
        )
    }
}

/// Everything an operator needs to diagnose a run.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisioningReport {
    pub run_id: Uuid,
    pub project_id: String,
    pub broker_endpoint: String,
    pub state: SessionState,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Probes needed before the broker answered.
    pub broker_attempts: u32,
    pub health: Vec<HealthReport>,
    pub topics: Vec<ResourceReport>,
    pub subscriptions: Vec<ResourceReport>,
    pub issues: Vec<Issue>,
    pub routing: RoutingMap,
}

impl ProvisioningReport {
    #[must_use]
    pub fn new(run_id: Uuid, topology: &TopologyConfig) -> Self {
        Self {
            run_id,
            project_id: topology.project_id.clone(),
            broker_endpoint: topology.broker_endpoint.clone(),
            state: SessionState::Loading,
            started_at: Utc::now(),
            finished_at: None,
            broker_attempts: 0,
            health: Vec::new(),
            topics: Vec::new(),
            subscriptions: Vec::new(),
            issues: Vec::new(),
            routing: topology.routing_map(),
        }
    }

    #[must_use]
    pub fn topic(&self, name: &str) -> Option<&ResourceReport> {
        self.topics.iter().find(|r| r.name == name)
    }

    #[must_use]
    pub fn subscription(&self, name: &str) -> Option<&ResourceReport> {
        self.subscriptions.iter().find(|r| r.name == name)
    }

    #[must_use]
    pub fn health_check(&self, service: &str) -> Option<&HealthReport> {
        self.health.iter().find(|h| h.service == service)
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceReport> {
        self.topics.iter().chain(self.subscriptions.iter())
    }

    /// Record create failures as issues.
    pub fn record_creation_failures(&mut self) {
        let failures: Vec<Issue> = self
            .resources()
            .filter_map(|r| match &r.outcome {
                ResourceOutcome::Failed { reason } => Some(Issue::ResourceCreation {
                    resource: r.kind,
                    name: r.name.clone(),
                    reason: reason.clone(),
                }),
                _ => None,
            })
            .collect();
        self.issues.extend(failures);
    }

    /// True when every resource was established and verified present, and no
    /// degrading issue was recorded.
    #[must_use]
    pub fn is_fully_provisioned(&self) -> bool {
        self.resources()
            .all(|r| r.outcome.is_success() && r.presence == Presence::Present)
            && !self.issues.iter().any(Issue::degrades)
    }

    /// Terminal state implied by the accumulated outcomes.
    #[must_use]
    pub fn terminal_state(&self) -> SessionState {
        if self.is_fully_provisioned() {
            SessionState::Ready
        } else {
            SessionState::Degraded
        }
    }

    #[must_use]
    pub fn count(&self, kind: ResourceKind, label: &str) -> usize {
        let resources = match kind {
            ResourceKind::Topic => &self.topics,
            ResourceKind::Subscription => &self.subscriptions,
        };
        resources
            .iter()
            .filter(|r| r.outcome.label() == label)
            .count()
    }
}
