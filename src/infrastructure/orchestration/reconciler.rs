//! Idempotent creation of declared topics and push subscriptions.
//!
//! Each phase issues one create call per resource on a bounded pool. A
//! failure is recorded against its own resource and never cancels or skips
//! another. Reports come back in declaration order. Existing resources are
//! left exactly as the broker holds them.

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::domain::report::{ResourceKind, ResourceOutcome, ResourceReport};
use crate::domain::topology::{Subscription, TopologyConfig};
use crate::error::BrokerError;
use crate::port::outbound::broker::{BrokerAdmin, CreateOutcome, SubscriptionRequest};

pub struct Reconciler<'a> {
    broker: &'a dyn BrokerAdmin,
    max_in_flight: usize,
}

impl<'a> Reconciler<'a> {
    #[must_use]
    pub fn new(broker: &'a dyn BrokerAdmin, max_in_flight: usize) -> Self {
        Self {
            broker,
            max_in_flight: max_in_flight.max(1),
        }
    }

    pub async fn reconcile_topics(&self, topology: &TopologyConfig) -> Vec<ResourceReport> {
        let reports: Vec<ResourceReport> = stream::iter(&topology.topics)
            .map(|topic| async move {
                let result = self.broker.create_topic(&topology.project_id, topic).await;
                report(ResourceKind::Topic, topic, result)
            })
            .buffered(self.max_in_flight)
            .collect()
            .await;

        log_phase(ResourceKind::Topic, &reports);
        reports
    }

    /// Must run after [`Self::reconcile_topics`] has completed.
    pub async fn reconcile_subscriptions(&self, topology: &TopologyConfig) -> Vec<ResourceReport> {
        let reports: Vec<ResourceReport> = stream::iter(&topology.subscriptions)
            .map(|subscription| async move {
                let request = subscription_request(topology, subscription);
                let result = self
                    .broker
                    .create_subscription(&topology.project_id, &request)
                    .await;
                report(ResourceKind::Subscription, &subscription.name, result)
            })
            .buffered(self.max_in_flight)
            .collect()
            .await;

        log_phase(ResourceKind::Subscription, &reports);
        reports
    }
}

#[must_use]
pub fn subscription_request(
    topology: &TopologyConfig,
    subscription: &Subscription,
) -> SubscriptionRequest {
    SubscriptionRequest {
        name: subscription.name.clone(),
        topic_path: topology.topic_path(&subscription.topic),
        push_endpoint: subscription.push_url(),
        ack_deadline_seconds: subscription.ack_deadline_seconds,
    }
}

fn report(
    kind: ResourceKind,
    name: &str,
    result: Result<CreateOutcome, BrokerError>,
) -> ResourceReport {
    let outcome = match result {
        Ok(CreateOutcome::Created) => {
            info!(resource = %kind, name, "Created");
            ResourceOutcome::Created
        }
        Ok(CreateOutcome::AlreadyExists) => {
            debug!(resource = %kind, name, "Already exists, left as-is");
            ResourceOutcome::AlreadyExisted
        }
        Err(err) => {
            warn!(resource = %kind, name, error = %err, "Create failed");
            ResourceOutcome::Failed {
                reason: err.to_string(),
            }
        }
    };
    ResourceReport::new(kind, name, outcome)
}

fn log_phase(kind: ResourceKind, reports: &[ResourceReport]) {
    let count = |label: &str| {
        reports
            .iter()
            .filter(|r| r.outcome.label() == label)
            .count()
    };
    info!(
        resource = %kind,
        created = count("created"),
        already_existed = count("already-existed"),
        failed = count("failed"),
        "Reconciliation phase complete"
    );
}
