//! Post-reconciliation cross-check against the broker's own listings.
//!
//! A single listing pass is authoritative: nothing here retries.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::domain::report::{Issue, Presence, ResourceKind};
use crate::domain::topology::TopologyConfig;
use crate::port::outbound::broker::{short_name, BrokerAdmin, SubscriptionListing};

/// Presence of one declared resource in the broker listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceCheck {
    pub name: String,
    pub presence: Presence,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verification {
    pub topics: Vec<PresenceCheck>,
    pub subscriptions: Vec<PresenceCheck>,
    pub issues: Vec<Issue>,
}

impl Verification {
    #[must_use]
    pub fn all_present(&self) -> bool {
        self.topics
            .iter()
            .chain(self.subscriptions.iter())
            .all(|check| check.presence == Presence::Present)
    }

    #[must_use]
    pub fn presence(&self, kind: ResourceKind, name: &str) -> Presence {
        let checks = match kind {
            ResourceKind::Topic => &self.topics,
            ResourceKind::Subscription => &self.subscriptions,
        };
        checks
            .iter()
            .find(|check| check.name == name)
            .map_or(Presence::Unverified, |check| check.presence)
    }
}

pub async fn verify(broker: &dyn BrokerAdmin, topology: &TopologyConfig) -> Verification {
    let mut verification = Verification::default();

    let listed_topics: Option<HashSet<String>> =
        match broker.list_topics(&topology.project_id).await {
            Ok(topics) => Some(topics.into_iter().collect()),
            Err(err) => {
                warn!(error = %err, "Topic listing failed");
                verification.issues.push(Issue::ListingFailed {
                    resource: ResourceKind::Topic,
                    reason: err.to_string(),
                });
                None
            }
        };

    let listed_subscriptions: Option<HashMap<String, SubscriptionListing>> =
        match broker.list_subscriptions(&topology.project_id).await {
            Ok(subscriptions) => Some(
                subscriptions
                    .into_iter()
                    .map(|s| (s.name.clone(), s))
                    .collect(),
            ),
            Err(err) => {
                warn!(error = %err, "Subscription listing failed");
                verification.issues.push(Issue::ListingFailed {
                    resource: ResourceKind::Subscription,
                    reason: err.to_string(),
                });
                None
            }
        };

    for topic in &topology.topics {
        let present = listed_topics
            .as_ref()
            .is_some_and(|listed| listed.contains(topic));
        verification.topics.push(check(
            &mut verification.issues,
            ResourceKind::Topic,
            topic,
            present,
        ));
    }

    for subscription in &topology.subscriptions {
        let listed = listed_subscriptions
            .as_ref()
            .and_then(|listed| listed.get(&subscription.name));

        if let Some(actual) = listed {
            if short_name(&actual.topic_path) != subscription.topic {
                warn!(
                    name = %subscription.name,
                    declared = %subscription.topic,
                    actual = %actual.topic_path,
                    "Subscription bound to a different topic"
                );
                verification.issues.push(Issue::TopicDrift {
                    name: subscription.name.clone(),
                    declared: topology.topic_path(&subscription.topic),
                    actual: actual.topic_path.clone(),
                });
            }

            let declared = subscription.push_url();
            if let Some(endpoint) = actual.push_endpoint.as_deref() {
                if endpoint != declared {
                    warn!(
                        name = %subscription.name,
                        declared = %declared,
                        actual = endpoint,
                        "Subscription pushes to a different endpoint"
                    );
                    verification.issues.push(Issue::EndpointDrift {
                        name: subscription.name.clone(),
                        declared,
                        actual: endpoint.to_string(),
                    });
                }
            }
        }

        verification.subscriptions.push(check(
            &mut verification.issues,
            ResourceKind::Subscription,
            &subscription.name,
            listed.is_some(),
        ));
    }

    info!(
        topics = verification.topics.len(),
        subscriptions = verification.subscriptions.len(),
        all_present = verification.all_present(),
        "Topology verified"
    );
    verification
}

fn check(issues: &mut Vec<Issue>, kind: ResourceKind, name: &str, present: bool) -> PresenceCheck {
    let presence = if present {
        Presence::Present
    } else {
        warn!(resource = %kind, name, "Declared resource missing from broker");
        issues.push(Issue::VerificationMismatch {
            resource: kind,
            name: name.to_string(),
        });
        Presence::Absent
    };
    PresenceCheck {
        name: name.to_string(),
        presence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::outbound::broker::SubscriptionRequest;
    use crate::testkit::broker::InMemoryBroker;
    use crate::testkit::config::order_topology;

    #[tokio::test]
    async fn empty_broker_reports_everything_absent() {
        let broker = InMemoryBroker::new();
        let verification = verify(&broker, &order_topology()).await;

        assert!(!verification.all_present());
        assert_eq!(verification.issues.len(), 3);
        assert_eq!(
            verification.presence(ResourceKind::Topic, "order-created"),
            Presence::Absent
        );
    }

    #[tokio::test]
    async fn drifted_subscription_is_present_but_noted() {
        let topology = order_topology();
        let broker = InMemoryBroker::new();
        broker.seed_topic(&topology.project_id, "order-created");
        broker.seed_topic(&topology.project_id, "legacy-orders");
        broker.seed_subscription(
            &topology.project_id,
            SubscriptionRequest {
                name: "audit-sub".into(),
                topic_path: topology.topic_path("legacy-orders"),
                push_endpoint: "http://audit:3000".into(),
                ack_deadline_seconds: 10,
            },
        );
        broker.seed_subscription(
            &topology.project_id,
            SubscriptionRequest {
                name: "notify-sub".into(),
                topic_path: topology.topic_path("order-created"),
                push_endpoint: "http://notify:3000".into(),
                ack_deadline_seconds: 60,
            },
        );

        let verification = verify(&broker, &topology).await;

        assert!(verification.all_present());
        assert!(matches!(
            verification.issues.as_slice(),
            [Issue::TopicDrift { name, .. }] if name == "audit-sub"
        ));
    }

    #[tokio::test]
    async fn moved_push_endpoint_is_noted_without_degrading() {
        let topology = order_topology();
        let broker = InMemoryBroker::new();
        broker.seed_topic(&topology.project_id, "order-created");
        let seeded = [
            ("audit-sub", "http://audit-v2:3000"),
            ("notify-sub", "http://notify:3000"),
        ];
        for (name, endpoint) in seeded {
            broker.seed_subscription(
                &topology.project_id,
                SubscriptionRequest {
                    name: name.into(),
                    topic_path: topology.topic_path("order-created"),
                    push_endpoint: endpoint.into(),
                    ack_deadline_seconds: 60,
                },
            );
        }

        let verification = verify(&broker, &topology).await;

        assert!(verification.all_present());
        match verification.issues.as_slice() {
            [Issue::EndpointDrift {
                name,
                declared,
                actual,
            }] => {
                assert_eq!(name, "audit-sub");
                assert_eq!(declared, "http://audit:3000");
                assert_eq!(actual, "http://audit-v2:3000");
            }
            other => panic!("expected one endpoint drift, got {other:?}"),
        }
        assert!(!verification.issues[0].degrades());
    }

    #[tokio::test]
    async fn listing_failure_marks_resources_absent() {
        let topology = order_topology();
        let broker = InMemoryBroker::new();
        broker.seed_topic(&topology.project_id, "order-created");
        broker.fail_listings("emulator restarting");

        let verification = verify(&broker, &topology).await;

        assert!(!verification.all_present());
        assert!(verification
            .issues
            .iter()
            .any(|issue| matches!(issue, Issue::ListingFailed { .. })));
    }
}
