//! Broker admin port.
//!
//! The provisioner only ever talks to the broker through this trait. Every
//! call is either idempotent (create) or read-only (ping, list), so calls may
//! be retried and reordered freely.

use async_trait::async_trait;

use crate::error::BrokerError;

/// Result of an idempotent create call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// The resource was already there and has been left as-is.
    AlreadyExists,
}

/// Payload for a push subscription create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRequest {
    pub name: String,
    /// Fully-qualified topic, `projects/{project}/topics/{name}`.
    pub topic_path: String,
    /// URL the broker will POST messages to.
    pub push_endpoint: String,
    pub ack_deadline_seconds: u32,
}

/// A subscription as reported by the broker listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionListing {
    /// Short name (last path segment).
    pub name: String,
    /// Topic as reported by the broker, fully qualified.
    pub topic_path: String,
    pub push_endpoint: Option<String>,
}

/// Administrative operations against a publish/subscribe broker.
#[async_trait]
pub trait BrokerAdmin: Send + Sync {
    /// Check that the broker answers at all.
    async fn ping(&self) -> Result<(), BrokerError>;

    /// Create a topic under `project_id`; an existing topic is not an error.
    async fn create_topic(&self, project_id: &str, topic: &str)
        -> Result<CreateOutcome, BrokerError>;

    /// Create a push subscription under `project_id`; an existing
    /// subscription is left untouched.
    async fn create_subscription(
        &self,
        project_id: &str,
        request: &SubscriptionRequest,
    ) -> Result<CreateOutcome, BrokerError>;

    /// Short names of every topic in the project.
    async fn list_topics(&self, project_id: &str) -> Result<Vec<String>, BrokerError>;

    async fn list_subscriptions(
        &self,
        project_id: &str,
    ) -> Result<Vec<SubscriptionListing>, BrokerError>;

    /// The `host:port` this adapter targets, for logging.
    fn endpoint(&self) -> &str;
}

/// Last segment of a fully-qualified resource name.
#[must_use]
pub fn short_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
