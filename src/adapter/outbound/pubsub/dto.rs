//! Pub/Sub REST v1 wire types.
//!
//! Only the fields the provisioner reads or writes are modelled; everything
//! else the broker sends is ignored.

use serde::{Deserialize, Serialize};

use crate::port::outbound::broker::{SubscriptionListing, SubscriptionRequest};

/// Body of `PUT /v1/projects/{project}/subscriptions/{name}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionBody<'a> {
    pub topic: &'a str,
    pub push_config: PushConfig,
    pub ack_deadline_seconds: u32,
}

impl<'a> From<&'a SubscriptionRequest> for SubscriptionBody<'a> {
    fn from(request: &'a SubscriptionRequest) -> Self {
        Self {
            topic: &request.topic_path,
            push_config: PushConfig {
                push_endpoint: Some(request.push_endpoint.clone()),
            },
            ack_deadline_seconds: request.ack_deadline_seconds,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_endpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopicResource {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResource {
    pub name: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub push_config: Option<PushConfig>,
}

impl From<SubscriptionResource> for SubscriptionListing {
    fn from(resource: SubscriptionResource) -> Self {
        Self {
            name: crate::port::outbound::broker::short_name(&resource.name).to_string(),
            topic_path: resource.topic,
            push_endpoint: resource.push_config.and_then(|config| config.push_endpoint),
        }
    }
}

/// One page of `GET /v1/projects/{project}/topics`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTopicsResponse {
    #[serde(default)]
    pub topics: Vec<TopicResource>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// One page of `GET /v1/projects/{project}/subscriptions`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSubscriptionsResponse {
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionResource>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Google API error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Pull a readable message out of an error response body.
#[must_use]
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => match envelope.error.status {
            Some(status) => format!("{status}: {}", envelope.error.message),
            None => envelope.error.message,
        },
        _ => body.trim().to_string(),
    }
}

/// Treat an empty page token as the end of the listing.
#[must_use]
pub fn next_token(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}
