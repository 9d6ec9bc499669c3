//! Pub/Sub admin REST client.
//!
//! Speaks the v1 REST surface exposed by the Pub/Sub emulator:
//! - `GET /` for reachability
//! - `PUT /v1/projects/{project}/topics/{name}` and
//!   `PUT /v1/projects/{project}/subscriptions/{name}` for idempotent creates
//! - `GET /v1/projects/{project}/{topics,subscriptions}` for paginated listings

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::dto::{
    error_message, next_token, ListSubscriptionsResponse, ListTopicsResponse, SubscriptionBody,
};
use crate::domain::topology::endpoint_url;
use crate::error::BrokerError;
use crate::infrastructure::config::http::HttpConfig;
use crate::port::outbound::broker::{
    short_name, BrokerAdmin, CreateOutcome, SubscriptionListing, SubscriptionRequest,
};

/// HTTP client for the Pub/Sub admin API.
pub struct PubSubClient {
    http: HttpClient,
    /// `host:port` as configured.
    endpoint: String,
    /// `http://host:port`, no trailing slash.
    base_url: String,
}

impl PubSubClient {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_http(endpoint, HttpClient::new())
    }

    #[must_use]
    pub fn from_config(endpoint: impl Into<String>, config: &HttpConfig) -> Self {
        let http = HttpClient::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });
        Self::with_http(endpoint, http)
    }

    fn with_http(endpoint: impl Into<String>, http: HttpClient) -> Self {
        let endpoint = endpoint.into();
        let base_url = endpoint_url(&endpoint).trim_end_matches('/').to_string();
        Self {
            http,
            endpoint,
            base_url,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/v1/projects/{project}/{collection}[/{name}]`.
    ///
    /// Every part is pushed as one percent-encoded path segment, so a name
    /// can never add a query, a fragment or extra path levels.
    fn resource_url(
        &self,
        project_id: &str,
        collection: &str,
        name: Option<&str>,
    ) -> Result<Url, BrokerError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| BrokerError::InvalidUrl(format!("{}: {err}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| {
                BrokerError::InvalidUrl(format!("{} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(["v1", "projects", project_id, collection])
            .extend(name);
        Ok(url)
    }

    async fn create(
        &self,
        url: Url,
        body: serde_json::Value,
    ) -> Result<CreateOutcome, BrokerError> {
        debug!(url = %url, "PUT");
        let response = self.http.put(url).json(&body).send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(CreateOutcome::Created)
        } else if status == StatusCode::CONFLICT {
            Ok(CreateOutcome::AlreadyExists)
        } else {
            Err(rejected(response).await)
        }
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        url: &Url,
        page_token: Option<&str>,
    ) -> Result<T, BrokerError> {
        let mut request = self.http.get(url.clone());
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(rejected(response).await);
        }
        Ok(response.json::<T>().await?)
    }
}

async fn rejected(response: Response) -> BrokerError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    BrokerError::Rejected {
        status,
        message: error_message(&body),
    }
}

#[async_trait]
impl BrokerAdmin for PubSubClient {
    async fn ping(&self) -> Result<(), BrokerError> {
        // Any HTTP answer means the broker is up; only transport errors count.
        let response = self.http.get(format!("{}/", self.base_url)).send().await?;
        debug!(status = response.status().as_u16(), "Broker answered");
        Ok(())
    }

    async fn create_topic(
        &self,
        project_id: &str,
        topic: &str,
    ) -> Result<CreateOutcome, BrokerError> {
        let url = self.resource_url(project_id, "topics", Some(topic))?;
        self.create(url, serde_json::json!({})).await
    }

    async fn create_subscription(
        &self,
        project_id: &str,
        request: &SubscriptionRequest,
    ) -> Result<CreateOutcome, BrokerError> {
        let url = self.resource_url(project_id, "subscriptions", Some(&request.name))?;
        let body = serde_json::to_value(SubscriptionBody::from(request))
            .map_err(|err| BrokerError::Decode(err.to_string()))?;
        self.create(url, body).await
    }

    async fn list_topics(&self, project_id: &str) -> Result<Vec<String>, BrokerError> {
        let url = self.resource_url(project_id, "topics", None)?;
        let mut topics = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page: ListTopicsResponse = self.get_page(&url, token.as_deref()).await?;
            topics.extend(
                page.topics
                    .into_iter()
                    .map(|topic| short_name(&topic.name).to_string()),
            );
            match next_token(page.next_page_token) {
                Some(next) if token.as_deref() != Some(next.as_str()) => token = Some(next),
                _ => break,
            }
        }

        debug!(project_id, count = topics.len(), "Listed topics");
        Ok(topics)
    }

    async fn list_subscriptions(
        &self,
        project_id: &str,
    ) -> Result<Vec<SubscriptionListing>, BrokerError> {
        let url = self.resource_url(project_id, "subscriptions", None)?;
        let mut subscriptions = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page: ListSubscriptionsResponse = self.get_page(&url, token.as_deref()).await?;
            subscriptions.extend(page.subscriptions.into_iter().map(SubscriptionListing::from));
            match next_token(page.next_page_token) {
                Some(next) if token.as_deref() != Some(next.as_str()) => token = Some(next),
                _ => break,
            }
        }

        debug!(project_id, count = subscriptions.len(), "Listed subscriptions");
        Ok(subscriptions)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
