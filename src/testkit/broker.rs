//! In-memory broker admin.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::BrokerError;
use crate::port::outbound::broker::{
    short_name, BrokerAdmin, CreateOutcome, SubscriptionListing, SubscriptionRequest,
};

/// One call made against the broker, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerCall {
    Ping,
    CreateTopic(String),
    CreateSubscription(String),
    ListTopics,
    ListSubscriptions,
}

#[derive(Default)]
struct State {
    topics: Vec<(String, String)>,
    subscriptions: Vec<(String, SubscriptionRequest)>,
    rejections: HashMap<String, (u16, String)>,
    hidden: HashSet<String>,
    listing_failure: Option<String>,
    /// Pings that fail before the broker comes up; `None` means never.
    unreachable_pings: Option<u32>,
    calls: Vec<BrokerCall>,
}

/// Broker fake holding topics and subscriptions per project.
///
/// Mirrors the emulator closely enough for the provisioner: creates are
/// idempotent, a subscription on a missing topic is rejected with 404 and
/// listings return short topic names and fully-qualified subscription topics.
pub struct InMemoryBroker {
    endpoint: String,
    state: Mutex<State>,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBroker {
    #[must_use]
    pub fn new() -> Self {
        Self::with_endpoint("localhost:8085")
    }

    #[must_use]
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            state: Mutex::new(State {
                unreachable_pings: Some(0),
                ..State::default()
            }),
        }
    }

    /// Every ping fails.
    pub fn unreachable(&self) {
        self.state.lock().unreachable_pings = None;
    }

    /// The first `failures` pings fail, later ones succeed.
    pub fn reachable_after(&self, failures: u32) {
        self.state.lock().unreachable_pings = Some(failures);
    }

    /// Creating the topic or subscription called `name` fails with `status`.
    pub fn reject(&self, name: &str, status: u16, message: &str) {
        self.state
            .lock()
            .rejections
            .insert(name.to_string(), (status, message.to_string()));
    }

    /// Both listings fail with a transport error.
    pub fn fail_listings(&self, reason: &str) {
        self.state.lock().listing_failure = Some(reason.to_string());
    }

    /// `name` is accepted on create but never shows up in a listing.
    pub fn hide_from_listing(&self, name: &str) {
        self.state.lock().hidden.insert(name.to_string());
    }

    pub fn seed_topic(&self, project_id: &str, name: &str) {
        self.state
            .lock()
            .topics
            .push((project_id.to_string(), name.to_string()));
    }

    pub fn seed_subscription(&self, project_id: &str, request: SubscriptionRequest) {
        self.state
            .lock()
            .subscriptions
            .push((project_id.to_string(), request));
    }

    #[must_use]
    pub fn topics(&self, project_id: &str) -> Vec<String> {
        self.state
            .lock()
            .topics
            .iter()
            .filter(|(project, _)| project == project_id)
            .map(|(_, name)| name.clone())
            .collect()
    }

    #[must_use]
    pub fn subscription(&self, project_id: &str, name: &str) -> Option<SubscriptionRequest> {
        self.state
            .lock()
            .subscriptions
            .iter()
            .find(|(project, sub)| project == project_id && sub.name == name)
            .map(|(_, sub)| sub.clone())
    }

    #[must_use]
    pub fn subscription_count(&self, project_id: &str) -> usize {
        self.state
            .lock()
            .subscriptions
            .iter()
            .filter(|(project, _)| project == project_id)
            .count()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<BrokerCall> {
        self.state.lock().calls.clone()
    }

    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.state.lock().calls.len()
    }

    #[must_use]
    pub fn ping_count(&self) -> usize {
        self.count(|call| matches!(call, BrokerCall::Ping))
    }

    #[must_use]
    pub fn create_count(&self) -> usize {
        self.count(|call| {
            matches!(
                call,
                BrokerCall::CreateTopic(_) | BrokerCall::CreateSubscription(_)
            )
        })
    }

    fn count(&self, predicate: impl Fn(&BrokerCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| predicate(c)).count()
    }
}

fn rejection(state: &State, name: &str) -> Option<BrokerError> {
    state
        .rejections
        .get(name)
        .map(|(status, message)| BrokerError::Rejected {
            status: *status,
            message: message.clone(),
        })
}

#[async_trait]
impl BrokerAdmin for InMemoryBroker {
    async fn ping(&self) -> Result<(), BrokerError> {
        let mut state = self.state.lock();
        state.calls.push(BrokerCall::Ping);
        let pending = state.unreachable_pings;
        match pending {
            Some(0) => Ok(()),
            Some(remaining) => {
                state.unreachable_pings = Some(remaining - 1);
                Err(BrokerError::Transport("connection refused".into()))
            }
            None => Err(BrokerError::Transport("connection refused".into())),
        }
    }

    async fn create_topic(
        &self,
        project_id: &str,
        topic: &str,
    ) -> Result<CreateOutcome, BrokerError> {
        let mut state = self.state.lock();
        state.calls.push(BrokerCall::CreateTopic(topic.to_string()));
        if let Some(err) = rejection(&state, topic) {
            return Err(err);
        }
        if state
            .topics
            .iter()
            .any(|(project, name)| project == project_id && name == topic)
        {
            return Ok(CreateOutcome::AlreadyExists);
        }
        state
            .topics
            .push((project_id.to_string(), topic.to_string()));
        Ok(CreateOutcome::Created)
    }

    async fn create_subscription(
        &self,
        project_id: &str,
        request: &SubscriptionRequest,
    ) -> Result<CreateOutcome, BrokerError> {
        let mut state = self.state.lock();
        state
            .calls
            .push(BrokerCall::CreateSubscription(request.name.clone()));
        if let Some(err) = rejection(&state, &request.name) {
            return Err(err);
        }
        if state
            .subscriptions
            .iter()
            .any(|(project, sub)| project == project_id && sub.name == request.name)
        {
            return Ok(CreateOutcome::AlreadyExists);
        }
        let topic = short_name(&request.topic_path);
        if !state
            .topics
            .iter()
            .any(|(project, name)| project == project_id && name == topic)
        {
            return Err(BrokerError::Rejected {
                status: 404,
                message: format!("NOT_FOUND: Topic not found: {}", request.topic_path),
            });
        }
        state
            .subscriptions
            .push((project_id.to_string(), request.clone()));
        Ok(CreateOutcome::Created)
    }

    async fn list_topics(&self, project_id: &str) -> Result<Vec<String>, BrokerError> {
        let mut state = self.state.lock();
        state.calls.push(BrokerCall::ListTopics);
        if let Some(reason) = &state.listing_failure {
            return Err(BrokerError::Transport(reason.clone()));
        }
        Ok(state
            .topics
            .iter()
            .filter(|(project, name)| project == project_id && !state.hidden.contains(name))
            .map(|(_, name)| name.clone())
            .collect())
    }

    async fn list_subscriptions(
        &self,
        project_id: &str,
    ) -> Result<Vec<SubscriptionListing>, BrokerError> {
        let mut state = self.state.lock();
        state.calls.push(BrokerCall::ListSubscriptions);
        if let Some(reason) = &state.listing_failure {
            return Err(BrokerError::Transport(reason.clone()));
        }
        Ok(state
            .subscriptions
            .iter()
            .filter(|(project, sub)| project == project_id && !state.hidden.contains(&sub.name))
            .map(|(_, sub)| SubscriptionListing {
                name: sub.name.clone(),
                topic_path: sub.topic_path.clone(),
                push_endpoint: Some(sub.push_endpoint.clone()),
            })
            .collect())
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
