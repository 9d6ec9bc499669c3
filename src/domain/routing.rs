//! Event-routing (fan-out) table.

use serde::Serialize;

use super::topology::TopologyConfig;

/// Push endpoints consuming one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub topic: String,
    /// Push endpoints in subscription declaration order.
    pub endpoints: Vec<String>,
}

/// Which services consume which topic.
///
/// Routes follow topic declaration order; a topic without subscribers is
/// listed with no endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RoutingMap {
    routes: Vec<Route>,
}

impl RoutingMap {
    #[must_use]
    pub fn from_topology(topology: &TopologyConfig) -> Self {
        let routes = topology
            .topics
            .iter()
            .map(|topic| Route {
                topic: topic.clone(),
                endpoints: topology
                    .subscriptions_for(topic)
                    .map(|s| s.push_endpoint.clone())
                    .collect(),
            })
            .collect();
        Self { routes }
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Endpoints subscribed to `topic`, or `None` if the topic is not declared.
    #[must_use]
    pub fn endpoints(&self, topic: &str) -> Option<&[String]> {
        self.routes
            .iter()
            .find(|route| route.topic == topic)
            .map(|route| route.endpoints.as_slice())
    }

    /// Number of declared delivery pipes across all topics.
    #[must_use]
    pub fn pipe_count(&self) -> usize {
        self.routes.iter().map(|route| route.endpoints.len()).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
