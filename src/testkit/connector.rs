//! Connector that hands out shared fakes.

use std::sync::Arc;

use parking_lot::Mutex;

use super::broker::InMemoryBroker;
use super::probe::ScriptedProbe;
use crate::infrastructure::config::settings::Settings;
use crate::infrastructure::factory::connector::Connector;
use crate::port::outbound::broker::BrokerAdmin;
use crate::port::outbound::probe::HealthProbe;

/// Returns the same broker and probe for every run and records which broker
/// endpoint each run asked for.
pub struct StaticConnector {
    broker: Arc<InMemoryBroker>,
    probe: Arc<ScriptedProbe>,
    requested: Mutex<Vec<String>>,
}

impl StaticConnector {
    #[must_use]
    pub fn new(broker: Arc<InMemoryBroker>, probe: Arc<ScriptedProbe>) -> Self {
        Self {
            broker,
            probe,
            requested: Mutex::new(Vec::new()),
        }
    }

    /// A fresh empty broker and a probe with no healthy endpoints.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(
            Arc::new(InMemoryBroker::new()),
            Arc::new(ScriptedProbe::new()),
        )
    }

    #[must_use]
    pub fn broker_handle(&self) -> Arc<InMemoryBroker> {
        Arc::clone(&self.broker)
    }

    #[must_use]
    pub fn probe_handle(&self) -> Arc<ScriptedProbe> {
        Arc::clone(&self.probe)
    }

    /// Broker endpoints requested so far, one per run.
    #[must_use]
    pub fn requested_endpoints(&self) -> Vec<String> {
        self.requested.lock().clone()
    }
}

impl Connector for StaticConnector {
    fn broker(&self, settings: &Settings) -> Arc<dyn BrokerAdmin> {
        self.requested
            .lock()
            .push(settings.topology.broker_endpoint.clone());
        self.broker.clone()
    }

    fn probe(&self, _settings: &Settings) -> Arc<dyn HealthProbe> {
        self.probe.clone()
    }
}
