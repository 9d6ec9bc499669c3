use std::sync::Arc;

use crate::adapter::outbound::probe::HttpProbe;
use crate::adapter::outbound::pubsub::client::PubSubClient;
use crate::infrastructure::config::settings::Settings;
use crate::port::outbound::broker::BrokerAdmin;
use crate::port::outbound::probe::HealthProbe;

/// Builds the outbound adapters for one run.
pub trait Connector: Send + Sync {
    fn broker(&self, settings: &Settings) -> Arc<dyn BrokerAdmin>;

    fn probe(&self, settings: &Settings) -> Arc<dyn HealthProbe>;
}

/// Real HTTP adapters: the Pub/Sub REST client and an HTTP health probe.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    fn broker(&self, settings: &Settings) -> Arc<dyn BrokerAdmin> {
        Arc::new(PubSubClient::from_config(
            settings.topology.broker_endpoint.clone(),
            &settings.http,
        ))
    }

    fn probe(&self, settings: &Settings) -> Arc<dyn HealthProbe> {
        Arc::new(HttpProbe::from_config(&settings.http))
    }
}
