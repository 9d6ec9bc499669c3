//! HTTP health probe.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::{debug, warn};

use crate::error::ProbeError;
use crate::infrastructure::config::http::HttpConfig;
use crate::port::outbound::probe::HealthProbe;

/// `GET {url}`; any 2xx is healthy.
pub struct HttpProbe {
    http: HttpClient,
}

impl HttpProbe {
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: HttpClient::new(),
        }
    }

    #[must_use]
    pub fn from_config(config: &HttpConfig) -> Self {
        let http = HttpClient::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });
        Self { http }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn probe(&self, url: &str) -> Result<(), ProbeError> {
        let status = self.http.get(url).send().await?.status();
        debug!(url, status = status.as_u16(), "Health probe answered");
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Status(status.as_u16()))
        }
    }
}
