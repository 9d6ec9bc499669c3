//! Health probe port used for readiness gating.

use async_trait::async_trait;

use crate::error::ProbeError;

/// Single-shot readiness probe against a service health endpoint.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Succeeds when the service at `url` reports healthy.
    async fn probe(&self, url: &str) -> Result<(), ProbeError>;
}
