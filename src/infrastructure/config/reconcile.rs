//! Reconciliation tuning.

use serde::Deserialize;

/// Worker pool bound for resource creation calls.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReconcileConfig {
    /// Create calls in flight at once within a phase.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

const fn default_max_in_flight() -> usize {
    4
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
        }
    }
}
