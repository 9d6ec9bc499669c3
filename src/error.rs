use std::path::PathBuf;

use thiserror::Error;

/// Configuration-related errors with structured variants.
///
/// Every variant is fatal: the run stops before any network call is made.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("subscription '{subscription}' references undeclared topic '{topic}'")]
    UnknownTopic { subscription: String, topic: String },

    #[error("duplicate {kind} name: {name}")]
    Duplicate { kind: &'static str, name: String },

    #[error("failed to read config file {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ParseJson(#[source] serde_json::Error),

    #[error("failed to parse config: {0}")]
    ParseToml(#[source] toml::de::Error),
}

/// Failures reported by a broker admin adapter.
///
/// "Already exists" is not an error: adapters map it to
/// [`CreateOutcome::AlreadyExists`](crate::port::outbound::broker::CreateOutcome).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("broker rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

/// Failures reported by a health probe.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("unhealthy status {0}")]
    Status(u16),

    #[error("unreachable: {0}")]
    Transport(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("broker at {endpoint} unavailable after {attempts} attempts: {reason}")]
    BrokerUnavailable {
        endpoint: String,
        attempts: u32,
        reason: String,
    },

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("provisioning cancelled")]
    Cancelled,

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// True for the error kinds that end a run in the `Fatal` state.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::BrokerUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for BrokerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BrokerError::Decode(err.to_string())
        } else {
            BrokerError::Transport(err.to_string())
        }
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        ProbeError::Transport(err.to_string())
    }
}
