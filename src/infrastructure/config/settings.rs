//! Provisioner configuration loading and validation.
//!
//! Provides [`Settings`], the validated topology plus the ambient sections
//! (logging, retry, reconcile, http). The document is JSON unless the path
//! ends in `.toml`. Environment variables override the project id and the
//! broker endpoint, and may select another document.
//!
//! # Example
//!
//! ```no_run
//! use meshprov::infrastructure::config::settings::ConfigLoader;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = ConfigLoader::resolve(None).load()?;
//!     settings.logging.init();
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::http::HttpConfig;
use super::logging::LoggingConfig;
use super::reconcile::ReconcileConfig;
use super::retry::RetryConfig;
use crate::domain::topology::{
    ack_deadline_error, HealthCheck, Subscription, TopologyConfig, DEFAULT_ACK_DEADLINE_SECONDS,
};
use crate::error::{ConfigError, Result};

/// Document read when neither the CLI nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "pubsub-config.json";
pub const DEFAULT_PROJECT_ID: &str = "local-project";
pub const DEFAULT_BROKER_ENDPOINT: &str = "localhost:8085";

/// Overrides the document's project id.
pub const ENV_PROJECT_ID: &str = "PUBSUB_PROJECT_ID";
/// Overrides the document's broker endpoint.
pub const ENV_BROKER_HOST: &str = "PUBSUB_EMULATOR_HOST";
/// Selects an alternate configuration document.
pub const ENV_CONFIG_PATH: &str = "MESHPROV_CONFIG";

/// Serialization format of the configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

/// Where environment overrides are read from.
#[derive(Debug, Clone, Default)]
pub enum EnvOverrides {
    /// The process environment.
    #[default]
    Process,
    /// A fixed set of variables; anything absent is unset.
    Fixed(HashMap<String, String>),
}

impl EnvOverrides {
    /// No overrides at all.
    #[must_use]
    pub fn none() -> Self {
        Self::Fixed(HashMap::new())
    }

    #[must_use]
    pub fn fixed<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Fixed(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Value of `key`, ignoring blank values.
    #[must_use]
    pub fn var(&self, key: &str) -> Option<String> {
        let value = match self {
            Self::Process => std::env::var(key).ok(),
            Self::Fixed(vars) => vars.get(key).cloned(),
        };
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct TopologyDocument {
    #[serde(default, alias = "projectId")]
    project_id: Option<String>,
    #[serde(default, alias = "brokerEndpoint", alias = "broker_endpoint")]
    emulator_host: Option<String>,
    #[serde(default)]
    topics: Option<Vec<String>>,
    #[serde(default)]
    subscriptions: Option<Vec<SubscriptionDocument>>,
    #[serde(default, alias = "healthChecks")]
    health_checks: Vec<HealthCheckDocument>,
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    retry: RetryConfig,
    #[serde(default)]
    reconcile: ReconcileConfig,
    #[serde(default)]
    http: HttpConfig,
}

#[derive(Debug, Deserialize)]
struct SubscriptionDocument {
    name: String,
    topic: String,
    #[serde(alias = "pushEndpoint")]
    push_endpoint: String,
    #[serde(default, alias = "ackDeadlineSeconds")]
    ack_deadline_seconds: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct HealthCheckDocument {
    #[serde(alias = "serviceName", alias = "service_name")]
    service: String,
    endpoint: String,
}

impl SubscriptionDocument {
    fn into_subscription(self) -> std::result::Result<Subscription, ConfigError> {
        let ack_deadline = match self.ack_deadline_seconds {
            None => DEFAULT_ACK_DEADLINE_SECONDS,
            // Range is checked by `TopologyConfig::validate`.
            Some(seconds) => {
                u32::try_from(seconds).map_err(|_| ack_deadline_error(&self.name, seconds))?
            }
        };
        Ok(Subscription::new(self.name, self.topic, self.push_endpoint)
            .with_ack_deadline(ack_deadline))
    }
}

/// Validated provisioner configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub topology: TopologyConfig,
    pub logging: LoggingConfig,
    pub retry: RetryConfig,
    pub reconcile: ReconcileConfig,
    pub http: HttpConfig,
}

impl Settings {
    /// Build settings around an already validated topology, with default
    /// ambient sections.
    #[must_use]
    pub fn with_topology(topology: TopologyConfig) -> Self {
        Self {
            topology,
            logging: LoggingConfig::default(),
            retry: RetryConfig::default(),
            reconcile: ReconcileConfig::default(),
            http: HttpConfig::default(),
        }
    }

    /// Parse and validate a configuration document.
    ///
    /// Environment overrides are applied before validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the content is malformed, `topics` or
    /// `subscriptions` is missing, or any invariant fails.
    pub fn parse(content: &str, format: ConfigFormat, env: &EnvOverrides) -> Result<Self> {
        let document: TopologyDocument = match format {
            ConfigFormat::Json => serde_json::from_str(content).map_err(ConfigError::ParseJson)?,
            ConfigFormat::Toml => toml::from_str(content).map_err(ConfigError::ParseToml)?,
        };

        let topics = document
            .topics
            .ok_or(ConfigError::MissingField { field: "topics" })?;
        let subscriptions = document
            .subscriptions
            .ok_or(ConfigError::MissingField {
                field: "subscriptions",
            })?
            .into_iter()
            .map(SubscriptionDocument::into_subscription)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let project_id = env
            .var(ENV_PROJECT_ID)
            .or(document.project_id)
            .unwrap_or_else(|| DEFAULT_PROJECT_ID.to_string());
        let broker_endpoint = env
            .var(ENV_BROKER_HOST)
            .or(document.emulator_host)
            .unwrap_or_else(|| DEFAULT_BROKER_ENDPOINT.to_string());

        let settings = Self {
            topology: TopologyConfig {
                project_id,
                broker_endpoint,
                topics,
                subscriptions,
                health_checks: document
                    .health_checks
                    .into_iter()
                    .map(|check| HealthCheck::new(check.service, check.endpoint))
                    .collect(),
            },
            logging: document.logging,
            retry: document.retry,
            reconcile: document.reconcile,
            http: document.http,
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or [`Settings::parse`]
    /// fails.
    pub fn load<P: AsRef<Path>>(path: P, env: &EnvOverrides) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, ConfigFormat::from_path(path), env)
    }

    fn validate(&self) -> Result<()> {
        self.topology.validate()?;

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.max_attempts",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.reconcile.max_in_flight == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reconcile.max_in_flight",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.http.timeout_ms == 0 || self.http.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http",
                reason: "timeouts must be greater than 0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Resolves the configuration document and loads it.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: PathBuf,
    env: EnvOverrides,
}

impl ConfigLoader {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env: EnvOverrides::Process,
        }
    }

    /// Pick the document: explicit path, then `MESHPROV_CONFIG`, then
    /// [`DEFAULT_CONFIG_PATH`].
    #[must_use]
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        let env = EnvOverrides::Process;
        let path = explicit
            .or_else(|| env.var(ENV_CONFIG_PATH).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self { path, env }
    }

    #[must_use]
    pub fn with_env(mut self, env: EnvOverrides) -> Self {
        self.env = env;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// # Errors
    ///
    /// See [`Settings::load`].
    pub fn load(&self) -> Result<Settings> {
        Settings::load(&self.path, &self.env)
    }
}
