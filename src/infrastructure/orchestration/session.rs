//! One provisioning run, as an explicit state machine.
//!
//! ```text
//! Loading ─► GatingBroker ─► GatingDependencies ─► ReconcilingTopics
//!    │            │                                       │
//!    ▼            ▼                                       ▼
//!  Fatal        Fatal        Verifying ◄─ ReconcilingSubscriptions
//!                                │
//!                                ▼
//!                        Ready | Degraded
//! ```
//!
//! Only a configuration error or an unreachable broker ends in `Fatal`.
//! Everything else is accumulated into the [`ProvisioningReport`] and the run
//! always reaches `Verifying`.

use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::gate::{await_broker, await_dependencies};
use super::reconciler::Reconciler;
use super::retry::RetryPolicy;
use super::shutdown::cancellable;
use super::verifier::verify;
use crate::domain::report::{HealthOutcome, Issue, ProvisioningReport, SessionState};
use crate::error::Result;
use crate::infrastructure::config::settings::{ConfigLoader, Settings};
use crate::infrastructure::factory::connector::Connector;

#[derive(Debug)]
pub struct ProvisioningSession {
    run_id: Uuid,
    state: SessionState,
    history: Vec<SessionState>,
}

impl Default for ProvisioningSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ProvisioningSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: SessionState::Loading,
            history: vec![SessionState::Loading],
        }
    }

    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Every state entered so far, in order.
    #[must_use]
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    fn enter(&mut self, state: SessionState) {
        if self.state != state {
            info!(run_id = %self.run_id, from = %self.state, to = %state, "Session transition");
            self.state = state;
            self.history.push(state);
        }
    }

    /// Load and validate the configuration.
    ///
    /// # Errors
    ///
    /// A configuration error moves the session to `Fatal` and is returned.
    pub fn load(&mut self, loader: &ConfigLoader) -> Result<Settings> {
        self.enter(SessionState::Loading);
        loader.load().map_err(|err| {
            self.enter(SessionState::Fatal);
            err
        })
    }

    /// Load the configuration and provision it.
    ///
    /// # Errors
    ///
    /// See [`Self::load`] and [`Self::provision`].
    pub async fn run(
        &mut self,
        loader: &ConfigLoader,
        connector: &dyn Connector,
        shutdown: watch::Receiver<bool>,
    ) -> Result<ProvisioningReport> {
        let settings = self.load(loader)?;
        self.provision(&settings, connector, shutdown).await
    }

    /// Gate, reconcile and verify the declared topology.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::BrokerUnavailable`] (session ends `Fatal`)
    /// when the broker never answers, or [`crate::error::Error::Cancelled`] on
    /// shutdown. Every other
    /// failure is recorded in the returned report.
    pub async fn provision(
        &mut self,
        settings: &Settings,
        connector: &dyn Connector,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<ProvisioningReport> {
        let topology = &settings.topology;
        let policy = RetryPolicy::from(&settings.retry);
        let broker = connector.broker(settings);
        let probe = connector.probe(settings);
        let mut report = ProvisioningReport::new(self.run_id, topology);

        info!(
            run_id = %self.run_id,
            project_id = %topology.project_id,
            broker = %topology.broker_endpoint,
            topics = topology.topics.len(),
            subscriptions = topology.subscriptions.len(),
            health_checks = topology.health_checks.len(),
            "Provisioning started"
        );

        self.enter(SessionState::GatingBroker);
        match await_broker(broker.as_ref(), policy, &mut shutdown).await {
            Ok(attempts) => report.broker_attempts = attempts,
            Err(err) => {
                if err.is_fatal() {
                    error!(run_id = %self.run_id, error = %err, "Broker never became available");
                    self.enter(SessionState::Fatal);
                }
                return Err(err);
            }
        }

        self.enter(SessionState::GatingDependencies);
        report.health =
            await_dependencies(probe.as_ref(), &topology.health_checks, policy, &shutdown).await?;
        for health in &report.health {
            if let HealthOutcome::TimedOut {
                attempts,
                last_error,
            } = &health.outcome
            {
                report.issues.push(Issue::DependencyTimeout {
                    service: health.service.clone(),
                    attempts: *attempts,
                    reason: last_error.clone(),
                });
            }
        }

        let reconciler = Reconciler::new(broker.as_ref(), settings.reconcile.max_in_flight);

        self.enter(SessionState::ReconcilingTopics);
        report.topics = cancellable(&mut shutdown, reconciler.reconcile_topics(topology)).await?;

        self.enter(SessionState::ReconcilingSubscriptions);
        report.subscriptions =
            cancellable(&mut shutdown, reconciler.reconcile_subscriptions(topology)).await?;
        report.record_creation_failures();

        self.enter(SessionState::Verifying);
        let verification = cancellable(&mut shutdown, verify(broker.as_ref(), topology)).await?;
        for resource in report.topics.iter_mut().chain(report.subscriptions.iter_mut()) {
            resource.presence = verification.presence(resource.kind, &resource.name);
        }
        report.issues.extend(verification.issues);

        let terminal = report.terminal_state();
        report.state = terminal;
        report.finished_at = Some(chrono::Utc::now());
        self.enter(terminal);

        if terminal == SessionState::Ready {
            info!(run_id = %self.run_id, "Topology ready");
        } else {
            warn!(
                run_id = %self.run_id,
                issues = report.issues.len(),
                "Topology degraded"
            );
        }

        Ok(report)
    }
}
