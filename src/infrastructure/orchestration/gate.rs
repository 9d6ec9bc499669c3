//! Startup gates: broker availability (fatal) and dependency readiness
//! (advisory).

use futures_util::future::join_all;
use tokio::sync::watch;
use tracing::{info, warn};

use super::retry::{poll, RetryOutcome, RetryPolicy};
use crate::domain::report::{HealthOutcome, HealthReport};
use crate::domain::topology::HealthCheck;
use crate::error::{Error, Result};
use crate::port::outbound::broker::BrokerAdmin;
use crate::port::outbound::probe::HealthProbe;

/// Poll the broker until it answers.
///
/// Returns the number of probes it took.
///
/// # Errors
///
/// Returns [`Error::BrokerUnavailable`] once the retry budget is spent, or
/// [`Error::Cancelled`] on shutdown.
pub async fn await_broker(
    broker: &dyn BrokerAdmin,
    policy: RetryPolicy,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<u32> {
    info!(
        endpoint = broker.endpoint(),
        max_attempts = policy.max_attempts,
        "Waiting for broker"
    );

    match poll(policy, shutdown, broker.endpoint(), move |_| broker.ping()).await {
        RetryOutcome::Succeeded { attempts, .. } => {
            info!(endpoint = broker.endpoint(), attempts, "Broker is reachable");
            Ok(attempts)
        }
        RetryOutcome::Exhausted {
            attempts,
            last_error,
        } => Err(Error::BrokerUnavailable {
            endpoint: broker.endpoint().to_string(),
            attempts,
            reason: last_error.to_string(),
        }),
        RetryOutcome::Cancelled { .. } => Err(Error::Cancelled),
    }
}

/// Poll every declared health endpoint concurrently.
///
/// A check that never succeeds is reported as timed out; it never fails the
/// run.
///
/// # Errors
///
/// Returns [`Error::Cancelled`] if shutdown interrupted any check.
pub async fn await_dependencies(
    probe: &dyn HealthProbe,
    checks: &[HealthCheck],
    policy: RetryPolicy,
    shutdown: &watch::Receiver<bool>,
) -> Result<Vec<HealthReport>> {
    if checks.is_empty() {
        return Ok(Vec::new());
    }
    info!(services = checks.len(), "Waiting for dependencies");

    let polls = checks.iter().map(|check| {
        let mut shutdown = shutdown.clone();
        async move {
            let url = check.url();
            let url = url.as_str();
            let outcome = poll(policy, &mut shutdown, &check.service_name, move |_| {
                probe.probe(url)
            })
            .await;
            (check, outcome)
        }
    });

    let mut reports = Vec::with_capacity(checks.len());
    for (check, outcome) in join_all(polls).await {
        let outcome = match outcome {
            RetryOutcome::Succeeded { attempts, .. } => {
                info!(service = %check.service_name, attempts, "Dependency ready");
                HealthOutcome::Ready { attempts }
            }
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                warn!(
                    service = %check.service_name,
                    endpoint = %check.endpoint,
                    attempts,
                    error = %last_error,
                    "Dependency not ready, continuing without it"
                );
                HealthOutcome::TimedOut {
                    attempts,
                    last_error: last_error.to_string(),
                }
            }
            RetryOutcome::Cancelled { .. } => return Err(Error::Cancelled),
        };
        reports.push(HealthReport {
            service: check.service_name.clone(),
            endpoint: check.endpoint.clone(),
            outcome,
        });
    }

    Ok(reports)
}
