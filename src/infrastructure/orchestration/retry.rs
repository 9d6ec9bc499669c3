//! Bounded polling with a fixed delay.
//!
//! One abstraction serves both readiness gates: a probe function, a maximum
//! number of attempts and a delay between them. Polling stops early when the
//! shutdown flag is raised.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::debug;

use super::shutdown::{is_shutdown, wait_for_shutdown};
use crate::infrastructure::config::retry::RetryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.delay())
    }
}

/// How a polling loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T, E> {
    Succeeded { value: T, attempts: u32 },
    Exhausted { attempts: u32, last_error: E },
    Cancelled { attempts: u32 },
}

impl<T, E> RetryOutcome<T, E> {
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::Cancelled { attempts } => *attempts,
        }
    }
}

/// Call `probe` until it succeeds, the attempt budget runs out, or shutdown
/// is requested.
///
/// `probe` receives the 1-based attempt number. A `max_attempts` of zero is
/// treated as one.
pub async fn poll<T, E, F, Fut>(
    policy: RetryPolicy,
    shutdown: &mut watch::Receiver<bool>,
    target: &str,
    mut probe: F,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        if is_shutdown(shutdown) {
            return RetryOutcome::Cancelled { attempts: attempt };
        }
        attempt += 1;

        let result = tokio::select! {
            result = probe(attempt) => result,
            () = wait_for_shutdown(shutdown) => {
                return RetryOutcome::Cancelled { attempts: attempt };
            }
        };

        match result {
            Ok(value) => {
                return RetryOutcome::Succeeded {
                    value,
                    attempts: attempt,
                }
            }
            Err(err) if attempt >= max_attempts => {
                return RetryOutcome::Exhausted {
                    attempts: attempt,
                    last_error: err,
                }
            }
            Err(err) => {
                debug!(
                    target_name = target,
                    attempt,
                    max_attempts,
                    error = %err,
                    "Probe failed, retrying"
                );
            }
        }

        tokio::select! {
            () = sleep(policy.delay) => {}
            () = wait_for_shutdown(shutdown) => {
                return RetryOutcome::Cancelled { attempts: attempt };
            }
        }
    }
}
