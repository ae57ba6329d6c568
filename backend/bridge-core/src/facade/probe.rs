//! Retry-hardened connectivity check.
//!
//! A consumer may start talking before the other side has published its API.
//! Those first requests go to a port nobody has bound and are never
//! answered, so each attempt is raced against a timeout and retried a
//! bounded number of times.

use crate::error::call::CallError;

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use tokio::time::{Instant, sleep_until as TokioSleepUntil, timeout as TokioTimeout};

/// Outcome of a [`ConnectionProbe`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReport {
    pub attempts: u32,
    pub connected: bool,
}

/// Bounded retry loop around a single connectivity attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionProbe {
    max_attempts: u32,
    attempt_timeout: Duration,
}

impl ConnectionProbe {
    pub fn new(max_attempts: u32, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            attempt_timeout,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Run `attempt` until one succeeds or the attempts are used up.
    ///
    /// Each attempt gets `attempt_timeout`; one that fails early still uses up
    /// its slot before the next starts, so the total wait stays bounded by
    /// `max_attempts * attempt_timeout`. A timed-out attempt is dropped, not
    /// awaited. Never fails: the outcome is in the returned report.
    pub async fn run<F, Fut>(&self, mut attempt: F) -> ProbeReport
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), CallError>>,
    {
        for number in 1..=self.max_attempts {
            let deadline = Instant::now() + self.attempt_timeout;

            match TokioTimeout(self.attempt_timeout, attempt()).await {
                Ok(Ok(())) => {
                    debug!("Connectivity probe succeeded on attempt {number}");
                    return ProbeReport {
                        attempts: number,
                        connected: true,
                    };
                }
                Ok(Err(e)) => {
                    debug!("Connectivity probe attempt {number} failed: {e}");
                    TokioSleepUntil(deadline).await;
                }
                Err(_) => {
                    debug!(
                        "Connectivity probe attempt {number} timed out after {:?}",
                        self.attempt_timeout
                    );
                }
            }
        }

        warn!(
            "Connectivity probe gave up after {} attempts",
            self.max_attempts
        );

        ProbeReport {
            attempts: self.max_attempts,
            connected: false,
        }
    }
}
