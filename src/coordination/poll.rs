//! Polling and retry combinators
//!
//! Every wait in the orchestrator goes through `poll_until`: probe, sleep for
//! the interval, probe again, until the probe yields a value or the deadline
//! expires. A probe error ends the wait at once; only "not yet" is retried.

use crate::error::{OrchestratorError, OrchestratorResult};

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// How often to probe and for how long
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    /// `None` waits forever
    pub timeout: Option<Duration>,
}

impl PollSchedule {
    pub fn bounded(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout: Some(timeout),
        }
    }

    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            timeout: None,
        }
    }
}

/// Probe until it yields `Some`, failing with `Timeout` naming `description`
pub async fn poll_until<T, F, Fut>(
    description: &str,
    schedule: PollSchedule,
    mut probe: F,
) -> OrchestratorResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = OrchestratorResult<Option<T>>>,
{
    debug!("Waiting for {}", description);

    match schedule.timeout {
        Some(limit) => timeout(limit, probe_forever(schedule.interval, &mut probe))
            .await
            .map_err(|_| OrchestratorError::timeout(description))?,
        None => probe_forever(schedule.interval, &mut probe).await,
    }
}

async fn probe_forever<T, F, Fut>(interval: Duration, probe: &mut F) -> OrchestratorResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = OrchestratorResult<Option<T>>>,
{
    loop {
        if let Some(value) = probe().await? {
            return Ok(value);
        }
        sleep(interval).await;
    }
}

/// Run `op` up to `attempts` times with a fixed `delay` between attempts.
///
/// Returns the first success or the last error.
pub async fn retry<T, E, F, Fut>(
    description: &str,
    attempts: u32,
    delay: Duration,
    mut op: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}/{}", description, attempt, max_attempts);
                }
                return Ok(value);
            }
            Err(e) if attempt < max_attempts => {
                warn!(
                    "{} failed (attempt {}/{}): {}",
                    description, attempt, max_attempts, e
                );
                sleep(delay).await;
            }
            Err(e) => {
                warn!("{} failed after {} attempts: {}", description, max_attempts, e);
                return Err(e);
            }
        }
    }
}
