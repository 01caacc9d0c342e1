//! Fixed-interval polling with an attempt budget.
//!
//! The policy is data, not control flow: a [`PollPolicy`] says how many
//! delayed attempts may be made and how long to wait before each one, and
//! [`poll_until`] applies it to any async probe with a termination predicate.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long the translation workflow is given to finish.
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(60);
/// Wait before every poll.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    /// Derive the attempt count from a total time budget: `budget / interval`.
    pub fn from_budget(budget: Duration, interval: Duration) -> Self {
        let attempts = budget.as_millis() / interval.as_millis().max(1);
        Self {
            max_attempts: u32::try_from(attempts).unwrap_or(u32::MAX),
            interval,
        }
    }
}

impl Default for PollPolicy {
    /// 60 s / 5 s = 12 attempts.
    fn default() -> Self {
        Self::from_budget(DEFAULT_BUDGET, DEFAULT_INTERVAL)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum PollError<E> {
    /// `attempts` probes ran and none satisfied the predicate.
    Exhausted { attempts: u32 },
    /// A probe itself failed.
    Failed(E),
}

/// Sleep, probe, and repeat until `done` accepts a value.
///
/// Each attempt is preceded by `policy.interval`. The budget is checked
/// before each attempt, so a probe that never satisfies `done` runs exactly
/// `policy.max_attempts` times. Probe errors end polling immediately.
pub async fn poll_until<T, E, F, Fut, P>(
    policy: &PollPolicy,
    mut probe: F,
    mut done: P,
) -> Result<T, PollError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&T) -> bool,
{
    let mut attempts = 0;
    loop {
        if attempts >= policy.max_attempts {
            return Err(PollError::Exhausted { attempts });
        }
        attempts += 1;
        tokio::time::sleep(policy.interval).await;

        let value = probe(attempts).await.map_err(PollError::Failed)?;
        if done(&value) {
            return Ok(value);
        }
    }
}
