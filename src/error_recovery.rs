// src/error_recovery.rs
//! Retry policy for gateway fetches.
//!
//! Only 404 is bounded. Every other failure is retried until it clears,
//! with a fixed pause; a fetch that never recovers blocks its caller
//! indefinitely, so bounded-time deployments must wrap the whole
//! per-root resolution in their own timeout.

use crate::constants::{NOT_FOUND_MAX_ATTEMPTS, NOT_FOUND_RETRY_DELAY, TRANSIENT_RETRY_DELAY};
use crate::error::NetworkFailureKind;
use std::future::Future;
use std::time::Duration;

/// How one failed attempt went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// 2xx with a body that failed the type's validator, or was not JSON
    InvalidPayload(String),
    NotFound,
    /// Any non-2xx status other than 404
    HttpStatus(u16),
    Transport(NetworkFailureKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

/// Fixed delays and the 404 bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub not_found_max_attempts: u32,
    pub not_found_delay: Duration,
    pub transient_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            not_found_max_attempts: NOT_FOUND_MAX_ATTEMPTS,
            not_found_delay: NOT_FOUND_RETRY_DELAY,
            transient_delay: TRANSIENT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Same shape with every delay scaled down, for stub gateways.
    pub fn with_delays(not_found_delay: Duration, transient_delay: Duration) -> Self {
        Self {
            not_found_delay,
            transient_delay,
            ..Self::default()
        }
    }
}

/// Counters for one fetch. 404s are counted on their own so that
/// transient failures in between do not use up the 404 budget.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    pub attempts: u32,
    pub not_found_attempts: u32,
}

impl RetryState {
    pub fn record(&mut self, failure: &AttemptFailure, policy: &RetryPolicy) -> RetryDecision {
        self.attempts += 1;
        match failure {
            AttemptFailure::NotFound => {
                self.not_found_attempts += 1;
                if self.not_found_attempts >= policy.not_found_max_attempts {
                    RetryDecision::GiveUp
                } else {
                    RetryDecision::RetryAfter(policy.not_found_delay)
                }
            }
            AttemptFailure::InvalidPayload(_)
            | AttemptFailure::HttpStatus(_)
            | AttemptFailure::Transport(_) => RetryDecision::RetryAfter(policy.transient_delay),
        }
    }
}

/// Returned when the policy gives up; only ever after repeated 404s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetriesExhausted {
    pub attempts: u32,
}

/// Runs `attempt` until it succeeds or the policy gives up.
///
/// The closure receives the 1-based attempt number.
pub async fn retry_with_policy<F, Fut, T>(
    policy: &RetryPolicy,
    mut attempt: F,
) -> Result<T, RetriesExhausted>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AttemptFailure>>,
{
    let mut state = RetryState::default();
    loop {
        match attempt(state.attempts + 1).await {
            Ok(value) => return Ok(value),
            Err(failure) => match state.record(&failure, policy) {
                RetryDecision::RetryAfter(delay) => {
                    log::debug!(
                        "Attempt {} failed ({:?}), retrying after {:?}",
                        state.attempts,
                        failure,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    return Err(RetriesExhausted {
                        attempts: state.attempts,
                    })
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn not_found_gives_up_on_third_attempt() {
        let policy = RetryPolicy::default();
        let mut state = RetryState::default();
        assert_eq!(
            state.record(&AttemptFailure::NotFound, &policy),
            RetryDecision::RetryAfter(NOT_FOUND_RETRY_DELAY)
        );
        assert_eq!(
            state.record(&AttemptFailure::NotFound, &policy),
            RetryDecision::RetryAfter(NOT_FOUND_RETRY_DELAY)
        );
        assert_eq!(
            state.record(&AttemptFailure::NotFound, &policy),
            RetryDecision::GiveUp
        );
        assert_eq!(state.attempts, 3);
    }

    #[test]
    fn transient_failures_never_give_up() {
        let policy = RetryPolicy::default();
        let mut state = RetryState::default();
        for _ in 0..50 {
            assert_eq!(
                state.record(&AttemptFailure::HttpStatus(503), &policy),
                RetryDecision::RetryAfter(TRANSIENT_RETRY_DELAY)
            );
        }
        assert_eq!(
            state.record(
                &AttemptFailure::Transport(NetworkFailureKind::ConnectionReset),
                &policy
            ),
            RetryDecision::RetryAfter(TRANSIENT_RETRY_DELAY)
        );
        assert_eq!(state.not_found_attempts, 0);
    }

    #[test]
    fn interleaved_failures_keep_separate_404_budget() {
        let policy = RetryPolicy::default();
        let mut state = RetryState::default();
        state.record(&AttemptFailure::NotFound, &policy);
        state.record(&AttemptFailure::HttpStatus(500), &policy);
        state.record(&AttemptFailure::NotFound, &policy);
        assert_eq!(
            state.record(&AttemptFailure::InvalidPayload("no label".into()), &policy),
            RetryDecision::RetryAfter(TRANSIENT_RETRY_DELAY)
        );
        assert_eq!(
            state.record(&AttemptFailure::NotFound, &policy),
            RetryDecision::GiveUp
        );
        assert_eq!(state.attempts, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn driver_returns_first_success() {
        let calls = AtomicU32::new(0);
        let result = retry_with_policy(&RetryPolicy::default(), |n| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(AttemptFailure::HttpStatus(500))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn driver_reports_exhaustion() {
        let result: Result<(), _> =
            retry_with_policy(&RetryPolicy::default(), |_| async { Err(AttemptFailure::NotFound) })
                .await;
        assert_eq!(result, Err(RetriesExhausted { attempts: 3 }));
    }
}
