//! Bounded polling and keyed retry for eventually consistent providers.
//!
//! Provisioning is strictly sequential, so both helpers block the calling
//! thread between attempts.

use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl WaitPolicy {
    pub const fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    pub const fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(60), Duration::from_secs(2))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaitError<E> {
    #[error("condition not met after {attempts} checks ({elapsed:?})")]
    TimedOut { attempts: u32, elapsed: Duration },
    #[error("readiness check failed: {0}")]
    Check(E),
}

/// Polls `predicate` until it reports true or `policy.timeout` elapses.
/// A predicate error ends the wait immediately.
pub fn wait_until<E>(
    policy: WaitPolicy,
    mut predicate: impl FnMut() -> Result<bool, E>,
) -> Result<(), WaitError<E>> {
    let started = Instant::now();
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        if predicate().map_err(WaitError::Check)? {
            return Ok(());
        }
        let elapsed = started.elapsed();
        if elapsed >= policy.timeout {
            return Err(WaitError::TimedOut { attempts, elapsed });
        }
        thread::sleep(policy.interval.min(policy.timeout - elapsed));
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl RetryPolicy {
    pub const fn no_backoff(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    fn next_backoff(&self, current: Duration) -> Duration {
        current.mul_f64(self.multiplier).min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 6,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(8),
            multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },
    #[error("{0}")]
    Permanent(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { last, .. } => last,
            Self::Permanent(error) => error,
        }
    }
}

/// Runs `op`, retrying with exponential backoff only while `is_retryable`
/// accepts the error.
pub fn retry_when<T, E>(
    policy: RetryPolicy,
    is_retryable: impl Fn(&E) -> bool,
    mut on_retry: impl FnMut(u32, &E, Duration),
    mut op: impl FnMut() -> Result<T, E>,
) -> Result<T, RetryError<E>> {
    let mut attempt = 0u32;
    let mut backoff = policy.initial_backoff;
    loop {
        attempt += 1;
        match op() {
            Ok(value) => return Ok(value),
            Err(error) if !is_retryable(&error) => return Err(RetryError::Permanent(error)),
            Err(error) if attempt > policy.max_retries => {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: error,
                })
            }
            Err(error) => {
                on_retry(attempt, &error, backoff);
                thread::sleep(backoff);
                backoff = policy.next_backoff(backoff);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn wait_returns_once_predicate_holds() {
        let checks = Cell::new(0);
        let policy = WaitPolicy::new(Duration::from_secs(5), Duration::ZERO);

        wait_until(policy, || {
            checks.set(checks.get() + 1);
            Ok::<_, String>(checks.get() == 3)
        })
        .expect("predicate should eventually hold");

        assert_eq!(checks.get(), 3);
    }

    #[test]
    fn wait_times_out_when_predicate_never_holds() {
        let error = wait_until(WaitPolicy::immediate(), || Ok::<_, String>(false))
            .expect_err("wait should time out");
        assert!(matches!(error, WaitError::TimedOut { attempts: 1, .. }));
    }

    #[test]
    fn wait_stops_on_check_error() {
        let checks = Cell::new(0);
        let error = wait_until(
            WaitPolicy::new(Duration::from_secs(5), Duration::ZERO),
            || {
                checks.set(checks.get() + 1);
                Err::<bool, _>("access denied".to_string())
            },
        )
        .expect_err("check error should surface");

        assert_eq!(error, WaitError::Check("access denied".to_string()));
        assert_eq!(checks.get(), 1);
    }

    #[test]
    fn retries_only_retryable_errors() {
        let calls = Cell::new(0);
        let result = retry_when(
            RetryPolicy::no_backoff(5),
            |error: &&str| *error == "denied",
            |_, _, _| {},
            || {
                calls.set(calls.get() + 1);
                match calls.get() {
                    1 | 2 => Err("denied"),
                    _ => Ok(42),
                }
            },
        );

        assert_eq!(result, Ok(42));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn permanent_error_is_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), _> = retry_when(
            RetryPolicy::no_backoff(5),
            |error: &&str| *error == "denied",
            |_, _, _| {},
            || {
                calls.set(calls.get() + 1);
                Err("invalid")
            },
        );

        assert_eq!(result, Err(RetryError::Permanent("invalid")));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn retry_gives_up_after_max_retries() {
        let mut retries_seen = Vec::new();
        let result: Result<(), _> = retry_when(
            RetryPolicy::no_backoff(2),
            |_: &&str| true,
            |attempt, _, _| retries_seen.push(attempt),
            || Err("denied"),
        );

        assert_eq!(
            result,
            Err(RetryError::Exhausted {
                attempts: 3,
                last: "denied"
            })
        );
        assert_eq!(retries_seen, vec![1, 2]);
    }

    #[test]
    fn backoff_grows_up_to_the_cap() {
        let policy = RetryPolicy::default();
        let mut backoff = policy.initial_backoff;
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(backoff.as_secs());
            backoff = policy.next_backoff(backoff);
        }
        assert_eq!(seen, vec![1, 2, 4, 8, 8]);
    }
}
