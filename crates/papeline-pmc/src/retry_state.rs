//! Retry/Backoff Policy (C3), modeled explicitly as a state machine per
//! item so fault-sequence tests can assert exact attempt counts rather
//! than inferring them from a plain loop.

use papeline_core::{BackoffPolicy, PmcError};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Idle,
    Scheduled,
    InFlight,
    Succeeded,
    Failed,
    Retrying(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Retriable,
    FatalForItem,
    FatalForBatch,
}

/// Classify a failure per §4.3. Note this is a finer classification than
/// [`papeline_core::ErrorKind::is_retryable`]: `ParseError` is retriable
/// *here* specifically because it represents "malformed-but-non-empty
/// response", which the generic error-kind taxonomy doesn't distinguish
/// from a structurally-unparseable local file.
pub fn classify(err: &PmcError) -> FailureClass {
    match err {
        PmcError::NetworkError(_) | PmcError::ParseError(_) => FailureClass::Retriable,
        PmcError::ConfigError(_) => FailureClass::FatalForBatch,
        _ => FailureClass::FatalForItem,
    }
}

fn sleep_cancellable(duration: Duration, cancelled: &dyn Fn() -> bool) {
    const SLICE: Duration = Duration::from_millis(100);
    let mut remaining = duration;
    while remaining > Duration::ZERO {
        if cancelled() {
            return;
        }
        let step = remaining.min(SLICE);
        std::thread::sleep(step);
        remaining -= step;
    }
}

/// Result of running an item through the retry state machine.
pub struct RetryOutcome<T> {
    pub result: Result<T, PmcError>,
    pub attempts: u32,
    pub final_state: RetryState,
}

/// Run `attempt` up to `max_attempts` times, honoring `policy`'s backoff
/// schedule between retriable failures, and observing `cancelled` both
/// before each attempt and during backoff sleeps.
pub fn retry_with_backoff<T>(
    max_attempts: u32,
    policy: &BackoffPolicy,
    cancelled: &dyn Fn() -> bool,
    mut attempt: impl FnMut(u32) -> Result<T, PmcError>,
) -> RetryOutcome<T> {
    let mut state = RetryState::Scheduled;
    let mut last_err: Option<PmcError> = None;

    for k in 1..=max_attempts.max(1) {
        if cancelled() {
            return RetryOutcome {
                result: Err(PmcError::Cancelled),
                attempts: k.saturating_sub(1),
                final_state: RetryState::Failed,
            };
        }
        state = RetryState::InFlight;

        match attempt(k) {
            Ok(value) => {
                let _ = state;
                return RetryOutcome {
                    result: Ok(value),
                    attempts: k,
                    final_state: RetryState::Succeeded,
                };
            }
            Err(e) => {
                let class = classify(&e);
                if class == FailureClass::Retriable && k < max_attempts {
                    state = RetryState::Retrying(k);
                    sleep_cancellable(policy.delay_for_attempt(k + 1), cancelled);
                    last_err = Some(e);
                    continue;
                }
                return RetryOutcome {
                    result: Err(e),
                    attempts: k,
                    final_state: RetryState::Failed,
                };
            }
        }
    }

    RetryOutcome {
        result: Err(last_err.unwrap_or(PmcError::Cancelled)),
        attempts: max_attempts,
        final_state: RetryState::Failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn succeeds_on_first_attempt_without_retry() {
        let policy = BackoffPolicy::default();
        let outcome = retry_with_backoff(3, &policy, &|| false, |_k| Ok::<_, PmcError>(42));
        assert_eq!(outcome.result.unwrap(), 42);
        assert_eq!(outcome.attempts, 1);
    }

    #[test]
    fn retries_network_errors_up_to_limit() {
        let calls = AtomicU32::new(0);
        let policy = BackoffPolicy { base: Duration::from_millis(1), cap: Duration::from_millis(5) };
        let outcome = retry_with_backoff(3, &policy, &|| false, |_k| {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(PmcError::NetworkError("boom".to_string()))
        });
        assert!(outcome.result.is_err());
        assert_eq!(outcome.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn fatal_for_item_error_does_not_retry() {
        let calls = AtomicU32::new(0);
        let policy = BackoffPolicy::default();
        let outcome = retry_with_backoff(3, &policy, &|| false, |_k| {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(PmcError::NotFound("missing".to_string()))
        });
        assert_eq!(outcome.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let policy = BackoffPolicy { base: Duration::from_millis(1), cap: Duration::from_millis(5) };
        let calls = AtomicU32::new(0);
        let outcome = retry_with_backoff(5, &policy, &|| false, |_k| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(PmcError::NetworkError("transient".to_string()))
            } else {
                Ok(())
            }
        });
        assert!(outcome.result.is_ok());
        assert_eq!(outcome.attempts, 3);
    }

    #[test]
    fn cancellation_short_circuits_before_first_attempt() {
        let policy = BackoffPolicy::default();
        let outcome = retry_with_backoff(3, &policy, &|| true, |_k| Ok::<_, PmcError>(1));
        assert!(matches!(outcome.result, Err(PmcError::Cancelled)));
        assert_eq!(outcome.attempts, 0);
    }
}
