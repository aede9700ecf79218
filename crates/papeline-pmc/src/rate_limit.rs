//! Rate Limiter & Credential Pool (C2).
//!
//! Scoped per [`crate::orchestrator::Orchestrator`] and passed in
//! explicitly rather than held in a process-wide singleton — a shared
//! static would make testing the rate-limit property against a fixed
//! clock effectively impossible, since every test in the process would
//! contend for the same bucket.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A process-local (per-instance) token bucket. Capacity equals the
/// configured rate; tokens replenish continuously at `rate` per second.
pub struct TokenBucket {
    rate: f64,
    capacity: f64,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// `rate` is requests/second: 10 with an API key configured, else 3
    /// (§4.2).
    pub fn new(rate: u32) -> Self {
        let rate = rate as f64;
        Self {
            rate,
            capacity: rate,
            state: Mutex::new(BucketState {
                tokens: rate,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn for_api_key(has_api_key: bool) -> Self {
        Self::new(if has_api_key { 10 } else { 3 })
    }

    /// Block the calling thread until a token is available, then consume
    /// it. Cooperative: checks `cancelled` between sleeps so callers can
    /// observe cancellation instead of blocking forever.
    pub fn acquire(&self, cancelled: &dyn Fn() -> bool) -> Result<(), papeline_core::PmcError> {
        loop {
            if cancelled() {
                return Err(papeline_core::PmcError::Cancelled);
            }
            let wait = {
                let mut state = self.state.lock().expect("token bucket lock poisoned");
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    None
                } else {
                    Some(Duration::from_secs_f64((1.0 - state.tokens) / self.rate))
                }
            };
            match wait {
                None => return Ok(()),
                Some(d) => std::thread::sleep(d.min(Duration::from_millis(100))),
            }
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate).min(self.capacity);
        state.last_refill = now;
    }
}

/// Round-robin rotation over a list of email addresses, thread-safe.
pub struct CredentialPool {
    emails: Vec<String>,
    next: Mutex<usize>,
    api_key: Option<String>,
}

/// Built-in fallback pool, used when no `EMAILS` override is configured.
const DEFAULT_EMAILS: &[&str] = &["anonymous@papeline.dev"];

impl CredentialPool {
    pub fn new(emails: Vec<String>, api_key: Option<String>) -> Self {
        let emails = if emails.is_empty() {
            DEFAULT_EMAILS.iter().map(|s| s.to_string()).collect()
        } else {
            emails
        };
        Self {
            emails,
            next: Mutex::new(0),
            api_key,
        }
    }

    pub fn from_env_var(value: Option<&str>, api_key: Option<String>) -> Self {
        let emails = value
            .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        Self::new(emails, api_key)
    }

    /// Next email in round-robin order, wrapping at the end.
    pub fn next_email(&self) -> String {
        let mut idx = self.next.lock().expect("credential pool lock poisoned");
        let email = self.emails[*idx % self.emails.len()].clone();
        *idx = (*idx + 1) % self.emails.len();
        email
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_defaults_to_3_without_api_key() {
        let bucket = TokenBucket::for_api_key(false);
        assert_eq!(bucket.capacity, 3.0);
    }

    #[test]
    fn rate_is_10_with_api_key() {
        let bucket = TokenBucket::for_api_key(true);
        assert_eq!(bucket.capacity, 10.0);
    }

    #[test]
    fn acquire_does_not_exceed_capacity_bursts() {
        let bucket = TokenBucket::new(3);
        let start = Instant::now();
        for _ in 0..3 {
            bucket.acquire(&|| false).unwrap();
        }
        // First 3 tokens are free (full bucket); the 4th must wait.
        bucket.acquire(&|| false).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[test]
    fn acquire_observes_cancellation() {
        let bucket = TokenBucket::new(3);
        for _ in 0..3 {
            bucket.acquire(&|| false).unwrap();
        }
        let result = bucket.acquire(&|| true);
        assert!(matches!(result, Err(papeline_core::PmcError::Cancelled)));
    }

    #[test]
    fn credential_pool_rotates_round_robin() {
        let pool = CredentialPool::new(
            vec!["a@x.com".to_string(), "b@x.com".to_string()],
            None,
        );
        assert_eq!(pool.next_email(), "a@x.com");
        assert_eq!(pool.next_email(), "b@x.com");
        assert_eq!(pool.next_email(), "a@x.com");
    }

    #[test]
    fn empty_env_var_falls_back_to_default_pool() {
        let pool = CredentialPool::from_env_var(None, None);
        assert_eq!(pool.next_email(), "anonymous@papeline.dev");
    }

    #[test]
    fn env_var_is_parsed_as_comma_separated() {
        let pool = CredentialPool::from_env_var(Some("a@x.com, b@x.com"), Some("key123".to_string()));
        assert_eq!(pool.next_email(), "a@x.com");
        assert_eq!(pool.next_email(), "b@x.com");
        assert!(pool.has_api_key());
        assert_eq!(pool.api_key(), Some("key123"));
    }
}
