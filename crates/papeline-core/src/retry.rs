//! Jittered exponential backoff, generalized from the sibling pipelines'
//! plain `2^attempt` backoff to the `base · 2^(k-2)` ± 25% jitter schedule.

use std::time::Duration;

use rand::Rng;

/// Backoff schedule parameters (defaults match the §4.3 contract: 1s base,
/// 30s cap, ±25% jitter).
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub cap: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            cap: Duration::from_secs(30),
        }
    }
}

impl BackoffPolicy {
    /// Delay before attempt `k` (k >= 2; attempt 1 never waits). `base *
    /// 2^(k-2)`, capped, then jittered by up to ±25%.
    pub fn delay_for_attempt(&self, k: u32) -> Duration {
        debug_assert!(k >= 2, "first attempt has no backoff delay");
        let exp = k.saturating_sub(2);
        let raw = self
            .base
            .checked_mul(1u32.checked_shl(exp).unwrap_or(u32::MAX))
            .unwrap_or(self.cap)
            .min(self.cap);
        jitter(raw)
    }
}

/// Apply ±25% jitter to a duration.
fn jitter(d: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let factor = rng.gen_range(0.75..=1.25);
    Duration::from_secs_f64(d.as_secs_f64() * factor)
}

/// Same schedule without randomness, for deterministic assertions in tests.
#[cfg(test)]
fn unjittered_delay(policy: &BackoffPolicy, k: u32) -> Duration {
    let exp = k.saturating_sub(2);
    policy
        .base
        .checked_mul(1u32.checked_shl(exp).unwrap_or(u32::MAX))
        .unwrap_or(policy.cap)
        .min(policy.cap)
}
