//! Exponential reconnect backoff.

use std::time::Duration;

/// Growth factor between consecutive reconnect delays.
pub const BACKOFF_FACTOR: f64 = 1.5;

/// Computes reconnect delays and enforces the attempt budget.
///
/// The delay for attempt `k` (1-based) is `min(base * 1.5^(k-1), max_delay)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    base: Duration,
    max_delay: Duration,
    max_attempts: u32,
}

impl ReconnectPolicy {
    /// Create a policy.
    pub fn new(base: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            max_delay,
            max_attempts,
        }
    }

    /// Maximum number of reconnect attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether another attempt may be scheduled after `attempts_made`.
    pub fn allows(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }

    /// Delay before reconnect attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base_ms = self.base.as_secs_f64() * 1000.0;
        let cap_ms = self.max_delay.as_secs_f64() * 1000.0;
        let delay_ms = (base_ms * BACKOFF_FACTOR.powi(exponent)).min(cap_ms);
        Duration::from_micros((delay_ms * 1000.0).round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(base_ms: u64, attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy::new(
            Duration::from_millis(base_ms),
            Duration::from_millis(30_000),
            attempts,
        )
    }

    #[test]
    fn test_delay_sequence_grows_by_half() {
        let p = policy(1000, 5);
        let delays: Vec<_> = (1..=5).map(|k| p.delay_for(k)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(1500),
                Duration::from_millis(2250),
                Duration::from_millis(3375),
                Duration::from_micros(5_062_500),
            ]
        );
    }

    #[test]
    fn test_default_base_sequence() {
        let p = policy(3000, 5);
        assert_eq!(p.delay_for(1), Duration::from_millis(3000));
        assert_eq!(p.delay_for(2), Duration::from_millis(4500));
        assert_eq!(p.delay_for(3), Duration::from_millis(6750));
    }

    #[test]
    fn test_delay_is_capped() {
        let p = policy(3000, 50);
        assert_eq!(p.delay_for(7), Duration::from_millis(30_000));
        assert_eq!(p.delay_for(40), Duration::from_millis(30_000));
        assert_eq!(p.delay_for(u32::MAX), Duration::from_millis(30_000));
    }

    #[test]
    fn test_attempt_budget() {
        let p = policy(3000, 2);
        assert!(p.allows(0));
        assert!(p.allows(1));
        assert!(!p.allows(2));
        assert!(!policy(3000, 0).allows(0));
    }
}
