//! Delay policy for failed polls.

use std::time::Duration;

use crate::config::RetryConfig;

/// Bounded exponential backoff.
///
/// The first retry waits `initial_delay`; each further consecutive failure
/// multiplies the delay by `multiplier`, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Retries at once, without any delay.
    pub const fn immediate() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Starts a fresh backoff sequence.
    pub fn backoff(&self) -> Backoff {
        Backoff {
            policy: *self,
            current: None,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            multiplier: config.multiplier,
        }
    }
}

/// State of one backoff sequence.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: RetryPolicy,
    current: Option<Duration>,
}

impl Backoff {
    /// Returns the delay before the next attempt and advances the sequence.
    pub fn next_delay(&mut self) -> Duration {
        let delay = match self.current {
            None => self.policy.initial_delay,
            Some(current) => {
                let scaled = current.as_secs_f64() * self.policy.multiplier.max(1.0);
                Duration::try_from_secs_f64(scaled).unwrap_or(self.policy.max_delay)
            }
        };
        let delay = delay.min(self.policy.max_delay);
        self.current = Some(delay);
        delay
    }

    /// Forgets past failures; the next delay is the initial one again.
    pub fn reset(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            multiplier: 2.0,
        };
        let mut backoff = policy.backoff();

        let delays: Vec<u128> = (0..5).map(|_| backoff.next_delay().as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 400, 500, 500]);

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_immediate_never_waits() {
        let mut backoff = RetryPolicy::immediate().backoff();
        for _ in 0..3 {
            assert_eq!(backoff.next_delay(), Duration::ZERO);
        }
    }

    #[test]
    fn test_from_config() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.initial_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
        assert_eq!(policy.multiplier, 2.0);
    }
}
