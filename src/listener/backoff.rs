//! Exponential backoff for reinstalling the event hook.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::model::{
    DEFAULT_BACKOFF_BASE_MS, DEFAULT_BACKOFF_MAX_MS, DEFAULT_RETRY_BUDGET,
    DEFAULT_STABLE_RESET_MS,
};

/// Tuning knobs, read from the `backoff` section of the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub base_ms: u64,
    pub max_ms: u64,
    /// Consecutive failures tolerated before giving up.
    pub retry_budget: u32,
    /// Time the hook must stay up after a successful install before the
    /// failure count starts over.
    pub stable_reset_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_ms: DEFAULT_BACKOFF_BASE_MS,
            max_ms: DEFAULT_BACKOFF_MAX_MS,
            retry_budget: DEFAULT_RETRY_BUDGET,
            stable_reset_ms: DEFAULT_STABLE_RESET_MS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    failures: u32,
    healthy_since: Option<Instant>,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            failures: 0,
            healthy_since: None,
        }
    }

    /// Failures counted since the last reset.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn reset(&mut self) {
        self.failures = 0;
        self.healthy_since = None;
    }

    /// The hook came up at `now`. Failures keep counting unless it stays
    /// up for `stable_reset_ms` before the next one.
    pub fn mark_healthy(&mut self, now: Instant) {
        self.healthy_since = Some(now);
    }

    /// Record a failure at `now` and return how long to wait before the
    /// next attempt, or `None` once the retry budget is spent.
    pub fn next_delay(&mut self, now: Instant) -> Option<Duration> {
        if let Some(since) = self.healthy_since.take() {
            if now.saturating_duration_since(since) >= Duration::from_millis(self.config.stable_reset_ms) {
                self.failures = 0;
            }
        }

        if self.failures >= self.config.retry_budget {
            return None;
        }
        let factor = 1u64.checked_shl(self.failures).unwrap_or(u64::MAX);
        let delay = self.config.base_ms.saturating_mul(factor).min(self.config.max_ms);
        self.failures += 1;
        Some(Duration::from_millis(delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(budget: u32) -> BackoffConfig {
        BackoffConfig {
            base_ms: 100,
            max_ms: 1000,
            retry_budget: budget,
            stable_reset_ms: 10_000,
        }
    }

    #[test]
    fn test_delays_double_up_to_max() {
        let mut backoff = Backoff::new(config(10));
        let now = Instant::now();
        let delays: Vec<u64> = (0..6)
            .map(|_| backoff.next_delay(now).unwrap().as_millis() as u64)
            .collect();
        assert_eq!(delays, [100, 200, 400, 800, 1000, 1000]);
    }

    #[test]
    fn test_budget_exhaustion() {
        let mut backoff = Backoff::new(config(2));
        let now = Instant::now();
        assert!(backoff.next_delay(now).is_some());
        assert!(backoff.next_delay(now).is_some());
        assert_eq!(backoff.next_delay(now), None);
        assert_eq!(backoff.failures(), 2);
    }

    #[test]
    fn test_stable_uptime_resets_count() {
        let mut backoff = Backoff::new(config(10));
        let start = Instant::now();
        backoff.next_delay(start);
        backoff.next_delay(start);
        backoff.mark_healthy(start + Duration::from_secs(1));
        let later = start + Duration::from_secs(11);
        assert_eq!(backoff.next_delay(later), Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_short_uptime_keeps_count() {
        let mut backoff = Backoff::new(config(10));
        let start = Instant::now();
        backoff.next_delay(start);
        backoff.next_delay(start);
        backoff.mark_healthy(start + Duration::from_secs(1));
        let later = start + Duration::from_secs(5);
        assert_eq!(backoff.next_delay(later), Some(Duration::from_millis(400)));
    }

    #[test]
    fn test_default_config_exhausts_when_failures_never_stop() {
        let mut backoff = Backoff::new(BackoffConfig::default());
        let mut now = Instant::now();
        let mut delays = Vec::new();
        while let Some(delay) = backoff.next_delay(now) {
            delays.push(delay.as_millis() as u64);
            now += delay;
            assert!(delays.len() <= 8, "budget never ran out: {:?}", delays);
        }
        assert_eq!(
            delays,
            [250, 500, 1000, 2000, 4000, 8000, 16000, 30000]
        );
    }

    #[test]
    fn test_huge_failure_count_saturates() {
        let mut backoff = Backoff::new(BackoffConfig {
            retry_budget: 200,
            ..config(0)
        });
        let now = Instant::now();
        for _ in 0..100 {
            assert!(backoff.next_delay(now).unwrap() <= Duration::from_millis(1000));
        }
    }
}
