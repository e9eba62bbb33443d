//! Backoff schedule for re-establishing the rate push stream.

use std::time::Duration;

use rand::Rng;

/// Reconnect backoff settings.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Ceiling for any single delay, before jitter.
    pub max_delay: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
    /// Random spread applied to each delay, as a fraction of it.
    pub jitter: f64,
    /// Consecutive failed attempts allowed. 0 means retry forever.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: 0.1,
            max_attempts: 0,
        }
    }
}

/// Tracks consecutive failures and hands out the next wait.
#[derive(Debug)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    failures: u32,
}

impl ReconnectPolicy {
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            config,
            failures: 0,
        }
    }

    /// Records a failure and returns how long to wait before retrying, or
    /// `None` once the attempt budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.config.max_attempts != 0 && self.failures >= self.config.max_attempts {
            return None;
        }
        let base = self.base_delay(self.failures);
        self.failures += 1;
        Some(self.jittered(base))
    }

    /// Clears the failure count once a session has delivered data.
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    fn base_delay(&self, failures: u32) -> Duration {
        let max = self.config.max_delay.as_secs_f64();
        let grown = self.config.initial_delay.as_secs_f64()
            * self.config.multiplier.max(1.0).powi(failures.min(64) as i32);
        if grown.is_finite() {
            Duration::from_secs_f64(grown.min(max))
        } else {
            self.config.max_delay
        }
    }

    fn jittered(&self, delay: Duration) -> Duration {
        let spread = self.config.jitter.clamp(0.0, 1.0);
        if spread == 0.0 || delay.is_zero() {
            return delay;
        }
        let factor = rand::rng().random_range((1.0 - spread)..=(1.0 + spread));
        delay.mul_f64(factor)
    }
}
