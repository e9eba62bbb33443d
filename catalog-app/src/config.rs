//! Configuration loading from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use catalog_hex::rates::{RateCacheConfig, ReconnectConfig};
use catalog_types::CurrencyCode;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub base_currency: CurrencyCode,
    /// Rate service address. When unset the in-process simulator is used.
    pub rates_url: Option<String>,
    /// Push stream address. Derived from `rates_url` when unset.
    pub rates_ws_url: Option<String>,
    pub fetch_timeout: Duration,
    pub reconnect: ReconnectConfig,
    pub simulated_tick: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let vars = Env(lookup);

        let reconnect = ReconnectConfig {
            initial_delay: vars.millis_or("RECONNECT_INITIAL_MS", 500)?,
            max_delay: vars.millis_or("RECONNECT_MAX_MS", 30_000)?,
            multiplier: vars.parse_or("RECONNECT_MULTIPLIER", 2.0)?,
            max_attempts: vars.parse_or("RECONNECT_MAX_ATTEMPTS", 0)?,
            ..ReconnectConfig::default()
        };

        Ok(Self {
            port: vars.parse_or("PORT", 3000)?,
            base_currency: vars.parse_or("BASE_CURRENCY", CurrencyCode::EUR)?,
            rates_url: vars.get("RATES_URL"),
            rates_ws_url: vars.get("RATES_WS_URL"),
            fetch_timeout: vars.millis_or("RATE_FETCH_TIMEOUT_MS", 2_000)?,
            reconnect,
            simulated_tick: vars.millis_or("SIMULATED_TICK_MS", 5_000)?,
        })
    }

    pub fn cache(&self) -> RateCacheConfig {
        RateCacheConfig {
            base: self.base_currency,
            fetch_timeout: self.fetch_timeout,
        }
    }
}

/// Variable source; blank values count as unset.
struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn parse_or<T>(&self, key: &str, default: T) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value
                .trim()
                .parse()
                .with_context(|| format!("invalid value for {key}: {value:?}")),
        }
    }

    fn millis_or(&self, key: &str, default: u64) -> anyhow::Result<Duration> {
        self.parse_or(key, default).map(Duration::from_millis)
    }
}
