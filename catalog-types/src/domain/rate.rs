//! Cached exchange rate entries and push-stream state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::CurrencyCode;
use crate::error::DomainError;

/// A cached rate from the catalog's base currency to `destination`.
///
/// Invariant: `rate` is finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RateEntry {
    pub destination: CurrencyCode,
    pub rate: f64,
    pub last_updated: DateTime<Utc>,
}

impl RateEntry {
    pub fn new(
        destination: CurrencyCode,
        rate: f64,
        last_updated: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if !is_valid_rate(rate) {
            return Err(DomainError::InvalidRate(rate));
        }
        Ok(Self {
            destination,
            rate,
            last_updated,
        })
    }

    /// Whether an observation stamped `timestamp` should replace this entry.
    pub fn is_superseded_by(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp > self.last_updated
    }
}

/// Rates must be finite and greater than zero.
pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// Lifecycle of the push-update stream consumer.
///
/// `Disconnected -> Connecting -> Streaming -> (Closed | Failed)`, with
/// `Failed -> Connecting` while the reconnect budget lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StreamState {
    Disconnected,
    Connecting,
    Streaming,
    Closed,
    Failed,
}

impl std::fmt::Display for StreamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StreamState::Disconnected => "disconnected",
            StreamState::Connecting => "connecting",
            StreamState::Streaming => "streaming",
            StreamState::Closed => "closed",
            StreamState::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_rate_entry_rejects_non_positive() {
        let now = Utc::now();
        assert!(matches!(
            RateEntry::new(CurrencyCode::USD, 0.0, now),
            Err(DomainError::InvalidRate(_))
        ));
        assert!(RateEntry::new(CurrencyCode::USD, -1.2, now).is_err());
        assert!(RateEntry::new(CurrencyCode::USD, f64::NAN, now).is_err());
        assert!(RateEntry::new(CurrencyCode::USD, f64::INFINITY, now).is_err());
    }

    #[test]
    fn test_is_superseded_by_newer_only() {
        let now = Utc::now();
        let entry = RateEntry::new(CurrencyCode::USD, 1.1, now).unwrap();
        assert!(entry.is_superseded_by(now + Duration::seconds(1)));
        assert!(!entry.is_superseded_by(now));
        assert!(!entry.is_superseded_by(now - Duration::seconds(1)));
    }

    #[test]
    fn test_stream_state_display() {
        assert_eq!(StreamState::Streaming.to_string(), "streaming");
        assert_eq!(
            serde_json::to_string(&StreamState::Failed).unwrap(),
            "\"failed\""
        );
    }
}
