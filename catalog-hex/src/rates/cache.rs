//! Currency-rate cache.
//!
//! Serves rates from the catalog's base currency to any supported destination.
//! Hits are answered from a sharded map without touching the network. A miss
//! performs one remote fetch per destination no matter how many callers are
//! waiting, stores the result, and registers the destination with the stream
//! consumer so later changes arrive as push updates.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::mpsc;

use catalog_types::domain::rate::is_valid_rate;
use catalog_types::{
    CacheStats, CurrencyCode, RateEntry, RateEntryView, RateError, RateFetcher, RateRequest,
    RatesSnapshot, RemoteErrorMessage, RemoteErrorRecord, StreamState,
};

type SharedFetch = Shared<BoxFuture<'static, Result<f64, RateError>>>;

/// Receiving end of the subscribe intents emitted by the cache.
///
/// Owned by the [`StreamConsumer`](super::StreamConsumer).
pub type SubscriptionIntents = mpsc::UnboundedReceiver<CurrencyCode>;

/// Rate cache configuration.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// Currency all catalog prices are stored in.
    pub base: CurrencyCode,
    /// Upper bound on a single remote fetch.
    pub fetch_timeout: Duration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            base: CurrencyCode::EUR,
            fetch_timeout: Duration::from_secs(2),
        }
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    remote_fetches: AtomicU64,
    updates_applied: AtomicU64,
    updates_dropped: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            remote_fetches: self.remote_fetches.load(Ordering::Relaxed),
            updates_applied: self.updates_applied.load(Ordering::Relaxed),
            updates_dropped: self.updates_dropped.load(Ordering::Relaxed),
        }
    }
}

struct Inner {
    base: CurrencyCode,
    fetch_timeout: Duration,
    fetcher: Arc<dyn RateFetcher>,
    entries: DashMap<CurrencyCode, RateEntry>,
    subscribed: DashSet<CurrencyCode>,
    in_flight: DashMap<CurrencyCode, SharedFetch>,
    remote_errors: DashMap<CurrencyCode, RemoteErrorRecord>,
    intents: mpsc::UnboundedSender<CurrencyCode>,
    counters: Counters,
}

/// Thread-safe rate cache. Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct RateCache {
    inner: Arc<Inner>,
}

impl RateCache {
    /// Creates an empty cache and the channel its subscribe intents are sent on.
    pub fn new(
        config: RateCacheConfig,
        fetcher: Arc<dyn RateFetcher>,
    ) -> (Self, SubscriptionIntents) {
        let (intents, intents_rx) = mpsc::unbounded_channel();
        let cache = Self {
            inner: Arc::new(Inner {
                base: config.base,
                fetch_timeout: config.fetch_timeout,
                fetcher,
                entries: DashMap::new(),
                subscribed: DashSet::new(),
                in_flight: DashMap::new(),
                remote_errors: DashMap::new(),
                intents,
                counters: Counters::default(),
            }),
        };
        (cache, intents_rx)
    }

    pub fn base(&self) -> CurrencyCode {
        self.inner.base
    }

    /// Returns the rate from the base currency to `destination`.
    ///
    /// Cached rates return immediately. On a miss the caller waits for the
    /// single in-flight fetch for that destination; a failed fetch leaves the
    /// cache untouched.
    pub async fn get_rate(&self, destination: CurrencyCode) -> Result<f64, RateError> {
        if destination == self.inner.base {
            return Ok(1.0);
        }

        if let Some(rate) = self.cached_rate(destination) {
            Counters::bump(&self.inner.counters.hits);
            return Ok(rate);
        }

        Counters::bump(&self.inner.counters.misses);
        self.shared_fetch(destination).await
    }

    /// Parses `code` and looks up its rate. Unknown codes fail before any
    /// remote call.
    pub async fn rate_for(&self, code: &str) -> Result<f64, RateError> {
        let destination: CurrencyCode = code
            .parse()
            .map_err(|_| RateError::InvalidCurrency(code.to_string()))?;
        self.get_rate(destination).await
    }

    /// Cached rate for `destination`, if any. Never fetches.
    pub fn cached_rate(&self, destination: CurrencyCode) -> Option<f64> {
        self.inner.entries.get(&destination).map(|entry| entry.rate)
    }

    /// Applies a pushed rate. Returns whether the cache changed.
    ///
    /// Dropped without error: non-positive or non-finite rates, destinations
    /// nobody subscribed to, and observations not newer than the cached one.
    pub fn apply_update(
        &self,
        destination: CurrencyCode,
        rate: f64,
        timestamp: DateTime<Utc>,
    ) -> bool {
        if !self.inner.subscribed.contains(&destination) {
            tracing::debug!(%destination, rate, "Dropping update for unsubscribed destination");
            Counters::bump(&self.inner.counters.updates_dropped);
            return false;
        }

        let entry = match RateEntry::new(destination, rate, timestamp) {
            Ok(entry) => entry,
            Err(e) => {
                self.reject_update(destination, &e.to_string());
                return false;
            }
        };

        if self.upsert(entry) {
            tracing::info!(%destination, rate, %timestamp, "Received updated rate from server");
            Counters::bump(&self.inner.counters.updates_applied);
            true
        } else {
            tracing::debug!(%destination, rate, %timestamp, "Ignoring out-of-order rate update");
            Counters::bump(&self.inner.counters.updates_dropped);
            false
        }
    }

    /// Records a malformed push message for `destination`.
    pub fn reject_update(&self, destination: CurrencyCode, reason: &str) {
        tracing::warn!(%destination, reason, "Dropping malformed rate update");
        Counters::bump(&self.inner.counters.updates_dropped);
    }

    /// Records an error the rate service reported on the push stream.
    ///
    /// The cached entry is kept: it may still be accurate from the last good
    /// observation.
    pub fn apply_remote_error(
        &self,
        destination: Option<CurrencyCode>,
        error: &RemoteErrorMessage,
    ) {
        let details = error
            .request
            .map(|req| req.to_string())
            .unwrap_or_default();
        tracing::error!(
            code = ?error.code,
            error = %error.message,
            details = %details,
            "Received error from currency service rate subscription"
        );

        if let Some(destination) = destination {
            self.inner.remote_errors.insert(
                destination,
                RemoteErrorRecord {
                    code: error.code,
                    message: error.message.clone(),
                    received_at: Utc::now(),
                },
            );
        }
    }

    /// Destinations registered for push updates, in code order.
    pub fn subscribed_destinations(&self) -> Vec<CurrencyCode> {
        let mut destinations: Vec<_> = self.inner.subscribed.iter().map(|d| *d).collect();
        destinations.sort();
        destinations
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.counters.snapshot()
    }

    /// Point-in-time copy of every cached entry.
    pub fn snapshot(&self, stream_state: StreamState) -> RatesSnapshot {
        let mut entries: Vec<RateEntryView> = self
            .inner
            .entries
            .iter()
            .map(|entry| {
                let destination = *entry.key();
                RateEntryView {
                    entry: *entry.value(),
                    subscribed: self.inner.subscribed.contains(&destination),
                    last_error: self
                        .inner
                        .remote_errors
                        .get(&destination)
                        .map(|record| record.clone()),
                }
            })
            .collect();
        entries.sort_by_key(|view| view.entry.destination);

        RatesSnapshot {
            base: self.inner.base,
            entries,
            stats: self.stats(),
            stream_state,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Miss handling
    // ─────────────────────────────────────────────────────────────────────────

    /// Joins the in-flight fetch for `destination`, starting one if needed.
    fn shared_fetch(&self, destination: CurrencyCode) -> SharedFetch {
        match self.inner.in_flight.entry(destination) {
            Entry::Occupied(in_flight) => in_flight.get().clone(),
            Entry::Vacant(slot) => {
                // A fetch that finished between our miss and this point wrote
                // its entry before clearing its marker.
                if let Some(rate) = self.cached_rate(destination) {
                    return futures::future::ready(Ok(rate)).boxed().shared();
                }

                // The fetch runs as its own task so it completes, stores its
                // entry and clears its marker even if every waiter goes away.
                let cache = self.clone();
                let task = tokio::spawn(async move {
                    let result = cache.populate(destination).await;
                    cache.inner.in_flight.remove(&destination);
                    result
                });
                let fetch = async move {
                    task.await.unwrap_or_else(|e| {
                        Err(RateError::RemoteUnavailable(format!(
                            "rate fetch for {destination} aborted: {e}"
                        )))
                    })
                }
                .boxed()
                .shared();

                slot.insert(fetch.clone());
                fetch
            }
        }
    }

    /// Fetches, validates and stores one rate.
    ///
    /// The entry is stamped with the local receive time. Pushed updates carry
    /// the rate service's clock, so while that clock lags ours they compare as
    /// older and are dropped.
    #[tracing::instrument(skip(self), fields(base = %self.inner.base))]
    async fn populate(&self, destination: CurrencyCode) -> Result<f64, RateError> {
        let request = RateRequest {
            base: self.inner.base,
            destination,
        };

        Counters::bump(&self.inner.counters.remote_fetches);
        let fetched = tokio::time::timeout(
            self.inner.fetch_timeout,
            self.inner.fetcher.fetch_rate(request),
        )
        .await;

        let response = match fetched {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                if let RateError::RemoteRejected {
                    request: Some(echoed),
                    ..
                } = &e
                {
                    tracing::error!(error = %e, details = %echoed, "Rate request rejected");
                } else {
                    tracing::error!(error = %e, "Rate fetch failed");
                }
                return Err(e);
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.inner.fetch_timeout, "Rate fetch timed out");
                return Err(RateError::RemoteUnavailable(format!(
                    "rate fetch timed out after {}ms",
                    self.inner.fetch_timeout.as_millis()
                )));
            }
        };

        if response.destination != destination || !is_valid_rate(response.rate) {
            tracing::error!(?response, "Rate service returned an unusable response");
            return Err(RateError::RemoteUnavailable(format!(
                "unusable rate response for {}",
                destination
            )));
        }

        let entry = RateEntry::new(destination, response.rate, Utc::now())
            .map_err(|e| RateError::RemoteUnavailable(e.to_string()))?;
        self.upsert(entry);
        self.register_subscription(destination);

        tracing::debug!(rate = response.rate, "Cached fetched rate");
        Ok(self.cached_rate(destination).unwrap_or(response.rate))
    }

    /// Inserts `entry` unless the cached one is at least as new.
    fn upsert(&self, entry: RateEntry) -> bool {
        match self.inner.entries.entry(entry.destination) {
            Entry::Occupied(mut cached) => {
                if cached.get().is_superseded_by(entry.last_updated) {
                    cached.insert(entry);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        }
    }

    fn register_subscription(&self, destination: CurrencyCode) {
        if self.inner.subscribed.insert(destination) && self.inner.intents.send(destination).is_err()
        {
            tracing::debug!(%destination, "Stream consumer gone; subscribe intent not delivered");
        }
    }
}
