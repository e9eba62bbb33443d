//! Exchange-rate cache and the background consumer keeping it fresh.

mod cache;
mod consumer;
mod reconnect;
#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use catalog_types::{RateFetcher, RateStreamConnector, StreamError, StreamState};

pub use cache::{RateCache, RateCacheConfig, SubscriptionIntents};
pub use consumer::StreamConsumer;
pub use reconnect::{ReconnectConfig, ReconnectPolicy};

/// A running rate cache together with its stream consumer task.
pub struct RateServices {
    pub cache: RateCache,
    pub stream_state: watch::Receiver<StreamState>,
    pub consumer: JoinHandle<Result<(), StreamError>>,
}

/// Builds the cache and spawns the consumer that feeds it push updates.
///
/// Must be called from within a tokio runtime.
pub fn start_rate_services(
    config: RateCacheConfig,
    reconnect: ReconnectConfig,
    fetcher: Arc<dyn RateFetcher>,
    connector: Arc<dyn RateStreamConnector>,
    shutdown: CancellationToken,
) -> RateServices {
    let (cache, intents) = RateCache::new(config, fetcher);
    let consumer = StreamConsumer::new(cache.clone(), connector, intents, reconnect, shutdown);
    let stream_state = consumer.state();

    RateServices {
        cache,
        stream_state,
        consumer: consumer.spawn(),
    }
}
