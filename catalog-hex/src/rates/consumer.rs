//! Push-stream consumer.
//!
//! A single background task owns the connection to the rate service's push
//! stream. It forwards subscribe intents from the cache, applies pushed rate
//! updates, and reconnects with backoff when the stream breaks. Losing the
//! stream never fails a rate lookup: the cache keeps serving what it has.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use catalog_types::{
    CurrencyCode, RateRequest, RateStream, RateStreamConnector, StreamError, StreamMessage,
    StreamState,
};

use super::cache::{RateCache, SubscriptionIntents};
use super::reconnect::{ReconnectConfig, ReconnectPolicy};

/// How a streaming session ended.
enum SessionEnd {
    Shutdown,
    Broken(StreamError),
}

pub struct StreamConsumer {
    cache: RateCache,
    connector: Arc<dyn RateStreamConnector>,
    intents: SubscriptionIntents,
    policy: ReconnectPolicy,
    shutdown: CancellationToken,
    state: watch::Sender<StreamState>,
}

impl StreamConsumer {
    pub fn new(
        cache: RateCache,
        connector: Arc<dyn RateStreamConnector>,
        intents: SubscriptionIntents,
        reconnect: ReconnectConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let (state, _) = watch::channel(StreamState::Disconnected);
        Self {
            cache,
            connector,
            intents,
            policy: ReconnectPolicy::new(reconnect),
            shutdown,
            state,
        }
    }

    /// Observes the consumer's lifecycle.
    pub fn state(&self) -> watch::Receiver<StreamState> {
        self.state.subscribe()
    }

    pub fn spawn(self) -> JoinHandle<Result<(), StreamError>> {
        tokio::spawn(self.run())
    }

    /// Runs until shutdown or until the reconnect budget is spent.
    pub async fn run(mut self) -> Result<(), StreamError> {
        loop {
            self.set_state(StreamState::Connecting);

            let connected = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    self.set_state(StreamState::Closed);
                    return Ok(());
                }
                result = self.connector.connect() => result,
            };

            match connected {
                Ok(mut stream) => {
                    tracing::info!(base = %self.cache.base(), "Connected to rate stream");
                    self.set_state(StreamState::Streaming);

                    match self.pump(stream.as_mut()).await {
                        SessionEnd::Shutdown => {
                            stream.close().await;
                            self.set_state(StreamState::Closed);
                            tracing::info!("Rate stream closed");
                            return Ok(());
                        }
                        SessionEnd::Broken(e) => {
                            tracing::warn!(error = %e, "Rate stream lost");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Unable to connect to rate stream");
                }
            }

            self.set_state(StreamState::Failed);

            let Some(delay) = self.policy.next_delay() else {
                let attempts = self.policy.failures();
                tracing::error!(attempts, "Giving up on rate stream");
                return Err(StreamError::RetriesExhausted(attempts));
            };

            tracing::debug!(?delay, attempt = self.policy.failures(), "Reconnecting to rate stream");
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    self.set_state(StreamState::Closed);
                    return Ok(());
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Drives one connected session until it breaks or shutdown is requested.
    ///
    /// The reconnect budget is only restored once the session delivers a
    /// message, so a server that accepts and immediately hangs up still
    /// counts against it.
    async fn pump(&mut self, stream: &mut dyn RateStream) -> SessionEnd {
        let mut sent = HashSet::new();
        let mut delivered = false;

        // Every destination the cache has fetched so far, including those
        // subscribed on a previous connection.
        for destination in self.cache.subscribed_destinations() {
            if let Err(e) = self.subscribe(stream, &mut sent, destination).await {
                return SessionEnd::Broken(e);
            }
        }

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => return SessionEnd::Shutdown,

                Some(destination) = self.intents.recv() => {
                    if let Err(e) = self.subscribe(stream, &mut sent, destination).await {
                        return SessionEnd::Broken(e);
                    }
                }

                message = stream.next_message() => match message {
                    Some(Ok(message)) => {
                        if !delivered {
                            delivered = true;
                            self.policy.reset();
                        }
                        self.dispatch(message);
                    }
                    Some(Err(StreamError::Malformed(reason))) => {
                        tracing::warn!(%reason, "Skipping malformed rate stream message");
                    }
                    Some(Err(e)) => return SessionEnd::Broken(e),
                    None => {
                        return SessionEnd::Broken(StreamError::Disconnected(
                            "server ended the stream".into(),
                        ));
                    }
                },
            }
        }
    }

    async fn subscribe(
        &self,
        stream: &mut dyn RateStream,
        sent: &mut HashSet<CurrencyCode>,
        destination: CurrencyCode,
    ) -> Result<(), StreamError> {
        if !sent.insert(destination) {
            return Ok(());
        }
        tracing::debug!(%destination, "Subscribing to rate updates");
        stream
            .subscribe(RateRequest {
                base: self.cache.base(),
                destination,
            })
            .await
    }

    fn dispatch(&self, message: StreamMessage) {
        match message {
            StreamMessage::Rate(update) => {
                if update.base != self.cache.base() {
                    self.cache.reject_update(
                        update.destination,
                        &format!("base {} does not match {}", update.base, self.cache.base()),
                    );
                    return;
                }
                self.cache
                    .apply_update(update.destination, update.rate, update.timestamp);
            }
            StreamMessage::Error(error) => {
                let destination = error.request.map(|req| req.destination);
                self.cache.apply_remote_error(destination, &error);
            }
        }
    }

    fn set_state(&self, state: StreamState) {
        self.state.send_replace(state);
    }
}
