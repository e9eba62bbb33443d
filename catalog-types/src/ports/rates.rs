//! Remote rate service ports.
//!
//! The rate service offers a request/response fetch for a single rate and a
//! duplex push stream: the client sends subscribe intents, the server pushes
//! rate updates or errors for subscribed pairs.

use crate::dto::{RateRequest, RateResponse, StreamMessage};
use crate::error::{RateError, StreamError};

/// Request/response rate lookup.
#[async_trait::async_trait]
pub trait RateFetcher: Send + Sync + 'static {
    /// Fetches the current rate for `req`. Implementations classify failures
    /// into `RemoteUnavailable` or `RemoteRejected`.
    async fn fetch_rate(&self, req: RateRequest) -> Result<RateResponse, RateError>;
}

/// Opens push-update streams.
#[async_trait::async_trait]
pub trait RateStreamConnector: Send + Sync + 'static {
    async fn connect(&self) -> Result<Box<dyn RateStream>, StreamError>;
}

/// An open duplex subscription channel.
#[async_trait::async_trait]
pub trait RateStream: Send {
    /// Sends a subscribe intent.
    async fn subscribe(&mut self, req: RateRequest) -> Result<(), StreamError>;

    /// Receives the next server message.
    ///
    /// `None` means the server ended the stream. `StreamError::Malformed` is
    /// recoverable; any other error means the stream is broken. Must be
    /// cancel-safe, the consumer polls it inside `select!`.
    async fn next_message(&mut self) -> Option<Result<StreamMessage, StreamError>>;

    /// Closes the stream.
    async fn close(&mut self);
}
