//! Scripted rate-service doubles shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use catalog_types::{
    CurrencyCode, RateError, RateFetcher, RateRequest, RateResponse, RateStream,
    RateStreamConnector, StreamError, StreamMessage,
};

/// Fetcher answering from a fixed table and counting calls.
pub(crate) struct FakeFetcher {
    answers: Mutex<HashMap<CurrencyCode, Result<f64, RateError>>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self {
            answers: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn with_rate(self, destination: CurrencyCode, rate: f64) -> Self {
        self.set_rate(destination, rate);
        self
    }

    pub fn with_error(self, destination: CurrencyCode, error: RateError) -> Self {
        self.answers.lock().unwrap().insert(destination, Err(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_rate(&self, destination: CurrencyCode, rate: f64) {
        self.answers.lock().unwrap().insert(destination, Ok(rate));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateFetcher for FakeFetcher {
    async fn fetch_rate(&self, req: RateRequest) -> Result<RateResponse, RateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let answer = self.answers.lock().unwrap().get(&req.destination).cloned();
        match answer {
            Some(Ok(rate)) => Ok(RateResponse {
                destination: req.destination,
                rate,
            }),
            Some(Err(e)) => Err(e),
            None => Err(RateError::RemoteRejected {
                message: "unsupported currency pair".into(),
                request: Some(req),
            }),
        }
    }
}

/// Server half of a scripted stream session.
pub(crate) struct ServerSide {
    pub updates: mpsc::UnboundedSender<Result<StreamMessage, StreamError>>,
    pub subscriptions: mpsc::UnboundedReceiver<RateRequest>,
    pub closed: Arc<AtomicBool>,
}

impl ServerSide {
    pub fn push(&self, message: StreamMessage) {
        let _ = self.updates.send(Ok(message));
    }

    pub fn push_err(&self, error: StreamError) {
        let _ = self.updates.send(Err(error));
    }

    /// Next subscribe intent, failing the test if none arrives promptly.
    pub async fn next_subscription(&mut self) -> RateRequest {
        tokio::time::timeout(Duration::from_secs(2), self.subscriptions.recv())
            .await
            .expect("no subscription within 2s")
            .expect("client dropped the stream")
    }
}

struct FakeStream {
    incoming: mpsc::UnboundedReceiver<Result<StreamMessage, StreamError>>,
    subscriptions: mpsc::UnboundedSender<RateRequest>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl RateStream for FakeStream {
    async fn subscribe(&mut self, req: RateRequest) -> Result<(), StreamError> {
        self.subscriptions
            .send(req)
            .map_err(|_| StreamError::Disconnected("server gone".into()))
    }

    async fn next_message(&mut self) -> Option<Result<StreamMessage, StreamError>> {
        self.incoming.recv().await
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Connector handing out pre-registered sessions in order. Refuses once
/// they run out.
#[derive(Default)]
pub(crate) struct FakeConnector {
    sessions: Mutex<VecDeque<FakeStream>>,
    connects: AtomicUsize,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a session for the next successful connect.
    pub fn add_session(&self) -> ServerSide {
        let (updates, incoming) = mpsc::unbounded_channel();
        let (subscriptions_tx, subscriptions) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        self.sessions.lock().unwrap().push_back(FakeStream {
            incoming,
            subscriptions: subscriptions_tx,
            closed: closed.clone(),
        });
        ServerSide {
            updates,
            subscriptions,
            closed,
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateStreamConnector for FakeConnector {
    async fn connect(&self) -> Result<Box<dyn RateStream>, StreamError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.sessions.lock().unwrap().pop_front() {
            Some(stream) => Ok(Box::new(stream)),
            None => Err(StreamError::Disconnected("connection refused".into())),
        }
    }
}

/// Polls `condition` until it holds, failing the test after 2s.
pub(crate) async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within 2s"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
