//! In-process rate service for development and demos.
//!
//! Answers fetches from the reference table in `catalog-currency` and pushes
//! a fresh observation for every subscription on each tick. Rates wander
//! when fluctuation is enabled.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use catalog_currency::simulated_rate;
use catalog_types::{
    ErrorCode, RateError, RateFetcher, RateRequest, RateResponse, RateStream,
    RateStreamConnector, RateUpdate, RemoteErrorMessage, StreamError, StreamMessage,
};

#[derive(Debug, Clone)]
pub struct SimulatedRateService {
    tick: Duration,
}

impl SimulatedRateService {
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }
}

impl Default for SimulatedRateService {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

fn same_currency_message(req: &RateRequest) -> String {
    format!(
        "Base rate {} can not be the same as destination rate {}",
        req.base, req.destination
    )
}

#[async_trait]
impl RateFetcher for SimulatedRateService {
    async fn fetch_rate(&self, req: RateRequest) -> Result<RateResponse, RateError> {
        if req.base == req.destination {
            return Err(RateError::RemoteRejected {
                message: same_currency_message(&req),
                request: Some(req),
            });
        }
        Ok(RateResponse {
            destination: req.destination,
            rate: simulated_rate(req.base, req.destination),
        })
    }
}

#[async_trait]
impl RateStreamConnector for SimulatedRateService {
    async fn connect(&self) -> Result<Box<dyn RateStream>, StreamError> {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.tick, self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Ok(Box::new(SimulatedStream {
            subscriptions: Vec::new(),
            pending: VecDeque::new(),
            ticker,
            closed: false,
        }))
    }
}

struct SimulatedStream {
    subscriptions: Vec<RateRequest>,
    pending: VecDeque<StreamMessage>,
    ticker: Interval,
    closed: bool,
}

#[async_trait]
impl RateStream for SimulatedStream {
    async fn subscribe(&mut self, req: RateRequest) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Disconnected("stream closed".into()));
        }
        if req.base == req.destination {
            self.pending.push_back(StreamMessage::Error(RemoteErrorMessage {
                code: ErrorCode::InvalidArgument,
                message: same_currency_message(&req),
                request: Some(req),
            }));
        } else if !self.subscriptions.contains(&req) {
            self.subscriptions.push(req);
        }
        Ok(())
    }

    async fn next_message(&mut self) -> Option<Result<StreamMessage, StreamError>> {
        loop {
            if self.closed {
                return None;
            }
            if let Some(message) = self.pending.pop_front() {
                return Some(Ok(message));
            }

            self.ticker.tick().await;
            let now = Utc::now();
            self.pending
                .extend(self.subscriptions.iter().map(|req| {
                    StreamMessage::Rate(RateUpdate {
                        base: req.base,
                        destination: req.destination,
                        rate: simulated_rate(req.base, req.destination),
                        timestamp: now,
                    })
                }));
        }
    }

    async fn close(&mut self) {
        self.closed = true;
        self.subscriptions.clear();
        self.pending.clear();
    }
}
