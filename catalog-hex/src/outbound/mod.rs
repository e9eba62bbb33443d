//! Rate service adapters implementing the `RateFetcher` and
//! `RateStreamConnector` ports.

pub mod http;
pub mod simulated;
pub mod ws;

pub use http::HttpRateFetcher;
pub use simulated::SimulatedRateService;
pub use ws::{WsRateConnector, stream_url};
