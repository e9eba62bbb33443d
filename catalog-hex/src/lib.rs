//! # Catalog Hex
//!
//! Rate cache, application service layer and HTTP adapter for the catalog service.
//!
//! ## Architecture
//!
//! - `rates/` - Currency-rate cache and the push-stream consumer that keeps it fresh
//! - `service/` - Application service (products priced in the caller's currency)
//! - `outbound/` - Rate service adapters (HTTP fetch, WebSocket stream, simulator)
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! The service is generic over `R: ProductRepository`; the rate service is
//! reached only through the `RateFetcher` and `RateStreamConnector` ports.

pub mod inbound;
pub mod openapi;
pub mod outbound;
pub mod rates;
pub mod service;


pub use rates::{RateCache, RateCacheConfig, StreamConsumer};
pub use service::ProductCatalog;
