//! HTTP Inbound Adapter
//!
//! Axum-based HTTP server that drives the catalog service.

mod handlers;
mod server;

pub use handlers::ApiError;
pub use server::HttpServer;
