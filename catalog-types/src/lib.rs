//! # Catalog Types
//!
//! Domain types and port traits for the product catalog service.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Product, RateEntry)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for the HTTP API and the rate-service wire format
//! - `error/` - Domain and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use catalog_currency::CurrencyCode;
pub use domain::{Product, ProductId, RateEntry, StreamState};
pub use dto::*;
pub use error::{AppError, DomainError, RateError, RepoError, StreamError};
pub use ports::{ProductRepository, RateFetcher, RateStream, RateStreamConnector};
