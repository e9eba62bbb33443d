//! Data Transfer Objects (DTOs) for requests and responses.
//!
//! Two boundaries live here: the product HTTP API and the wire format of the
//! remote rate service (request/response fetch plus the push stream).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::CurrencyCode;
use crate::domain::{Product, ProductId, RateEntry, StreamState};

// ─────────────────────────────────────────────────────────────────────────────
// Product DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to create or replace a product.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductRequest {
    /// Product name
    #[schema(example = "Latte")]
    pub name: String,
    /// Free-form description
    #[serde(default)]
    #[schema(example = "Frothy milky coffee")]
    pub description: String,
    /// Price in minor units of the base currency
    #[schema(example = 245)]
    pub price: i64,
    /// Stock keeping unit, three lowercase groups joined by `-`
    #[schema(example = "abc-def-ghi")]
    pub sku: String,
}

/// A product priced in a specific currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductView {
    pub id: ProductId,
    #[schema(example = "Latte")]
    pub name: String,
    pub description: String,
    /// Price in minor units of `currency`
    #[schema(example = 270)]
    pub price: i64,
    pub currency: CurrencyCode,
    pub sku: String,
}

impl ProductView {
    /// View of a product at its stored base-currency price.
    pub fn from_product(product: &Product, currency: CurrencyCode) -> Self {
        Self::with_price(product, currency, product.price)
    }

    /// View of a product at an already converted price.
    pub fn with_price(product: &Product, currency: CurrencyCode, price: i64) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            price,
            currency,
            sku: product.sku.clone(),
        }
    }
}

/// Query string accepted by the product read endpoints.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CurrencyQuery {
    pub currency: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate Service Wire Format
// ─────────────────────────────────────────────────────────────────────────────

/// Request for a single rate; also the subscribe-intent sent on the push stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct RateRequest {
    pub base: CurrencyCode,
    pub destination: CurrencyCode,
}

impl std::fmt::Display for RateRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "base: {} destination: {}", self.base, self.destination)
    }
}

/// Successful response to a rate fetch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateResponse {
    pub destination: CurrencyCode,
    pub rate: f64,
}

/// Machine-readable classification of a remote error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidArgument,
    NotFound,
    Unavailable,
    Internal,
    #[serde(other)]
    Unknown,
}

/// Error body returned by the rate service, on fetch or on the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteErrorMessage {
    pub code: ErrorCode,
    #[serde(default)]
    pub message: String,
    /// The offending request, echoed back for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RateRequest>,
}

/// A pushed rate observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateUpdate {
    pub base: CurrencyCode,
    pub destination: CurrencyCode,
    pub rate: f64,
    pub timestamp: DateTime<Utc>,
}

/// A server-to-client message on the push stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    Rate(RateUpdate),
    Error(RemoteErrorMessage),
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate Cache Introspection
// ─────────────────────────────────────────────────────────────────────────────

/// Last error the rate service reported for a subscribed destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RemoteErrorRecord {
    pub code: ErrorCode,
    pub message: String,
    pub received_at: DateTime<Utc>,
}

/// A cached rate together with its subscription status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RateEntryView {
    #[serde(flatten)]
    pub entry: RateEntry,
    pub subscribed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<RemoteErrorRecord>,
}

/// Counters maintained by the rate cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub remote_fetches: u64,
    pub updates_applied: u64,
    pub updates_dropped: u64,
}

/// Point-in-time view of the rate cache, served by `GET /rates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RatesSnapshot {
    pub base: CurrencyCode,
    pub entries: Vec<RateEntryView>,
    pub stats: CacheStats,
    pub stream_state: StreamState,
}
