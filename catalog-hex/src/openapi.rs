//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use catalog_types::domain::{ProductId, StreamState};
use catalog_types::dto::{
    CacheStats, ErrorCode, ProductRequest, ProductView, RateEntryView, RatesSnapshot,
    RemoteErrorRecord,
};
use catalog_types::{CurrencyCode, RateEntry};
use utoipa::OpenApi;

// Dummy functions to generate path documentation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value),
            example = json!({"status": "healthy", "rate_stream": "streaming"}))
    )
)]
async fn health() {}

/// List products in the requested currency
#[utoipa::path(
    get,
    path = "/products",
    tag = "products",
    params(
        ("currency" = Option<String>, Query, description = "Currency code, defaults to the base currency")
    ),
    responses(
        (status = 200, description = "Products priced in the requested currency", body = Vec<ProductView>),
        (status = 400, description = "Unknown currency or rejected by the rate service"),
        (status = 503, description = "Rate service unavailable")
    )
)]
async fn list_products() {}

/// Get a product in the requested currency
#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "products",
    params(
        ("id" = u32, Path, description = "Product ID"),
        ("currency" = Option<String>, Query, description = "Currency code, defaults to the base currency")
    ),
    responses(
        (status = 200, description = "Product priced in the requested currency", body = ProductView),
        (status = 400, description = "Invalid ID or currency"),
        (status = 404, description = "Product not found"),
        (status = 503, description = "Rate service unavailable")
    )
)]
async fn get_product() {}

/// Add a product
#[utoipa::path(
    post,
    path = "/products",
    tag = "products",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductView),
        (status = 400, description = "Validation error")
    )
)]
async fn create_product() {}

/// Replace a product
#[utoipa::path(
    put,
    path = "/products/{id}",
    tag = "products",
    params(("id" = u32, Path, description = "Product ID")),
    request_body = ProductRequest,
    responses(
        (status = 204, description = "Product updated"),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Product not found")
    )
)]
async fn update_product() {}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "products",
    params(("id" = u32, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found")
    )
)]
async fn delete_product() {}

/// Rate cache snapshot
#[utoipa::path(
    get,
    path = "/rates",
    tag = "rates",
    responses(
        (status = 200, description = "Cached rates, subscriptions and counters", body = RatesSnapshot)
    )
)]
async fn rates() {}

/// OpenAPI documentation for the Catalog API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        version = "0.1.0",
        description = "Product catalog priced in any supported currency",
        license(name = "MIT"),
    ),
    paths(
        health,
        list_products,
        get_product,
        create_product,
        update_product,
        delete_product,
        rates,
    ),
    components(
        schemas(
            ProductRequest,
            ProductView,
            ProductId,
            CurrencyCode,
            RatesSnapshot,
            RateEntryView,
            RateEntry,
            RemoteErrorRecord,
            ErrorCode,
            CacheStats,
            StreamState,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "products", description = "Product catalog operations"),
        (name = "rates", description = "Exchange rate cache introspection"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();

        assert!(paths.contains(&"/products".to_string()));
        assert!(paths.contains(&"/products/{id}".to_string()));
        assert!(paths.contains(&"/rates".to_string()));
    }
}
