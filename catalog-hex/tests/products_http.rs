//! HTTP-level tests for the catalog routes.
//!
//! Drives the router in-process with `oneshot`; the rate service is a local
//! fake so conversions are deterministic.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use tokio::sync::watch;
use tower::ServiceExt;

use catalog_hex::inbound::HttpServer;
use catalog_hex::{ProductCatalog, RateCache, RateCacheConfig};
use catalog_repo::InMemoryRepo;
use catalog_types::{
    CurrencyCode, RateError, RateFetcher, RateRequest, RateResponse, StreamState,
};

/// Serves USD at 1.10, refuses CNY, and is unreachable for GBP.
#[derive(Default)]
struct FixedRates {
    calls: AtomicUsize,
}

#[async_trait]
impl RateFetcher for FixedRates {
    async fn fetch_rate(&self, req: RateRequest) -> Result<RateResponse, RateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match req.destination {
            CurrencyCode::USD => Ok(RateResponse {
                destination: req.destination,
                rate: 1.10,
            }),
            CurrencyCode::GBP => Err(RateError::RemoteUnavailable("connection refused".into())),
            _ => Err(RateError::RemoteRejected {
                message: "unsupported currency pair".into(),
                request: Some(req),
            }),
        }
    }
}

fn test_app() -> (Router, Arc<FixedRates>) {
    let fetcher = Arc::new(FixedRates::default());
    let (cache, _intents) = RateCache::new(RateCacheConfig::default(), fetcher.clone());
    let catalog = ProductCatalog::new(InMemoryRepo::seeded(), cache);
    let (_state_tx, state_rx) = watch::channel(StreamState::Streaming);
    (HttpServer::new(catalog, state_rx).router(), fetcher)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_reports_stream_state() {
    let (app, _) = test_app();

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["rate_stream"], "streaming");
}

#[tokio::test]
async fn test_list_products_in_base_currency() {
    let (app, fetcher) = test_app();

    let response = app.oneshot(get("/products")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json[0]["name"], "Latte");
    assert_eq!(json[0]["price"], 245);
    assert_eq!(json[0]["currency"], "EUR");
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_list_products_converted_to_usd() {
    let (app, fetcher) = test_app();

    let response = app
        .clone()
        .oneshot(get("/products?currency=USD"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json[0]["price"], 270);
    assert_eq!(json[0]["currency"], "USD");

    // Second request is served from the cache.
    let response = app.oneshot(get("/products?currency=USD")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_currency_is_bad_request() {
    let (app, fetcher) = test_app();

    let response = app.oneshot(get("/products?currency=XYZ")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], 400);
    assert!(json["error"].as_str().unwrap().contains("XYZ"));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rejected_currency_is_bad_request() {
    let (app, _) = test_app();

    let response = app.oneshot(get("/products?currency=CNY")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unavailable_rate_service_is_503() {
    let (app, _) = test_app();

    let response = app.oneshot(get("/products?currency=GBP")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["code"], 503);
}

#[tokio::test]
async fn test_get_single_product() {
    let (app, _) = test_app();

    let response = app
        .oneshot(get("/products/2?currency=USD"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["name"], "Espresso");
    assert_eq!(json["price"], 219);
}

#[tokio::test]
async fn test_get_missing_product_is_404() {
    let (app, _) = test_app();

    let response = app.clone().oneshot(get("/products/99")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get("/products/abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_update_delete() {
    let (app, _) = test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/products",
            serde_json::json!({"name": "Mocha", "price": 310, "sku": "cof-moc-cho"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["id"], 3);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/products/3",
            serde_json::json!({"name": "Mocha", "price": 330, "sku": "cof-moc-cho"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.clone().oneshot(get("/products/3")).await.unwrap();
    assert_eq!(body_json(response).await["price"], 330);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/products/3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get("/products/3")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_with_invalid_sku_is_bad_request() {
    let (app, _) = test_app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/products",
            serde_json::json!({"name": "Tea", "price": 150, "sku": "TEA"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_missing_product_is_404() {
    let (app, _) = test_app();

    let response = app
        .oneshot(json_request(
            Method::PUT,
            "/products/42",
            serde_json::json!({"name": "Tea", "price": 150, "sku": "tea-grn-hot"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rates_snapshot_lists_cached_entries() {
    let (app, _) = test_app();

    app.clone()
        .oneshot(get("/products?currency=USD"))
        .await
        .unwrap();
    let response = app.oneshot(get("/rates")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["base"], "EUR");
    assert_eq!(json["stream_state"], "streaming");
    assert_eq!(json["entries"][0]["destination"], "USD");
    assert_eq!(json["entries"][0]["rate"], 1.10);
    assert_eq!(json["entries"][0]["subscribed"], true);
    assert_eq!(json["stats"]["remote_fetches"], 1);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (app, _) = test_app();

    let response = app.oneshot(get("/api-docs/openapi.json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["paths"]["/products"].is_object());
}
