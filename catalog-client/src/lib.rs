//! # Catalog Client SDK
//!
//! A typed Rust client for the Catalog API.

use catalog_types::{ProductId, ProductRequest, ProductView, RatesSnapshot};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Catalog API client.
pub struct CatalogClient {
    base_url: String,
    http: Client,
}

impl CatalogClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<serde_json::Value, ClientError> {
        self.get("/health").await
    }

    /// Lists products, optionally priced in `currency`.
    pub async fn list_products(
        &self,
        currency: Option<&str>,
    ) -> Result<Vec<ProductView>, ClientError> {
        self.get(&with_currency("/products", currency)).await
    }

    /// Gets one product, optionally priced in `currency`.
    pub async fn get_product(
        &self,
        id: ProductId,
        currency: Option<&str>,
    ) -> Result<ProductView, ClientError> {
        self.get(&with_currency(&format!("/products/{}", id), currency))
            .await
    }

    /// Adds a product priced in the base currency.
    pub async fn create_product(&self, req: &ProductRequest) -> Result<ProductView, ClientError> {
        let resp = self
            .http
            .post(format!("{}/products", self.base_url))
            .json(req)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Replaces a product.
    pub async fn update_product(
        &self,
        id: ProductId,
        req: &ProductRequest,
    ) -> Result<(), ClientError> {
        let resp = self
            .http
            .put(format!("{}/products/{}", self.base_url, id))
            .json(req)
            .send()
            .await?;
        self.handle_empty(resp).await
    }

    /// Removes a product.
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ClientError> {
        let resp = self
            .http
            .request(Method::DELETE, format!("{}/products/{}", self.base_url, id))
            .send()
            .await?;
        self.handle_empty(resp).await
    }

    /// Fetches the server's rate cache snapshot.
    pub async fn rates(&self) -> Result<RatesSnapshot, ClientError> {
        self.get("/rates").await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        let body = resp.text().await?;
        if status.is_success() {
            Ok(serde_json::from_str(&body)?)
        } else {
            Err(api_error(status.as_u16(), body))
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(api_error(status.as_u16(), body))
    }
}

fn with_currency(path: &str, currency: Option<&str>) -> String {
    match currency.map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => format!("{}?currency={}", path, code),
        None => path.to_string(),
    }
}

fn api_error(status: u16, body: String) -> ClientError {
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or(body);
    ClientError::Api { status, message }
}
