//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tokio::sync::watch;
use utoipa::OpenApi;

use catalog_types::{
    AppError, CurrencyQuery, ProductId, ProductRepository, ProductRequest, ProductView, RateError,
    StreamState,
};

use crate::ProductCatalog;
use crate::openapi::ApiDoc;

/// Application state shared across handlers.
pub struct AppState<R: ProductRepository> {
    pub catalog: ProductCatalog<R>,
    pub stream_state: watch::Receiver<StreamState>,
}

impl<R: ProductRepository> AppState<R> {
    fn stream_state(&self) -> StreamState {
        *self.stream_state.borrow()
    }
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Rate(RateError::InvalidCurrency(_) | RateError::RemoteRejected { .. }) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Rate(RateError::RemoteUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self.0 {
            AppError::BadRequest(msg) | AppError::NotFound(msg) | AppError::Internal(msg) => {
                msg.clone()
            }
            AppError::Rate(e) => e.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "Request failed");
        }

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

fn parse_id(id: &str) -> Result<ProductId, AppError> {
    id.parse()
        .map_err(|_| AppError::BadRequest("Invalid product ID".into()))
}

/// Health check endpoint.
pub async fn health<R: ProductRepository>(
    State(state): State<Arc<AppState<R>>>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "rate_stream": state.stream_state(),
    }))
}

/// List products, priced in the requested currency.
#[tracing::instrument(skip(state))]
pub async fn list_products<R: ProductRepository>(
    State(state): State<Arc<AppState<R>>>,
    Query(query): Query<CurrencyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .catalog
        .get_converted_products(query.currency.as_deref())
        .await?;
    Ok(Json(products))
}

/// Get one product, priced in the requested currency.
#[tracing::instrument(skip(state), fields(product_id = %id))]
pub async fn get_product<R: ProductRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
    Query(query): Query<CurrencyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let product = state
        .catalog
        .get_converted_product(id, query.currency.as_deref())
        .await?;
    Ok(Json(product))
}

/// Add a product priced in the base currency.
#[tracing::instrument(skip(state, req), fields(name = %req.name, sku = %req.sku))]
pub async fn create_product<R: ProductRepository>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<ProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.catalog.add_product(req).await?;
    let view = ProductView::from_product(&product, state.catalog.base_currency());
    Ok((StatusCode::CREATED, Json(view)))
}

/// Replace a product.
#[tracing::instrument(skip(state, req), fields(product_id = %id))]
pub async fn update_product<R: ProductRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
    Json(req): Json<ProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    state.catalog.update_product(id, req).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a product.
#[tracing::instrument(skip(state), fields(product_id = %id))]
pub async fn delete_product<R: ProductRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    state.catalog.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rate cache contents and counters.
pub async fn rates<R: ProductRepository>(
    State(state): State<Arc<AppState<R>>>,
) -> impl IntoResponse {
    Json(state.catalog.rates_snapshot(state.stream_state()))
}

/// Generated OpenAPI document.
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
