//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use catalog_types::{ProductRepository, StreamState};

use super::handlers::{self, AppState};
use crate::ProductCatalog;

/// HTTP Server for the Catalog API.
pub struct HttpServer<R: ProductRepository> {
    state: Arc<AppState<R>>,
}

impl<R: ProductRepository> HttpServer<R> {
    /// Creates a new HTTP server around the catalog and the stream state it reports.
    pub fn new(catalog: ProductCatalog<R>, stream_state: watch::Receiver<StreamState>) -> Self {
        Self {
            state: Arc::new(AppState {
                catalog,
                stream_state,
            }),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health::<R>))
            .route(
                "/products",
                get(handlers::list_products::<R>).post(handlers::create_product::<R>),
            )
            .route(
                "/products/{id}",
                get(handlers::get_product::<R>)
                    .put(handlers::update_product::<R>)
                    .delete(handlers::delete_product::<R>),
            )
            .route("/rates", get(handlers::rates::<R>))
            .route("/api-docs/openapi.json", get(handlers::openapi_json))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server until a termination signal arrives or `shutdown` is
    /// cancelled. A signal also cancels `shutdown` so background tasks stop.
    pub async fn run(self, addr: &str, shutdown: CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {}
                    _ = shutdown.cancelled() => {}
                }
                shutdown.cancel();
            })
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
