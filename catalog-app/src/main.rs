//! # Catalog Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Choose the rate service adapters (remote or simulated)
//! - Start the rate cache and its stream consumer
//! - Start the HTTP server

mod config;

use std::sync::Arc;

use opentelemetry::global;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_hex::outbound::{HttpRateFetcher, SimulatedRateService, WsRateConnector, stream_url};
use catalog_hex::rates::start_rate_services;
use catalog_hex::{ProductCatalog, inbound::HttpServer};
use catalog_repo::build_repo;
use catalog_types::{RateFetcher, RateStreamConnector};

use config::Config;

fn init_tracer() -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // Use gRPC exporter with batch processing (non-blocking)
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("catalog-service"), provider))
}

type RateAdapters = (Arc<dyn RateFetcher>, Arc<dyn RateStreamConnector>);

fn rate_adapters(config: &Config) -> anyhow::Result<RateAdapters> {
    let Some(rates_url) = &config.rates_url else {
        tracing::warn!("RATES_URL not set, using the simulated rate service");
        catalog_currency::set_fluctuation(true);
        let simulated = Arc::new(SimulatedRateService::new(config.simulated_tick));
        let fetcher: Arc<dyn RateFetcher> = simulated.clone();
        let connector: Arc<dyn RateStreamConnector> = simulated;
        return Ok((fetcher, connector));
    };

    let ws_url = match &config.rates_ws_url {
        Some(url) => url::Url::parse(url)?,
        None => stream_url(rates_url)?,
    };
    tracing::info!(%rates_url, %ws_url, "Using remote rate service");

    let fetcher: Arc<dyn RateFetcher> = Arc::new(HttpRateFetcher::new(rates_url.as_str()));
    let connector: Arc<dyn RateStreamConnector> = Arc::new(WsRateConnector::new(ws_url));
    Ok((fetcher, connector))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // OpenTelemetry export only when a collector is configured
    let otel = match std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(_) => Some(init_tracer()?),
        Err(_) => None,
    };
    let telemetry = otel
        .as_ref()
        .map(|(tracer, _)| tracing_opentelemetry::layer().with_tracer(tracer.clone()));

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,catalog_app=debug,catalog_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry)
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!(
        "Starting catalog server on port {} with base currency {}",
        config.port,
        config.base_currency
    );

    let shutdown = CancellationToken::new();
    let (fetcher, connector) = rate_adapters(&config)?;
    let rates = start_rate_services(
        config.cache(),
        config.reconnect.clone(),
        fetcher,
        connector,
        shutdown.clone(),
    );

    let catalog = ProductCatalog::new(build_repo(), rates.cache.clone());

    // Create and run the HTTP server
    let server = HttpServer::new(catalog, rates.stream_state.clone());
    let addr = format!("0.0.0.0:{}", config.port);

    let served = server.run(&addr, shutdown.clone()).await;
    shutdown.cancel();

    match rates.consumer.await {
        Ok(Ok(())) => tracing::info!("Rate stream consumer stopped"),
        Ok(Err(e)) => tracing::warn!(error = %e, "Rate stream consumer had already given up"),
        Err(e) => tracing::error!(error = %e, "Rate stream consumer panicked"),
    }

    // Ensure traces are flushed before exit
    if let Some((_, provider)) = otel {
        let _ = provider.shutdown();
    }
    served
}
