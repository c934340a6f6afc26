//! Alert Engine Binary
//!
//! Starts the stock price alert pipeline.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin alert-engine
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `MARKET_DATA_URL`: Base URL of the quote provider
//!
//! ## Optional
//! - `REDIS_URL`: Redis URL for the quote cache (default: no cache)
//! - `MARKET_SUFFIX`: Suffix appended to provider symbols (default: .IS)
//! - `GATEWAY_TIMEOUT_SECS`: Provider request timeout (default: 5)
//! - `POLL_INTERVAL_SECS`: Seconds between evaluation cycles (default: 60)
//! - `ALERT_TOLERANCE_PCT`: Tolerance band around targets in percent (default: 1)
//! - `QUOTE_CACHE_TTL_SECS`: TTL for cached quotes (default: 600)
//! - `ALERT_ENGINE_HTTP_PORT`: HTTP/WebSocket port (default: 8080)
//! - `OTEL_ENABLED`: Enable OpenTelemetry (default: true)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4318>)
//! - `OTEL_SERVICE_NAME`: Service name (default: alert-engine)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use alert_engine::infrastructure::telemetry;
use alert_engine::{
    AlertEvaluator, AppConfig, ConnectionRegistry, GatewayConfig, HttpMarketDataGateway,
    HttpServer, HttpServerState, InMemoryAlertStore, NotificationDispatcher, PollingScheduler,
    RedisQuoteCache, ToleranceBand, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let config = AppConfig::from_env()?;

    // Initialize telemetry (tracing + optional OTLP export)
    let _telemetry_guard = telemetry::init(&config.telemetry)?;

    tracing::info!("Starting Alert Engine");
    log_config(&config);

    // Initialize Prometheus metrics
    let _metrics_handle = init_metrics();

    let shutdown_token = CancellationToken::new();

    // Quote cache: soft-fail, so startup proceeds with or without Redis
    let cache = match &config.redis_url {
        Some(url) => RedisQuoteCache::connect(url).await,
        None => {
            tracing::info!("No REDIS_URL configured, running without quote cache");
            RedisQuoteCache::disabled()
        }
    };
    let cache_available = cache.is_available();
    let cache = Arc::new(cache);

    // Market data gateway
    let gateway = Arc::new(HttpMarketDataGateway::new(&GatewayConfig {
        base_url: config.market_data.base_url.clone(),
        market_suffix: config.market_data.market_suffix.clone(),
        timeout: config.market_data.timeout,
    })?);

    // Alert store and connection registry
    let alert_store = Arc::new(InMemoryAlertStore::new());
    let registry = Arc::new(ConnectionRegistry::new());

    // Evaluate-then-dispatch pipeline
    let tolerance = ToleranceBand::from_pct(config.pipeline.tolerance_pct);
    let evaluator = AlertEvaluator::new(
        Arc::clone(&alert_store),
        Arc::clone(&gateway),
        Arc::clone(&cache),
        tolerance,
    )
    .with_quote_ttl(config.pipeline.quote_ttl);
    let dispatcher = NotificationDispatcher::new(Arc::clone(&registry));
    let scheduler = PollingScheduler::new(evaluator, dispatcher, config.pipeline.poll_interval);
    let scheduler_stats = scheduler.stats();

    // HTTP server: WebSocket notifications, health, metrics
    let server_state = Arc::new(HttpServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&registry),
        scheduler_stats,
        cache_available,
    ));
    let http_server = HttpServer::new(
        config.server.http_port,
        server_state,
        shutdown_token.clone(),
    );

    // Spawn the polling scheduler
    let scheduler_shutdown = shutdown_token.clone();
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run(scheduler_shutdown).await;
    });

    // Spawn the HTTP server
    let server_handle = tokio::spawn(async move {
        if let Err(e) = http_server.run().await {
            tracing::error!(error = %e, "HTTP server error");
        }
    });

    tracing::info!("Alert engine ready");

    await_signal().await;
    shutdown_token.cancel();
    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );

    // Wait for the scheduler to leave its cycle and for axum to close the
    // WebSocket connections it still holds, bounded by the shutdown timeout.
    let drain = async {
        if let Err(e) = scheduler_handle.await {
            tracing::error!(error = %e, "Scheduler task failed during shutdown");
        }
        if let Err(e) = server_handle.await {
            tracing::error!(error = %e, "HTTP server task failed during shutdown");
        }
    };
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, drain).await.is_err() {
        tracing::warn!("Shutdown timeout elapsed before all tasks drained");
    }

    tracing::info!("Alert engine stopped");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }
}

/// Log the parsed configuration.
fn log_config(config: &AppConfig) {
    tracing::info!(
        http_port = config.server.http_port,
        poll_interval_secs = config.pipeline.poll_interval.as_secs(),
        tolerance_pct = %config.pipeline.tolerance_pct,
        quote_ttl_secs = config.pipeline.quote_ttl.as_secs(),
        market_suffix = %config.market_data.market_suffix,
        cache_configured = config.redis_url.is_some(),
        "Configuration loaded"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv_from_ancestors() {
    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
