//! HTTP Server
//!
//! Single axum server carrying the notification WebSocket endpoint plus
//! health and metrics. Used by clients for live alerts and by container
//! orchestrators and monitoring systems.
//!
//! # Endpoints
//!
//! - `GET /ws/{user_id}` - WebSocket upgrade for alert notifications
//! - `GET /health` - Returns JSON health status
//! - `GET /healthz` - Kubernetes liveness probe (simple OK)
//! - `GET /metrics` - Prometheus metrics in text format

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::services::SchedulerStats;
use crate::domain::alert::UserId;
use crate::infrastructure::metrics::get_metrics_handle;
use crate::infrastructure::registry::ConnectionRegistry;

// =============================================================================
// Health Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "degraded".
    pub status: HealthStatus,
    /// Engine version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Quote cache status.
    pub cache: CacheStatus,
    /// Live notification connections.
    pub connections: ConnectionStatus,
    /// Polling pipeline counters.
    pub pipeline: PipelineStatus,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational.
    Healthy,
    /// Running without the quote cache.
    Degraded,
}

/// Quote cache status.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    /// Whether a Redis connection was established.
    pub available: bool,
}

/// Live connection counts.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    /// Users with at least one connection.
    pub users: usize,
    /// Total live connections.
    pub connections: usize,
}

/// Pipeline counters since startup.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStatus {
    /// Completed evaluation cycles.
    pub cycles: u64,
    /// Alert events fired.
    pub events_fired: u64,
    /// Notification messages delivered.
    pub notifications_sent: u64,
}

// =============================================================================
// Server State
// =============================================================================

/// Shared state for the HTTP server.
pub struct HttpServerState {
    version: String,
    started_at: Instant,
    registry: Arc<ConnectionRegistry>,
    scheduler_stats: Arc<SchedulerStats>,
    cache_available: bool,
}

impl HttpServerState {
    /// Create new server state.
    #[must_use]
    pub fn new(
        version: String,
        registry: Arc<ConnectionRegistry>,
        scheduler_stats: Arc<SchedulerStats>,
        cache_available: bool,
    ) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            registry,
            scheduler_stats,
            cache_available,
        }
    }
}

// =============================================================================
// HTTP Server
// =============================================================================

/// Notification and health HTTP server.
pub struct HttpServer {
    port: u16,
    state: Arc<HttpServerState>,
    cancel: CancellationToken,
}

impl HttpServer {
    /// Create a new server.
    #[must_use]
    pub const fn new(port: u16, state: Arc<HttpServerState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Run the server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HttpServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), HttpServerError> {
        let app = build_router(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HttpServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "HTTP server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HttpServerError::ServerFailed(e.to_string()))?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the router. Exposed separately so tests can drive it in-process.
pub fn build_router(state: Arc<HttpServerState>) -> Router {
    Router::new()
        .route("/ws/{user_id}", get(ws_handler))
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

// =============================================================================
// WebSocket Handler
// =============================================================================

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(user_id): Path<UserId>,
    State(state): State<Arc<HttpServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, user_id, state))
}

/// Drive one notification connection until the client goes away.
///
/// Outbound alert messages arrive over a per-connection channel registered
/// with the connection registry. Inbound client text is acknowledged with an
/// echo; the engine does not act on it.
async fn handle_socket(socket: WebSocket, user_id: UserId, state: Arc<HttpServerState>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let connection_id = state.registry.register(user_id, tx);
    tracing::info!(user_id, connection_id = %connection_id, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                let Some(text) = outbound else { break };
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(data))) => {
                        let ack = format!("Message received: {data}");
                        if sink.send(Message::Text(ack.into())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_))) => {}
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                }
            }
        }
    }

    state.registry.unregister(user_id, connection_id);
    tracing::info!(user_id, connection_id = %connection_id, "WebSocket disconnected");
}

// =============================================================================
// Health Handlers
// =============================================================================

async fn health_handler(State(state): State<Arc<HttpServerState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(build_health_response(&state)))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            let body = handle.render();
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                body,
            )
        },
    )
}

fn build_health_response(state: &HttpServerState) -> HealthResponse {
    let registry_stats = state.registry.stats();
    let (cycles, events_fired, notifications_sent) = state.scheduler_stats.snapshot();

    let status = if state.cache_available {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    HealthResponse {
        status,
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        cache: CacheStatus {
            available: state.cache_available,
        },
        connections: ConnectionStatus {
            users: registry_stats.user_count,
            connections: registry_stats.connection_count,
        },
        pipeline: PipelineStatus {
            cycles,
            events_fired,
            notifications_sent,
        },
    }
}

// =============================================================================
// Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================
