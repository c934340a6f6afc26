#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Alert Engine - Stock Price Alert Pipeline
//!
//! Polls market prices on a fixed interval, evaluates user watchlist alerts
//! against a tolerance band around their target prices, and pushes one
//! notification per fired alert to every live WebSocket connection of the
//! owning user. A Redis TTL cache sits in front of the market data provider
//! and degrades to a pass-through when unavailable.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Alert, quote, and holding arithmetic with no I/O
//!   - `alert`: Watchlist alerts, fired events, tolerance band
//!   - `quote`: Price quote value type
//!   - `holding`: Weighted-average cost-basis bookkeeping
//!   - `symbol`: Market-suffix qualification
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Market data, alert store, and quote cache interfaces
//!   - `services`: Evaluator, dispatcher, polling scheduler
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `gateway`: HTTP market data provider adapter
//!   - `cache`: Redis quote cache with soft-fail semantics
//!   - `registry`: Per-user live connection tracking
//!   - `http`: WebSocket, health, and metrics endpoints
//!   - `ledger`: In-memory portfolio holding store
//!   - `alerts`: In-memory alert store
//!   - `config`: Environment configuration
//!
//! # Data Flow
//!
//! ```text
//! Scheduler ──► Evaluator ──► cache ──► Gateway (HTTP provider)
//!                  │
//!                  ▼
//!             Dispatcher ──► Registry ──► WebSocket ──► Client 1..N
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core alert and holding types with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::alert::{AlertEvent, ToleranceBand, UserId, WatchlistAlert};
pub use domain::holding::{Holding, HoldingError};
pub use domain::quote::PriceQuote;

// Application ports and services
pub use application::ports::{AlertStorePort, MarketDataPort, QuoteCachePort, QuoteError};
pub use application::services::{
    AlertEvaluator, CycleOutcome, NotificationDispatcher, PollingScheduler, SchedulerStats,
};

// Infrastructure config
pub use infrastructure::config::{
    AppConfig, ConfigError, PipelineSettings, ServerSettings, TelemetrySettings,
};

// Adapters (for integration tests and the binary)
pub use infrastructure::alerts::InMemoryAlertStore;
pub use infrastructure::cache::RedisQuoteCache;
pub use infrastructure::gateway::{GatewayConfig, HttpMarketDataGateway};
pub use infrastructure::http::{HttpServer, HttpServerError, HttpServerState};
pub use infrastructure::ledger::{HoldingLedger, LedgerError};
pub use infrastructure::registry::{ConnectionId, ConnectionRegistry, RegistryStats};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryError, TelemetryGuard, init as init_telemetry};
