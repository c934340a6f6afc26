//! Port Definitions
//!
//! Interfaces the alert pipeline depends on, implemented by infrastructure
//! adapters. The evaluator and scheduler are written against these traits so
//! tests can substitute in-memory fakes or mocks.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::alert::WatchlistAlert;
use crate::domain::quote::PriceQuote;

#[cfg(test)]
use mockall::automock;

// =============================================================================
// Market Data
// =============================================================================

/// Quote lookup failure.
///
/// The gateway performs no retries; the evaluator's next tick is the retry
/// policy. Unknown symbols, transport failures, timeouts, and malformed
/// provider payloads all surface the same way.
#[derive(Debug, Clone, Error)]
pub enum QuoteError {
    /// No usable quote could be produced for the symbol this cycle.
    #[error("quote unavailable for {symbol}: {reason}")]
    Unavailable {
        /// Internal (bare) symbol.
        symbol: String,
        /// Human-readable cause, for logs only.
        reason: String,
    },
}

impl QuoteError {
    /// Convenience constructor.
    #[must_use]
    pub fn unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}

/// Port for quote-by-symbol lookups against the external provider.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Fetch the current quote for an internal (bare) symbol.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::Unavailable` when the symbol is unknown or the
    /// provider is unreachable, rate-limited, or slow.
    async fn get_quote(&self, symbol: &str) -> Result<PriceQuote, QuoteError>;
}

// =============================================================================
// Alert Store
// =============================================================================

/// Alert store failure.
#[derive(Debug, Clone, Error)]
pub enum AlertStoreError {
    /// The backing store could not be read.
    #[error("alert store unavailable: {0}")]
    Unavailable(String),
}

/// Port for reading watchlist alerts from the external store.
///
/// The engine is read-only here: alert lifecycle belongs to the CRUD layer.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AlertStorePort: Send + Sync {
    /// All alerts with `active == true`.
    async fn active_alerts(&self) -> Result<Vec<WatchlistAlert>, AlertStoreError>;
}

// =============================================================================
// Quote Cache
// =============================================================================

/// Port for the TTL cache in front of the market data gateway.
///
/// Every operation is non-throwing: an unreachable backing store degrades to
/// an unconditional miss (`get` -> `None`, `set`/`delete` -> `false`). The
/// cache is a latency/cost optimization, never a source of truth, and the
/// pipeline must be correct when it is entirely absent.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QuoteCachePort: Send + Sync {
    /// Look up a serialized payload. `None` on miss, expiry, or degrade.
    async fn get(&self, key: &str) -> Option<String>;

    /// Store a serialized payload with a per-key TTL. `false` on degrade.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> bool;

    /// Remove a key. `false` on degrade.
    async fn delete(&self, key: &str) -> bool;

    /// Clear the whole cache. `false` on degrade.
    async fn flush_all(&self) -> bool;
}
