//! Alert Evaluator
//!
//! For every active watchlist alert, resolves the current price of its
//! symbol cache-aside (cache get -> gateway call -> cache populate) and
//! decides which alerts fire. Failures are isolated per alert: a symbol
//! whose quote is unavailable this cycle is skipped, logged, and retried
//! naturally on the next tick.
//!
//! No state is retained between cycles; an alert that stays within tolerance
//! fires on every cycle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::application::ports::{
    AlertStorePort, MarketDataPort, QuoteCachePort, QuoteError,
};
use crate::domain::alert::{AlertEvent, ToleranceBand};
use crate::domain::quote::PriceQuote;
use crate::domain::symbol;
use crate::infrastructure::metrics;

/// Cache key prefix for current-price lookups: `stock_price:{SYMBOL}`.
const PRICE_KEY_PREFIX: &str = "stock_price:";

/// Default TTL for cached quotes (10 minutes).
pub const DEFAULT_QUOTE_TTL: Duration = Duration::from_secs(600);

/// Result of one full evaluation pass.
#[derive(Debug, Clone, Default)]
pub struct CycleOutcome {
    /// Alerts that fired this cycle, in store order.
    pub events: Vec<AlertEvent>,
    /// Number of active alerts examined.
    pub evaluated: usize,
    /// Alerts skipped because no price could be resolved.
    pub skipped: usize,
}

/// Evaluates active alerts against current market prices.
pub struct AlertEvaluator<S, M, C>
where
    S: AlertStorePort,
    M: MarketDataPort,
    C: QuoteCachePort,
{
    alerts: Arc<S>,
    market: Arc<M>,
    cache: Arc<C>,
    tolerance: ToleranceBand,
    quote_ttl: Duration,
}

impl<S, M, C> AlertEvaluator<S, M, C>
where
    S: AlertStorePort,
    M: MarketDataPort,
    C: QuoteCachePort,
{
    /// Create an evaluator with the default quote TTL.
    #[must_use]
    pub fn new(alerts: Arc<S>, market: Arc<M>, cache: Arc<C>, tolerance: ToleranceBand) -> Self {
        Self {
            alerts,
            market,
            cache,
            tolerance,
            quote_ttl: DEFAULT_QUOTE_TTL,
        }
    }

    /// Override the cache TTL applied when populating quotes.
    #[must_use]
    pub const fn with_quote_ttl(mut self, ttl: Duration) -> Self {
        self.quote_ttl = ttl;
        self
    }

    /// Run one full evaluation pass.
    ///
    /// Always completes: store failures yield an empty outcome, per-alert
    /// failures are counted as skips. Price resolution is memoized per
    /// symbol within the pass so N alerts on one symbol cost one lookup.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let alerts = match self.alerts.active_alerts().await {
            Ok(alerts) => alerts,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read active alerts, skipping cycle");
                return CycleOutcome::default();
            }
        };

        let mut outcome = CycleOutcome::default();
        let mut resolved: HashMap<String, Option<Decimal>> = HashMap::new();

        for alert in alerts {
            if !alert.active {
                continue;
            }
            outcome.evaluated += 1;

            let sym = symbol::normalize(&alert.symbol);
            let price = match resolved.get(&sym) {
                Some(cached) => *cached,
                None => {
                    let result = self.resolve_price(&sym).await;
                    if let Err(e) = &result {
                        tracing::warn!(
                            alert_id = alert.alert_id,
                            symbol = %sym,
                            error = %e,
                            "Skipping alert this cycle"
                        );
                    }
                    let price = result.ok();
                    resolved.insert(sym.clone(), price);
                    price
                }
            };

            let Some(current_price) = price else {
                outcome.skipped += 1;
                continue;
            };

            if self.tolerance.contains(alert.target_price, current_price) {
                tracing::debug!(
                    alert_id = alert.alert_id,
                    symbol = %sym,
                    target = %alert.target_price,
                    current = %current_price,
                    "Alert fired"
                );
                outcome.events.push(AlertEvent {
                    user_id: alert.user_id,
                    symbol: sym.clone(),
                    target_price: alert.target_price,
                    current_price,
                });
            }
        }

        metrics::record_alerts_evaluated(outcome.evaluated as u64);
        metrics::record_alerts_fired(outcome.events.len() as u64);
        outcome
    }

    /// Resolve the current price for a normalized symbol, cache-aside.
    ///
    /// A cached payload that fails to deserialize is treated as a miss, not
    /// an error; the gateway result then overwrites it.
    async fn resolve_price(&self, sym: &str) -> Result<Decimal, QuoteError> {
        let key = format!("{PRICE_KEY_PREFIX}{sym}");

        if let Some(payload) = self.cache.get(&key).await {
            match serde_json::from_str::<PriceQuote>(&payload) {
                Ok(quote) => {
                    metrics::record_cache_hit();
                    return Ok(quote.price);
                }
                Err(e) => {
                    tracing::debug!(key = %key, error = %e, "Discarding undecodable cache entry");
                }
            }
        }
        metrics::record_cache_miss();

        let quote = self.market.get_quote(sym).await.inspect_err(|_| {
            metrics::record_gateway_failure();
        })?;

        match serde_json::to_string(&quote) {
            Ok(payload) => {
                self.cache.set(&key, &payload, self.quote_ttl).await;
            }
            Err(e) => {
                tracing::debug!(symbol = %sym, error = %e, "Could not serialize quote for cache");
            }
        }

        Ok(quote.price)
    }
}

// =============================================================================
// Tests
// =============================================================================
