//! Alert Pipeline Integration Tests
//!
//! Drives the evaluator, dispatcher, and registry together through handwritten
//! port fakes, covering fan-out exactness, cache behavior, and resilience to
//! provider outages.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;

use alert_engine::{
    AlertEvaluator, ConnectionRegistry, InMemoryAlertStore, MarketDataPort,
    NotificationDispatcher, PriceQuote, QuoteCachePort, QuoteError, ToleranceBand, WatchlistAlert,
};

// =============================================================================
// Port Fakes
// =============================================================================

/// Market data fake with fixed prices and a call counter.
struct FakeMarketData {
    prices: HashMap<String, Decimal>,
    calls: AtomicUsize,
    available: bool,
}

impl FakeMarketData {
    fn with_prices(prices: &[(&str, Decimal)]) -> Self {
        Self {
            prices: prices
                .iter()
                .map(|(s, p)| ((*s).to_string(), *p))
                .collect(),
            calls: AtomicUsize::new(0),
            available: true,
        }
    }

    fn down() -> Self {
        Self {
            prices: HashMap::new(),
            calls: AtomicUsize::new(0),
            available: false,
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataPort for FakeMarketData {
    async fn get_quote(&self, symbol: &str) -> Result<PriceQuote, QuoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.available {
            return Err(QuoteError::unavailable(symbol, "provider unreachable"));
        }
        self.prices
            .get(symbol)
            .map(|price| PriceQuote::new(symbol, *price))
            .ok_or_else(|| QuoteError::unavailable(symbol, "unknown symbol"))
    }
}

/// In-memory cache fake honoring the soft-fail contract.
#[derive(Default)]
struct FakeCache {
    entries: Mutex<HashMap<String, String>>,
    degraded: bool,
}

impl FakeCache {
    fn degraded() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            degraded: true,
        }
    }
}

#[async_trait]
impl QuoteCachePort for FakeCache {
    async fn get(&self, key: &str) -> Option<String> {
        if self.degraded {
            return None;
        }
        self.entries.lock().get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str, _ttl: Duration) -> bool {
        if self.degraded {
            return false;
        }
        self.entries.lock().insert(key.to_string(), value.to_string());
        true
    }

    async fn delete(&self, key: &str) -> bool {
        !self.degraded && self.entries.lock().remove(key).is_some()
    }

    async fn flush_all(&self) -> bool {
        if self.degraded {
            return false;
        }
        self.entries.lock().clear();
        true
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn alert(alert_id: u64, user_id: u64, symbol: &str, target: Decimal) -> WatchlistAlert {
    WatchlistAlert {
        alert_id,
        user_id,
        symbol: symbol.to_string(),
        target_price: target,
        active: true,
    }
}

fn store_with(alerts: Vec<WatchlistAlert>) -> Arc<InMemoryAlertStore> {
    let store = Arc::new(InMemoryAlertStore::new());
    for a in alerts {
        store.upsert(a);
    }
    store
}

// =============================================================================
// Pipeline Tests
// =============================================================================

#[tokio::test]
async fn fired_alert_reaches_every_connection_of_the_user() {
    let store = store_with(vec![alert(1, 7, "THYAO", dec!(290))]);
    let market = Arc::new(FakeMarketData::with_prices(&[("THYAO", dec!(289.50))]));
    let cache = Arc::new(FakeCache::default());

    let evaluator = AlertEvaluator::new(store, market, cache, ToleranceBand::default());

    let registry = Arc::new(ConnectionRegistry::new());
    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    registry.register(7, tx_a);
    registry.register(7, tx_b);
    let dispatcher = NotificationDispatcher::new(Arc::clone(&registry));

    let outcome = evaluator.run_cycle().await;
    assert_eq!(outcome.events.len(), 1);
    assert_eq!(dispatcher.dispatch_all(&outcome.events), 2);

    let expected =
        "Stock Alert: THYAO is near your target price of 290! Current price: 289.50";
    assert_eq!(rx_a.recv().await.as_deref(), Some(expected));
    assert_eq!(rx_b.recv().await.as_deref(), Some(expected));
}

#[tokio::test]
async fn notifications_go_only_to_the_owning_user() {
    let store = store_with(vec![
        alert(1, 7, "THYAO", dec!(290)),
        alert(2, 8, "GARAN", dec!(1000)),
    ]);
    let market = Arc::new(FakeMarketData::with_prices(&[
        ("THYAO", dec!(290)),
        ("GARAN", dec!(45)),
    ]));
    let cache = Arc::new(FakeCache::default());
    let evaluator = AlertEvaluator::new(store, market, cache, ToleranceBand::default());

    let registry = Arc::new(ConnectionRegistry::new());
    let (tx_7, mut rx_7) = mpsc::unbounded_channel();
    let (tx_8, mut rx_8) = mpsc::unbounded_channel();
    registry.register(7, tx_7);
    registry.register(8, tx_8);
    let dispatcher = NotificationDispatcher::new(registry);

    let outcome = evaluator.run_cycle().await;
    // GARAN at 45 is nowhere near 1000, only user 7's alert fires.
    assert_eq!(outcome.events.len(), 1);
    dispatcher.dispatch_all(&outcome.events);

    assert!(rx_7.recv().await.is_some());
    assert!(rx_8.try_recv().is_err());
}

#[tokio::test]
async fn repeat_fire_three_consecutive_cycles() {
    // No suppression between cycles: a price parked inside the band keeps
    // firing every cycle.
    let store = store_with(vec![alert(1, 7, "THYAO", dec!(290))]);
    let market = Arc::new(FakeMarketData::with_prices(&[("THYAO", dec!(290))]));
    let cache = Arc::new(FakeCache::degraded());
    let evaluator = AlertEvaluator::new(store, market, cache, ToleranceBand::default());

    let registry = Arc::new(ConnectionRegistry::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    registry.register(7, tx);
    let dispatcher = NotificationDispatcher::new(registry);

    for _ in 0..3 {
        let outcome = evaluator.run_cycle().await;
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(dispatcher.dispatch_all(&outcome.events), 1);
    }

    for _ in 0..3 {
        assert!(rx.recv().await.is_some());
    }
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn provider_outage_skips_cycle_and_recovers() {
    let store = store_with(vec![alert(1, 7, "THYAO", dec!(290))]);
    let cache = Arc::new(FakeCache::degraded());

    let down = Arc::new(FakeMarketData::down());
    let evaluator = AlertEvaluator::new(
        Arc::clone(&store),
        down,
        Arc::clone(&cache),
        ToleranceBand::default(),
    );

    let outcome = evaluator.run_cycle().await;
    assert_eq!(outcome.evaluated, 1);
    assert_eq!(outcome.skipped, 1);
    assert!(outcome.events.is_empty());

    // Same store, provider back up: the next cycle fires normally.
    let up = Arc::new(FakeMarketData::with_prices(&[("THYAO", dec!(290))]));
    let evaluator = AlertEvaluator::new(store, up, cache, ToleranceBand::default());

    let outcome = evaluator.run_cycle().await;
    assert_eq!(outcome.events.len(), 1);
}

#[tokio::test]
async fn degraded_cache_falls_through_to_provider_every_cycle() {
    let store = store_with(vec![alert(1, 7, "THYAO", dec!(290))]);
    let market = Arc::new(FakeMarketData::with_prices(&[("THYAO", dec!(290))]));
    let cache = Arc::new(FakeCache::degraded());

    let evaluator = AlertEvaluator::new(store, Arc::clone(&market), cache, ToleranceBand::default());

    for _ in 0..2 {
        let outcome = evaluator.run_cycle().await;
        assert_eq!(outcome.events.len(), 1);
    }
    // Nothing was cached, so each cycle hit the provider.
    assert_eq!(market.call_count(), 2);
}

#[tokio::test]
async fn working_cache_spares_the_provider_on_later_cycles() {
    let store = store_with(vec![alert(1, 7, "THYAO", dec!(290))]);
    let market = Arc::new(FakeMarketData::with_prices(&[("THYAO", dec!(290))]));
    let cache = Arc::new(FakeCache::default());

    let evaluator = AlertEvaluator::new(store, Arc::clone(&market), cache, ToleranceBand::default());

    for _ in 0..3 {
        let outcome = evaluator.run_cycle().await;
        assert_eq!(outcome.events.len(), 1);
    }
    // First cycle populated the cache; the rest were hits.
    assert_eq!(market.call_count(), 1);
}

#[tokio::test]
async fn one_lookup_serves_all_alerts_on_a_symbol() {
    let store = store_with(vec![
        alert(1, 1, "THYAO", dec!(290)),
        alert(2, 2, "THYAO", dec!(289)),
        alert(3, 3, "THYAO", dec!(292)),
    ]);
    let market = Arc::new(FakeMarketData::with_prices(&[("THYAO", dec!(290))]));
    let cache = Arc::new(FakeCache::degraded());

    let evaluator = AlertEvaluator::new(store, Arc::clone(&market), cache, ToleranceBand::default());

    let outcome = evaluator.run_cycle().await;
    assert_eq!(outcome.evaluated, 3);
    assert_eq!(outcome.events.len(), 3);
    assert_eq!(market.call_count(), 1);
}

#[tokio::test]
async fn disconnected_receiver_is_pruned_and_others_still_served() {
    let registry = Arc::new(ConnectionRegistry::new());
    let (tx_gone, rx_gone) = mpsc::unbounded_channel();
    let (tx_live, mut rx_live) = mpsc::unbounded_channel();
    registry.register(7, tx_gone);
    registry.register(7, tx_live);

    drop(rx_gone);

    let store = store_with(vec![alert(1, 7, "THYAO", dec!(290))]);
    let market = Arc::new(FakeMarketData::with_prices(&[("THYAO", dec!(290))]));
    let cache = Arc::new(FakeCache::degraded());
    let evaluator = AlertEvaluator::new(store, market, cache, ToleranceBand::default());
    let dispatcher = NotificationDispatcher::new(Arc::clone(&registry));

    let outcome = evaluator.run_cycle().await;
    assert_eq!(dispatcher.dispatch_all(&outcome.events), 1);
    assert!(rx_live.recv().await.is_some());

    let stats = registry.stats();
    assert_eq!(stats.connection_count, 1);
    assert_eq!(stats.user_count, 1);
}

#[tokio::test]
async fn alerts_outside_tolerance_stay_silent() {
    let store = store_with(vec![
        alert(1, 7, "THYAO", dec!(290)),
        alert(2, 7, "GARAN", dec!(45)),
    ]);
    // THYAO exactly 1% above target fires; GARAN far away stays quiet.
    let market = Arc::new(FakeMarketData::with_prices(&[
        ("THYAO", dec!(292.90)),
        ("GARAN", dec!(60)),
    ]));
    let cache = Arc::new(FakeCache::degraded());
    let evaluator = AlertEvaluator::new(store, market, cache, ToleranceBand::default());

    let outcome = evaluator.run_cycle().await;
    assert_eq!(outcome.evaluated, 2);
    assert_eq!(outcome.events.len(), 1);
    assert_eq!(outcome.events[0].symbol, "THYAO");
}
