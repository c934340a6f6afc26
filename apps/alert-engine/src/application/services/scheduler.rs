//! Polling Scheduler
//!
//! Drives the evaluate-then-dispatch pipeline on a fixed interval until
//! shutdown. One cycle at a time: a slow cycle delays the next tick rather
//! than overlapping it. A failed cycle never stops the loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::application::ports::{AlertStorePort, MarketDataPort, QuoteCachePort};
use crate::application::services::{AlertEvaluator, NotificationDispatcher};
use crate::infrastructure::metrics;

/// Default polling period (60 seconds).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Running counters for the polling loop, shared with the health endpoint.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    /// Completed evaluation cycles.
    pub cycles: AtomicU64,
    /// Alert events fired across all cycles.
    pub events_fired: AtomicU64,
    /// Notification messages handed to connections.
    pub notifications_sent: AtomicU64,
}

impl SchedulerStats {
    /// Snapshot as `(cycles, events_fired, notifications_sent)`.
    #[must_use]
    pub fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.cycles.load(Ordering::Relaxed),
            self.events_fired.load(Ordering::Relaxed),
            self.notifications_sent.load(Ordering::Relaxed),
        )
    }
}

/// Periodic evaluate-then-dispatch driver.
pub struct PollingScheduler<S, M, C>
where
    S: AlertStorePort,
    M: MarketDataPort,
    C: QuoteCachePort,
{
    evaluator: AlertEvaluator<S, M, C>,
    dispatcher: NotificationDispatcher,
    period: Duration,
    stats: Arc<SchedulerStats>,
}

impl<S, M, C> PollingScheduler<S, M, C>
where
    S: AlertStorePort,
    M: MarketDataPort,
    C: QuoteCachePort,
{
    /// Create a scheduler with the given polling period.
    #[must_use]
    pub fn new(
        evaluator: AlertEvaluator<S, M, C>,
        dispatcher: NotificationDispatcher,
        period: Duration,
    ) -> Self {
        Self {
            evaluator,
            dispatcher,
            period,
            stats: Arc::new(SchedulerStats::default()),
        }
    }

    /// Handle to the shared cycle counters.
    #[must_use]
    pub fn stats(&self) -> Arc<SchedulerStats> {
        Arc::clone(&self.stats)
    }

    /// Run until the token is cancelled.
    ///
    /// The first cycle runs one full period after startup, not immediately.
    /// Missed ticks are delayed, never bursted.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(period_secs = self.period.as_secs(), "Polling scheduler started");

        let mut ticker = tokio::time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    tracing::info!("Polling scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_once().await;
                }
            }
        }
    }

    /// Execute one evaluate-then-dispatch cycle.
    async fn run_once(&self) {
        let started = Instant::now();
        let outcome = self.evaluator.run_cycle().await;
        let delivered = self.dispatcher.dispatch_all(&outcome.events);

        self.stats.cycles.fetch_add(1, Ordering::Relaxed);
        self.stats
            .events_fired
            .fetch_add(outcome.events.len() as u64, Ordering::Relaxed);
        self.stats
            .notifications_sent
            .fetch_add(delivered as u64, Ordering::Relaxed);
        metrics::record_cycle_duration(started.elapsed());

        tracing::info!(
            evaluated = outcome.evaluated,
            skipped = outcome.skipped,
            fired = outcome.events.len(),
            delivered,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Evaluation cycle complete"
        );
    }
}

// =============================================================================
// Tests
// =============================================================================
