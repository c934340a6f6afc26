//! In-Memory Alert Store
//!
//! `AlertStorePort` adapter holding watchlist alerts in process memory.
//! Alert CRUD lives in a separate service; this store is the engine's view
//! of it, fed at startup or by whatever wiring the deployment uses.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{AlertStoreError, AlertStorePort};
use crate::domain::alert::WatchlistAlert;
use crate::domain::symbol;

/// Thread-safe in-memory alert store.
#[derive(Default)]
pub struct InMemoryAlertStore {
    alerts: RwLock<HashMap<u64, WatchlistAlert>>,
}

impl InMemoryAlertStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an alert. The symbol is normalized on the way in.
    pub fn upsert(&self, mut alert: WatchlistAlert) {
        alert.symbol = symbol::normalize(&alert.symbol);
        self.alerts.write().insert(alert.alert_id, alert);
    }

    /// Remove an alert. Returns it if present.
    pub fn remove(&self, alert_id: u64) -> Option<WatchlistAlert> {
        self.alerts.write().remove(&alert_id)
    }

    /// Flip an alert's active flag. Returns false for unknown ids.
    pub fn set_active(&self, alert_id: u64, active: bool) -> bool {
        self.alerts
            .write()
            .get_mut(&alert_id)
            .map(|alert| alert.active = active)
            .is_some()
    }

    /// Total alerts held, active or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.alerts.read().len()
    }

    /// Whether the store holds no alerts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.read().is_empty()
    }
}

#[async_trait]
impl AlertStorePort for InMemoryAlertStore {
    async fn active_alerts(&self) -> Result<Vec<WatchlistAlert>, AlertStoreError> {
        let mut alerts: Vec<WatchlistAlert> = self
            .alerts
            .read()
            .values()
            .filter(|alert| alert.active)
            .cloned()
            .collect();
        // Stable order keeps cycles deterministic.
        alerts.sort_by_key(|alert| alert.alert_id);
        Ok(alerts)
    }
}

// =============================================================================
// Tests
// =============================================================================
