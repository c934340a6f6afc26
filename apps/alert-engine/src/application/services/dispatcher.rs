//! Notification Dispatcher
//!
//! Turns fired alert events into user-facing text and pushes one message per
//! event to every live connection of the target user. Users with no
//! connections are skipped silently; there is no queueing or retry for
//! offline users.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::alert::AlertEvent;
use crate::infrastructure::metrics;
use crate::infrastructure::registry::ConnectionRegistry;

/// Render an alert event as its notification text.
#[must_use]
pub fn format_alert(symbol: &str, target: Decimal, current: Decimal) -> String {
    format!(
        "Stock Alert: {symbol} is near your target price of {target}! Current price: {current}"
    )
}

/// Delivers alert notifications over the connection registry.
pub struct NotificationDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl NotificationDispatcher {
    /// Create a dispatcher over the given registry.
    #[must_use]
    pub const fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Dispatch one event: one message per live connection of the user.
    ///
    /// Returns the number of connections the message was handed to.
    pub fn dispatch(&self, event: &AlertEvent) -> usize {
        let text = format_alert(&event.symbol, event.target_price, event.current_price);
        let delivered = self.registry.fan_out(event.user_id, &text);

        if delivered > 0 {
            metrics::record_notifications_sent(delivered as u64);
            tracing::info!(
                user_id = event.user_id,
                symbol = %event.symbol,
                delivered,
                "Alert notification dispatched"
            );
        } else {
            tracing::debug!(
                user_id = event.user_id,
                symbol = %event.symbol,
                "No live connections, notification dropped"
            );
        }
        delivered
    }

    /// Dispatch a batch of events in order. Returns total deliveries.
    pub fn dispatch_all(&self, events: &[AlertEvent]) -> usize {
        events.iter().map(|event| self.dispatch(event)).sum()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use rust_decimal_macros::dec;

    fn event(user_id: u64) -> AlertEvent {
        AlertEvent {
            user_id,
            symbol: "THYAO".to_string(),
            target_price: dec!(290),
            current_price: dec!(289.50),
        }
    }

    #[test]
    fn message_text_matches_notification_format() {
        let text = format_alert("THYAO", dec!(290), dec!(289.50));
        assert_eq!(
            text,
            "Stock Alert: THYAO is near your target price of 290! Current price: 289.50"
        );
    }

    #[tokio::test]
    async fn delivers_to_every_connection_of_the_user() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (tx_a, mut rx_a) = tokio::sync::mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = tokio::sync::mpsc::unbounded_channel();
        registry.register(7, tx_a);
        registry.register(7, tx_b);

        let dispatcher = NotificationDispatcher::new(registry);
        let delivered = dispatcher.dispatch(&event(7));

        assert_eq!(delivered, 2);
        assert!(rx_a.recv().await.is_some());
        assert!(rx_b.recv().await.is_some());
    }

    #[tokio::test]
    async fn user_without_connections_is_skipped() {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = NotificationDispatcher::new(registry);

        assert_eq!(dispatcher.dispatch(&event(99)), 0);
    }

    #[tokio::test]
    async fn batch_dispatch_sums_deliveries() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        registry.register(7, tx);

        let dispatcher = NotificationDispatcher::new(registry);
        let total = dispatcher.dispatch_all(&[event(7), event(8), event(7)]);

        assert_eq!(total, 2);
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());
    }
}
