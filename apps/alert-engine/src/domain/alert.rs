//! Watchlist Alert Types
//!
//! A watchlist alert is a user-configured (symbol, target price) pair. The
//! evaluator periodically checks each active alert against the current market
//! price and fires when the price is within a tolerance band of the target.
//!
//! Evaluation is stateless across cycles: an alert that stays in range fires
//! on every cycle. Fire-once suppression is a product decision that has
//! deliberately not been made; see DESIGN.md.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Unique identifier for a user.
pub type UserId = u64;

/// A user-configured price alert, read from the external watchlist store.
///
/// The engine only reads rows with `active == true` and never mutates them;
/// alert lifecycle (create/deactivate) belongs to the CRUD layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistAlert {
    /// Alert row identifier.
    pub alert_id: u64,
    /// Owning user.
    pub user_id: UserId,
    /// Internal (bare) stock symbol.
    pub symbol: String,
    /// Price the user wants to be notified near.
    pub target_price: Decimal,
    /// Whether the alert is currently active.
    pub active: bool,
}

/// A fired alert, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// User to notify.
    pub user_id: UserId,
    /// Symbol that triggered.
    pub symbol: String,
    /// The alert's target price.
    pub target_price: Decimal,
    /// The resolved current price.
    pub current_price: Decimal,
}

// =============================================================================
// Tolerance Band
// =============================================================================

/// Symmetric tolerance band around a target price.
///
/// An alert fires when `|current - target| <= target * pct / 100`. The band
/// is expressed as a percentage of the target so a 1% band means the same
/// thing for a 10-lira stock and a 1000-lira stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToleranceBand {
    pct: Decimal,
}

impl ToleranceBand {
    /// Create a band from a percentage of the target price.
    ///
    /// Negative percentages are clamped to zero (an exact-match band).
    #[must_use]
    pub fn from_pct(pct: Decimal) -> Self {
        Self {
            pct: pct.max(Decimal::ZERO),
        }
    }

    /// The band width as a percentage of the target.
    #[must_use]
    pub const fn pct(&self) -> Decimal {
        self.pct
    }

    /// Whether `current` is within the band around `target`.
    #[must_use]
    pub fn contains(&self, target: Decimal, current: Decimal) -> bool {
        let width = target.abs() * self.pct / Decimal::ONE_HUNDRED;
        (current - target).abs() <= width
    }
}

impl Default for ToleranceBand {
    /// 1% of the target price.
    fn default() -> Self {
        Self { pct: Decimal::ONE }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use rust_decimal_macros::dec;
    use test_case::test_case;

    #[test_case(dec!(100), dec!(100.00), true; "exact match")]
    #[test_case(dec!(100), dec!(101.00), true; "upper edge inclusive")]
    #[test_case(dec!(100), dec!(99.00), true; "lower edge inclusive")]
    #[test_case(dec!(100), dec!(101.01), false; "just above band")]
    #[test_case(dec!(100), dec!(98.99), false; "just below band")]
    fn default_band_is_one_pct(target: Decimal, current: Decimal, fires: bool) {
        let band = ToleranceBand::default();
        assert_eq!(band.contains(target, current), fires);
    }

    #[test]
    fn band_scales_with_target() {
        let band = ToleranceBand::default();
        // 1% of 1000 is 10.
        assert!(band.contains(dec!(1000), dec!(991)));
        assert!(!band.contains(dec!(1000), dec!(989)));
    }

    #[test]
    fn zero_band_requires_exact_price() {
        let band = ToleranceBand::from_pct(Decimal::ZERO);
        assert!(band.contains(dec!(50), dec!(50)));
        assert!(!band.contains(dec!(50), dec!(50.01)));
    }

    #[test]
    fn negative_pct_clamps_to_zero() {
        let band = ToleranceBand::from_pct(dec!(-5));
        assert_eq!(band.pct(), Decimal::ZERO);
    }

    #[test]
    fn wide_band() {
        let band = ToleranceBand::from_pct(dec!(10));
        assert!(band.contains(dec!(200), dec!(185)));
        assert!(!band.contains(dec!(200), dec!(179)));
    }
}
