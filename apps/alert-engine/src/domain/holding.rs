//! Portfolio Holding Arithmetic
//!
//! Weighted-average cost-basis bookkeeping. Buys recompute the average price
//! as a quantity-weighted mean; decreases subtract quantity and never touch
//! the average (average-cost method, not FIFO/LIFO).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Holding arithmetic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HoldingError {
    /// Decrease requested beyond the available quantity.
    #[error("insufficient quantity: requested {requested}, held {held}")]
    InsufficientQuantity {
        /// Quantity the caller tried to remove.
        requested: u64,
        /// Quantity actually held.
        held: u64,
    },

    /// Buy of zero shares is meaningless and would not move the average.
    #[error("buy quantity must be positive")]
    ZeroQuantity,

    /// Buy would push the share count past the representable maximum.
    #[error("quantity overflow: cannot hold more than {max} shares", max = u64::MAX)]
    QuantityOverflow,
}

/// A position in one stock within one portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// Owning portfolio.
    pub portfolio_id: u64,
    /// Internal (bare) stock symbol.
    pub symbol: String,
    /// Shares held. Never negative.
    pub quantity: u64,
    /// Quantity-weighted average purchase price.
    pub average_price: Decimal,
}

impl Holding {
    /// Open a new holding from a first purchase.
    ///
    /// # Errors
    ///
    /// Returns `HoldingError::ZeroQuantity` for an empty purchase.
    pub fn open(
        portfolio_id: u64,
        symbol: impl Into<String>,
        quantity: u64,
        price: Decimal,
    ) -> Result<Self, HoldingError> {
        if quantity == 0 {
            return Err(HoldingError::ZeroQuantity);
        }
        Ok(Self {
            portfolio_id,
            symbol: symbol.into(),
            quantity,
            average_price: price,
        })
    }

    /// Apply a purchase: add quantity and recompute the weighted average.
    ///
    /// ```text
    /// new_avg = (old_qty * old_avg + qty * price) / (old_qty + qty)
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `HoldingError::ZeroQuantity` for an empty purchase and
    /// `HoldingError::QuantityOverflow` when the total would exceed
    /// `u64::MAX`; the holding is left untouched on either.
    pub fn buy(&mut self, quantity: u64, price: Decimal) -> Result<(), HoldingError> {
        if quantity == 0 {
            return Err(HoldingError::ZeroQuantity);
        }
        let new_total = self
            .quantity
            .checked_add(quantity)
            .ok_or(HoldingError::QuantityOverflow)?;

        let old_qty = Decimal::from(self.quantity);
        let add_qty = Decimal::from(quantity);
        let new_qty = Decimal::from(new_total);

        self.average_price = (old_qty * self.average_price + add_qty * price) / new_qty;
        self.quantity = new_total;
        Ok(())
    }

    /// Apply a disposal: subtract quantity, leaving the average unchanged.
    ///
    /// # Errors
    ///
    /// Returns `HoldingError::InsufficientQuantity` when `quantity` exceeds
    /// the held amount; the holding is left untouched.
    pub fn decrease(&mut self, quantity: u64) -> Result<(), HoldingError> {
        if quantity > self.quantity {
            return Err(HoldingError::InsufficientQuantity {
                requested: quantity,
                held: self.quantity,
            });
        }
        self.quantity -= quantity;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use rust_decimal_macros::dec;

    #[test]
    fn weighted_average_example() {
        // buy 10 @ 100 then 5 @ 130 -> qty 15, avg 110
        let mut holding = Holding::open(1, "THYAO", 10, dec!(100)).unwrap();
        holding.buy(5, dec!(130)).unwrap();

        assert_eq!(holding.quantity, 15);
        assert_eq!(holding.average_price, dec!(110));
    }

    #[test]
    fn open_sets_average_to_price() {
        let holding = Holding::open(1, "GARAN", 20, dec!(45.50)).unwrap();
        assert_eq!(holding.quantity, 20);
        assert_eq!(holding.average_price, dec!(45.50));
    }

    #[test]
    fn open_with_zero_quantity_rejected() {
        let err = Holding::open(1, "GARAN", 0, dec!(45.50)).unwrap_err();
        assert_eq!(err, HoldingError::ZeroQuantity);
    }

    #[test]
    fn decrease_preserves_average() {
        let mut holding = Holding::open(1, "THYAO", 15, dec!(110)).unwrap();
        holding.decrease(5).unwrap();

        assert_eq!(holding.quantity, 10);
        assert_eq!(holding.average_price, dec!(110));
    }

    #[test]
    fn decrease_beyond_held_fails_and_leaves_holding_unchanged() {
        let mut holding = Holding::open(1, "THYAO", 15, dec!(110)).unwrap();
        let err = holding.decrease(20).unwrap_err();

        assert_eq!(
            err,
            HoldingError::InsufficientQuantity {
                requested: 20,
                held: 15
            }
        );
        assert_eq!(holding.quantity, 15);
        assert_eq!(holding.average_price, dec!(110));
    }

    #[test]
    fn decrease_to_zero_is_allowed() {
        let mut holding = Holding::open(1, "AKBNK", 7, dec!(60)).unwrap();
        holding.decrease(7).unwrap();
        assert_eq!(holding.quantity, 0);
    }

    #[test]
    fn buy_after_full_decrease_uses_weighted_mean_from_zero() {
        let mut holding = Holding::open(1, "AKBNK", 4, dec!(50)).unwrap();
        holding.decrease(4).unwrap();
        holding.buy(2, dec!(80)).unwrap();

        // Zero-quantity base means the new price is the new average.
        assert_eq!(holding.quantity, 2);
        assert_eq!(holding.average_price, dec!(80));
    }

    #[test]
    fn buy_overflowing_quantity_rejected_and_leaves_holding_unchanged() {
        let mut holding = Holding::open(1, "THYAO", u64::MAX, dec!(10)).unwrap();
        let err = holding.buy(1, dec!(12)).unwrap_err();

        assert_eq!(err, HoldingError::QuantityOverflow);
        assert_eq!(holding.quantity, u64::MAX);
        assert_eq!(holding.average_price, dec!(10));
    }

    #[test]
    fn buy_zero_rejected() {
        let mut holding = Holding::open(1, "AKBNK", 4, dec!(50)).unwrap();
        assert_eq!(holding.buy(0, dec!(80)).unwrap_err(), HoldingError::ZeroQuantity);
    }

    #[test]
    fn fractional_average_keeps_precision() {
        let mut holding = Holding::open(1, "SISE", 3, dec!(10)).unwrap();
        holding.buy(1, dec!(11)).unwrap();
        assert_eq!(holding.average_price, dec!(10.25));
    }
}
