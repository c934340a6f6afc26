//! Price Quote Types
//!
//! Typed representation of a market quote. The provider returns a loose info
//! blob; only the fields the system consumes cross the gateway boundary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A point-in-time price for a symbol. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Internal (bare) symbol, market suffix stripped.
    pub symbol: String,
    /// Last known price.
    pub price: Decimal,
    /// When the provider produced the price.
    pub as_of: DateTime<Utc>,
}

impl PriceQuote {
    /// Create a quote stamped with the current time.
    #[must_use]
    pub fn new(symbol: impl Into<String>, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            as_of: Utc::now(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
