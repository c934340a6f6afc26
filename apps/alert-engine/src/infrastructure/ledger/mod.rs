//! Holding Ledger
//!
//! In-memory store of portfolio holdings keyed by `(portfolio_id, symbol)`.
//! Each holding sits behind its own lock so a buy and a decrease on the same
//! position serialize, while positions in different stocks proceed in
//! parallel. The map lock is only held long enough to find or create an
//! entry, never across the arithmetic.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use crate::domain::holding::{Holding, HoldingError};
use crate::domain::symbol;

/// Ledger operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// No holding exists for the portfolio/symbol pair.
    #[error("no holding for portfolio {portfolio_id}, symbol {symbol}")]
    HoldingNotFound {
        /// Portfolio that was addressed.
        portfolio_id: u64,
        /// Normalized symbol that was addressed.
        symbol: String,
    },

    /// The underlying holding arithmetic rejected the operation.
    #[error(transparent)]
    Holding(#[from] HoldingError),
}

type LedgerKey = (u64, String);

/// Thread-safe per-position holding store.
#[derive(Default)]
pub struct HoldingLedger {
    positions: RwLock<HashMap<LedgerKey, Arc<Mutex<Holding>>>>,
}

impl HoldingLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a purchase, opening the position if it does not exist yet.
    ///
    /// Returns the holding state after the buy.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Holding` for a zero-quantity purchase.
    pub fn buy(
        &self,
        portfolio_id: u64,
        sym: &str,
        quantity: u64,
        price: rust_decimal::Decimal,
    ) -> Result<Holding, LedgerError> {
        let key = (portfolio_id, symbol::normalize(sym));

        let existing = self.positions.read().get(&key).cloned();
        let entry = match existing {
            Some(entry) => entry,
            None => {
                let mut positions = self.positions.write();
                if let Some(entry) = positions.get(&key) {
                    // Lost the race to another creator; fall through to buy.
                    Arc::clone(entry)
                } else {
                    let holding = Holding::open(portfolio_id, key.1.clone(), quantity, price)?;
                    let entry = Arc::new(Mutex::new(holding.clone()));
                    positions.insert(key, entry);
                    tracing::debug!(
                        portfolio_id,
                        symbol = %holding.symbol,
                        quantity,
                        "Position opened"
                    );
                    return Ok(holding);
                }
            }
        };

        let mut holding = entry.lock();
        holding.buy(quantity, price)?;
        tracing::debug!(
            portfolio_id,
            symbol = %holding.symbol,
            quantity = holding.quantity,
            average_price = %holding.average_price,
            "Position increased"
        );
        Ok(holding.clone())
    }

    /// Record a disposal against an existing position.
    ///
    /// Returns the holding state after the decrease. The average price is
    /// untouched even when the quantity reaches zero.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::HoldingNotFound` for an unknown position and
    /// `LedgerError::Holding` when the quantity exceeds what is held; in
    /// both cases nothing changes.
    pub fn decrease(
        &self,
        portfolio_id: u64,
        sym: &str,
        quantity: u64,
    ) -> Result<Holding, LedgerError> {
        let key = (portfolio_id, symbol::normalize(sym));

        let entry = self.positions.read().get(&key).cloned().ok_or_else(|| {
            LedgerError::HoldingNotFound {
                portfolio_id,
                symbol: key.1.clone(),
            }
        })?;

        let mut holding = entry.lock();
        holding.decrease(quantity)?;
        tracing::debug!(
            portfolio_id,
            symbol = %holding.symbol,
            quantity = holding.quantity,
            "Position decreased"
        );
        Ok(holding.clone())
    }

    /// Snapshot a single position.
    #[must_use]
    pub fn get(&self, portfolio_id: u64, sym: &str) -> Option<Holding> {
        let key = (portfolio_id, symbol::normalize(sym));
        self.positions
            .read()
            .get(&key)
            .map(|entry| entry.lock().clone())
    }

    /// Snapshot every position in a portfolio, ordered by symbol.
    #[must_use]
    pub fn holdings_for(&self, portfolio_id: u64) -> Vec<Holding> {
        let mut holdings: Vec<Holding> = self
            .positions
            .read()
            .iter()
            .filter(|((pid, _), _)| *pid == portfolio_id)
            .map(|(_, entry)| entry.lock().clone())
            .collect();
        holdings.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        holdings
    }
}

// =============================================================================
// Tests
// =============================================================================
