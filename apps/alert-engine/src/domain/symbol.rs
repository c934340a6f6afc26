//! Symbol Qualification
//!
//! Internal symbols are bare tickers (`THYAO`); the market data provider
//! requires a market-suffix-qualified form (`THYAO.IS`) and returns data
//! keyed to that form. Qualification is applied on every provider call and
//! stripped from every value returned to the rest of the system.

/// Normalize an internal symbol: trimmed and uppercased.
#[must_use]
pub fn normalize(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Qualify a bare internal symbol for a provider lookup.
///
/// Already-qualified symbols pass through unchanged.
#[must_use]
pub fn qualify(symbol: &str, suffix: &str) -> String {
    let normalized = normalize(symbol);
    if normalized.ends_with(suffix) {
        normalized
    } else {
        format!("{normalized}{suffix}")
    }
}

/// Strip the market suffix from a provider-qualified symbol.
#[must_use]
pub fn strip(symbol: &str, suffix: &str) -> String {
    symbol
        .strip_suffix(suffix)
        .unwrap_or(symbol)
        .to_string()
}

// =============================================================================
// Tests
// =============================================================================
