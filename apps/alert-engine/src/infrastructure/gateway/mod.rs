//! Market Data Gateway
//!
//! `MarketDataPort` adapter over the external quote provider's HTTP API.
//! Internal symbols are bare tickers; the provider wants them qualified with
//! a market suffix (default `.IS` for Borsa Istanbul). Qualification happens
//! here and only here, so nothing above this adapter ever sees a suffixed
//! symbol.
//!
//! No retries: a failed lookup is reported as unavailable and the polling
//! cycle retries naturally.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::application::ports::{MarketDataPort, QuoteError};
use crate::domain::quote::PriceQuote;
use crate::domain::symbol;

/// Default market suffix appended for the provider.
pub const DEFAULT_MARKET_SUFFIX: &str = ".IS";

/// Default request timeout.
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(5);

/// Gateway connection settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Provider base URL, without a trailing slash.
    pub base_url: String,
    /// Market suffix appended to outgoing symbols.
    pub market_suffix: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl GatewayConfig {
    /// Settings for a provider at `base_url` with the default suffix and
    /// timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            market_suffix: DEFAULT_MARKET_SUFFIX.to_string(),
            timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }
}

/// HTTP quote provider adapter.
#[derive(Debug)]
pub struct HttpMarketDataGateway {
    client: reqwest::Client,
    base_url: String,
    market_suffix: String,
}

impl HttpMarketDataGateway {
    /// Build the gateway and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::Unavailable` if the HTTP client cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self, QuoteError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| QuoteError::unavailable("*", e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            market_suffix: config.market_suffix.clone(),
        })
    }

    async fn fetch(&self, qualified: &str) -> Result<ProviderQuote, String> {
        let url = format!("{}/v1/quote", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", qualified)])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(format!("provider returned {status}"));
        }

        response.json().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl MarketDataPort for HttpMarketDataGateway {
    async fn get_quote(&self, sym: &str) -> Result<PriceQuote, QuoteError> {
        let bare = symbol::strip(&symbol::normalize(sym), &self.market_suffix);
        let qualified = symbol::qualify(&bare, &self.market_suffix);

        let raw = self
            .fetch(&qualified)
            .await
            .map_err(|reason| QuoteError::unavailable(&bare, reason))?;

        if raw.price <= Decimal::ZERO {
            return Err(QuoteError::unavailable(
                &bare,
                format!("non-positive price {}", raw.price),
            ));
        }

        Ok(PriceQuote {
            symbol: bare,
            price: raw.price,
            as_of: raw.timestamp.unwrap_or_else(Utc::now),
        })
    }
}

// Provider response shape.

#[derive(Debug, Deserialize)]
struct ProviderQuote {
    #[allow(dead_code)]
    symbol: String,
    price: Decimal,
    timestamp: Option<DateTime<Utc>>,
}

// =============================================================================
// Tests
// =============================================================================
