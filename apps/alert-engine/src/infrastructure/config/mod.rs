//! Engine Configuration
//!
//! Configuration for the alert engine, loaded from environment variables.

use std::time::Duration;

use rust_decimal::Decimal;

/// Server port settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// HTTP port serving WebSocket, health, and metrics endpoints.
    pub http_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { http_port: 8080 }
    }
}

/// Polling and evaluation settings.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Time between evaluation cycles.
    pub poll_interval: Duration,
    /// Symmetric tolerance around the target price, in percent.
    pub tolerance_pct: Decimal,
    /// TTL for cached quotes.
    pub quote_ttl: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            tolerance_pct: Decimal::ONE,
            quote_ttl: Duration::from_secs(600),
        }
    }
}

/// Market data provider settings.
#[derive(Debug, Clone)]
pub struct MarketDataSettings {
    /// Provider base URL.
    pub base_url: String,
    /// Market suffix appended to outgoing symbols.
    pub market_suffix: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl MarketDataSettings {
    fn defaults_with_url(base_url: String) -> Self {
        Self {
            base_url,
            market_suffix: ".IS".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Trace export settings.
#[derive(Debug, Clone)]
pub struct TelemetrySettings {
    /// Whether spans are exported over OTLP.
    pub otel_enabled: bool,
    /// OTLP exporter endpoint.
    pub otlp_endpoint: String,
    /// Service name attached to exported spans.
    pub service_name: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            otel_enabled: true,
            otlp_endpoint: "http://localhost:4318".to_string(),
            service_name: "alert-engine".to_string(),
        }
    }
}

impl TelemetrySettings {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            otel_enabled: std::env::var("OTEL_ENABLED")
                .map(|v| !v.eq_ignore_ascii_case("false"))
                .unwrap_or(defaults.otel_enabled),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or(defaults.otlp_endpoint),
            service_name: std::env::var("OTEL_SERVICE_NAME").unwrap_or(defaults.service_name),
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server port settings.
    pub server: ServerSettings,
    /// Polling and evaluation settings.
    pub pipeline: PipelineSettings,
    /// Market data provider settings.
    pub market_data: MarketDataSettings,
    /// Trace export settings.
    pub telemetry: TelemetrySettings,
    /// Redis URL for the quote cache. `None` runs without a cache.
    pub redis_url: Option<String>,
}

impl AppConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or
    /// empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("MARKET_DATA_URL")
            .map_err(|_| ConfigError::MissingEnvVar("MARKET_DATA_URL".to_string()))?;
        if base_url.is_empty() {
            return Err(ConfigError::EmptyValue("MARKET_DATA_URL".to_string()));
        }

        let mut market_data = MarketDataSettings::defaults_with_url(base_url);
        if let Ok(suffix) = std::env::var("MARKET_SUFFIX") {
            market_data.market_suffix = suffix;
        }
        market_data.timeout = parse_env_duration_secs("GATEWAY_TIMEOUT_SECS", market_data.timeout);

        let pipeline = PipelineSettings {
            poll_interval: parse_env_duration_secs(
                "POLL_INTERVAL_SECS",
                PipelineSettings::default().poll_interval,
            ),
            tolerance_pct: parse_env_decimal(
                "ALERT_TOLERANCE_PCT",
                PipelineSettings::default().tolerance_pct,
            ),
            quote_ttl: parse_env_duration_secs(
                "QUOTE_CACHE_TTL_SECS",
                PipelineSettings::default().quote_ttl,
            ),
        };

        let server = ServerSettings {
            http_port: parse_env_u16("ALERT_ENGINE_HTTP_PORT", ServerSettings::default().http_port),
        };

        let redis_url = std::env::var("REDIS_URL").ok().filter(|v| !v.is_empty());

        Ok(Self {
            server,
            pipeline,
            market_data,
            telemetry: TelemetrySettings::from_env(),
            redis_url,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_decimal(key: &str, default: Decimal) -> Decimal {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rust_decimal_macros::dec;

    #[test]
    fn pipeline_defaults() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.poll_interval, Duration::from_secs(60));
        assert_eq!(settings.tolerance_pct, dec!(1));
        assert_eq!(settings.quote_ttl, Duration::from_secs(600));
    }

    #[test]
    fn server_defaults() {
        assert_eq!(ServerSettings::default().http_port, 8080);
    }

    #[test]
    fn market_data_defaults() {
        let settings = MarketDataSettings::defaults_with_url("http://example".to_string());
        assert_eq!(settings.market_suffix, ".IS");
        assert_eq!(settings.timeout, Duration::from_secs(5));
    }

    #[test]
    fn telemetry_defaults() {
        let settings = TelemetrySettings::default();
        assert!(settings.otel_enabled);
        assert_eq!(settings.otlp_endpoint, "http://localhost:4318");
        assert_eq!(settings.service_name, "alert-engine");
    }
}
