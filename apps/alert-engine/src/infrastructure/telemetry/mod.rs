//! Tracing Bootstrap
//!
//! Installs the global `tracing` subscriber: a fmt layer always, plus batch
//! OTLP span export when [`TelemetrySettings::otel_enabled`] is set. Returns
//! a guard whose drop flushes and shuts down the exporter, so spans from the
//! final shutdown sequence still reach the backend.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::SdkTracerProvider;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::infrastructure::config::TelemetrySettings;

/// Baseline filter when `RUST_LOG` is unset: engine logs at info, HTTP
/// plumbing quieted to warnings.
const DEFAULT_LOG_FILTER: &str = "info,alert_engine=info,h2=warn,hyper=warn";

/// Telemetry bootstrap failure.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The OTLP span exporter could not be constructed.
    #[error("failed to build OTLP span exporter: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),

    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Flushes and shuts down span export when dropped. Keep it alive for the
/// lifetime of the process.
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("Failed to shut down tracer provider: {e}");
        }
    }
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber per `settings`.
///
/// # Errors
///
/// Returns `TelemetryError` when the OTLP exporter cannot be built or when a
/// global subscriber is already installed.
pub fn init(settings: &TelemetrySettings) -> Result<TelemetryGuard, TelemetryError> {
    let base = tracing_subscriber::registry()
        .with(log_filter())
        .with(tracing_subscriber::fmt::layer().with_target(true));

    if !settings.otel_enabled {
        base.try_init()?;
        return Ok(TelemetryGuard { provider: None });
    }

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&settings.otlp_endpoint)
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(
            opentelemetry_sdk::Resource::builder()
                .with_service_name(settings.service_name.clone())
                .build(),
        )
        .build();

    let tracer = provider.tracer(settings.service_name.clone());
    base.with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init()?;

    Ok(TelemetryGuard {
        provider: Some(provider),
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_directives_parse() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }

    #[test]
    fn guard_without_provider_drops_cleanly() {
        drop(TelemetryGuard { provider: None });
    }
}
