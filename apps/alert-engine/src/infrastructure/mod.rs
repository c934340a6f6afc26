//! Infrastructure layer - Adapters for external systems and delivery.

pub mod alerts;
pub mod cache;
pub mod config;
pub mod gateway;
pub mod http;
pub mod ledger;
pub mod metrics;
pub mod registry;
pub mod telemetry;
