//! HTTP API Module
//!
//! Exposes metrics and status endpoints.

mod metrics;
mod routes;

pub use metrics::ExporterMetrics;
pub use routes::run_api_server;
