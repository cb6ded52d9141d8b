//! Domain layer
//!
//! Plain values produced by detection and consumed by the telemetry
//! pipeline:
//!
//! - [`EnvContext`] - Where the process is running (provider, environment, region, ...)
//! - [`Metric`] / [`MetricsSet`] - Named, short-named telemetry values grouped per collector
//! - [`BuildInfo`] - Static build metadata of the host tool
//! - [`TelemetryError`] - Failures surfaced by the aggregation path

pub mod build_info;
pub mod env_context;
pub mod errors;
pub mod metrics;

pub use build_info::BuildInfo;
pub use env_context::EnvContext;
pub use errors::TelemetryError;
pub use metrics::{Metric, MetricValue, MetricsSet};
