//! envtel Telemetry - Metrics collection and header encoding
//!
//! Turns the detected runtime environment plus build and host facts into a
//! compact header value attached to outbound requests:
//!
//! - [`collectors`] - `metadata`, `environment` and `os` collectors
//! - [`HeaderEncoder`] - `sn=<tool>&<collector>.<metric>=<value>...`, base64 encoded
//! - [`TelemetryAggregator`] - two-tier cache in front of the collectors and encoder
//! - [`Telemetry`] - facade assembling the default pipeline from [`Config`](envtel_core::config::Config)
//!
//! Nothing here sends requests; callers attach the header themselves.

pub mod aggregator;
pub mod collectors;
pub mod encoder;
pub mod telemetry;

pub use aggregator::TelemetryAggregator;
pub use collectors::{EnvironmentCollector, MetadataCollector, OsCollector};
pub use encoder::HeaderEncoder;
pub use telemetry::{decode_header, Telemetry};
