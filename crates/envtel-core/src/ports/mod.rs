//! Port definitions
//!
//! The traits the telemetry pipeline is assembled from. Implementations
//! live in adapter crates:
//!
//! - [`Detector`] - Runtime environment detection (`envtel-detect`)
//! - [`Collector`] - Produces one [`MetricsSet`](crate::domain::MetricsSet) per pass (`envtel-telemetry`)
//! - [`MetricsEncoder`] - Serializes collected sets into header bytes (`envtel-telemetry`)

pub mod collector;
pub mod detector;
pub mod encoder;

pub use collector::Collector;
pub use detector::Detector;
pub use encoder::MetricsEncoder;
