//! Metrics collector port
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because collector failures are adapter-specific;
//!   the aggregator wraps them in
//!   [`TelemetryError::Collection`](crate::domain::TelemetryError::Collection).
//! - `is_dynamic` is what lets the aggregator skip re-collection: a static
//!   collector's previous result is reused verbatim.

use async_trait::async_trait;

use crate::domain::MetricsSet;

/// Produces one [`MetricsSet`] per collection pass.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Unique collector name, used as the aggregator cache key
    fn name(&self) -> &str;

    /// Whether the output may differ from the previous collection.
    fn is_dynamic(&self) -> bool;

    /// Collects the current metrics.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying data source fails. The aggregator
    /// aborts the whole pass in that case.
    async fn collect(&self) -> anyhow::Result<MetricsSet>;
}
