//! Metrics encoder port

use crate::domain::{MetricsSet, TelemetryError};

/// Serializes collected metric sets into an opaque header value.
pub trait MetricsEncoder: Send + Sync {
    /// Encodes `sets` in order. The output must be deterministic for a
    /// given input.
    fn encode(&self, sets: &[MetricsSet]) -> Result<Vec<u8>, TelemetryError>;
}
