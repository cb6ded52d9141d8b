//! Telemetry error types
//!
//! Probe failures inside detectors are never errors; they fold into
//! "not detected". The errors here are the ones the aggregation path
//! returns to the caller.

use thiserror::Error;

/// Errors surfaced by the telemetry pipeline
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A collector failed; no partial telemetry is produced
    #[error("Collector '{collector}' failed: {source}")]
    Collection {
        /// Name of the failing collector
        collector: String,
        /// Underlying adapter error
        #[source]
        source: anyhow::Error,
    },

    /// The encoder could not serialize the collected metrics
    #[error("Encoding failed: {0}")]
    Encoding(String),

    /// The configuration is unusable
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The environment detector could not be built
    #[error("Detector setup failed: {0}")]
    Detection(String),
}

impl TelemetryError {
    pub fn collection(collector: impl Into<String>, source: anyhow::Error) -> Self {
        TelemetryError::Collection {
            collector: collector.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for TelemetryError {
    fn from(err: serde_json::Error) -> Self {
        TelemetryError::Encoding(err.to_string())
    }
}
