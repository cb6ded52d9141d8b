//! Default telemetry pipeline
//!
//! [`Telemetry`] wires the cloud detector, the three built-in collectors
//! (`metadata`, `environment`, `os`, in that order), the header encoder and
//! the aggregator from a [`Config`].

use std::sync::Arc;

use base64::Engine;
use envtel_core::{
    config::Config,
    domain::{BuildInfo, TelemetryError},
    ports::{Collector, Detector},
};
use envtel_detect::CloudDetector;
use tracing::{debug, info};

use crate::{
    aggregator::TelemetryAggregator,
    collectors::{EnvironmentCollector, MetadataCollector, OsCollector},
    encoder::HeaderEncoder,
};

/// Produces the telemetry header for outbound requests.
pub struct Telemetry {
    header_name: String,
    enabled: bool,
    metadata: Arc<MetadataCollector>,
    aggregator: TelemetryAggregator,
}

impl Telemetry {
    /// Builds the default pipeline, detecting the environment with a
    /// [`CloudDetector`] configured from `config.detection`.
    ///
    /// # Errors
    ///
    /// [`TelemetryError::Detection`] if the detector's HTTP client cannot be
    /// built, [`TelemetryError::Config`] if `config` does not validate.
    pub fn new(config: &Config, build_info: BuildInfo) -> Result<Self, TelemetryError> {
        let detector = CloudDetector::from_config(&config.detection)
            .map_err(|e| TelemetryError::Detection(e.to_string()))?;
        let detector = Arc::new(detector);
        Self::with_detector(config, build_info, detector)
    }

    /// Same as [`Telemetry::new`] with a caller-supplied detector.
    pub fn with_detector(
        config: &Config,
        build_info: BuildInfo,
        detector: Arc<dyn Detector>,
    ) -> Result<Self, TelemetryError> {
        let errors = config.validate();
        if !errors.is_empty() {
            let joined = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(TelemetryError::Config(joined));
        }

        let metadata = Arc::new(MetadataCollector::new(build_info));
        let environment = EnvironmentCollector::new(detector)
            .with_env_prefix(config.detection.env_prefix.clone());
        let os = OsCollector::new().with_fs_root(config.detection.fs_root.clone());

        let collectors: Vec<Arc<dyn Collector>> =
            vec![metadata.clone(), Arc::new(environment), Arc::new(os)];
        let aggregator = TelemetryAggregator::new(
            collectors,
            Box::new(HeaderEncoder::new(config.telemetry.tool_name.clone())),
        );

        let enabled = config.telemetry_enabled();
        info!(
            enabled,
            tool = %config.telemetry.tool_name,
            header = %config.telemetry.header_name,
            "Telemetry initialized"
        );

        Ok(Self {
            header_name: config.telemetry.header_name.clone(),
            enabled,
            metadata,
            aggregator,
        })
    }

    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The header value, or `None` when telemetry is disabled.
    pub async fn header_value(&self) -> Result<Option<String>, TelemetryError> {
        if !self.enabled {
            debug!("Telemetry disabled, no header produced");
            return Ok(None);
        }
        let bytes = self.aggregator.collect_and_encode().await?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| TelemetryError::Encoding(e.to_string()))
    }

    pub fn set_route(&self, route: impl Into<String>) {
        self.metadata.set_route(route);
    }

    pub fn set_service(&self, service: impl Into<String>) {
        self.metadata.set_service(service);
    }

    pub fn set_class(&self, class: impl Into<String>) {
        self.metadata.set_class(class);
    }

    pub fn set_operation(&self, operation: impl Into<String>) {
        self.metadata.set_operation(operation);
    }

    pub fn metadata(&self) -> &MetadataCollector {
        &self.metadata
    }

    pub fn aggregator(&self) -> &TelemetryAggregator {
        &self.aggregator
    }
}

/// Decodes a header value back into its wire string.
pub fn decode_header(value: &str) -> Result<String, TelemetryError> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(value.trim())
        .map_err(|e| TelemetryError::Encoding(format!("invalid base64: {e}")))?;
    String::from_utf8(raw).map_err(|e| TelemetryError::Encoding(format!("invalid UTF-8: {e}")))
}
