//! Cloud detection cascade
//!
//! [`CloudDetector`] tries each provider detector in a fixed order and
//! returns the first match. The default order is AWS, Azure, GCP, which
//! follows expected deployment prevalence rather than the alphabet; it is
//! part of the observable behavior.
//!
//! When nothing matches, the on-premise sentinel context is returned with
//! `found = false`.

use std::time::Duration;

use async_trait::async_trait;
use envtel_core::{config::DetectionConfig, domain::EnvContext, ports::Detector};
use tracing::{debug, info, Instrument, Span};

use crate::{
    aws::AwsDetector,
    azure::AzureDetector,
    gcp::GcpDetector,
    probe::DetectorOptions,
    DetectError,
};

/// Ordered cascade over provider detectors.
pub struct CloudDetector {
    detectors: Vec<Box<dyn Detector>>,
    span: Span,
}

impl CloudDetector {
    /// The default cascade probing the real host: AWS, then Azure, then GCP.
    pub fn new() -> Result<Self, DetectError> {
        Self::with_options(DetectorOptions::default())
    }

    /// The default cascade with shared options.
    ///
    /// If `options.timeout` is unset, each detector keeps its own default
    /// (150 ms for AWS, 200 ms for Azure and GCP).
    ///
    /// # Errors
    ///
    /// [`DetectError::Client`] if a detector's HTTP client cannot be built.
    pub fn with_options(options: DetectorOptions) -> Result<Self, DetectError> {
        Ok(Self::with_detectors(vec![
            Box::new(AwsDetector::with_options(options.clone())?),
            Box::new(AzureDetector::with_options(options.clone())?),
            Box::new(GcpDetector::with_options(options)?),
        ]))
    }

    /// The default cascade configured from the `detection` config section.
    pub fn from_config(config: &DetectionConfig) -> Result<Self, DetectError> {
        let options = DetectorOptions::from_config(config);
        let aws_timeout = Duration::from_millis(config.aws_timeout_ms);
        let metadata_timeout = Duration::from_millis(config.metadata_timeout_ms);

        Ok(Self::with_detectors(vec![
            Box::new(AwsDetector::with_options(
                options.clone().with_timeout(aws_timeout),
            )?),
            Box::new(AzureDetector::with_options(
                options.clone().with_timeout(metadata_timeout),
            )?),
            Box::new(GcpDetector::with_options(
                options.with_timeout(metadata_timeout),
            )?),
        ]))
    }

    /// A cascade over arbitrary detectors, tried in the given order.
    pub fn with_detectors(detectors: Vec<Box<dyn Detector>>) -> Self {
        Self {
            detectors,
            span: tracing::debug_span!("cloud_detector"),
        }
    }

    /// Replaces the span every log event of the cascade is recorded in.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Names of the detectors in cascade order.
    pub fn detector_names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    async fn first_match(&self) -> Option<EnvContext> {
        for detector in &self.detectors {
            if let Some(ctx) = detector.detect().await {
                info!(
                    provider = %ctx.provider,
                    environment = %ctx.environment,
                    region = %ctx.region,
                    "Runtime environment detected"
                );
                return Some(ctx);
            }
            debug!(detector = detector.name(), "No match, trying next detector");
        }
        debug!("No cloud provider matched, assuming on-premise");
        None
    }

    /// Runs the cascade, returning the detected context and whether any
    /// provider matched. Misses yield the on-premise sentinel.
    pub async fn detect_or_default(&self) -> (EnvContext, bool) {
        match self.detect().await {
            Some(ctx) => (ctx, true),
            None => (EnvContext::on_premise(), false),
        }
    }
}

#[async_trait]
impl Detector for CloudDetector {
    fn name(&self) -> &str {
        "cloud"
    }

    async fn detect(&self) -> Option<EnvContext> {
        self.first_match().instrument(self.span.clone()).await
    }
}
