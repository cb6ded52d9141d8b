//! GCP environment detection
//!
//! Checks, in priority order:
//!
//! | Environment | Signal |
//! |---|---|
//! | GCE | Metadata server `instance/id` (`Metadata-Flavor: Google`) |
//! | Cloud Functions | `FUNCTION_NAME` or `FUNCTION_TARGET` |
//! | Cloud Run | `K_SERVICE` |
//! | GKE | Kubernetes marker + GKE/GCP env vars or marker files |
//!
//! On GCE the zone and project are read from the metadata server as well;
//! the region is the zone without its trailing letter suffix.

use std::time::Duration;

use async_trait::async_trait;
use envtel_core::{
    domain::{
        env_context::{environment, provider},
        EnvContext,
    },
    ports::Detector,
};
use tracing::{debug, Instrument, Span};

use crate::{
    probe::{DetectorOptions, Probe},
    DetectError,
};

/// Default GCP metadata request timeout.
pub const GCP_DEFAULT_TIMEOUT: Duration = Duration::from_millis(200);

const METADATA_PREFIX: &str = "/computeMetadata/v1";
const METADATA_FLAVOR_HEADER: (&str, &str) = ("Metadata-Flavor", "Google");

const REGION_VARS: &[&str] = &["FUNCTION_REGION", "GOOGLE_CLOUD_REGION", "REGION"];
const PROJECT_VARS: &[&str] = &["GOOGLE_CLOUD_PROJECT", "GCLOUD_PROJECT", "PROJECT_ID"];
const FUNCTION_VARS: &[&str] = &["FUNCTION_NAME", "FUNCTION_TARGET"];
const CLOUD_RUN_SERVICE_VAR: &str = "K_SERVICE";
const GKE_ENV_MARKERS: &[&str] = &[
    "GKE_CLUSTER_NAME",
    "GOOGLE_APPLICATION_CREDENTIALS",
    "GCE_METADATA_HOST",
];
const GKE_FILE_MARKERS: &[&str] = &["/var/lib/google", "/etc/gke"];

/// Detects GCE, Cloud Functions, Cloud Run and GKE.
pub struct GcpDetector {
    probe: Probe,
    span: Span,
}

impl GcpDetector {
    /// Detector probing the real host with the default 200 ms metadata timeout.
    pub fn new() -> Result<Self, DetectError> {
        Self::with_options(DetectorOptions::default())
    }

    /// Detector with explicit endpoint, env prefix, fs root and timeout.
    ///
    /// # Errors
    ///
    /// [`DetectError::Client`] if the HTTP client cannot be built.
    pub fn with_options(options: DetectorOptions) -> Result<Self, DetectError> {
        Ok(Self {
            probe: Probe::new(&options, GCP_DEFAULT_TIMEOUT)?,
            span: tracing::debug_span!("gcp_detector"),
        })
    }

    /// Replaces the span every log event of this detector is recorded in.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    fn region(&self) -> String {
        self.probe.first_env(REGION_VARS)
    }

    fn project_id(&self) -> String {
        self.probe.first_env(PROJECT_VARS)
    }

    async fn metadata(&self, key: &str) -> Option<String> {
        let path = format!("{METADATA_PREFIX}/{key}");
        self.probe
            .get_text(&path, &[METADATA_FLAVOR_HEADER])
            .await
    }

    async fn detect_gce(&self) -> Option<EnvContext> {
        let instance_id = self.metadata("instance/id").await?;

        let region = match self.metadata("instance/zone").await {
            Some(zone) => region_from_zone(&zone),
            None => self.region(),
        };
        let project = match self.metadata("project/project-id").await {
            Some(project) => project,
            None => self.project_id(),
        };

        Some(
            EnvContext::new(provider::GCP, environment::GCE)
                .with_region(region)
                .with_account_id(project)
                .with_instance_id(instance_id),
        )
    }

    fn detect_cloud_functions(&self) -> Option<EnvContext> {
        if !self.probe.has_any_env(FUNCTION_VARS) {
            return None;
        }
        Some(
            EnvContext::new(provider::GCP, environment::CLOUD_FUNCTIONS)
                .with_region(self.region())
                .with_account_id(self.project_id())
                .with_instance_id(self.probe.first_env(FUNCTION_VARS)),
        )
    }

    fn detect_cloud_run(&self) -> Option<EnvContext> {
        let service = self.probe.env(CLOUD_RUN_SERVICE_VAR)?;
        Some(
            EnvContext::new(provider::GCP, environment::CLOUD_RUN)
                .with_region(self.region())
                .with_account_id(self.project_id())
                .with_instance_id(service),
        )
    }

    fn detect_gke(&self) -> Option<EnvContext> {
        if !self.probe.in_kubernetes() {
            return None;
        }
        if !(self.probe.has_any_env(GKE_ENV_MARKERS) || self.probe.has_any_file(GKE_FILE_MARKERS)) {
            debug!("Kubernetes detected without GCP-specific markers");
            return None;
        }
        Some(
            EnvContext::new(provider::GCP, environment::GKE)
                .with_region(self.region())
                .with_account_id(self.project_id()),
        )
    }

    async fn run(&self) -> Option<EnvContext> {
        let result = match self.detect_gce().await {
            Some(ctx) => Some(ctx),
            None => self
                .detect_cloud_functions()
                .or_else(|| self.detect_cloud_run())
                .or_else(|| self.detect_gke()),
        };
        match &result {
            Some(ctx) => debug!(environment = %ctx.environment, region = %ctx.region, "GCP detected"),
            None => debug!(
                timeout_ms = self.probe.timeout().as_millis() as u64,
                "GCP not detected"
            ),
        }
        result
    }
}

#[async_trait]
impl Detector for GcpDetector {
    fn name(&self) -> &str {
        provider::GCP
    }

    async fn detect(&self) -> Option<EnvContext> {
        self.run().instrument(self.span.clone()).await
    }
}

/// `projects/123/zones/us-central1-a` -> `us-central1`.
///
/// Zones without a `-<suffix>` are returned unchanged.
fn region_from_zone(zone: &str) -> String {
    let zone = zone.rsplit('/').next().unwrap_or(zone);
    match zone.rsplit_once('-') {
        Some((region, _)) if !region.is_empty() => region.to_string(),
        _ => zone.to_string(),
    }
}
