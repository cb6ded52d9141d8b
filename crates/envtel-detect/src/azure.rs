//! Azure environment detection
//!
//! Checks, in priority order:
//!
//! | Environment | Signal |
//! |---|---|
//! | VM | Azure IMDS instance document (`Metadata: true`) |
//! | Functions | `FUNCTIONS_WORKER_RUNTIME` |
//! | App Service | `WEBSITE_INSTANCE_ID` or `WEBSITE_SITE_NAME` |
//! | AKS | Kubernetes marker + AKS env vars or marker files |

use std::time::Duration;

use async_trait::async_trait;
use envtel_core::{
    domain::{
        env_context::{environment, provider, UNKNOWN},
        EnvContext,
    },
    ports::Detector,
};
use serde::Deserialize;
use tracing::{debug, Instrument, Span};

use crate::{
    probe::{non_empty, DetectorOptions, Probe},
    DetectError,
};

/// Default Azure IMDS request timeout.
pub const AZURE_DEFAULT_TIMEOUT: Duration = Duration::from_millis(200);

const INSTANCE_PATH: &str = "/metadata/instance?api-version=2021-02-01";
const METADATA_HEADER: (&str, &str) = ("Metadata", "true");

const REGION_VARS: &[&str] = &["AZURE_REGION", "REGION_NAME", "LOCATION"];
const SUBSCRIPTION_VARS: &[&str] = &["AZURE_SUBSCRIPTION_ID", "SUBSCRIPTION_ID"];
const FUNCTIONS_RUNTIME_VAR: &str = "FUNCTIONS_WORKER_RUNTIME";
const WEBSITE_INSTANCE_VAR: &str = "WEBSITE_INSTANCE_ID";
const WEBSITE_SITE_VAR: &str = "WEBSITE_SITE_NAME";
const AKS_ENV_MARKERS: &[&str] = &["AKS_CLUSTER_NAME", "AZURE_CONTAINER_INSTANCE_ID"];
const AKS_FILE_MARKERS: &[&str] = &[
    "/etc/kubernetes/azure.json",
    "/var/run/secrets/azure/tokens/azure-identity-token",
];

#[derive(Debug, Deserialize)]
struct InstanceDocument {
    compute: ComputeDocument,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComputeDocument {
    location: Option<String>,
    subscription_id: Option<String>,
    vm_id: Option<String>,
}

/// Detects Azure VMs, Functions, App Service and AKS.
pub struct AzureDetector {
    probe: Probe,
    span: Span,
}

impl AzureDetector {
    /// Detector probing the real host with the default 200 ms IMDS timeout.
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
            probe: Probe::new(&options, AZURE_DEFAULT_TIMEOUT)?,
            span: tracing::debug_span!("azure_detector"),
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

    fn subscription_id(&self) -> String {
        self.probe.first_env(SUBSCRIPTION_VARS)
    }

    fn website_instance(&self) -> String {
        self.probe.first_env(&[WEBSITE_INSTANCE_VAR])
    }

    async fn detect_vm(&self) -> Option<EnvContext> {
        let doc: InstanceDocument = self
            .probe
            .get_json(INSTANCE_PATH, &[METADATA_HEADER])
            .await?;
        let compute = doc.compute;
        Some(
            EnvContext::new(provider::AZURE, environment::AZURE_VM)
                .with_region(non_empty(compute.location).unwrap_or_else(|| self.region()))
                .with_account_id(
                    non_empty(compute.subscription_id).unwrap_or_else(|| self.subscription_id()),
                )
                .with_instance_id(non_empty(compute.vm_id).unwrap_or_else(|| UNKNOWN.to_string())),
        )
    }

    fn detect_functions(&self) -> Option<EnvContext> {
        if !self.probe.has_env(FUNCTIONS_RUNTIME_VAR) {
            return None;
        }
        Some(
            EnvContext::new(provider::AZURE, environment::AZURE_FUNCTIONS)
                .with_region(self.region())
                .with_account_id(self.subscription_id())
                .with_instance_id(self.website_instance()),
        )
    }

    fn detect_app_service(&self) -> Option<EnvContext> {
        if !self
            .probe
            .has_any_env(&[WEBSITE_INSTANCE_VAR, WEBSITE_SITE_VAR])
        {
            return None;
        }
        Some(
            EnvContext::new(provider::AZURE, environment::APP_SERVICE)
                .with_region(self.region())
                .with_account_id(self.subscription_id())
                .with_instance_id(self.website_instance()),
        )
    }

    fn detect_aks(&self) -> Option<EnvContext> {
        if !self.probe.in_kubernetes() {
            return None;
        }
        if !(self.probe.has_any_env(AKS_ENV_MARKERS) || self.probe.has_any_file(AKS_FILE_MARKERS)) {
            debug!("Kubernetes detected without Azure-specific markers");
            return None;
        }
        Some(
            EnvContext::new(provider::AZURE, environment::AKS)
                .with_region(self.region())
                .with_account_id(self.subscription_id()),
        )
    }

    async fn run(&self) -> Option<EnvContext> {
        let result = match self.detect_vm().await {
            Some(ctx) => Some(ctx),
            None => self
                .detect_functions()
                .or_else(|| self.detect_app_service())
                .or_else(|| self.detect_aks()),
        };
        match &result {
            Some(ctx) => debug!(environment = %ctx.environment, region = %ctx.region, "Azure detected"),
            None => debug!(
                timeout_ms = self.probe.timeout().as_millis() as u64,
                "Azure not detected"
            ),
        }
        result
    }
}

#[async_trait]
impl Detector for AzureDetector {
    fn name(&self) -> &str {
        provider::AZURE
    }

    async fn detect(&self) -> Option<EnvContext> {
        self.run().instrument(self.span.clone()).await
    }
}
