//! Runtime environment context
//!
//! An [`EnvContext`] describes where the current process runs: the cloud
//! provider, the compute environment within that provider, the region and
//! the account / instance identifiers. Detection produces a fresh value on
//! every call; it carries no identity of its own.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder used for any field that could not be determined.
pub const UNKNOWN: &str = "unknown";

/// Provider / environment name reported when no cloud was detected.
pub const ON_PREMISE: &str = "on-premise";

/// Cloud provider identifiers.
pub mod provider {
    pub const AWS: &str = "aws";
    pub const AZURE: &str = "azure";
    pub const GCP: &str = "gcp";
}

/// Compute environment identifiers, grouped per provider.
pub mod environment {
    pub const EC2: &str = "ec2";
    pub const ECS: &str = "ecs";
    pub const LAMBDA: &str = "lambda";
    pub const EKS: &str = "eks";

    pub const AZURE_VM: &str = "vm";
    pub const AZURE_FUNCTIONS: &str = "functions";
    pub const APP_SERVICE: &str = "app-service";
    pub const AKS: &str = "aks";

    pub const GCE: &str = "gce";
    pub const CLOUD_FUNCTIONS: &str = "cloud-functions";
    pub const CLOUD_RUN: &str = "cloud-run";
    pub const GKE: &str = "gke";
}

/// Where the current process is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvContext {
    /// Cloud provider (`aws`, `azure`, `gcp`) or `on-premise`
    pub provider: String,
    /// Compute environment within the provider (`ec2`, `lambda`, `gke`, ...)
    pub environment: String,
    /// Provider region, `unknown` when undeterminable
    pub region: String,
    /// Account / subscription / project identifier
    pub account_id: String,
    /// Instance / VM / function identifier
    pub instance_id: String,
}

impl EnvContext {
    /// Creates a context with the given provider and environment and every
    /// other field set to `unknown`.
    pub fn new(provider: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            environment: environment.into(),
            region: UNKNOWN.to_string(),
            account_id: UNKNOWN.to_string(),
            instance_id: UNKNOWN.to_string(),
        }
    }

    /// The sentinel returned when no provider matched.
    pub fn on_premise() -> Self {
        Self::new(ON_PREMISE, ON_PREMISE)
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = account_id.into();
        self
    }

    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = instance_id.into();
        self
    }

    /// Returns true if this is the on-premise sentinel provider.
    pub fn is_on_premise(&self) -> bool {
        self.provider == ON_PREMISE
    }
}

impl Default for EnvContext {
    fn default() -> Self {
        Self::on_premise()
    }
}

impl fmt::Display for EnvContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.provider, self.environment, self.region)
    }
}
