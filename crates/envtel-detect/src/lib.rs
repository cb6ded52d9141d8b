//! envtel Detect - Runtime environment detection
//!
//! Determines where the current process runs by probing environment
//! variables, filesystem markers and the cloud metadata service:
//! - [`AwsDetector`] - EC2, ECS, Lambda, EKS
//! - [`AzureDetector`] - VM, Functions, App Service, AKS
//! - [`GcpDetector`] - GCE, Cloud Functions, Cloud Run, GKE
//! - [`CloudDetector`] - ordered cascade over the three, with an on-premise fallback
//!
//! Detection never fails. Probe timeouts, error statuses and malformed
//! metadata all count as "not this environment". Only building a detector
//! can fail, when the HTTP client cannot be created.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use envtel_detect::CloudDetector;
//!
//! # async fn example() -> Result<(), envtel_detect::DetectError> {
//! let (ctx, found) = CloudDetector::new()?.detect_or_default().await;
//! println!("{} (cloud: {found})", ctx);
//! # Ok(())
//! # }
//! ```

pub mod aws;
pub mod azure;
pub mod cloud;
pub mod gcp;
pub mod probe;

pub use aws::AwsDetector;
pub use azure::AzureDetector;
pub use cloud::CloudDetector;
pub use gcp::GcpDetector;
pub use probe::DetectorOptions;

/// Errors raised while building a detector.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("Failed to build metadata HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
