//! AWS environment detection
//!
//! Checks, in priority order:
//!
//! | Environment | Signal |
//! |---|---|
//! | EC2 | IMDSv2 token + instance identity document (or `meta-data/instance-id`) |
//! | ECS | `ECS_CONTAINER_METADATA_URI_V4` |
//! | Lambda | `AWS_LAMBDA_FUNCTION_NAME` |
//! | EKS | Kubernetes marker + IRSA env vars or EKS marker files |
//!
//! IMDSv2 token acquisition is best effort: if `PUT /latest/api/token`
//! does not answer `200`, the metadata GETs are sent without a token.
//! When the identity document request gets no answer at all, the
//! `meta-data` fallbacks are skipped so an absent IMDS costs at most two
//! timeouts.

use std::time::Duration;

use async_trait::async_trait;
use envtel_core::{
    domain::{
        env_context::{environment, provider, UNKNOWN},
        EnvContext,
    },
    ports::Detector,
};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, Instrument, Span};

use crate::{
    probe::{non_empty, DetectorOptions, Probe},
    DetectError,
};

/// Default IMDS request timeout.
pub const AWS_DEFAULT_TIMEOUT: Duration = Duration::from_millis(150);

const TOKEN_PATH: &str = "/latest/api/token";
const IDENTITY_DOCUMENT_PATH: &str = "/latest/dynamic/instance-identity/document";
const INSTANCE_ID_PATH: &str = "/latest/meta-data/instance-id";
const REGION_PATH: &str = "/latest/meta-data/placement/region";

const TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";
const TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";
const TOKEN_TTL_SECONDS: &str = "21600";

const REGION_VARS: &[&str] = &["AWS_REGION", "AWS_DEFAULT_REGION"];
const ACCOUNT_VARS: &[&str] = &["AWS_ACCOUNT_ID", "CDK_DEFAULT_ACCOUNT"];
const ECS_METADATA_VAR: &str = "ECS_CONTAINER_METADATA_URI_V4";
const LAMBDA_FUNCTION_VAR: &str = "AWS_LAMBDA_FUNCTION_NAME";
const EKS_ENV_MARKERS: &[&str] = &["AWS_ROLE_ARN", "AWS_WEB_IDENTITY_TOKEN_FILE"];
const EKS_FILE_MARKERS: &[&str] = &[
    "/etc/eks/release",
    "/var/run/secrets/eks.amazonaws.com/serviceaccount/token",
];

/// Instance identity document served by IMDS.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityDocument {
    region: Option<String>,
    account_id: Option<String>,
    instance_id: Option<String>,
}

/// Detects EC2, ECS, Lambda and EKS.
pub struct AwsDetector {
    probe: Probe,
    span: Span,
}

impl AwsDetector {
    /// Detector probing the real host with the default 150 ms IMDS timeout.
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
            probe: Probe::new(&options, AWS_DEFAULT_TIMEOUT)?,
            span: tracing::debug_span!("aws_detector"),
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

    fn account_id(&self) -> String {
        self.probe.first_env(ACCOUNT_VARS)
    }

    /// IMDSv2 session token, if the token endpoint answers `200`.
    async fn imds_token(&self) -> Option<String> {
        let token = self
            .probe
            .fetch_ok(
                Method::PUT,
                TOKEN_PATH,
                &[(TOKEN_TTL_HEADER, TOKEN_TTL_SECONDS)],
            )
            .await
            .ok()
            .flatten()
            .map(|body| body.trim().to_string())
            .filter(|token| !token.is_empty());
        if token.is_none() {
            debug!("IMDSv2 token unavailable, falling back to unauthenticated requests");
        }
        token
    }

    async fn detect_ec2(&self) -> Option<EnvContext> {
        let token = self.imds_token().await;
        let headers: Vec<(&str, &str)> = token
            .as_deref()
            .map(|token| vec![(TOKEN_HEADER, token)])
            .unwrap_or_default();

        let document = match self
            .probe
            .try_get_json::<IdentityDocument>(IDENTITY_DOCUMENT_PATH, &headers)
            .await
        {
            Ok(document) => document,
            Err(_) => {
                debug!("IMDS did not answer, skipping meta-data fallbacks");
                return None;
            }
        };

        if let Some(doc) = document {
            return Some(
                EnvContext::new(provider::AWS, environment::EC2)
                    .with_region(non_empty(doc.region).unwrap_or_else(|| self.region()))
                    .with_account_id(
                        non_empty(doc.account_id).unwrap_or_else(|| self.account_id()),
                    )
                    .with_instance_id(
                        non_empty(doc.instance_id).unwrap_or_else(|| UNKNOWN.to_string()),
                    ),
            );
        }

        let instance_id = self.probe.get_text(INSTANCE_ID_PATH, &headers).await?;
        let region = match self.probe.get_text(REGION_PATH, &headers).await {
            Some(region) => region,
            None => self.region(),
        };
        Some(
            EnvContext::new(provider::AWS, environment::EC2)
                .with_region(region)
                .with_account_id(self.account_id())
                .with_instance_id(instance_id),
        )
    }

    fn detect_ecs(&self) -> Option<EnvContext> {
        if !self.probe.has_env(ECS_METADATA_VAR) {
            return None;
        }
        Some(
            EnvContext::new(provider::AWS, environment::ECS)
                .with_region(self.region())
                .with_account_id(self.account_id()),
        )
    }

    fn detect_lambda(&self) -> Option<EnvContext> {
        let function = self.probe.env(LAMBDA_FUNCTION_VAR)?;
        Some(
            EnvContext::new(provider::AWS, environment::LAMBDA)
                .with_region(self.region())
                .with_account_id(self.account_id())
                .with_instance_id(function),
        )
    }

    fn detect_eks(&self) -> Option<EnvContext> {
        if !self.probe.in_kubernetes() {
            return None;
        }
        if !(self.probe.has_any_env(EKS_ENV_MARKERS) || self.probe.has_any_file(EKS_FILE_MARKERS)) {
            debug!("Kubernetes detected without AWS-specific markers");
            return None;
        }
        Some(
            EnvContext::new(provider::AWS, environment::EKS)
                .with_region(self.region())
                .with_account_id(self.account_id()),
        )
    }

    async fn run(&self) -> Option<EnvContext> {
        let result = match self.detect_ec2().await {
            Some(ctx) => Some(ctx),
            None => self
                .detect_ecs()
                .or_else(|| self.detect_lambda())
                .or_else(|| self.detect_eks()),
        };
        match &result {
            Some(ctx) => debug!(environment = %ctx.environment, region = %ctx.region, "AWS detected"),
            None => debug!(
                timeout_ms = self.probe.timeout().as_millis() as u64,
                "AWS not detected"
            ),
        }
        result
    }
}

#[async_trait]
impl Detector for AwsDetector {
    fn name(&self) -> &str {
        provider::AWS
    }

    async fn detect(&self) -> Option<EnvContext> {
        self.run().instrument(self.span.clone()).await
    }
}
