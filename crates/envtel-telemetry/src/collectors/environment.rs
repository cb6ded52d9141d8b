//! Runtime environment metrics
//!
//! Reports whether an HTTP proxy is configured and where the process runs.
//! Account and instance identifiers are deliberately left out of the
//! metric set even though detection computes them.

use std::sync::Arc;

use async_trait::async_trait;
use envtel_core::{
    domain::{EnvContext, MetricsSet},
    ports::{Collector, Detector},
};
use tokio::sync::OnceCell;
use tracing::{debug, Instrument, Span};

pub const NAME: &str = "environment";
pub const SHORT_NAME: &str = "env";

const PROXY_VARS: &[&str] = &["HTTP_PROXY", "HTTPS_PROXY", "http_proxy", "https_proxy"];

/// Emits proxy and cloud placement metrics.
///
/// Detection runs at most once per collector; the result is reused for the
/// collector's lifetime.
pub struct EnvironmentCollector {
    detector: Arc<dyn Detector>,
    context: OnceCell<EnvContext>,
    env_prefix: String,
    span: Span,
}

impl EnvironmentCollector {
    pub fn new(detector: Arc<dyn Detector>) -> Self {
        Self {
            detector,
            context: OnceCell::new(),
            env_prefix: String::new(),
            span: tracing::debug_span!("environment_collector"),
        }
    }

    /// Reads the proxy variables under `prefix`.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The detected context, running detection on first use.
    pub async fn context(&self) -> &EnvContext {
        self.context
            .get_or_init(|| async {
                let ctx = self
                    .detector
                    .detect()
                    .await
                    .unwrap_or_else(EnvContext::on_premise);
                debug!(provider = %ctx.provider, environment = %ctx.environment, "Environment memoized");
                ctx
            })
            .await
    }

    fn proxy_configured(&self) -> bool {
        PROXY_VARS.iter().any(|name| {
            std::env::var(format!("{}{}", self.env_prefix, name))
                .map(|value| !value.is_empty())
                .unwrap_or(false)
        })
    }
}

#[async_trait]
impl Collector for EnvironmentCollector {
    fn name(&self) -> &str {
        NAME
    }

    fn is_dynamic(&self) -> bool {
        false
    }

    async fn collect(&self) -> anyhow::Result<MetricsSet> {
        let ctx = self.context().instrument(self.span.clone()).await;

        Ok(MetricsSet::new(NAME, SHORT_NAME)
            .with("proxy_configured", "px", self.proxy_configured())
            .with("cloud_provider", "cp", ctx.provider.as_str())
            .with("cloud_environment", "ce", ctx.environment.as_str())
            .with("cloud_region", "cr", ctx.region.as_str()))
    }
}
