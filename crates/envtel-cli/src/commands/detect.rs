//! Detect command - Run the cloud detection cascade
//!
//! Prints every field of the detected context, including account and
//! instance ids. Those stay local; the telemetry header never carries them.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use envtel_core::config::Config;
use envtel_detect::CloudDetector;
use tracing::info;

use crate::output::{Output, OutputFormat};

#[derive(Debug, Args)]
pub struct DetectCommand {}

impl DetectCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let out = Output::new(format);
        let config = Config::load_or_default(config_path);

        info!(endpoint = %config.detection.metadata_endpoint, "Running detection");
        let detector = CloudDetector::from_config(&config.detection)
            .context("Failed to build environment detector")?;
        let (ctx, found) = detector.detect_or_default().await;

        if format.is_json() {
            let mut json = serde_json::to_value(&ctx).context("Failed to serialize context")?;
            json["found"] = serde_json::Value::Bool(found);
            out.print_json(&json);
            return Ok(());
        }

        if found {
            out.success(&format!("Detected {}", ctx));
        } else {
            out.warn("No cloud provider detected, assuming on-premise");
        }
        out.field("Provider", &ctx.provider);
        out.field("Environment", &ctx.environment);
        out.field("Region", &ctx.region);
        out.field("Account ID", &ctx.account_id);
        out.field("Instance ID", &ctx.instance_id);

        Ok(())
    }
}
