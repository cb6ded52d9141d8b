//! Header command - Produce the telemetry header
//!
//! Builds the default pipeline from configuration, applies the optional
//! request context and prints `<header-name>: <value>`.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use envtel_core::{config::Config, domain::BuildInfo};
use envtel_telemetry::{decode_header, Telemetry};

use crate::output::{Output, OutputFormat};

#[derive(Debug, Args)]
pub struct HeaderCommand {
    /// Route of the API call (e.g. /v1/users)
    #[arg(long)]
    pub route: Option<String>,

    /// Service being called
    #[arg(long)]
    pub service: Option<String>,

    /// Client class issuing the call
    #[arg(long)]
    pub class: Option<String>,

    /// Operation being performed
    #[arg(long)]
    pub operation: Option<String>,

    /// Also print the decoded wire string
    #[arg(long)]
    pub decode: bool,
}

impl HeaderCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let out = Output::new(format);
        let config = Config::load_or_default(config_path);

        let build_info = BuildInfo::current()
            .with_tool_name(env!("CARGO_PKG_NAME"))
            .with_version(env!("CARGO_PKG_VERSION"));
        let telemetry =
            Telemetry::new(&config, build_info).context("Failed to initialize telemetry")?;

        if let Some(route) = &self.route {
            telemetry.set_route(route.as_str());
        }
        if let Some(service) = &self.service {
            telemetry.set_service(service.as_str());
        }
        if let Some(class) = &self.class {
            telemetry.set_class(class.as_str());
        }
        if let Some(operation) = &self.operation {
            telemetry.set_operation(operation.as_str());
        }

        let value = telemetry
            .header_value()
            .await
            .context("Failed to produce telemetry header")?;

        let Some(value) = value else {
            if format.is_json() {
                out.print_json(&serde_json::json!({
                    "enabled": false,
                    "header": telemetry.header_name(),
                }));
            } else {
                out.warn("Telemetry is disabled; no header produced");
            }
            return Ok(());
        };

        let decoded = if self.decode {
            Some(decode_header(&value)?)
        } else {
            None
        };

        if format.is_json() {
            out.print_json(&serde_json::json!({
                "enabled": true,
                "header": telemetry.header_name(),
                "value": value,
                "decoded": decoded,
            }));
        } else {
            println!("{}: {}", telemetry.header_name(), value);
            if let Some(decoded) = decoded {
                for pair in decoded.split('&') {
                    out.info(pair);
                }
            }
        }

        Ok(())
    }
}
