//! Config command - View and validate envtel configuration

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use envtel_core::config::Config;
use tracing::info;

use crate::output::{Output, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
    /// Print the default configuration file path
    Path,
}

impl ConfigCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(format, config_path),
            ConfigCommand::Validate => execute_validate(format, config_path),
            ConfigCommand::Path => execute_path(format),
        }
    }
}

fn execute_show(format: OutputFormat, config_path: &Path) -> Result<()> {
    let out = Output::new(format);
    let config = Config::load_or_default(config_path);

    info!(config_path = %config_path.display(), "Showing configuration");

    if format.is_json() {
        let json = serde_json::to_value(&config)
            .context("Failed to serialize configuration to JSON")?;
        out.print_json(&json);
        return Ok(());
    }

    out.success(&format!("Configuration ({})", config_path.display()));
    if !config_path.exists() {
        out.info("File not found, showing defaults");
    }
    out.info("");
    let yaml =
        serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
    for line in yaml.lines() {
        out.info(line);
    }
    Ok(())
}

fn execute_validate(format: OutputFormat, config_path: &Path) -> Result<()> {
    let out = Output::new(format);
    let path_str = config_path.display().to_string();

    if !config_path.exists() {
        if format.is_json() {
            out.print_json(&serde_json::json!({
                "valid": true,
                "config_path": path_str,
                "errors": [],
                "note": "file not found, defaults in use",
            }));
        } else {
            out.info(&format!("Configuration file not found at {}", path_str));
            out.info("Defaults are in use and are valid.");
        }
        return Ok(());
    }

    let config = match Config::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            if format.is_json() {
                out.print_json(&serde_json::json!({
                    "valid": false,
                    "config_path": path_str,
                    "errors": [format!("Failed to parse configuration: {:#}", e)],
                }));
            } else {
                out.error(&format!("Failed to parse configuration: {:#}", e));
                out.info(&format!("File: {}", path_str));
            }
            bail!("configuration could not be parsed");
        }
    };

    info!(config_path = %path_str, "Validating configuration");
    let errors = config.validate();

    if format.is_json() {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        out.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": path_str,
            "errors": messages,
        }));
    } else if errors.is_empty() {
        out.success("Configuration is valid");
        out.info(&format!("File: {}", path_str));
    } else {
        out.error(&format!(
            "Configuration has {} error{}:",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" }
        ));
        out.info(&format!("File: {}", path_str));
        for error in &errors {
            out.info(&format!("  {} - {}", error.field, error.message));
        }
    }

    if !errors.is_empty() {
        bail!("configuration has {} error(s)", errors.len());
    }
    Ok(())
}

fn execute_path(format: OutputFormat) -> Result<()> {
    let path = Config::default_path();
    if format.is_json() {
        Output::new(format).print_json(&serde_json::json!({
            "config_path": path.display().to_string(),
        }));
    } else {
        println!("{}", path.display());
    }
    Ok(())
}
