//! Configuration module for envtel.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable that force-disables telemetry when set to `1` or `true`.
pub const TELEMETRY_DISABLED_ENV: &str = "ENVTEL_TELEMETRY_DISABLED";

/// Default header carrying the encoded telemetry.
pub const DEFAULT_HEADER_NAME: &str = "X-Cybr-Telemetry";

/// Link-local address shared by the AWS, Azure and GCP metadata services.
pub const DEFAULT_METADATA_ENDPOINT: &str = "http://169.254.169.254";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for envtel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub telemetry: TelemetryConfig,
    pub detection: DetectionConfig,
    pub logging: LoggingConfig,
}

/// Header production settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Whether a telemetry header is produced at all.
    pub enabled: bool,
    /// Tool name written as the `sn=` field of the wire string.
    pub tool_name: String,
    /// Name of the transport header carrying the encoded value.
    pub header_name: String,
}

/// Runtime environment detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Base URL of the cloud metadata service.
    pub metadata_endpoint: String,
    /// Prefix prepended to every environment variable the detectors read.
    pub env_prefix: String,
    /// Directory that filesystem markers are resolved against.
    pub fs_root: PathBuf,
    /// Timeout for AWS IMDS requests, in milliseconds.
    pub aws_timeout_ms: u64,
    /// Timeout for Azure and GCP metadata requests, in milliseconds.
    pub metadata_timeout_ms: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/envtel/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("envtel")
            .join("config.yaml")
    }

    /// Whether telemetry should be produced, taking the
    /// [`TELEMETRY_DISABLED_ENV`] override into account.
    pub fn telemetry_enabled(&self) -> bool {
        if let Ok(value) = std::env::var(TELEMETRY_DISABLED_ENV) {
            let value = value.trim().to_ascii_lowercase();
            if value == "1" || value == "true" {
                return false;
            }
        }
        self.telemetry.enabled
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tool_name: "envtel".to_string(),
            header_name: DEFAULT_HEADER_NAME.to_string(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            metadata_endpoint: DEFAULT_METADATA_ENDPOINT.to_string(),
            env_prefix: String::new(),
            fs_root: PathBuf::from("/"),
            aws_timeout_ms: 150,
            metadata_timeout_ms: 200,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"detection.aws_timeout_ms"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound for probe timeouts. Detection runs on the request path.
const MAX_TIMEOUT_MS: u64 = 5_000;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- telemetry ---
        if self.telemetry.tool_name.trim().is_empty() {
            errors.push(ValidationError {
                field: "telemetry.tool_name".into(),
                message: "must not be empty".into(),
            });
        }
        if self.telemetry.tool_name.contains(['&', '=']) {
            errors.push(ValidationError {
                field: "telemetry.tool_name".into(),
                message: "must not contain '&' or '='".into(),
            });
        }
        if self.telemetry.header_name.trim().is_empty() {
            errors.push(ValidationError {
                field: "telemetry.header_name".into(),
                message: "must not be empty".into(),
            });
        }

        // --- detection ---
        let endpoint = &self.detection.metadata_endpoint;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            errors.push(ValidationError {
                field: "detection.metadata_endpoint".into(),
                message: format!("must be an http(s) URL, got '{endpoint}'"),
            });
        }
        for (field, value) in [
            ("detection.aws_timeout_ms", self.detection.aws_timeout_ms),
            (
                "detection.metadata_timeout_ms",
                self.detection.metadata_timeout_ms,
            ),
        ] {
            if value == 0 || value > MAX_TIMEOUT_MS {
                errors.push(ValidationError {
                    field: field.into(),
                    message: format!("must be in range 1..={MAX_TIMEOUT_MS}"),
                });
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use envtel_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .tool_name("mytool")
///     .metadata_endpoint("http://127.0.0.1:8080")
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- telemetry ---

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.telemetry.enabled = enabled;
        self
    }

    pub fn tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.config.telemetry.tool_name = tool_name.into();
        self
    }

    pub fn header_name(mut self, header_name: impl Into<String>) -> Self {
        self.config.telemetry.header_name = header_name.into();
        self
    }

    // --- detection ---

    pub fn metadata_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.detection.metadata_endpoint = endpoint.into();
        self
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.detection.env_prefix = prefix.into();
        self
    }

    pub fn fs_root(mut self, root: PathBuf) -> Self {
        self.config.detection.fs_root = root;
        self
    }

    pub fn aws_timeout_ms(mut self, ms: u64) -> Self {
        self.config.detection.aws_timeout_ms = ms;
        self
    }

    pub fn metadata_timeout_ms(mut self, ms: u64) -> Self {
        self.config.detection.metadata_timeout_ms = ms;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
