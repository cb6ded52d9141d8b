//! Shared probing layer for provider detectors
//!
//! Every detector looks at the same three signal sources:
//! - environment variables, read through an optional namespace prefix
//! - marker files, resolved against a configurable filesystem root
//! - the link-local metadata service, reached with a short per-request timeout
//!
//! None of the probes return errors. A missing variable, a missing file,
//! a timeout, a non-2xx status or an unparsable body all come back as
//! `None` / `false` so the calling cascade simply moves on.

use std::{path::PathBuf, time::Duration};

use envtel_core::{
    config::{DetectionConfig, DEFAULT_METADATA_ENDPOINT},
    domain::env_context::UNKNOWN,
};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::DetectError;

/// Generic Kubernetes indicator: set inside every pod.
pub const KUBERNETES_SERVICE_HOST: &str = "KUBERNETES_SERVICE_HOST";

/// Service-account token mounted into pods by default.
pub const KUBERNETES_TOKEN_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

// ============================================================================
// DetectorOptions
// ============================================================================

/// Explicit configuration for a single detector.
///
/// The defaults probe the real host: the link-local metadata address,
/// unprefixed environment variables and the real filesystem root. Tests and
/// embedders override them to point at mock servers and fixture trees.
#[derive(Debug, Clone)]
pub struct DetectorOptions {
    /// Base URL of the metadata service (no trailing slash required)
    pub metadata_endpoint: String,
    /// Prefix prepended to every environment variable name
    pub env_prefix: String,
    /// Root directory marker file paths are resolved against
    pub fs_root: PathBuf,
    /// Per-request metadata timeout; `None` uses the detector's default
    pub timeout: Option<Duration>,
}

impl DetectorOptions {
    /// Options from the `detection` config section, without a timeout.
    ///
    /// Timeouts differ per provider, so [`CloudDetector`](crate::CloudDetector)
    /// fills them in per detector.
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            metadata_endpoint: config.metadata_endpoint.clone(),
            env_prefix: config.env_prefix.clone(),
            fs_root: config.fs_root.clone(),
            timeout: None,
        }
    }

    pub fn with_metadata_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.metadata_endpoint = endpoint.into();
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn with_fs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.fs_root = root.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            metadata_endpoint: DEFAULT_METADATA_ENDPOINT.to_string(),
            env_prefix: String::new(),
            fs_root: PathBuf::from("/"),
            timeout: None,
        }
    }
}

// ============================================================================
// Probe
// ============================================================================

/// Signal reader shared by the provider detectors.
#[derive(Debug, Clone)]
pub(crate) struct Probe {
    client: Client,
    endpoint: String,
    env_prefix: String,
    fs_root: PathBuf,
    timeout: Duration,
}

impl Probe {
    pub(crate) fn new(
        options: &DetectorOptions,
        default_timeout: Duration,
    ) -> Result<Self, DetectError> {
        // Link-local metadata traffic must never go through HTTP(S)_PROXY.
        let client = Client::builder().no_proxy().build()?;

        Ok(Self {
            client,
            endpoint: options.metadata_endpoint.trim_end_matches('/').to_string(),
            env_prefix: options.env_prefix.clone(),
            fs_root: options.fs_root.clone(),
            timeout: options.timeout.unwrap_or(default_timeout),
        })
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    // ------------------------------------------------------------------------
    // Environment variables
    // ------------------------------------------------------------------------

    /// Value of `name` (after prefixing), treating empty values as unset.
    pub(crate) fn env(&self, name: &str) -> Option<String> {
        std::env::var(format!("{}{}", self.env_prefix, name))
            .ok()
            .filter(|value| !value.is_empty())
    }

    pub(crate) fn has_env(&self, name: &str) -> bool {
        self.env(name).is_some()
    }

    pub(crate) fn has_any_env(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.has_env(name))
    }

    /// First non-empty value among `names`, in order, or `unknown`.
    pub(crate) fn first_env(&self, names: &[&str]) -> String {
        names
            .iter()
            .find_map(|name| self.env(name))
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    // ------------------------------------------------------------------------
    // Filesystem markers
    // ------------------------------------------------------------------------

    fn resolve(&self, path: &str) -> PathBuf {
        self.fs_root.join(path.trim_start_matches('/'))
    }

    pub(crate) fn file_exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    pub(crate) fn has_any_file(&self, paths: &[&str]) -> bool {
        paths.iter().any(|path| self.file_exists(path))
    }

    /// Generic Kubernetes indicator. Necessary but never sufficient for a
    /// provider-specific verdict.
    pub(crate) fn in_kubernetes(&self) -> bool {
        self.has_env(KUBERNETES_SERVICE_HOST) || self.file_exists(KUBERNETES_TOKEN_FILE)
    }

    // ------------------------------------------------------------------------
    // Metadata service
    // ------------------------------------------------------------------------

    fn request(&self, method: Method, path: &str, headers: &[(&str, &str)]) -> RequestBuilder {
        let url = format!("{}{}", self.endpoint, path);
        let mut builder = self.client.request(method, url).timeout(self.timeout);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder
    }

    /// Sends the request and returns the status and body.
    ///
    /// A transport failure or timeout is [`Unreachable`]: nothing answered
    /// within the timeout, which callers use to skip further requests.
    async fn send(
        &self,
        method: Method,
        path: &str,
        headers: &[(&str, &str)],
    ) -> Result<(StatusCode, String), Unreachable> {
        let response = match self.request(method.clone(), path, headers).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(
                    %method,
                    path,
                    timeout_ms = self.timeout.as_millis() as u64,
                    error = %e,
                    "Metadata probe failed"
                );
                return Err(Unreachable);
            }
        };

        let status = response.status();
        match response.text().await {
            Ok(body) => Ok((status, body)),
            Err(e) => {
                debug!(%method, path, error = %e, "Metadata probe body unreadable");
                Err(Unreachable)
            }
        }
    }

    /// Body of a request that must answer exactly `200 OK`.
    pub(crate) async fn fetch_ok(
        &self,
        method: Method,
        path: &str,
        headers: &[(&str, &str)],
    ) -> Result<Option<String>, Unreachable> {
        let (status, body) = self.send(method.clone(), path, headers).await?;
        if status != StatusCode::OK {
            debug!(%method, path, status = status.as_u16(), "Metadata probe returned non-200");
            return Ok(None);
        }
        Ok(Some(body))
    }

    /// Body of a successful (2xx) GET, trimmed. Error statuses and empty
    /// bodies are `Ok(None)`.
    pub(crate) async fn try_get_text(
        &self,
        path: &str,
        headers: &[(&str, &str)],
    ) -> Result<Option<String>, Unreachable> {
        let (status, body) = self.send(Method::GET, path, headers).await?;
        if !status.is_success() {
            debug!(path, status = status.as_u16(), "Metadata probe returned non-2xx");
            return Ok(None);
        }
        let body = body.trim();
        if body.is_empty() {
            return Ok(None);
        }
        Ok(Some(body.to_string()))
    }

    /// Like [`Probe::try_get_text`], folding every failure into `None`.
    pub(crate) async fn get_text(&self, path: &str, headers: &[(&str, &str)]) -> Option<String> {
        self.try_get_text(path, headers).await.ok().flatten()
    }

    /// Successful GET parsed as JSON; malformed bodies are `Ok(None)`.
    pub(crate) async fn try_get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        headers: &[(&str, &str)],
    ) -> Result<Option<T>, Unreachable> {
        let Some(body) = self.try_get_text(path, headers).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&body) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                debug!(path, error = %e, "Metadata probe returned malformed JSON");
                Ok(None)
            }
        }
    }

    /// Like [`Probe::try_get_json`], folding every failure into `None`.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        headers: &[(&str, &str)],
    ) -> Option<T> {
        self.try_get_json(path, headers).await.ok().flatten()
    }
}

/// The metadata service did not answer: connection error or timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Unreachable;

/// Treats empty strings from metadata documents as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
