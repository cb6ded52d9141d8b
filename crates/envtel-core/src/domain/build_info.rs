//! Static build metadata of the host tool
//!
//! The values are normally baked in at compile time. Host tools embedding
//! the telemetry pipeline can override any of them with the `with_*`
//! builder methods.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::env_context::UNKNOWN;

/// Build and identity information reported by the metadata collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub tool_name: String,
    pub version: String,
    pub build_number: String,
    pub build_date: String,
    pub git_commit: String,
    pub git_branch: String,
    /// Per-process identifier that correlates telemetry from one run
    pub correlation_id: String,
}

impl BuildInfo {
    /// Build information of this binary.
    ///
    /// Reads `ENVTEL_BUILD_NUMBER`, `ENVTEL_BUILD_DATE`, `ENVTEL_GIT_COMMIT`
    /// and `ENVTEL_GIT_BRANCH` at compile time; unset values become
    /// `unknown`. A fresh correlation id is generated on every call.
    pub fn current() -> Self {
        Self {
            tool_name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            build_number: option_env!("ENVTEL_BUILD_NUMBER")
                .unwrap_or(UNKNOWN)
                .to_string(),
            build_date: option_env!("ENVTEL_BUILD_DATE")
                .unwrap_or(UNKNOWN)
                .to_string(),
            git_commit: option_env!("ENVTEL_GIT_COMMIT")
                .unwrap_or(UNKNOWN)
                .to_string(),
            git_branch: option_env!("ENVTEL_GIT_BRANCH")
                .unwrap_or(UNKNOWN)
                .to_string(),
            correlation_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = tool_name.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_build_number(mut self, build_number: impl Into<String>) -> Self {
        self.build_number = build_number.into();
        self
    }

    pub fn with_build_date(mut self, build_date: impl Into<String>) -> Self {
        self.build_date = build_date.into();
        self
    }

    pub fn with_git_commit(mut self, git_commit: impl Into<String>) -> Self {
        self.git_commit = git_commit.into();
        self
    }

    pub fn with_git_branch(mut self, git_branch: impl Into<String>) -> Self {
        self.git_branch = git_branch.into();
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::current()
    }
}
