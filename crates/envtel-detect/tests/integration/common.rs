//! Shared test helpers for detector integration tests

use std::{path::Path, time::Duration};

use envtel_detect::DetectorOptions;
use tempfile::TempDir;
use wiremock::MockServer;

/// Per-test sandbox: a mock metadata server, an empty fs root and an env
/// prefix nobody else uses.
pub struct Sandbox {
    pub server: MockServer,
    pub root: TempDir,
    pub prefix: String,
}

impl Sandbox {
    /// Starts a mock server with no routes mounted; unmatched requests
    /// answer `404`, which detectors treat as a miss.
    pub async fn new(prefix: &str) -> Self {
        Self {
            server: MockServer::start().await,
            root: tempfile::tempdir().expect("tempdir"),
            prefix: format!("ENVTEL_IT_{prefix}_"),
        }
    }

    pub fn options(&self) -> DetectorOptions {
        DetectorOptions::default()
            .with_metadata_endpoint(self.server.uri())
            .with_env_prefix(self.prefix.clone())
            .with_fs_root(self.root.path())
            .with_timeout(Duration::from_millis(200))
    }

    /// Sets `name` under this sandbox's prefix.
    pub fn set_env(&self, name: &str, value: &str) {
        std::env::set_var(format!("{}{}", self.prefix, name), value);
    }

    /// Creates a marker file at `path`, interpreted relative to the fs root.
    pub fn touch(&self, path: &str) {
        touch(self.root.path(), path);
    }
}

pub fn touch(root: &Path, path: &str) {
    let full = root.join(path.trim_start_matches('/'));
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent).expect("create marker dir");
    }
    std::fs::write(full, "marker").expect("write marker");
}
