//! Host metrics
//!
//! OS, architecture, CPU count, compiler version, timezone, total memory
//! and total disk. Memory and disk come from `sysinfo`; when introspection
//! yields nothing they are reported as `unknown` rather than failing.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use envtel_core::{
    domain::{env_context::UNKNOWN, MetricValue, MetricsSet},
    ports::Collector,
};
use sysinfo::{Disks, System};
use tracing::debug;

pub const NAME: &str = "os";
pub const SHORT_NAME: &str = "os";

/// Emits static host facts.
#[derive(Debug, Clone)]
pub struct OsCollector {
    fs_root: PathBuf,
}

impl OsCollector {
    pub fn new() -> Self {
        Self {
            fs_root: PathBuf::from("/"),
        }
    }

    /// Resolves `/etc/timezone` and `/etc/localtime` under `root`.
    pub fn with_fs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.fs_root = root.into();
        self
    }
}

impl Default for OsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collector for OsCollector {
    fn name(&self) -> &str {
        NAME
    }

    fn is_dynamic(&self) -> bool {
        false
    }

    async fn collect(&self) -> anyhow::Result<MetricsSet> {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Ok(MetricsSet::new(NAME, SHORT_NAME)
            .with("os_name", "os", std::env::consts::OS)
            .with("architecture", "arch", std::env::consts::ARCH)
            .with("cpu_count", "cpu", cpus)
            .with("runtime_version", "rv", runtime_version())
            .with(
                "timezone",
                "tz",
                timezone(std::env::var("TZ").ok(), &self.fs_root),
            )
            .with("total_memory", "mem", total_memory())
            .with("total_disk", "dsk", total_disk()))
    }
}

fn runtime_version() -> String {
    match option_env!("RUSTC_VERSION") {
        Some(version) => format!("rustc {version}"),
        None => UNKNOWN.to_string(),
    }
}

fn total_memory() -> MetricValue {
    let mut system = System::new();
    system.refresh_memory();
    match system.total_memory() {
        0 => {
            debug!("Total memory unavailable");
            MetricValue::from(UNKNOWN)
        }
        bytes => MetricValue::from(bytes),
    }
}

fn total_disk() -> MetricValue {
    let disks = Disks::new_with_refreshed_list();
    let total: u64 = disks.iter().map(|disk| disk.total_space()).sum();
    if total == 0 {
        debug!("Total disk space unavailable");
        return MetricValue::from(UNKNOWN);
    }
    MetricValue::from(total)
}

/// Timezone name from `TZ`, `/etc/timezone`, the `/etc/localtime` link
/// target, and finally the local UTC offset.
fn timezone(tz_env: Option<String>, root: &Path) -> String {
    if let Some(tz) = tz_env.map(|tz| tz.trim_start_matches(':').to_string()) {
        if !tz.is_empty() {
            return tz;
        }
    }

    if let Ok(contents) = std::fs::read_to_string(root.join("etc/timezone")) {
        let name = contents.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }

    if let Ok(target) = std::fs::read_link(root.join("etc/localtime")) {
        let target = target.to_string_lossy();
        if let Some((_, name)) = target.split_once("zoneinfo/") {
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }

    Local::now().format("%:z").to_string()
}
