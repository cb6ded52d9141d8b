//! Build metadata and per-request context
//!
//! Build fields never change. The request context (`route`, `service`,
//! `class`, `operation`) is updated by the caller before each logical API
//! call; any setter marks the collector dynamic until the next collection.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, PoisonError,
};

use async_trait::async_trait;
use chrono::Local;
use envtel_core::{
    domain::{BuildInfo, MetricsSet},
    ports::Collector,
};

pub const NAME: &str = "metadata";
pub const SHORT_NAME: &str = "md";

#[derive(Debug, Clone, Default)]
struct RequestContext {
    route: String,
    service: String,
    class: String,
    operation: String,
}

/// Emits build identifiers, a timestamp and the caller's request context.
#[derive(Debug)]
pub struct MetadataCollector {
    build: BuildInfo,
    context: Mutex<RequestContext>,
    changed: AtomicBool,
}

impl MetadataCollector {
    pub fn new(build: BuildInfo) -> Self {
        Self {
            build,
            context: Mutex::new(RequestContext::default()),
            changed: AtomicBool::new(false),
        }
    }

    pub fn build_info(&self) -> &BuildInfo {
        &self.build
    }

    pub fn set_route(&self, route: impl Into<String>) {
        self.update(|ctx| ctx.route = route.into());
    }

    pub fn set_service(&self, service: impl Into<String>) {
        self.update(|ctx| ctx.service = service.into());
    }

    pub fn set_class(&self, class: impl Into<String>) {
        self.update(|ctx| ctx.class = class.into());
    }

    pub fn set_operation(&self, operation: impl Into<String>) {
        self.update(|ctx| ctx.operation = operation.into());
    }

    // The flag flips under the context lock so a collection never observes
    // a new value with a stale flag.
    fn update(&self, apply: impl FnOnce(&mut RequestContext)) {
        let mut ctx = self.context.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut ctx);
        self.changed.store(true, Ordering::SeqCst);
    }

    fn take_context(&self) -> RequestContext {
        let ctx = self.context.lock().unwrap_or_else(PoisonError::into_inner);
        self.changed.store(false, Ordering::SeqCst);
        ctx.clone()
    }
}

#[async_trait]
impl Collector for MetadataCollector {
    fn name(&self) -> &str {
        NAME
    }

    fn is_dynamic(&self) -> bool {
        self.changed.load(Ordering::SeqCst)
    }

    async fn collect(&self) -> anyhow::Result<MetricsSet> {
        let ctx = self.take_context();
        let build = &self.build;

        Ok(MetricsSet::new(NAME, SHORT_NAME)
            .with("tool_version", "v", build.version.as_str())
            .with("build_number", "bn", build.build_number.as_str())
            .with("build_date", "bd", build.build_date.as_str())
            .with("git_commit", "gc", build.git_commit.as_str())
            .with("git_branch", "gb", build.git_branch.as_str())
            .with("correlation_id", "cid", build.correlation_id.as_str())
            .with("timestamp", "ts", Local::now().to_rfc3339())
            .with("route", "rt", ctx.route)
            .with("service", "svc", ctx.service)
            .with("class", "cls", ctx.class)
            .with("operation", "op", ctx.operation))
    }
}
