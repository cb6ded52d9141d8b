//! Telemetry aggregation with a two-tier cache
//!
//! 1. Whole-result short-circuit: when every collector is static and a
//!    previous encoding exists, the cached bytes are returned without
//!    taking the collection lock.
//! 2. Per-collector reuse: during a fresh collection, static collectors
//!    with a cached [`MetricsSet`] are not called again.
//!
//! Fresh collections are serialized by an async mutex. Each fresh set is
//! cached as soon as its collector returns, since collecting may have
//! consumed the collector's "changed" state. A collector or encoder
//! failure aborts the pass and leaves the last encoded bytes as they were;
//! they are not served again until a later pass encodes successfully.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, PoisonError, RwLock,
    },
};

use envtel_core::{
    domain::{MetricsSet, TelemetryError},
    ports::{Collector, MetricsEncoder},
};
use tokio::sync::Mutex;
use tracing::{debug, warn, Instrument, Span};

/// Collects from an ordered list of collectors and encodes the result.
pub struct TelemetryAggregator {
    collectors: Vec<Arc<dyn Collector>>,
    encoder: Box<dyn MetricsEncoder>,
    /// Last successful set per collector name
    sets: Mutex<HashMap<String, MetricsSet>>,
    last_encoded: RwLock<Option<Vec<u8>>>,
    /// Set when `sets` holds data newer than `last_encoded`
    stale: AtomicBool,
    span: Span,
}

impl TelemetryAggregator {
    pub fn new(collectors: Vec<Arc<dyn Collector>>, encoder: Box<dyn MetricsEncoder>) -> Self {
        Self {
            collectors,
            encoder,
            sets: Mutex::new(HashMap::new()),
            last_encoded: RwLock::new(None),
            stale: AtomicBool::new(false),
            span: tracing::debug_span!("telemetry_aggregator"),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn collectors(&self) -> &[Arc<dyn Collector>] {
        &self.collectors
    }

    /// First collector whose name equals `name` exactly.
    pub fn collector_by_name(&self, name: &str) -> Option<&Arc<dyn Collector>> {
        self.collectors.iter().find(|c| c.name() == name)
    }

    /// Bytes of the last successful encoding, if any.
    pub fn last_encoded(&self) -> Option<Vec<u8>> {
        self.last_encoded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the encoded telemetry, collecting only what may have changed.
    ///
    /// # Errors
    ///
    /// [`TelemetryError::Collection`] if any collector fails, or the
    /// encoder's error. The last encoded bytes are kept in either case.
    pub async fn collect_and_encode(&self) -> Result<Vec<u8>, TelemetryError> {
        if let Some(bytes) = self.cached_if_static() {
            return Ok(bytes);
        }
        self.collect_fresh().instrument(self.span.clone()).await
    }

    fn cached_if_static(&self) -> Option<Vec<u8>> {
        if self.stale.load(Ordering::SeqCst) || self.collectors.iter().any(|c| c.is_dynamic()) {
            return None;
        }
        self.last_encoded()
    }

    async fn collect_fresh(&self) -> Result<Vec<u8>, TelemetryError> {
        let mut cached = self.sets.lock().await;

        // Another caller may have finished a collection while we waited.
        if let Some(bytes) = self.cached_if_static() {
            debug!("Reusing telemetry encoded while waiting for the lock");
            return Ok(bytes);
        }

        let mut sets = Vec::with_capacity(self.collectors.len());

        for collector in &self.collectors {
            let name = collector.name();
            if !collector.is_dynamic() {
                if let Some(set) = cached.get(name) {
                    sets.push(set.clone());
                    continue;
                }
            }

            match collector.collect().await {
                Ok(set) => {
                    debug!(collector = name, metrics = set.len(), "Collected metrics");
                    self.stale.store(true, Ordering::SeqCst);
                    cached.insert(name.to_string(), set.clone());
                    sets.push(set);
                }
                Err(e) => {
                    warn!(collector = name, error = %e, "Collector failed, aborting telemetry");
                    return Err(TelemetryError::collection(name, e));
                }
            }
        }

        let bytes = self.encoder.encode(&sets).map_err(|e| {
            warn!(error = %e, "Telemetry encoding failed");
            e
        })?;

        *self
            .last_encoded
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(bytes.clone());
        self.stale.store(false, Ordering::SeqCst);

        Ok(bytes)
    }
}
