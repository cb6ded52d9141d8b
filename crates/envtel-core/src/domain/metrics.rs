//! Telemetry metric values
//!
//! A [`Metric`] is a single named value; a [`MetricsSet`] is the ordered
//! bundle one collector produces in one collection pass. Both names exist
//! in a long form (for humans and logs) and a short form (for the wire).

use serde::{Deserialize, Serialize};

/// The value carried by a [`Metric`].
///
/// Scalars cover what the built-in collectors emit; [`MetricValue::Json`]
/// carries any structured value and is written compactly on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Json(serde_json::Value),
}

impl From<bool> for MetricValue {
    fn from(value: bool) -> Self {
        MetricValue::Bool(value)
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        MetricValue::Int(value)
    }
}

impl From<i32> for MetricValue {
    fn from(value: i32) -> Self {
        MetricValue::Int(i64::from(value))
    }
}

impl From<u64> for MetricValue {
    fn from(value: u64) -> Self {
        MetricValue::UInt(value)
    }
}

impl From<usize> for MetricValue {
    fn from(value: usize) -> Self {
        MetricValue::UInt(value as u64)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Float(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Str(value.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        MetricValue::Str(value)
    }
}

impl From<serde_json::Value> for MetricValue {
    fn from(value: serde_json::Value) -> Self {
        MetricValue::Json(value)
    }
}

impl<T: Into<MetricValue>> From<Option<T>> for MetricValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(MetricValue::Null, Into::into)
    }
}

/// A single telemetry value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Descriptive name, e.g. `cloud_provider`
    pub name: String,
    /// Wire name, e.g. `cp`
    pub short_name: String,
    pub value: MetricValue,
}

impl Metric {
    pub fn new(
        name: impl Into<String>,
        short_name: impl Into<String>,
        value: impl Into<MetricValue>,
    ) -> Self {
        Self {
            name: name.into(),
            short_name: short_name.into(),
            value: value.into(),
        }
    }
}

/// The ordered metrics produced by one collector.
///
/// Metric order is part of the wire contract: the encoder emits
/// `key=value` pairs exactly in this order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSet {
    /// Name of the collector that produced the set, e.g. `environment`
    pub collector_name: String,
    /// Wire prefix of the collector, e.g. `env`
    pub short_name: String,
    pub metrics: Vec<Metric>,
}

impl MetricsSet {
    pub fn new(collector_name: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            collector_name: collector_name.into(),
            short_name: short_name.into(),
            metrics: Vec::new(),
        }
    }

    /// Appends a metric, preserving insertion order.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        short_name: impl Into<String>,
        value: impl Into<MetricValue>,
    ) {
        self.metrics.push(Metric::new(name, short_name, value));
    }

    /// Builder-style variant of [`MetricsSet::push`].
    pub fn with(
        mut self,
        name: impl Into<String>,
        short_name: impl Into<String>,
        value: impl Into<MetricValue>,
    ) -> Self {
        self.push(name, short_name, value);
        self
    }

    /// Looks up a metric by its descriptive name.
    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
