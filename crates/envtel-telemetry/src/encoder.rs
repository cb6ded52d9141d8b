//! Header wire format
//!
//! ```text
//! sn=<tool>&<collector short>.<metric short>=<value>&...
//! ```
//!
//! The string is then base64 encoded (standard alphabet, padded). Values
//! are written unescaped, so a value containing `&` or `=` makes the
//! string ambiguous to parse. Callers that need strict parsing must keep
//! those characters out of their values.

use base64::Engine;
use envtel_core::{
    domain::{MetricValue, MetricsSet, TelemetryError},
    ports::MetricsEncoder,
};

/// Encodes metric sets into the telemetry header value.
#[derive(Debug, Clone)]
pub struct HeaderEncoder {
    tool_name: String,
}

impl HeaderEncoder {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
        }
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// The plain wire string, before base64.
    pub fn wire_string(&self, sets: &[MetricsSet]) -> Result<String, TelemetryError> {
        let mut out = format!("sn={}", self.tool_name);
        for set in sets {
            for metric in &set.metrics {
                out.push('&');
                out.push_str(&set.short_name);
                out.push('.');
                out.push_str(&metric.short_name);
                out.push('=');
                out.push_str(&format_value(&metric.value)?);
            }
        }
        Ok(out)
    }
}

impl MetricsEncoder for HeaderEncoder {
    fn encode(&self, sets: &[MetricsSet]) -> Result<Vec<u8>, TelemetryError> {
        let wire = self.wire_string(sets)?;
        Ok(base64::engine::general_purpose::STANDARD
            .encode(wire)
            .into_bytes())
    }
}

fn format_value(value: &MetricValue) -> Result<String, TelemetryError> {
    Ok(match value {
        MetricValue::Null => String::new(),
        MetricValue::Bool(b) => b.to_string(),
        MetricValue::Int(n) => n.to_string(),
        MetricValue::UInt(n) => n.to_string(),
        MetricValue::Float(f) => f.to_string(),
        MetricValue::Str(s) => s.clone(),
        MetricValue::Json(json) => serde_json::to_string(json)?,
    })
}
