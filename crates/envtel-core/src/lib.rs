//! envtel Core - Domain values, ports and configuration
//!
//! This crate holds everything the detection and telemetry crates share:
//! - **Domain values** - `EnvContext`, `Metric`, `MetricValue`, `MetricsSet`, `BuildInfo`
//! - **Port definitions** - Traits for adapters: `Detector`, `Collector`, `MetricsEncoder`
//! - **Configuration** - YAML-backed settings with validation and a builder
//!
//! # Architecture
//!
//! The domain module contains plain values with no I/O. Ports define the
//! trait interfaces that the `envtel-detect` and `envtel-telemetry` crates
//! implement, so the aggregator never depends on a concrete collector.

pub mod config;
pub mod domain;
pub mod ports;
