//! CLI command implementations

pub mod config;
pub mod detect;
pub mod header;
