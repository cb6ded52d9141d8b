//! Runtime environment detector port
//!
//! ## Design Notes
//!
//! - A detector never fails: metadata timeouts, non-2xx responses and
//!   malformed payloads all mean "this check did not match".
//! - `None` means every check of the detector was exhausted.
//! - Uses `#[async_trait]` because implementations probe metadata services.

use async_trait::async_trait;

use crate::domain::EnvContext;

/// Detects whether the process runs in a particular environment.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Short identifier of what this detector recognises (e.g. `aws`)
    fn name(&self) -> &str;

    /// Runs the detector's checks in priority order and returns the first
    /// match, or `None` if nothing matched.
    async fn detect(&self) -> Option<EnvContext>;
}
