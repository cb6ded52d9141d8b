//! Built-in metric collectors
//!
//! | Collector | Short | Dynamic |
//! |---|---|---|
//! | [`MetadataCollector`] | `md` | after any request-context setter, until the next collection |
//! | [`EnvironmentCollector`] | `env` | never |
//! | [`OsCollector`] | `os` | never |

pub mod environment;
pub mod metadata;
pub mod os;

pub use environment::EnvironmentCollector;
pub use metadata::MetadataCollector;
pub use os::OsCollector;
