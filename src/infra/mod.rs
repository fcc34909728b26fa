//! Infrastructure - configuration and run summary
//!
//! - `config` - Application configuration (TOML loading, defaults)
//! - `metrics` - Per-run scan counters

pub mod config;
pub mod metrics;

// Re-export commonly used types
pub use config::Config;
pub use metrics::ScanSummary;
