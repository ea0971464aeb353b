//! Structured logging utilities for the scan-dispatch engine's components.
//!
//! Provides consistent logging with component prefixes and structured fields.
//!
//! # Usage
//!
//! ```ignore
//! use warder_config::logging::*;
//!
//! log_worker_info!("Popped task", root_id = %root_id);
//! log_distributor_debug!("Distribution timed out", depth = file.depth);
//! ```

use std::path::Path;

/// Component identifiers for log filtering.
pub struct Component;

impl Component {
    pub const WORKER: &'static str = "worker";
    pub const DISTRIBUTOR: &'static str = "distributor";
    pub const REGISTRY: &'static str = "registry";
    pub const ASSIGNMENT: &'static str = "assignment";
    pub const COORDINATOR: &'static str = "coordinator";
    pub const CLASSIFIER: &'static str = "classifier";
    pub const CLI: &'static str = "cli";
}

// === worker loop logging macros ===

#[macro_export]
macro_rules! log_worker_info {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(component = "worker", $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_worker_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = "worker", $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_worker_error {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::error!(component = "worker", $($key = $value,)* $msg)
    };
}

// === distributor logging macros ===

#[macro_export]
macro_rules! log_distributor_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = "distributor", $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_distributor_warn {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(component = "distributor", $($key = $value,)* $msg)
    };
}

// === registry logging macros ===

#[macro_export]
macro_rules! log_registry_warn {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(component = "registry", $($key = $value,)* $msg)
    };
}

// === coordinator logging macros ===

#[macro_export]
macro_rules! log_coordinator_warn {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(component = "coordinator", $($key = $value,)* $msg)
    };
}

/// Initialize logging once at process startup.
///
/// Honors `RUST_LOG`/`EnvFilter` first; if unset, falls back to the contents
/// of `logging_cfg` (a filter-directive string) when given, and otherwise to
/// `info`.
pub fn init_logging(logging_cfg: Option<&Path>) {
    use tracing_subscriber::EnvFilter;

    let fallback = logging_cfg
        .and_then(|path| std::fs::read_to_string(path).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
