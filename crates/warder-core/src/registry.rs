//! Scanner registry (spec §4.3).
//!
//! Per REDESIGN FLAGS §9: this is an explicit, build-time static map from
//! scanner name to constructor, not dynamic module resolution — there is no
//! camel-to-snake-case name translation anywhere in this crate. Config
//! scanner names are registry keys verbatim. Instances are created lazily on
//! first use and retained for the worker's lifetime; a missing entry is a
//! soft failure (`WorkerError::MissingScanner`), logged and skipped.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use warder_config::log_registry_warn;

use crate::types::{File, ScanOutput, ScannerOptions};

/// Uniform contract every scanner plugin implements (spec §6).
#[async_trait]
pub trait ScannerPlugin: Send + Sync {
    /// The registry key this plugin was constructed under.
    fn name(&self) -> &str;

    /// Scan `data`, returning any child files it extracted and a JSON
    /// summary of its work. Scanners should self-bound against `expire_at`,
    /// though the distributor's own distribution timeout is the actual
    /// enforcement mechanism.
    async fn scan_wrapper(
        &self,
        data: &[u8],
        file: &File,
        options: &ScannerOptions,
        expire_at: DateTime<Utc>,
    ) -> anyhow::Result<(Vec<File>, ScanOutput)>;
}

type PluginConstructor = Box<dyn Fn() -> Box<dyn ScannerPlugin> + Send + Sync>;

/// Owns the static name->constructor map and the live plugin cache. Not
/// shared across tasks — the worker loop owns one registry for its entire
/// lifetime (spec §5, "scanner cache is owned by the worker").
pub struct ScannerRegistry {
    constructors: HashMap<String, PluginConstructor>,
    cache: HashMap<String, Arc<dyn ScannerPlugin>>,
}

impl Default for ScannerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ScannerRegistry {
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
            cache: HashMap::new(),
        }
    }

    /// Register a constructor under `name`. Intended to be called once at
    /// bootstrap (spec §4.7) with closures that capture whatever the plugin
    /// needs (config, a coordinator handle) by value.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn ScannerPlugin> + Send + Sync + 'static,
    {
        self.constructors
            .insert(name.into(), Box::new(constructor));
    }

    /// Look up a live plugin instance, constructing and caching it on first
    /// use. Returns `None` (and logs) if `name` has no registered
    /// constructor — the caller treats this as `MissingScanner` and skips
    /// the scanner for the current file.
    pub fn get_or_create(&mut self, name: &str) -> Option<Arc<dyn ScannerPlugin>> {
        if let Some(plugin) = self.cache.get(name) {
            return Some(Arc::clone(plugin));
        }
        let constructor = match self.constructors.get(name) {
            Some(c) => c,
            None => {
                log_registry_warn!("scanner not registered", name = name);
                return None;
            }
        };
        let plugin: Arc<dyn ScannerPlugin> = Arc::from(constructor());
        self.cache.insert(name.to_string(), Arc::clone(&plugin));
        Some(plugin)
    }
}
