//! # warder-config
//!
//! Configuration loading for the scan-dispatch worker.
//!
//! Loads a single YAML document (default path `/etc/warder/backend.yaml`,
//! overridable via `--worker-config`) once at process startup. There is no hot
//! reload: the worker is a bounded-lifetime process restarted by a supervisor,
//! so config/scanner/rule changes are picked up on the next restart rather
//! than in-process.

pub mod logging;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config path used when `--worker-config` is not passed.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/warder/backend.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Root configuration document (`backend.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub coordinator: CoordinatorConfig,
    /// Optional path to a logging filter-directive override file.
    pub logging_cfg: Option<PathBuf>,
    pub limits: LimitsConfig,
    pub tasting: TastingConfig,
    /// Scanner name -> ordered rule list, in the order scanners appear in
    /// the YAML document. The assignment engine's priority sort is stable
    /// and breaks ties on this order (spec §3 invariant 3, §8 invariant 6),
    /// so an order-preserving map is load-bearing here: a `HashMap` would
    /// let two workers loading byte-identical config disagree on tie-break
    /// order, since its iteration order is randomized per process.
    pub scanners: IndexMap<String, Vec<ScannerRule>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coordinator: CoordinatorConfig::default(),
            logging_cfg: None,
            limits: LimitsConfig::default(),
            tasting: TastingConfig::default(),
            scanners: IndexMap::new(),
        }
    }
}

impl Config {
    /// Load and parse a config document from `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Coordinator (Redis-backed queue + KV store) connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub addr: String,
    pub db: i64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            addr: "redis://127.0.0.1:6379".to_string(),
            db: 0,
        }
    }
}

/// Worker-lifetime and per-request/per-file budgets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Retire the worker after this many requests have been processed.
    ///
    /// Counts distinct requests, not file nodes within a request's tree —
    /// matches the upstream source's accounting, which can surprise an
    /// operator expecting the latter.
    pub max_files: u64,
    /// Retire the worker after this many seconds, regardless of throughput.
    pub time_to_live: u64,
    /// Maximum file-node depth in the recursion tree; deeper nodes are skipped.
    pub max_depth: u32,
    /// Per-file-node distribution (classify + scan) timeout, in seconds.
    pub distribution: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_files: 1000,
            time_to_live: 3600,
            max_depth: 5,
            distribution: 600,
        }
    }
}

/// Classifier inputs: MIME sniffing needs no external database, but the field
/// is accepted for parity with the upstream config shape. The rule matcher
/// takes a single rule file or a directory of rule files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TastingConfig {
    pub mime_db: Option<PathBuf>,
    pub yara_rules: Option<PathBuf>,
}

impl Default for TastingConfig {
    fn default() -> Self {
        Self {
            mime_db: None,
            yara_rules: None,
        }
    }
}

/// One rule in a scanner's mapping. Evaluated in configured order by the
/// assignment engine (warder-core::assignment).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScannerRule {
    pub positive: Option<RuleMatch>,
    pub negative: Option<RuleMatch>,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl Default for ScannerRule {
    fn default() -> Self {
        Self {
            positive: None,
            negative: None,
            priority: default_priority(),
            options: serde_json::Map::new(),
        }
    }
}

fn default_priority() -> i32 {
    5
}

/// One side (positive or negative) of a rule's match criteria.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RuleMatch {
    pub flavors: Vec<String>,
    pub filename: Option<String>,
    pub source: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_yaml() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn parses_a_minimal_scanner_mapping() {
        let yaml = r#"
coordinator:
  addr: "redis://localhost:6379"
  db: 1
limits:
  max_files: 1
  time_to_live: 30
  max_depth: 5
  distribution: 10
scanners:
  ScanZip:
    - positive:
        flavors: ["application/zip"]
      priority: 5
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.coordinator.db, 1);
        let rules = cfg.scanners.get("ScanZip").expect("ScanZip rule present");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].priority, 5);
        assert_eq!(
            rules[0].positive.as_ref().unwrap().flavors,
            vec!["application/zip".to_string()]
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::load_from(Path::new("/nonexistent/backend.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backend.yaml");
        std::fs::write(&path, "scanners: [this is not a map").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
