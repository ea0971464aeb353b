//! Integration tests for warder-config: the full load-from-disk pipeline
//! against a realistic `backend.yaml`, as an operator would actually write
//! one (spec §6 "Config document").

use warder_config::{Config, ConfigError};

fn write_config(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("backend.yaml");
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn loads_a_realistic_backend_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
coordinator:
  addr: "redis://coordinator.internal:6379"
  db: 2
logging_cfg: "/etc/warder/logging.filter"
limits:
  max_files: 500
  time_to_live: 1800
  max_depth: 8
  distribution: 45
tasting:
  yara_rules: "/etc/warder/rules"
scanners:
  ScanZip:
    - positive:
        flavors: ["application/zip"]
      priority: 5
    - negative:
        filename: "\\.enc$"
      priority: 1
  ScanHash:
    - positive:
        flavors: ["*"]
      priority: 1
"#,
    );

    let config = Config::load_from(&path).expect("valid config should load");

    assert_eq!(config.coordinator.addr, "redis://coordinator.internal:6379");
    assert_eq!(config.coordinator.db, 2);
    assert_eq!(config.limits.max_files, 500);
    assert_eq!(config.limits.time_to_live, 1800);
    assert_eq!(config.limits.max_depth, 8);
    assert_eq!(config.limits.distribution, 45);
    assert_eq!(
        config.tasting.yara_rules,
        Some(std::path::PathBuf::from("/etc/warder/rules"))
    );

    let zip_rules = config.scanners.get("ScanZip").expect("ScanZip configured");
    assert_eq!(zip_rules.len(), 2);
    assert_eq!(zip_rules[0].priority, 5);
    assert!(zip_rules[1].negative.is_some());

    let hash_rules = config.scanners.get("ScanHash").expect("ScanHash configured");
    assert_eq!(hash_rules[0].positive.as_ref().unwrap().flavors, vec!["*"]);
}

#[test]
fn absent_sections_fall_back_to_documented_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
coordinator:
  addr: "redis://127.0.0.1:6379"
  db: 0
"#,
    );

    let config = Config::load_from(&path).unwrap();

    assert_eq!(config.limits.max_files, 1000);
    assert_eq!(config.limits.time_to_live, 3600);
    assert_eq!(config.limits.max_depth, 5);
    assert_eq!(config.limits.distribution, 600);
    assert!(config.scanners.is_empty());
    assert!(config.tasting.yara_rules.is_none());
}

#[test]
fn nonexistent_config_path_is_an_io_error_not_a_panic() {
    let err = Config::load_from(std::path::Path::new("/does/not/exist/backend.yaml"))
        .expect_err("missing file must error");
    assert!(matches!(err, ConfigError::Io { .. }));
}
