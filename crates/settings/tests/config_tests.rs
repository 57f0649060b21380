use settings::{SettingsError, StudioConfig};

#[test]
fn missing_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = StudioConfig::load_or_default(&dir.path().join("config.json")).unwrap();
    assert_eq!(config, StudioConfig::default());
    assert_eq!(config.history_capacity, 25);
    assert_eq!(config.debounce_ms, 150);
}

#[test]
fn partial_config_keeps_remaining_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "debounce_ms": 300 }"#).unwrap();

    let config = StudioConfig::load(&path).unwrap();
    assert_eq!(config.debounce_ms, 300);
    assert_eq!(config.history_capacity, 25);
    assert_eq!(config.max_matrix_jobs, 10_000);
}

#[test]
fn save_then_load_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");
    let config = StudioConfig {
        history_capacity: 50,
        ..Default::default()
    };
    config.save(&path).unwrap();
    assert_eq!(StudioConfig::load(&path).unwrap(), config);
}

#[test]
fn malformed_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = StudioConfig::load_or_default(&path).unwrap_err();
    assert!(matches!(err, SettingsError::Json { .. }));
}
