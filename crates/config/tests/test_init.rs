//! Tests for configuration initialization

use armory_config::{init_at, paths, Config};
use tempfile::TempDir;

#[tokio::test]
async fn test_init_writes_starter_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join(".armory").join("config.json");

    let config = init_at(&config_path).await.expect("init failed");

    assert!(config_path.exists());
    assert!(config.chain("shout").is_some());
}

#[tokio::test]
async fn test_init_keeps_existing_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.json");

    let mut existing = Config::default();
    existing.executor.max_workers = 7;
    existing.save_to(&config_path).await.expect("Failed to save");

    let config = init_at(&config_path).await.expect("init failed");

    assert_eq!(config.max_workers(), 7);
    assert!(config.chains.is_empty());
}

#[test]
fn test_config_path_inside_data_dir() {
    let path = paths::config_path();
    assert!(path.starts_with(paths::data_dir()));
    assert!(path.ends_with(".armory/config.json"));
}
