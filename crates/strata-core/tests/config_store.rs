use std::path::PathBuf;

use tempfile::TempDir;

use strata_core::config::{ConfigStore, ServerConfig, ServerEntry, StrataConfig};

#[test]
fn load_missing_returns_empty_config() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::new(temp.path().join("config").join("strata.toml"));

    let config = store.load().unwrap();

    assert!(config.servers.is_empty());
}

#[test]
fn save_then_load_roundtrip() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::new(temp.path().join("config").join("strata.toml"));

    let mut config = StrataConfig::new();
    let mut entry = ServerEntry::new(temp.path().join("deploy"));
    entry.zip_deployments = false;
    config.servers.insert("local".to_string(), entry);

    store.save(&config).unwrap();
    let loaded = store.load().unwrap();

    assert!(loaded.servers.contains_key("local"));
    assert!(!loaded.servers["local"].zip_deployments);
}

#[test]
fn resolved_server_uses_explicit_state_dir() {
    let temp = TempDir::new().unwrap();
    let mut config = StrataConfig::new();
    let mut entry = ServerEntry::new(temp.path().join("deploy"));
    entry.state_dir = Some(temp.path().join("state"));
    config.servers.insert("local".to_string(), entry);

    let server = config
        .server("local", &PathBuf::from("/unused/default"))
        .unwrap();

    assert_eq!(server.name(), "local");
    assert_eq!(server.state_location(), temp.path().join("state"));
    assert!(server.zip_deployments());
}
