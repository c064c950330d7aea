use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use lexchat::config::{BackendConfig, Config};
use lexchat::message::Message;
use lexchat::storage::SqliteStorage;

#[allow(dead_code)]
pub fn create_temp_storage() -> (SqliteStorage, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("lexchat.db");
    let storage =
        SqliteStorage::new_with_path(db_path).expect("failed to create sqlite storage with path");
    (storage, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Backend settings pointing at a mock server
#[allow(dead_code)]
pub fn backend_config(base_url: &str) -> BackendConfig {
    BackendConfig {
        base_url: base_url.to_string(),
        timeout_seconds: 5,
    }
}

#[allow(dead_code)]
pub fn config_with_backend(base_url: &str) -> Config {
    Config {
        backend: backend_config(base_url),
        ..Default::default()
    }
}

/// A question/answer pair as the chat view would cache it
#[allow(dead_code)]
pub fn exchange(question: &str, answer: &str) -> Vec<Message> {
    vec![Message::user(question), Message::assistant(answer)]
}
