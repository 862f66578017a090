//! Integration tests for the refresh pipeline.
//!
//! These tests drive a `RefreshScheduler` against a real `ConfigStore` in a
//! temporary directory, exercising the scheduler, the store, and the document
//! model together.  Timer-driven tests run on Tokio's paused clock.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use tokenrefresh_agent::application::credential_provider::CredentialProvider;
use tokenrefresh_agent::application::refresh_scheduler::{RefreshScheduler, SchedulerError};
use tokenrefresh_agent::application::token_store::TokenStore;
use tokenrefresh_agent::infrastructure::provider::mock::{MockCredentialProvider, MockResponse};
use tokenrefresh_agent::infrastructure::storage::config_store::ConfigStore;
use tokenrefresh_core::{ConfigDocument, RefresherSettings, SEED_EMAIL, SENTINEL_TOKEN};

const REGISTRY: &str = "https://registry.example.com";

const SHARED_CONFIG: &str = r#"
enableCrashReporting = false

[npmAuth."https://registry.example.com"]
token = "expired"
email = "dev@example.com"
alwaysAuth = true

[npmAuth."https://other.example.com"]
token = "untouched"
email = "other@example.com"
alwaysAuth = false

[scopedRegistries]
name = "company"
url = "https://registry.example.com"
scopes = ["com.company"]
"#;

fn config_path(dir: &TempDir) -> PathBuf {
    dir.path().join(".upmconfig.toml")
}

fn build(
    dir: &TempDir,
    provider: MockCredentialProvider,
    minutes: i64,
) -> (RefreshScheduler, Arc<ConfigStore>, Arc<MockCredentialProvider>) {
    let store = Arc::new(ConfigStore::new(config_path(dir), REGISTRY));
    let provider = Arc::new(provider);
    let scheduler = RefreshScheduler::new(
        RefresherSettings::new("/usr/bin/gcloud", REGISTRY, minutes),
        Arc::clone(&provider) as Arc<dyn CredentialProvider>,
        Arc::clone(&store) as Arc<dyn TokenStore>,
    );
    (scheduler, store, provider)
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_first_run_without_config_file_creates_seeded_entry_with_fresh_token() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let (scheduler, store, _provider) =
        build(&dir, MockCredentialProvider::returning("abc123"), 40);
    assert!(!config_path(&dir).exists());

    // Act
    scheduler.start().await.unwrap();
    let mut rx = scheduler.subscribe();
    rx.wait_for(|s| s.refresh_count == 1).await.unwrap();

    // Assert
    let entry = store.get_entry(REGISTRY).unwrap();
    assert_eq!(entry.token, "abc123");
    assert_eq!(entry.email, SEED_EMAIL);
    assert!(entry.always_auth);
    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_scheduled_refreshes_preserve_unrelated_content() {
    // Arrange
    let dir = TempDir::new().unwrap();
    std::fs::write(config_path(&dir), SHARED_CONFIG).unwrap();
    let before = ConfigDocument::parse(SHARED_CONFIG).unwrap();
    let (scheduler, store, provider) =
        build(&dir, MockCredentialProvider::returning("fresh"), 10);

    // Act: the immediate cycle plus two scheduled ones
    scheduler.start().await.unwrap();
    settle().await;
    for _ in 0..2 {
        tokio::time::advance(Duration::from_secs(10 * 60)).await;
        settle().await;
    }
    scheduler.stop().await;

    // Assert
    assert_eq!(provider.calls(), 3);
    let mut expected = before;
    expected.set_token(REGISTRY, "fresh").unwrap();
    assert_eq!(store.load().unwrap(), expected);
    assert_eq!(store.get_token("https://other.example.com").unwrap(), "untouched");
}

#[tokio::test(start_paused = true)]
async fn test_failed_cycle_writes_sentinel_and_next_cycle_recovers() {
    // Arrange
    let dir = TempDir::new().unwrap();
    std::fs::write(config_path(&dir), SHARED_CONFIG).unwrap();
    let (scheduler, store, _provider) = build(
        &dir,
        MockCredentialProvider::returning("recovered").then(MockResponse::Timeout),
        1,
    );

    // Act
    scheduler.start().await.unwrap();
    settle().await;

    // Assert – sentinel, email intact
    let entry = store.get_entry(REGISTRY).unwrap();
    assert_eq!(entry.token, SENTINEL_TOKEN);
    assert_eq!(entry.email, "dev@example.com");

    // Act – next tick
    tokio::time::advance(Duration::from_secs(61)).await;
    settle().await;

    // Assert
    assert_eq!(store.get_token(REGISTRY).unwrap(), "recovered");
    assert_eq!(scheduler.observer().refresh_count(), 2);
    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_start_fails_when_registry_missing_from_existing_file() {
    // Arrange
    let dir = TempDir::new().unwrap();
    std::fs::write(config_path(&dir), "[npmAuth.\"https://elsewhere\"]\ntoken = \"t\"\n").unwrap();
    let (scheduler, _store, provider) = build(&dir, MockCredentialProvider::returning("x"), 40);

    // Act
    let result = scheduler.start().await;

    // Assert
    assert!(matches!(result, Err(SchedulerError::Config(_))));
    assert!(!scheduler.is_running());
    assert_eq!(provider.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_observer_reads_token_from_disk() {
    // Arrange
    let dir = TempDir::new().unwrap();
    std::fs::write(config_path(&dir), SHARED_CONFIG).unwrap();
    let (scheduler, store, _provider) = build(&dir, MockCredentialProvider::returning("t1"), 40);
    let observer = scheduler.observer();

    // Act: someone else rewrites the token on disk
    store.set_token(REGISTRY, "edited-by-hand").unwrap();

    // Assert
    assert_eq!(observer.current_token().unwrap(), "edited-by-hand");
    assert_eq!(observer.status().last_refresh_display(), "never");
}

#[cfg(unix)]
#[tokio::test]
async fn test_refresh_now_with_real_process_writes_trimmed_token() {
    use std::os::unix::fs::PermissionsExt;
    use tokenrefresh_agent::infrastructure::provider::ProcessCredentialProvider;

    // Arrange: a shell script standing in for the credential tool
    let dir = TempDir::new().unwrap();
    let tool = dir.path().join("gcloud");
    std::fs::write(&tool, "#!/bin/sh\nprintf 'abc123\\n'\n").unwrap();
    std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
    std::fs::write(config_path(&dir), SHARED_CONFIG).unwrap();

    let store = Arc::new(ConfigStore::new(config_path(&dir), REGISTRY));
    let scheduler = RefreshScheduler::new(
        RefresherSettings::new(tool.to_string_lossy(), REGISTRY, 40),
        Arc::new(ProcessCredentialProvider::default()),
        Arc::clone(&store) as Arc<dyn TokenStore>,
    );

    // Act
    let token = scheduler.refresh_now().await.unwrap();

    // Assert
    assert_eq!(token, "abc123");
    assert_eq!(store.get_token(REGISTRY).unwrap(), "abc123");
    assert_eq!(scheduler.observer().refresh_count(), 1);
}
