//! Read-only view of the refresh scheduler for status displays.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use tokenrefresh_core::{ConfigError, RefreshSnapshot, RefresherSettings};

use crate::application::token_store::TokenStore;

/// Cheap to clone; every clone sees the same live state.
#[derive(Clone)]
pub struct RefreshObserver {
    state: watch::Receiver<RefreshSnapshot>,
    settings: watch::Receiver<RefresherSettings>,
    store: Arc<dyn TokenStore>,
}

impl RefreshObserver {
    pub(crate) fn new(
        state: watch::Receiver<RefreshSnapshot>,
        settings: watch::Receiver<RefresherSettings>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            state,
            settings,
            store,
        }
    }

    /// The token currently committed for the selected registry, read from the
    /// store rather than cached.
    ///
    /// # Errors
    ///
    /// Propagates the store's error, typically `RegistryNotFound`.
    pub fn current_token(&self) -> Result<String, ConfigError> {
        let registry_id = self.settings.borrow().registry_id().to_string();
        self.store.read_token(&registry_id)
    }

    pub fn refresh_count(&self) -> u64 {
        self.state.borrow().refresh_count
    }

    pub fn last_refresh_time(&self) -> Option<DateTime<Utc>> {
        self.state.borrow().last_refresh_time
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    /// A copy of the whole snapshot.
    pub fn status(&self) -> RefreshSnapshot {
        self.state.borrow().clone()
    }

    /// The registry the scheduler is refreshing.
    pub fn registry_id(&self) -> String {
        self.settings.borrow().registry_id().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::credential_provider::CredentialProvider;
    use crate::application::refresh_scheduler::RefreshScheduler;
    use crate::infrastructure::provider::mock::MockCredentialProvider;
    use crate::infrastructure::storage::memory::MemoryTokenStore;

    const REGISTRY: &str = "https://registry.example.com";

    fn make_scheduler(token: &str) -> RefreshScheduler {
        let provider: Arc<dyn CredentialProvider> =
            Arc::new(MockCredentialProvider::returning(token));
        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::with_registry(REGISTRY));
        RefreshScheduler::new(
            RefresherSettings::new("/usr/bin/gcloud", REGISTRY, 40),
            provider,
            store,
        )
    }

    #[tokio::test]
    async fn test_fresh_observer_reports_never_refreshed() {
        // Arrange
        let scheduler = make_scheduler("abc123");

        // Act
        let observer = scheduler.observer();

        // Assert
        assert_eq!(observer.refresh_count(), 0);
        assert!(observer.last_refresh_time().is_none());
        assert!(!observer.is_running());
        assert_eq!(observer.status().last_refresh_display(), "never");
        assert_eq!(observer.current_token().unwrap(), "invalid_token");
    }

    #[tokio::test]
    async fn test_observer_sees_refresh_results() {
        // Arrange
        let scheduler = make_scheduler("abc123");
        let observer = scheduler.observer();

        // Act
        scheduler.refresh_now().await.unwrap();

        // Assert
        assert_eq!(observer.refresh_count(), 1);
        assert!(observer.last_refresh_time().is_some());
        assert_eq!(observer.current_token().unwrap(), "abc123");
        assert_eq!(observer.registry_id(), REGISTRY);
    }

    #[tokio::test]
    async fn test_observer_follows_running_flag() {
        // Arrange
        let scheduler = make_scheduler("abc123");
        let observer = scheduler.observer();

        // Act / Assert
        scheduler.start().await.unwrap();
        assert!(observer.is_running());
        scheduler.stop().await;
        assert!(!observer.is_running());
    }
}
