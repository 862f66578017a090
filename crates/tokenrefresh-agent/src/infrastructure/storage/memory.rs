//! In-memory [`TokenStore`] for unit testing.
//!
//! Lets scheduler tests run without touching the file system and inject commit
//! failures on demand.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use tokenrefresh_core::{ConfigError, SEED_TOKEN};

use crate::application::token_store::TokenStore;

/// Registry id → token map guarded by a mutex.
pub struct MemoryTokenStore {
    tokens: Mutex<BTreeMap<String, String>>,
    commits: AtomicUsize,
    fail_commits: AtomicBool,
}

impl MemoryTokenStore {
    /// A store with one registry holding the seed token.
    pub fn with_registry(registry_id: &str) -> Self {
        Self::with_registries(&[registry_id])
    }

    /// A store with several registries, each holding the seed token.
    pub fn with_registries(registry_ids: &[&str]) -> Self {
        let tokens = registry_ids
            .iter()
            .map(|id| (id.to_string(), SEED_TOKEN.to_string()))
            .collect();
        Self {
            tokens: Mutex::new(tokens),
            commits: AtomicUsize::new(0),
            fail_commits: AtomicBool::new(false),
        }
    }

    /// The current token for `registry_id`, if the registry exists.
    pub fn token(&self, registry_id: &str) -> Option<String> {
        self.tokens
            .lock()
            .expect("lock poisoned")
            .get(registry_id)
            .cloned()
    }

    /// Number of successful commits.
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Makes every subsequent commit fail with an I/O error.
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

impl TokenStore for MemoryTokenStore {
    fn read_token(&self, registry_id: &str) -> Result<String, ConfigError> {
        self.token(registry_id)
            .ok_or_else(|| ConfigError::RegistryNotFound(registry_id.to_string()))
    }

    fn commit_token(&self, registry_id: &str, token: &str) -> Result<(), ConfigError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(ConfigError::Io {
                path: "memory".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "injected failure"),
            });
        }
        let mut tokens = self.tokens.lock().expect("lock poisoned");
        match tokens.get_mut(registry_id) {
            Some(slot) => {
                *slot = token.to_string();
                self.commits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(ConfigError::RegistryNotFound(registry_id.to_string())),
        }
    }

    fn has_registry(&self, registry_id: &str) -> Result<bool, ConfigError> {
        Ok(self
            .tokens
            .lock()
            .expect("lock poisoned")
            .contains_key(registry_id))
    }
}
