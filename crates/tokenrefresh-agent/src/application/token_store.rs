//! TokenStore: where refreshed tokens are committed.
//!
//! Every call is a complete load-modify-save against the backing document, so
//! a successful return always leaves a valid file behind.  Implementations must
//! serialize their own writers; callers never hold a lock across calls.

use tokenrefresh_core::ConfigError;

/// Persistent storage for one token per registry.
pub trait TokenStore: Send + Sync {
    /// Reads the token currently stored for `registry_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RegistryNotFound`] if the registry has no entry,
    /// or any load error of the backing document.
    fn read_token(&self, registry_id: &str) -> Result<String, ConfigError>;

    /// Replaces the token for `registry_id` and persists the document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RegistryNotFound`] if the registry has no entry;
    /// the entry is never created.
    fn commit_token(&self, registry_id: &str, token: &str) -> Result<(), ConfigError>;

    /// Returns whether `registry_id` has an entry.
    ///
    /// # Errors
    ///
    /// Returns any load error of the backing document.
    fn has_registry(&self, registry_id: &str) -> Result<bool, ConfigError>;
}
