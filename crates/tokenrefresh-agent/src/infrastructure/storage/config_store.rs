//! File-backed access to the registry config document (`~/.upmconfig.toml`).
//!
//! Every mutation is a full load → modify → save under one in-process lock, so
//! a scheduled token commit and a settings-panel edit can never interleave their
//! halves.  Other OS processes are not coordinated with: a user editing the file
//! by hand while a refresh is being written races with it and the last writer
//! wins.
//!
//! Saves are atomic with respect to readers (see [`atomic`]), so the package
//! manager always sees either the old document or the new one.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use tokenrefresh_core::{ConfigDocument, ConfigError, RegistryEntry};

use crate::application::token_store::TokenStore;
use crate::infrastructure::storage::atomic;

/// File name of the registry config document in the user's home directory.
pub const UPM_CONFIG_FILE_NAME: &str = ".upmconfig.toml";

/// Resolves `~/.upmconfig.toml`.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDir`] when the home directory is unknown.
pub fn upm_config_path() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(UPM_CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoHomeDir)
}

/// Reads and writes one registry config file.
pub struct ConfigStore {
    path: PathBuf,
    /// Registry used to seed the document when the file does not exist yet.
    seed_registry: String,
    write_lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>, seed_registry: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            seed_registry: seed_registry.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// A store for `~/.upmconfig.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDir`] when the home directory is unknown.
    pub fn at_default_location(seed_registry: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self::new(upm_config_path()?, seed_registry))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the document.  A missing file yields the seeded default document
    /// (nothing is written).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] for file-system errors other than "not found"
    /// and [`ConfigError::Parse`] if the TOML is malformed.
    pub fn load(&self) -> Result<ConfigDocument, ConfigError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => ConfigDocument::parse(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "config file absent; using seeded default");
                Ok(ConfigDocument::seeded(&self.seed_registry))
            }
            Err(source) => Err(ConfigError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Overwrites the file with `doc`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] or [`ConfigError::Io`].
    pub fn save(&self, doc: &ConfigDocument) -> Result<(), ConfigError> {
        let _guard = self.lock();
        self.write_atomically(doc)
    }

    /// Loads the document, applies `edit`, and saves the result, all under the
    /// store's lock.  Nothing is written if `edit` fails.
    ///
    /// # Errors
    ///
    /// Returns the first error from loading, `edit`, or saving.
    pub fn update<T>(
        &self,
        edit: impl FnOnce(&mut ConfigDocument) -> Result<T, ConfigError>,
    ) -> Result<T, ConfigError> {
        let _guard = self.lock();
        let mut doc = self.load()?;
        let out = edit(&mut doc)?;
        self.write_atomically(&doc)?;
        Ok(out)
    }

    /// Reads the token for `registry_id` from disk.
    ///
    /// # Errors
    ///
    /// Load errors, or [`ConfigError::RegistryNotFound`].
    pub fn get_token(&self, registry_id: &str) -> Result<String, ConfigError> {
        self.load()?.get_token(registry_id).map(str::to_string)
    }

    /// Replaces the token for `registry_id` and saves.
    ///
    /// # Errors
    ///
    /// Load/save errors, or [`ConfigError::RegistryNotFound`].
    pub fn set_token(&self, registry_id: &str, token: &str) -> Result<(), ConfigError> {
        self.update(|doc| doc.set_token(registry_id, token))
    }

    /// Reads the full entry for `registry_id`.
    ///
    /// # Errors
    ///
    /// Load errors, [`ConfigError::RegistryNotFound`] or
    /// [`ConfigError::MalformedSection`].
    pub fn get_entry(&self, registry_id: &str) -> Result<RegistryEntry, ConfigError> {
        self.load()?.get_entry(registry_id)
    }

    /// Updates `email` and `alwaysAuth` for `registry_id` and saves.  The token
    /// is left alone.
    ///
    /// # Errors
    ///
    /// Load/save errors, or [`ConfigError::RegistryNotFound`].
    pub fn set_entry(
        &self,
        registry_id: &str,
        email: &str,
        always_auth: bool,
    ) -> Result<(), ConfigError> {
        self.update(|doc| doc.set_entry(registry_id, email, always_auth))
    }

    /// Registry ids in file order.
    ///
    /// # Errors
    ///
    /// Load errors, or [`ConfigError::MalformedSection`].
    pub fn registries(&self) -> Result<Vec<String>, ConfigError> {
        self.load()?.registry_ids()
    }

    /// Writes the seeded default document if the file does not exist yet.
    ///
    /// Returns `true` if a file was created.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Serialize`].
    pub fn ensure_exists(&self) -> Result<bool, ConfigError> {
        let _guard = self.lock();
        if self.path.exists() {
            return Ok(false);
        }
        self.write_atomically(&ConfigDocument::seeded(&self.seed_registry))?;
        info!(path = %self.path.display(), registry = %self.seed_registry, "created config file");
        Ok(true)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_atomically(&self, doc: &ConfigDocument) -> Result<(), ConfigError> {
        let content = doc.to_toml_string()?;
        atomic::write_atomically(&self.path, content.as_bytes()).map_err(|source| {
            ConfigError::Io {
                path: self.path.clone(),
                source,
            }
        })?;
        debug!(path = %self.path.display(), "config saved");
        Ok(())
    }
}

impl TokenStore for ConfigStore {
    fn read_token(&self, registry_id: &str) -> Result<String, ConfigError> {
        self.get_token(registry_id)
    }

    fn commit_token(&self, registry_id: &str, token: &str) -> Result<(), ConfigError> {
        self.set_token(registry_id, token)
    }

    fn has_registry(&self, registry_id: &str) -> Result<bool, ConfigError> {
        Ok(self.load()?.contains_registry(registry_id))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
