//! TOML persistence for [`RefresherSettings`].
//!
//! The settings file lives in the platform-appropriate preferences directory:
//! - Windows:  `%APPDATA%\TokenRefresh\settings.toml`
//! - Linux:    `~/.config/tokenrefresh/settings.toml`
//! - macOS:    `~/Library/Application Support/TokenRefresh/settings.toml`
//!
//! ```toml
//! credential_tool_path = "/usr/bin/gcloud"
//! registry_id = "https://europe-npm.pkg.dev/my-project/my-repo"
//! refresh_interval_minutes = 40
//! ```
//!
//! Every field has a serde default, so a file written by an older version (or
//! edited down by hand) still loads.  The interval is clamped again on load.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use tokenrefresh_core::{RefresherSettings, SettingsError};

use crate::infrastructure::provider::locate_credential_tool;
use crate::infrastructure::storage::atomic;

const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Determines the platform-appropriate directory for the settings file.
///
/// # Errors
///
/// Returns [`SettingsError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn settings_dir() -> Result<PathBuf, SettingsError> {
    platform_settings_dir().ok_or(SettingsError::NoPlatformConfigDir)
}

/// Resolves the full path to the settings file.
///
/// # Errors
///
/// Returns [`SettingsError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn settings_file_path() -> Result<PathBuf, SettingsError> {
    Ok(settings_dir()?.join(SETTINGS_FILE_NAME))
}

/// Reads and writes the refresher settings file.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A store for the platform default location.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NoPlatformConfigDir`].
    pub fn at_default_location() -> Result<Self, SettingsError> {
        Ok(Self::new(settings_file_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the settings, returning defaults (with the credential tool located
    /// on `PATH`) if the file does not yet exist.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] for file-system errors other than "not
    /// found", and [`SettingsError::Parse`] if the TOML is malformed.
    pub fn load(&self) -> Result<RefresherSettings, SettingsError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let settings: RefresherSettings = toml::from_str(&content)?;
                Ok(settings.normalized())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "settings file absent; using defaults");
                let mut settings = RefresherSettings::default();
                settings.set_credential_tool_path(locate_credential_tool().to_string_lossy());
                Ok(settings)
            }
            Err(source) => Err(SettingsError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Like [`SettingsStore::load`], but logs and falls back to defaults on
    /// any error.
    pub fn load_or_default(&self) -> RefresherSettings {
        self.load().unwrap_or_else(|e| {
            warn!(path = %self.path.display(), "could not load settings, using defaults: {e}");
            let mut settings = RefresherSettings::default();
            settings.set_credential_tool_path(locate_credential_tool().to_string_lossy());
            settings
        })
    }

    /// Persists `settings` atomically, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] for file-system failures or
    /// [`SettingsError::Serialize`] if serialization fails.
    pub fn save(&self, settings: &RefresherSettings) -> Result<(), SettingsError> {
        let content = toml::to_string_pretty(settings)?;
        atomic::write_atomically(&self.path, content.as_bytes()).map_err(|source| {
            SettingsError::Io {
                path: self.path.clone(),
                source,
            }
        })?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

/// Resolves the platform preferences directory including the app subdirectory.
fn platform_settings_dir() -> Option<PathBuf> {
    let base = dirs::config_dir()?;

    #[cfg(target_os = "linux")]
    {
        Some(base.join("tokenrefresh"))
    }

    #[cfg(not(target_os = "linux"))]
    {
        Some(base.join("TokenRefresh"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_absent_file_returns_defaults_with_located_tool() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join(SETTINGS_FILE_NAME));

        // Act
        let settings = store.load().unwrap();

        // Assert
        assert_eq!(settings.refresh_interval_minutes(), 40);
        assert_eq!(settings.registry_id(), "");
        assert!(settings.is_configured(), "tool path falls back to the bare name");
    }

    #[test]
    fn test_save_then_load_round_trips() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("sub").join(SETTINGS_FILE_NAME));
        let settings = RefresherSettings::new("/opt/gcloud", "https://registry.example.com", 15);

        // Act
        store.save(&settings).unwrap();
        let restored = store.load().unwrap();

        // Assert
        assert_eq!(restored, settings);
    }

    #[test]
    fn test_load_clamps_hand_edited_interval() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join(SETTINGS_FILE_NAME));
        std::fs::write(store.path(), "refresh_interval_minutes = 0\n").unwrap();

        let settings = store.load().unwrap();

        assert_eq!(settings.refresh_interval_minutes(), 1);
    }

    #[test]
    fn test_load_clamps_negative_interval() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join(SETTINGS_FILE_NAME));
        std::fs::write(
            store.path(),
            "credential_tool_path = \"/opt/gcloud\"\n\
             registry_id = \"https://registry.example.com\"\n\
             refresh_interval_minutes = -5\n",
        )
        .unwrap();

        // Act
        let loaded = store.load().unwrap();
        let fallback = store.load_or_default();

        // Assert
        assert_eq!(loaded.refresh_interval_minutes(), 1);
        assert_eq!(loaded.registry_id(), "https://registry.example.com");
        assert_eq!(fallback, loaded);
    }

    #[test]
    fn test_save_replaces_existing_file_without_leftovers() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join(SETTINGS_FILE_NAME));
        store
            .save(&RefresherSettings::new("/opt/gcloud", "https://a.example.com", 15))
            .unwrap();

        // Act
        store
            .save(&RefresherSettings::new("/opt/gcloud", "https://b.example.com", 20))
            .unwrap();

        // Assert
        assert_eq!(store.load().unwrap().registry_id(), "https://b.example.com");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_load_invalid_toml_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join(SETTINGS_FILE_NAME));
        std::fs::write(store.path(), "[[[ nope").unwrap();

        assert!(matches!(store.load(), Err(SettingsError::Parse(_))));
    }

    #[test]
    fn test_load_or_default_recovers_from_invalid_file() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join(SETTINGS_FILE_NAME));
        std::fs::write(store.path(), "[[[ nope").unwrap();

        let settings = store.load_or_default();

        assert_eq!(settings.refresh_interval_minutes(), 40);
    }

    #[test]
    fn test_settings_file_path_ends_with_file_name() {
        if let Ok(path) = settings_file_path() {
            assert!(path.ends_with(SETTINGS_FILE_NAME));
        }
    }
}
