//! User-configurable refresher settings.
//!
//! Created once at startup from the persisted preferences file, mutated only
//! through the explicit setters below, and written back after every mutation by
//! the agent's settings store.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SettingsError;

/// Shortest allowed refresh interval.
pub const MIN_REFRESH_INTERVAL_MINUTES: u32 = 1;
/// Longest allowed refresh interval.  Access tokens minted by the credential
/// tool expire after an hour.
pub const MAX_REFRESH_INTERVAL_MINUTES: u32 = 60;
/// Interval used when nothing has been configured.
pub const DEFAULT_REFRESH_INTERVAL_MINUTES: u32 = 40;

/// Clamps any requested interval into `[MIN, MAX]`.
pub fn clamp_refresh_interval(minutes: i64) -> u32 {
    minutes.clamp(
        i64::from(MIN_REFRESH_INTERVAL_MINUTES),
        i64::from(MAX_REFRESH_INTERVAL_MINUTES),
    ) as u32
}

fn default_refresh_interval() -> u32 {
    DEFAULT_REFRESH_INTERVAL_MINUTES
}

/// Reads the interval as any TOML integer and clamps it, so a hand-edited
/// negative or huge value does not make the whole file unreadable.
fn deserialize_refresh_interval<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    i64::deserialize(deserializer).map(clamp_refresh_interval)
}

/// Settings that drive the refresh scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefresherSettings {
    /// Path to the credential tool executable.
    #[serde(default)]
    credential_tool_path: String,
    /// Registry whose token is kept fresh.  Must exist in the config document.
    #[serde(default)]
    registry_id: String,
    /// Minutes between refresh cycles, always within `[1, 60]`.
    #[serde(
        default = "default_refresh_interval",
        deserialize_with = "deserialize_refresh_interval"
    )]
    refresh_interval_minutes: u32,
}

impl Default for RefresherSettings {
    fn default() -> Self {
        Self {
            credential_tool_path: String::new(),
            registry_id: String::new(),
            refresh_interval_minutes: DEFAULT_REFRESH_INTERVAL_MINUTES,
        }
    }
}

impl RefresherSettings {
    pub fn new(
        credential_tool_path: impl Into<String>,
        registry_id: impl Into<String>,
        refresh_interval_minutes: i64,
    ) -> Self {
        Self {
            credential_tool_path: credential_tool_path.into(),
            registry_id: registry_id.into(),
            refresh_interval_minutes: clamp_refresh_interval(refresh_interval_minutes),
        }
    }

    /// Re-applies the interval clamp.  Used after deserializing a file that may
    /// have been edited by hand.
    pub fn normalized(mut self) -> Self {
        self.refresh_interval_minutes =
            clamp_refresh_interval(i64::from(self.refresh_interval_minutes));
        self
    }

    pub fn credential_tool_path(&self) -> &str {
        &self.credential_tool_path
    }

    pub fn set_credential_tool_path(&mut self, path: impl Into<String>) {
        self.credential_tool_path = path.into();
    }

    pub fn registry_id(&self) -> &str {
        &self.registry_id
    }

    /// Selects the registry to refresh.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::EmptyRegistry`] for a blank id; the previous
    /// value is kept.
    pub fn set_registry_id(&mut self, registry_id: impl Into<String>) -> Result<(), SettingsError> {
        let registry_id = registry_id.into();
        if registry_id.trim().is_empty() {
            return Err(SettingsError::EmptyRegistry);
        }
        self.registry_id = registry_id;
        Ok(())
    }

    pub fn refresh_interval_minutes(&self) -> u32 {
        self.refresh_interval_minutes
    }

    /// Sets the interval, clamped to `[1, 60]`.  Returns the value actually stored.
    pub fn set_refresh_interval_minutes(&mut self, minutes: i64) -> u32 {
        self.refresh_interval_minutes = clamp_refresh_interval(minutes);
        self.refresh_interval_minutes
    }

    /// The interval as a [`Duration`].
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.refresh_interval_minutes) * 60)
    }

    /// Whether a credential tool has been configured at all.
    pub fn is_configured(&self) -> bool {
        !self.credential_tool_path.trim().is_empty()
    }

    /// Checks that the scheduler has everything it needs to run.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::EmptyRegistry`] or [`SettingsError::EmptyToolPath`].
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.registry_id.trim().is_empty() {
            return Err(SettingsError::EmptyRegistry);
        }
        if !self.is_configured() {
            return Err(SettingsError::EmptyToolPath);
        }
        Ok(())
    }
}
