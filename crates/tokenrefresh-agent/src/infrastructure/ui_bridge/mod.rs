//! Command bridge: exposes the agent's operations to a settings panel or
//! status window.
//!
//! Every command takes the shared [`AgentState`] and returns a
//! [`CommandResult<T>`], so a frontend always receives the same shape:
//! `{ success: bool, data: T | null, error: string | null }`.
//!
//! # Settings mutations
//!
//! Each settings command follows the same sequence, under one lock so two
//! commands cannot lose each other's change:
//!
//! 1. copy the scheduler's current settings;
//! 2. apply and validate the change (rejections are logged and returned);
//! 3. persist the new settings to disk;
//! 4. hand them to the scheduler, which reschedules if the interval changed.
//!
//! # DTOs
//!
//! DTOs contain only JSON-friendly fields.  Timestamps are RFC 3339 strings,
//! or `"never"` before the first refresh.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use tokenrefresh_core::{registry_label, RefresherSettings};

use crate::application::refresh_scheduler::RefreshScheduler;
use crate::infrastructure::provider::locate_credential_tool;
use crate::infrastructure::storage::{config_store::ConfigStore, settings::SettingsStore};

// ── Shared agent state ────────────────────────────────────────────────────────

/// State shared between all commands.
pub struct AgentState {
    pub scheduler: RefreshScheduler,
    pub settings_store: SettingsStore,
    pub config_store: Arc<ConfigStore>,
    /// Serializes read-modify-persist of the settings.
    settings_lock: Mutex<()>,
}

impl AgentState {
    pub fn new(
        scheduler: RefreshScheduler,
        settings_store: SettingsStore,
        config_store: Arc<ConfigStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            scheduler,
            settings_store,
            config_store,
            settings_lock: Mutex::new(()),
        })
    }

    /// Applies `edit` to a copy of the current settings, persists the result
    /// and hands it to the scheduler.  Nothing changes if `edit` or the save
    /// fails.
    async fn apply_settings<T>(
        &self,
        edit: impl FnOnce(&mut RefresherSettings) -> Result<T, String>,
    ) -> Result<T, String> {
        let _guard = self.settings_lock.lock().await;
        let mut settings = self.scheduler.settings();
        let out = edit(&mut settings).map_err(|e| {
            warn!("settings change rejected: {e}");
            e
        })?;
        self.settings_store
            .save(&settings)
            .map_err(|e| format!("failed to save settings: {e}"))?;
        self.scheduler.update_settings(settings);
        Ok(out)
    }
}

// ── Data Transfer Objects ─────────────────────────────────────────────────────

/// DTO for the refresher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsDto {
    pub credential_tool_path: String,
    pub registry_id: String,
    pub refresh_interval_minutes: u32,
    pub configured: bool,
}

impl From<&RefresherSettings> for SettingsDto {
    fn from(s: &RefresherSettings) -> Self {
        Self {
            credential_tool_path: s.credential_tool_path().to_string(),
            registry_id: s.registry_id().to_string(),
            refresh_interval_minutes: s.refresh_interval_minutes(),
            configured: s.is_configured(),
        }
    }
}

/// DTO for one entry of the registry picker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistryDto {
    pub id: String,
    pub label: String,
}

/// DTO for a registry's credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntryDto {
    pub registry_id: String,
    pub token: String,
    pub email: String,
    pub always_auth: bool,
}

/// DTO for the status window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusDto {
    pub running: bool,
    pub registry_id: String,
    /// Current token, or the error text if it could not be read.
    pub token: String,
    pub refresh_count: u64,
    pub last_refreshed: String,
}

/// Unified response wrapper used by all commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

impl<T: Serialize> From<Result<T, String>> for CommandResult<T> {
    fn from(result: Result<T, String>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e),
        }
    }
}

// ── Settings commands ─────────────────────────────────────────────────────────

/// Returns the current refresher settings.
pub async fn get_settings(state: Arc<AgentState>) -> CommandResult<SettingsDto> {
    CommandResult::ok(SettingsDto::from(&state.scheduler.settings()))
}

/// Sets the credential tool path.
pub async fn update_credential_tool_path(
    state: Arc<AgentState>,
    path: String,
) -> CommandResult<()> {
    state
        .apply_settings(|s| {
            if path.trim().is_empty() {
                return Err("credential tool path is empty".to_string());
            }
            s.set_credential_tool_path(path);
            Ok(())
        })
        .await
        .into()
}

/// Looks the credential tool up on `PATH`, stores it, and returns it.
pub async fn set_tool_path_from_environment(state: Arc<AgentState>) -> CommandResult<String> {
    let located = locate_credential_tool().to_string_lossy().into_owned();
    state
        .apply_settings(|s| {
            s.set_credential_tool_path(located.clone());
            Ok(located)
        })
        .await
        .into()
}

/// Selects the registry to refresh.  It must exist in the config document.
pub async fn update_registry(state: Arc<AgentState>, registry_id: String) -> CommandResult<()> {
    let known = match state.config_store.load() {
        Ok(doc) => doc.contains_registry(&registry_id),
        Err(e) => return CommandResult::err(format!("failed to read config: {e}")),
    };
    state
        .apply_settings(|s| {
            s.set_registry_id(registry_id.clone())
                .map_err(|e| e.to_string())?;
            if !known {
                return Err(format!("registry `{registry_id}` not found in config"));
            }
            Ok(())
        })
        .await
        .into()
}

/// Sets the refresh interval and returns the clamped value actually applied.
pub async fn update_refresh_interval(state: Arc<AgentState>, minutes: i64) -> CommandResult<u32> {
    let result = state
        .apply_settings(|s| Ok(s.set_refresh_interval_minutes(minutes)))
        .await;
    if let Ok(applied) = result {
        info!(requested = minutes, applied, "refresh interval updated");
    }
    result.into()
}

// ── Registry commands ─────────────────────────────────────────────────────────

/// Lists the registries in the config document, in file order.
pub async fn list_registries(state: Arc<AgentState>) -> CommandResult<Vec<RegistryDto>> {
    match state.config_store.registries() {
        Ok(ids) => CommandResult::ok(
            ids.into_iter()
                .map(|id| RegistryDto {
                    label: registry_label(&id).to_string(),
                    id,
                })
                .collect(),
        ),
        Err(e) => CommandResult::err(format!("failed to read config: {e}")),
    }
}

/// Returns one registry's credentials.
pub async fn get_registry_entry(
    state: Arc<AgentState>,
    registry_id: String,
) -> CommandResult<RegistryEntryDto> {
    match state.config_store.get_entry(&registry_id) {
        Ok(entry) => CommandResult::ok(RegistryEntryDto {
            registry_id,
            token: entry.token,
            email: entry.email,
            always_auth: entry.always_auth,
        }),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Saves the user-editable fields of a registry entry.  `token` in the DTO is
/// ignored; only the refresh scheduler writes tokens.
pub async fn update_registry_entry(
    state: Arc<AgentState>,
    entry: RegistryEntryDto,
) -> CommandResult<()> {
    match state
        .config_store
        .set_entry(&entry.registry_id, &entry.email, entry.always_auth)
    {
        Ok(()) => CommandResult::ok(()),
        Err(e) => CommandResult::err(format!("failed to save config: {e}")),
    }
}

/// Writes the default config file if none exists.  Returns whether it was
/// created.
pub async fn create_config_file(state: Arc<AgentState>) -> CommandResult<bool> {
    match state.config_store.ensure_exists() {
        Ok(created) => CommandResult::ok(created),
        Err(e) => CommandResult::err(format!("failed to create config: {e}")),
    }
}

// ── Refresh commands ──────────────────────────────────────────────────────────

/// Returns the scheduler status together with the current token.
pub async fn get_status(state: Arc<AgentState>) -> CommandResult<StatusDto> {
    let observer = state.scheduler.observer();
    let snapshot = observer.status();
    let token = observer.current_token().unwrap_or_else(|e| e.to_string());
    CommandResult::ok(StatusDto {
        running: snapshot.running,
        registry_id: observer.registry_id(),
        token,
        refresh_count: snapshot.refresh_count,
        last_refreshed: snapshot.last_refresh_display(),
    })
}

/// Starts the refresh loop.
pub async fn start_refresh(state: Arc<AgentState>) -> CommandResult<()> {
    match state.scheduler.start().await {
        Ok(()) => CommandResult::ok(()),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Stops the refresh loop.
pub async fn stop_refresh(state: Arc<AgentState>) -> CommandResult<()> {
    state.scheduler.stop().await;
    CommandResult::ok(())
}

/// Restarts the refresh loop.
pub async fn restart_refresh(state: Arc<AgentState>) -> CommandResult<()> {
    match state.scheduler.restart().await {
        Ok(()) => CommandResult::ok(()),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Runs one refresh now and returns the new token.
pub async fn refresh_now(state: Arc<AgentState>) -> CommandResult<String> {
    match state.scheduler.refresh_now().await {
        Ok(token) => CommandResult::ok(token),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
