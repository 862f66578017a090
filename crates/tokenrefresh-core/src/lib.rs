//! # tokenrefresh-core
//!
//! Domain model for TokenRefresh, a background agent that keeps the bearer
//! token for a package registry fresh inside `~/.upmconfig.toml`.
//!
//! This crate has no file-system, process, or runtime dependencies.  It
//! defines:
//!
//! - **`domain`** – the config document, registry entries, refresher settings,
//!   and the refresh state snapshot.
//! - **`error`** – the error taxonomy shared with the agent.

pub mod domain;
pub mod error;

pub use domain::document::ConfigDocument;
pub use domain::registry::{
    is_placeholder_token, redact_token, registry_label, RegistryEntry, AUTH_SECTION, SEED_EMAIL,
    SEED_TOKEN, SENTINEL_TOKEN,
};
pub use domain::settings::{
    clamp_refresh_interval, RefresherSettings, DEFAULT_REFRESH_INTERVAL_MINUTES,
    MAX_REFRESH_INTERVAL_MINUTES, MIN_REFRESH_INTERVAL_MINUTES,
};
pub use domain::state::RefreshSnapshot;
pub use error::{ConfigError, ProviderError, SettingsError};
