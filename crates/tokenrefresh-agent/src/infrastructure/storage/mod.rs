//! Storage infrastructure: registry config document and refresher settings.
//!
//! - `config_store` reads and atomically rewrites `~/.upmconfig.toml` and is
//!   the production [`TokenStore`](crate::application::token_store::TokenStore).
//! - `settings` persists the refresher settings in the platform preferences
//!   directory.
//! - `memory` is an in-memory token store used by tests.
//! - `atomic` replaces a file through a private temporary file and a rename.

pub mod atomic;
pub mod config_store;
pub mod memory;
pub mod settings;
