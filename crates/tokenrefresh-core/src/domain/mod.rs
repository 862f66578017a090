//! Domain entities for TokenRefresh.
//!
//! - **`registry`** – one registry's credentials and the placeholder values
//!   written on first run or after a failed refresh.
//! - **`document`** – the whole `.upmconfig.toml` as an ordered table, with
//!   scoped get/set on a single registry entry.
//! - **`settings`** – the refresher's user settings (tool path, registry,
//!   interval).
//! - **`state`** – the scheduler's runtime counters.

pub mod document;
pub mod registry;
pub mod settings;
pub mod state;
