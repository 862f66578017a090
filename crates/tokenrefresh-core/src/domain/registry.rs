//! Registry entries stored under the `npmAuth` section of `.upmconfig.toml`.
//!
//! The package manager reads this file synchronously every time it resolves a
//! scoped registry, so the shape of each entry must stay exactly as it expects:
//!
//! ```toml
//! [npmAuth."https://europe-npm.pkg.dev/my-project/my-repo"]
//! token = "ya29.a0Af..."
//! email = "me@example.com"
//! alwaysAuth = true
//! ```
//!
//! `token` is owned by the refresh scheduler.  `email` and `alwaysAuth` are
//! user-editable and must survive every refresh untouched.

use serde::{Deserialize, Serialize};

/// Name of the top-level table that maps registry ids to their credentials.
pub const AUTH_SECTION: &str = "npmAuth";

/// Token written into a freshly seeded document.
pub const SEED_TOKEN: &str = "invalid_token";

/// Email written into a freshly seeded document.
pub const SEED_EMAIL: &str = "invalid_email@somewhere.com";

/// Token committed when a refresh cycle fails to obtain a real one.
///
/// Registry consumers reject it outright, which makes a failed refresh visible
/// instead of silently reusing an expired credential.
pub const SENTINEL_TOKEN: &str = "invalid token after error";

/// Credentials for one registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryEntry {
    pub token: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "alwaysAuth", default)]
    pub always_auth: bool,
}

impl RegistryEntry {
    /// The placeholder entry used when no config file exists yet.
    pub fn seed() -> Self {
        Self {
            token: SEED_TOKEN.to_string(),
            email: SEED_EMAIL.to_string(),
            always_auth: true,
        }
    }
}

/// Returns a short display label for a registry id (the URL without its
/// `https://` scheme).
pub fn registry_label(registry_id: &str) -> &str {
    registry_id
        .strip_prefix("https://")
        .unwrap_or(registry_id)
}

/// Returns whether `token` is one of the placeholder values this crate writes.
pub fn is_placeholder_token(token: &str) -> bool {
    token == SEED_TOKEN || token == SENTINEL_TOKEN
}

/// Shortened form of a token that is safe to put in a log line.
pub fn redact_token(token: &str) -> String {
    const VISIBLE: usize = 6;
    if is_placeholder_token(token) || token.chars().count() <= VISIBLE {
        return token.to_string();
    }
    let prefix: String = token.chars().take(VISIBLE).collect();
    format!("{prefix}…")
}
