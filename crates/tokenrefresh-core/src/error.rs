//! Error types shared by the core domain and the agent.
//!
//! Each concern gets its own enum so callers can match on exactly the failures
//! they are able to handle:
//!
//! - [`ConfigError`]   – reading, parsing, or editing the registry config document.
//! - [`ProviderError`] – invoking the external credential tool.
//! - [`SettingsError`] – validating or persisting the refresher settings.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Error type for registry config document operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The user's home directory could not be determined.
    #[error("could not determine the user home directory")]
    NoHomeDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file exists but its TOML content is malformed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The document could not be serialized back to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The registry id has no entry under the auth section.
    #[error("registry `{0}` not found in config")]
    RegistryNotFound(String),

    /// A section or field exists but has the wrong shape (e.g. a string where a
    /// table is expected).
    #[error("malformed `{section}` in config: {reason}")]
    MalformedSection { section: String, reason: String },
}

/// Error type for the external credential tool invocation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The executable could not be spawned (missing binary, permission denied, ...).
    #[error("failed to launch credential tool `{tool}`: {source}")]
    LaunchFailed {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading the child's output or waiting for it failed.
    #[error("credential tool I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The tool did not exit within the allotted time and was killed.
    #[error("credential tool timed out after {0:?}")]
    Timeout(Duration),

    /// The tool exited without printing a token on stdout.
    #[error("credential tool produced no token (exit code {code:?})")]
    EmptyOutput { code: Option<i32>, stderr: String },
}

/// Error type for refresher settings validation and persistence.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// No registry has been selected.
    #[error("registry id is empty")]
    EmptyRegistry,

    /// No credential tool path has been configured.
    #[error("credential tool path is empty")]
    EmptyToolPath,

    /// The platform preferences directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings TOML could not be parsed.
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The settings could not be serialized.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_not_found_message_names_the_registry() {
        let err = ConfigError::RegistryNotFound("https://registry.example.com".to_string());
        assert_eq!(
            err.to_string(),
            "registry `https://registry.example.com` not found in config"
        );
    }

    #[test]
    fn test_timeout_message_includes_duration() {
        let err = ProviderError::Timeout(Duration::from_secs(30));
        assert!(err.to_string().contains("30s"));
    }
}
