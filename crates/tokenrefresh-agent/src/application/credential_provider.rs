//! CredentialProvider: the seam between the scheduler and the external tool
//! that mints access tokens.
//!
//! The production implementation spawns the tool as a child process
//! (`infrastructure::provider::ProcessCredentialProvider`); tests inject
//! `MockCredentialProvider` instead so no real binary is needed.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokenrefresh_core::ProviderError;

/// Arguments passed to the credential tool to print a bearer token.
pub const ACCESS_TOKEN_ARGS: [&str; 2] = ["auth", "print-access-token"];

/// Upper bound on a single credential tool invocation.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Obtains a fresh token from an external credential tool.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Runs the tool at `tool_path` and returns the token it prints, trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the tool cannot be launched, times out, or
    /// prints nothing on stdout.
    async fn fetch_token(&self, tool_path: &Path) -> Result<String, ProviderError>;
}
