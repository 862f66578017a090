//! [`CredentialProvider`] backed by the external credential tool.
//!
//! Runs `<tool> auth print-access-token` as a child process with stdin closed
//! and stdout/stderr captured.  The whole call is bounded by a timeout; on
//! expiry the child is killed (it is spawned with `kill_on_drop`) and
//! [`ProviderError::Timeout`] is returned.
//!
//! Output handling:
//!
//! | stdout (trimmed) | exit code | result                                  |
//! |------------------|-----------|-----------------------------------------|
//! | non-empty        | 0         | `Ok(token)`                             |
//! | non-empty        | non-zero  | `Ok(token)`, warning logged             |
//! | empty            | any       | `Err(EmptyOutput)`                      |
//!
//! Anything on stderr is logged as a warning and never becomes part of the
//! token.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time;
use tracing::{debug, warn};

use tokenrefresh_core::{redact_token, ProviderError};

use crate::application::credential_provider::{
    CredentialProvider, ACCESS_TOKEN_ARGS, DEFAULT_PROVIDER_TIMEOUT,
};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Spawns the credential tool once per call.
#[derive(Debug, Clone)]
pub struct ProcessCredentialProvider {
    timeout: Duration,
}

impl ProcessCredentialProvider {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ProcessCredentialProvider {
    fn default() -> Self {
        Self::new(DEFAULT_PROVIDER_TIMEOUT)
    }
}

#[async_trait]
impl CredentialProvider for ProcessCredentialProvider {
    async fn fetch_token(&self, tool_path: &Path) -> Result<String, ProviderError> {
        let mut command = Command::new(tool_path);
        command
            .args(ACCESS_TOKEN_ARGS)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.as_std_mut().creation_flags(CREATE_NO_WINDOW);
        }

        debug!(tool = %tool_path.display(), "running credential tool");
        let child = command
            .spawn()
            .map_err(|source| ProviderError::LaunchFailed {
                tool: tool_path.to_path_buf(),
                source,
            })?;

        // Dropping the `wait_with_output` future on timeout drops the child,
        // which kills it.
        let output = time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout))??;

        interpret_output(
            output.status.code(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        )
    }
}

/// Turns the tool's exit code and captured output into a token or an error.
pub(crate) fn interpret_output(
    code: Option<i32>,
    stdout: &str,
    stderr: &str,
) -> Result<String, ProviderError> {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        warn!(exit_code = ?code, "credential tool stderr: {stderr}");
    }

    let token = stdout.trim();
    if token.is_empty() {
        return Err(ProviderError::EmptyOutput {
            code,
            stderr: stderr.to_string(),
        });
    }

    if code != Some(0) {
        warn!(exit_code = ?code, "credential tool exited unsuccessfully but printed a token; using it");
    }
    debug!(token = %redact_token(token), "credential tool returned a token");
    Ok(token.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
