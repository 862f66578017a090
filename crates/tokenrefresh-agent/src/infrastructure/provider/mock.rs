//! Mock credential provider for unit testing.
//!
//! Returns scripted responses without spawning a process, optionally after an
//! artificial delay, and records how it was called.  The in-flight counters
//! let tests prove that refresh cycles never overlap.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use tokenrefresh_core::ProviderError;

use crate::application::credential_provider::CredentialProvider;

/// One scripted outcome of [`MockCredentialProvider::fetch_token`].
#[derive(Debug, Clone)]
pub enum MockResponse {
    Token(String),
    LaunchFailure(String),
    Timeout,
    Empty,
}

impl MockResponse {
    fn into_result(self, tool_path: &Path) -> Result<String, ProviderError> {
        match self {
            Self::Token(token) => Ok(token),
            Self::LaunchFailure(msg) => Err(ProviderError::LaunchFailed {
                tool: tool_path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, msg),
            }),
            Self::Timeout => Err(ProviderError::Timeout(Duration::from_secs(30))),
            Self::Empty => Err(ProviderError::EmptyOutput {
                code: Some(1),
                stderr: String::new(),
            }),
        }
    }
}

/// A mock implementation of [`CredentialProvider`].
///
/// Scripted responses queued with [`MockCredentialProvider::then`] are
/// consumed first, in order; after that every call gets the fallback.
pub struct MockCredentialProvider {
    script: Mutex<VecDeque<MockResponse>>,
    fallback: MockResponse,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    tool_paths: Mutex<Vec<PathBuf>>,
}

impl MockCredentialProvider {
    /// A provider that always returns `token`.
    pub fn returning(token: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: MockResponse::Token(token.to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            tool_paths: Mutex::new(Vec::new()),
        }
    }

    /// A provider whose every call fails with `response`.
    pub fn failing(response: MockResponse) -> Self {
        Self {
            fallback: response,
            ..Self::returning("")
        }
    }

    /// Makes every call take `delay` (in tokio time) before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queues a one-shot response ahead of the fallback.
    pub fn then(self, response: MockResponse) -> Self {
        self.script
            .lock()
            .expect("lock poisoned")
            .push_back(response);
        self
    }

    /// Number of calls started so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of calls currently awaiting their answer.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// The tool path passed to the most recent call.
    pub fn last_tool_path(&self) -> Option<PathBuf> {
        self.tool_paths.lock().expect("lock poisoned").last().cloned()
    }
}

/// Decrements the in-flight counter even if the call future is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialProvider for MockCredentialProvider {
    async fn fetch_token(&self, tool_path: &Path) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tool_paths
            .lock()
            .expect("lock poisoned")
            .push(tool_path.to_path_buf());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let response = self
            .script
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        response.into_result(tool_path)
    }
}
