//! RefreshScheduler: keeps one registry token fresh on a timer.
//!
//! # Lifecycle
//!
//! ```text
//!            start()                       stop()
//! Stopped ─────────────► Running ─────────────────► Stopped
//!                         │   ▲
//!                         ▼   │ sleep(interval), then next cycle
//!                       refresh cycle
//! ```
//!
//! `start()` runs one cycle immediately and then one per interval.  The next
//! sleep only begins after the previous cycle has committed its token, so two
//! cycles never overlap and never race on the config file.  A manual
//! `refresh_now()` shares the same cycle lock.
//!
//! # Refresh cycle
//!
//! 1. Ask the [`CredentialProvider`] for a token.
//! 2. On failure, log the error and use [`SENTINEL_TOKEN`] instead.
//! 3. Commit the token through the [`TokenStore`].
//! 4. Bump the refresh count and last-refresh time, whatever happened above.
//!
//! Failures inside scheduled cycles are logged and never stop the loop.
//!
//! # Interval changes
//!
//! Settings live in a `watch` channel.  While the loop sleeps it also waits for
//! settings changes; a new interval drops the pending sleep and starts a new one
//! measured from the moment of the change.  A cycle already in flight is not
//! affected.
//!
//! # Cancellation
//!
//! `stop()` cancels the pending sleep through a [`CancellationToken`] and then
//! awaits the loop task, so an in-flight cycle finishes (bounded by the
//! provider timeout) and the old loop is gone before `start()` can spawn a new
//! one.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use tokenrefresh_core::{
    redact_token, ConfigError, ProviderError, RefreshSnapshot, RefresherSettings, SettingsError,
    SENTINEL_TOKEN,
};

use crate::application::credential_provider::CredentialProvider;
use crate::application::observe::RefreshObserver;
use crate::application::token_store::TokenStore;

/// Errors surfaced to callers of `start()` and `refresh_now()`.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// State shared between the scheduler handle and its loop task.
struct Shared {
    provider: Arc<dyn CredentialProvider>,
    store: Arc<dyn TokenStore>,
    settings: watch::Sender<RefresherSettings>,
    state: watch::Sender<RefreshSnapshot>,
    /// Held for the whole of a cycle so scheduled and manual cycles never overlap.
    cycle_lock: Mutex<()>,
}

struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the refresh loop for one registry.
pub struct RefreshScheduler {
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl RefreshScheduler {
    pub fn new(
        settings: RefresherSettings,
        provider: Arc<dyn CredentialProvider>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        let (settings, _) = watch::channel(settings);
        let (state, _) = watch::channel(RefreshSnapshot::default());
        Self {
            shared: Arc::new(Shared {
                provider,
                store,
                settings,
                state,
                cycle_lock: Mutex::new(()),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Starts the refresh loop.  Calling it while already running is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Settings`] if the settings are incomplete, or
    /// [`SchedulerError::Config`] (typically `RegistryNotFound`) if the selected
    /// registry has no entry in the config document.  The scheduler stays
    /// stopped in both cases.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        let mut worker = self.worker.lock().await;
        if worker.as_ref().is_some_and(|w| !w.handle.is_finished()) {
            debug!("refresh loop already running");
            return Ok(());
        }

        let settings = self.settings();
        settings.validate()?;
        if !self.shared.store.has_registry(settings.registry_id())? {
            return Err(ConfigError::RegistryNotFound(settings.registry_id().to_string()).into());
        }

        let cancel = CancellationToken::new();
        self.shared.state.send_modify(|s| s.running = true);
        let handle = tokio::spawn(run_loop(Arc::clone(&self.shared), cancel.clone()));
        *worker = Some(Worker { cancel, handle });

        info!(
            registry = %settings.registry_id(),
            interval_minutes = settings.refresh_interval_minutes(),
            "token refresh started"
        );
        Ok(())
    }

    /// Stops the refresh loop and waits for it to exit.
    ///
    /// A cycle already in flight completes; no further cycle is scheduled.
    pub async fn stop(&self) {
        let mut worker = self.worker.lock().await;
        if let Some(Worker { cancel, handle }) = worker.take() {
            cancel.cancel();
            if let Err(e) = handle.await {
                error!("refresh loop ended abnormally: {e}");
            }
            info!("token refresh stopped");
        }
        self.shared.state.send_modify(|s| s.running = false);
    }

    /// Stops the current loop (if any) and starts a fresh one.
    ///
    /// # Errors
    ///
    /// Same as [`RefreshScheduler::start`].
    pub async fn restart(&self) -> Result<(), SchedulerError> {
        self.stop().await;
        self.start().await
    }

    /// Runs one refresh cycle now, serialized with scheduled cycles.
    ///
    /// The cycle has the same effects as a scheduled one (sentinel on provider
    /// failure, counters bumped), but the failure is returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Settings`] for incomplete settings,
    /// [`SchedulerError::Provider`] if the tool failed (the sentinel has been
    /// committed), or [`SchedulerError::Config`] if the commit failed.
    pub async fn refresh_now(&self) -> Result<String, SchedulerError> {
        self.settings().validate()?;
        self.shared.run_cycle().await
    }

    /// Replaces the settings.  A running loop picks up a new interval at once
    /// and the rest at its next cycle.
    pub fn update_settings(&self, settings: RefresherSettings) {
        self.shared.settings.send_replace(settings);
    }

    /// Changes the refresh interval, clamped to `[1, 60]` minutes, and returns
    /// the value applied.
    pub fn set_refresh_interval_minutes(&self, minutes: i64) -> u32 {
        let mut applied = 0;
        self.shared
            .settings
            .send_modify(|s| applied = s.set_refresh_interval_minutes(minutes));
        applied
    }

    /// A copy of the current settings.
    pub fn settings(&self) -> RefresherSettings {
        self.shared.settings.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.borrow().running
    }

    /// A receiver that sees every state change the scheduler publishes.
    pub fn subscribe(&self) -> watch::Receiver<RefreshSnapshot> {
        self.shared.state.subscribe()
    }

    /// A read-only view for status displays.
    pub fn observer(&self) -> RefreshObserver {
        RefreshObserver::new(
            self.shared.state.subscribe(),
            self.shared.settings.subscribe(),
            Arc::clone(&self.shared.store),
        )
    }
}

impl Shared {
    async fn run_cycle(&self) -> Result<String, SchedulerError> {
        let _cycle = self.cycle_lock.lock().await;
        let settings = self.settings.borrow().clone();
        let tool = PathBuf::from(settings.credential_tool_path());

        let (token, provider_error) = match self.provider.fetch_token(&tool).await {
            Ok(token) => (token, None),
            Err(e) => {
                error!(tool = %tool.display(), "credential tool failed: {e}");
                (SENTINEL_TOKEN.to_string(), Some(e))
            }
        };

        let committed = self.store.commit_token(settings.registry_id(), &token);
        self.state.send_modify(|s| s.record_cycle(Utc::now()));
        committed?;

        match provider_error {
            Some(e) => Err(e.into()),
            None => {
                info!(
                    registry = %settings.registry_id(),
                    token = %redact_token(&token),
                    "token refreshed"
                );
                Ok(token)
            }
        }
    }
}

async fn run_loop(shared: Arc<Shared>, cancel: CancellationToken) {
    let mut settings_rx = shared.settings.subscribe();

    loop {
        if cancel.is_cancelled() {
            break;
        }

        match shared.run_cycle().await {
            Ok(_) => {}
            Err(SchedulerError::Provider(_)) => {
                warn!("refresh cycle committed the sentinel token");
            }
            Err(e) => error!("refresh cycle failed: {e}"),
        }

        let mut interval = settings_rx.borrow_and_update().refresh_interval();
        let mut deadline = Instant::now() + interval;

        let cancelled = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break true,

                _ = time::sleep_until(deadline) => break false,

                changed = settings_rx.changed() => {
                    if changed.is_err() {
                        break true;
                    }
                    let next = settings_rx.borrow_and_update().refresh_interval();
                    if next != interval {
                        interval = next;
                        deadline = Instant::now() + interval;
                        info!(
                            interval_minutes = interval.as_secs() / 60,
                            "refresh interval changed; next refresh rescheduled"
                        );
                    }
                }
            }
        };

        if cancelled {
            break;
        }
    }

    debug!("refresh loop exited");
}
