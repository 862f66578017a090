//! TokenRefresh agent entry point.
//!
//! Keeps the registry token in `~/.upmconfig.toml` fresh until interrupted.
//!
//! # Usage
//!
//! ```text
//! tokenrefresh-agent [OPTIONS]
//!
//! Options:
//!   --upmconfig <PATH>   Registry config file [default: ~/.upmconfig.toml]
//!   --settings  <PATH>   Refresher settings file [default: platform config dir]
//!   --registry  <ID>     Registry whose token is refreshed
//!   --interval  <MIN>    Minutes between refreshes, clamped to 1..=60
//!   --tool      <PATH>   Credential tool executable
//!   --once               Refresh once and exit
//!   --log-level <LEVEL>  Log level when RUST_LOG is unset [default: info]
//! ```
//!
//! `--registry`, `--interval` and `--tool` are written back to the settings
//! file, so later runs pick them up without the flags.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ SettingsStore::load()          -- settings + CLI overrides
//!  └─ ConfigStore                    -- ~/.upmconfig.toml
//!  └─ RefreshScheduler               -- ProcessCredentialProvider → ConfigStore
//!       └─ refresh loop (Tokio task) until Ctrl-C
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tokenrefresh_agent::application::credential_provider::CredentialProvider;
use tokenrefresh_agent::application::refresh_scheduler::RefreshScheduler;
use tokenrefresh_agent::application::token_store::TokenStore;
use tokenrefresh_agent::infrastructure::provider::ProcessCredentialProvider;
use tokenrefresh_agent::infrastructure::storage::config_store::ConfigStore;
use tokenrefresh_agent::infrastructure::storage::settings::SettingsStore;
use tokenrefresh_agent::infrastructure::ui_bridge::AgentState;
use tokenrefresh_core::redact_token;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Keeps a package-registry token in `.upmconfig.toml` fresh.
#[derive(Debug, Parser)]
#[command(
    name = "tokenrefresh-agent",
    about = "Background agent that refreshes a package-registry token",
    version
)]
struct Cli {
    /// Registry config file to update.
    #[arg(long, env = "TOKENREFRESH_UPMCONFIG")]
    upmconfig: Option<PathBuf>,

    /// Refresher settings file.
    #[arg(long, env = "TOKENREFRESH_SETTINGS")]
    settings: Option<PathBuf>,

    /// Registry id (the `npmAuth` key) whose token is refreshed.
    #[arg(long, env = "TOKENREFRESH_REGISTRY")]
    registry: Option<String>,

    /// Minutes between refreshes; clamped to 1..=60.
    #[arg(long, env = "TOKENREFRESH_INTERVAL", allow_negative_numbers = true)]
    interval: Option<i64>,

    /// Path to the credential tool executable.
    #[arg(long, env = "TOKENREFRESH_TOOL")]
    tool: Option<String>,

    /// Perform a single refresh and exit with its result.
    #[arg(long, env = "TOKENREFRESH_ONCE")]
    once: bool,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info", env = "TOKENREFRESH_LOG_LEVEL")]
    log_level: String,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    info!("TokenRefresh agent starting");

    // ── Settings ──────────────────────────────────────────────────────────────
    let settings_store = match &cli.settings {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::at_default_location().context("locating settings file")?,
    };
    let mut settings = settings_store.load_or_default();
    let mut changed = false;

    if let Some(tool) = &cli.tool {
        settings.set_credential_tool_path(tool.clone());
        changed = true;
    }
    if let Some(registry) = &cli.registry {
        settings
            .set_registry_id(registry.clone())
            .context("invalid --registry")?;
        changed = true;
    }
    if let Some(minutes) = cli.interval {
        let applied = settings.set_refresh_interval_minutes(minutes);
        if i64::from(applied) != minutes {
            info!(requested = minutes, applied, "refresh interval clamped");
        }
        changed = true;
    }
    if changed {
        settings_store
            .save(&settings)
            .with_context(|| format!("saving settings to {}", settings_store.path().display()))?;
    }

    if settings.registry_id().trim().is_empty() {
        bail!("no registry selected; pass --registry <ID> once to store one");
    }

    // ── Wiring ────────────────────────────────────────────────────────────────
    let registry = settings.registry_id().to_string();
    let config_store = Arc::new(match &cli.upmconfig {
        Some(path) => ConfigStore::new(path, &registry),
        None => ConfigStore::at_default_location(&registry).context("locating .upmconfig.toml")?,
    });
    info!(
        config = %config_store.path().display(),
        settings = %settings_store.path().display(),
        registry = %registry,
        tool = %settings.credential_tool_path(),
        "configuration loaded"
    );

    let provider: Arc<dyn CredentialProvider> = Arc::new(ProcessCredentialProvider::default());
    let token_store: Arc<dyn TokenStore> = config_store.clone();
    let scheduler = RefreshScheduler::new(settings, provider, token_store);
    let state = AgentState::new(scheduler, settings_store, config_store);

    // ── One-shot mode ─────────────────────────────────────────────────────────
    if cli.once {
        let token = state
            .scheduler
            .refresh_now()
            .await
            .context("token refresh failed")?;
        info!(token = %redact_token(&token), "token refreshed; exiting");
        return Ok(());
    }

    // ── Refresh loop ──────────────────────────────────────────────────────────
    state
        .scheduler
        .start()
        .await
        .context("starting token refresh")?;

    let mut status_rx = state.scheduler.subscribe();
    tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let snapshot = status_rx.borrow_and_update().clone();
            info!(
                running = snapshot.running,
                refresh_count = snapshot.refresh_count,
                last_refreshed = %snapshot.last_refresh_display(),
                "refresh status"
            );
        }
    });

    info!("TokenRefresh agent ready.  Press Ctrl-C to exit.");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown signal received");

    state.scheduler.stop().await;
    info!("TokenRefresh agent stopped");
    Ok(())
}
