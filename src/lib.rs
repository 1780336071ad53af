// Floating shortcut assistant: global text expansion, "//" template search and
// macro replay driven by a system-wide keyboard hook.

// Enable coverage attribute on nightly for explicit exclusions
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod hook;
pub mod keyboard;
pub mod popup;
pub mod replay;
pub mod settings;
pub mod shortcuts;
pub mod shutdown;
pub mod trigger;
pub mod turso;

#[cfg(test)]
pub(crate) mod test_support;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

// Re-export log macros for use throughout the crate
pub use log::{debug, error, info, trace, warn};

use crate::hook::{HookError, KeyHook, TrackedCursor};
use crate::keyboard::EnigoFactory;
use crate::replay::ReplayEngine;
use crate::settings::Settings;
use crate::shortcuts::{BlockingLookup, ShortcutRegistry};
use crate::trigger::TriggerStateMachine;
use crate::turso::{TursoClient, TursoError};

/// Errors that stop the application from starting
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to build async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error(transparent)]
    Database(#[from] TursoError),
    #[error(transparent)]
    Hook(#[from] HookError),
    #[error("Failed to install Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

/// Install the global subscriber: stderr plus a daily log file in `log_dir`.
///
/// `log` records from every module are bridged into tracing. The returned
/// guard flushes the file writer when dropped, so keep it for the process life.
pub fn init_logging(log_dir: &Path) -> WorkerGuard {
    let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_appender = tracing_appender::rolling::daily(log_dir, "assistive.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_thread_names(true)
        .with_target(true);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
    {
        eprintln!("Logging already initialized: {}", e);
    }

    guard
}

/// Application entry point - runs until Ctrl+C or until the hook dies.
/// Note: This function cannot be unit tested as it installs an OS-wide hook.
#[cfg_attr(coverage_nightly, coverage(off))]
pub fn run() {
    let loaded = Settings::load_from(&settings::settings_path());
    let settings = match &loaded {
        Ok(settings) => settings.clone(),
        Err(_) => Settings::default(),
    };

    let _log_guard = init_logging(&settings.log_dir());
    info!("Setting up assistive...");
    if let Err(e) = loaded {
        warn!("{}; using default settings", e);
    }

    if let Err(e) = start(settings) {
        error!("Startup failed: {}", e);
        std::process::exit(1);
    }
    info!("assistive stopped");
}

#[cfg_attr(coverage_nightly, coverage(off))]
fn start(settings: Settings) -> Result<(), StartupError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("assistive-worker")
        .build()
        .map_err(StartupError::Runtime)?;

    let client = runtime.block_on(async {
        let client = TursoClient::new(settings.data_dir.clone()).await?;
        turso::initialize_schema(&client).await?;
        Ok::<_, TursoError>(client)
    })?;
    info!("Shortcut database ready at {:?}", client.db_path());

    let registry = Arc::new(ShortcutRegistry::new(Arc::new(client)));
    let lookup = Arc::new(BlockingLookup::new(
        registry,
        runtime.handle().clone(),
        Duration::from_millis(settings.store_timeout_ms),
    ));

    let engine = Arc::new(ReplayEngine::new(
        Arc::new(EnigoFactory),
        settings.replay,
        settings.max_concurrent_replays,
        runtime.handle().clone(),
    ));

    let (emitter, receiver) = popup::channel();
    let cursor = Arc::new(TrackedCursor::new());
    let machine = TriggerStateMachine::new(
        settings.scope.clone(),
        lookup,
        Arc::new(emitter),
        engine.clone(),
        cursor.clone(),
    )
    .with_buffer_capacity(settings.buffer_capacity)
    .with_popup_geometry(settings.popup);

    shutdown::install_ctrlc_handler(|| info!("Interrupt received, stopping"))?;

    let hook = KeyHook::new();
    hook.start(machine, cursor, engine.activity())?;
    debug!(
        "Serving scope user='{}' department='{}'",
        settings.scope.user_id, settings.scope.department
    );

    runtime.block_on(popup::run_consumer(receiver, engine));

    if let Some(Err(e)) = hook.try_finish() {
        return Err(e.into());
    }
    // rdev::listen never returns on its own; the hook thread ends with the process
    runtime.shutdown_timeout(Duration::from_secs(2));
    Ok(())
}
