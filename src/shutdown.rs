// Shutdown coordination module
// Provides a global flag that replay workers and the popup consumer poll

use std::sync::atomic::{AtomicBool, Ordering};

/// Global shutdown flag - set to true when the process is shutting down
static APP_SHUTTING_DOWN: AtomicBool = AtomicBool::new(false);

/// Signal that the process is shutting down
pub fn signal_shutdown() {
    APP_SHUTTING_DOWN.store(true, Ordering::SeqCst);
    crate::info!("Shutdown signaled");
}

/// Check if the process is shutting down
/// Returns true after signal_shutdown() has been called
pub fn is_shutting_down() -> bool {
    APP_SHUTTING_DOWN.load(Ordering::SeqCst)
}

/// Route Ctrl+C (SIGINT/SIGTERM) to `signal_shutdown`, then run `on_signal`.
///
/// `on_signal` runs on the ctrlc handler thread. A second Ctrl+C while the
/// flag is already set exits the process immediately.
pub fn install_ctrlc_handler<F>(on_signal: F) -> Result<(), ctrlc::Error>
where
    F: Fn() + Send + 'static,
{
    ctrlc::set_handler(move || {
        if is_shutting_down() {
            crate::warn!("Second interrupt received, exiting now");
            std::process::exit(130);
        }
        signal_shutdown();
        on_signal();
    })
}

#[cfg(test)]
pub(crate) fn reset_for_test() {
    APP_SHUTTING_DOWN.store(false, Ordering::SeqCst);
}

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod tests;
