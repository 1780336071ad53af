// Global keyboard hook
//
// rdev::listen blocks for the life of the process, so the hook runs on its
// own thread and owns the TriggerStateMachine outright. Pointer moves feed
// TrackedCursor for popup placement. Keys synthesized by a running replay
// are echoed back by the OS and are kept away from the state machine.

pub mod rdev_backend;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use rdev::{listen, Event, EventType};

use crate::popup::CursorSource;
use crate::replay::ReplayActivity;
use crate::trigger::{LogicalKey, TriggerStateMachine};

/// How long after a replay its synthetic keys may still arrive
pub const REPLAY_ECHO_GRACE: Duration = Duration::from_millis(150);

/// Errors that can occur while running the hook
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HookError {
    #[error("Keyboard hook is already running")]
    AlreadyRunning,
    #[error("Failed to spawn hook thread: {0}")]
    Spawn(String),
    /// The OS refused the global listener (missing permission, no display)
    #[error("Global key listener failed: {0}")]
    Listen(String),
}

/// Pointer position as last seen by the hook
pub struct TrackedCursor {
    position: Mutex<Option<(i32, i32)>>,
    screen: Option<(i32, i32)>,
}

impl TrackedCursor {
    /// Query the primary display size once; None if it cannot be read
    pub fn new() -> Self {
        let screen = match rdev::display_size() {
            Ok((w, h)) => Some((w as i32, h as i32)),
            Err(e) => {
                crate::warn!("Could not read display size: {:?}", e);
                None
            }
        };
        Self::with_screen(screen)
    }

    pub fn with_screen(screen: Option<(i32, i32)>) -> Self {
        Self {
            position: Mutex::new(None),
            screen,
        }
    }

    pub fn update(&self, x: f64, y: f64) {
        *self.position.lock() = Some((x.round() as i32, y.round() as i32));
    }
}

impl Default for TrackedCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorSource for TrackedCursor {
    fn cursor_position(&self) -> Option<(i32, i32)> {
        *self.position.lock()
    }

    fn screen_size(&self) -> Option<(i32, i32)> {
        self.screen
    }
}

/// Route one raw event to the cursor tracker or the state machine.
///
/// While a replay is active only Alt transitions pass, so the held-modifier
/// state stays accurate.
fn handle_event(
    event: &Event,
    machine: &mut TriggerStateMachine,
    cursor: &TrackedCursor,
    activity: &ReplayActivity,
) {
    if let EventType::MouseMove { x, y } = event.event_type {
        cursor.update(x, y);
        return;
    }
    let Some(key) = rdev_backend::translate(event) else {
        return;
    };
    if key.key != LogicalKey::Alt && activity.is_active(REPLAY_ECHO_GRACE) {
        crate::trace!("Ignoring {:?} during replay", key.key);
        return;
    }
    machine.on_key(&key);
}

/// Owner of the hook thread
pub struct KeyHook {
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<Result<(), HookError>>>>,
}

impl KeyHook {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start listening. The state machine moves onto the hook thread.
    ///
    /// If the OS listener fails the error is logged and shutdown is
    /// signaled, since nothing else can deliver keys.
    pub fn start(
        &self,
        machine: TriggerStateMachine,
        cursor: Arc<TrackedCursor>,
        activity: Arc<ReplayActivity>,
    ) -> Result<(), HookError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(HookError::AlreadyRunning);
        }

        let running = self.running.clone();
        let spawned = thread::Builder::new()
            .name("key-hook".to_string())
            .spawn(move || {
                let mut machine = machine;
                crate::info!("Keyboard hook listening");
                let result = listen(move |event: Event| {
                    handle_event(&event, &mut machine, &cursor, &activity);
                })
                .map_err(|e| HookError::Listen(format!("{:?}", e)));

                running.store(false, Ordering::SeqCst);
                if let Err(ref e) = result {
                    crate::error!("{}", e);
                    crate::shutdown::signal_shutdown();
                }
                result
            });

        match spawned {
            Ok(handle) => {
                *self.handle.lock() = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(HookError::Spawn(e.to_string()))
            }
        }
    }

    /// Take the listener result if the thread has already stopped
    pub fn try_finish(&self) -> Option<Result<(), HookError>> {
        let mut guard = self.handle.lock();
        if !guard.as_ref().is_some_and(|h| h.is_finished()) {
            return None;
        }
        let handle = guard.take()?;
        Some(
            handle
                .join()
                .unwrap_or_else(|_| Err(HookError::Listen("hook thread panicked".to_string()))),
        )
    }
}

impl Default for KeyHook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
