//! Synthetic input interface driven by the replay engine.
//!
//! Implementations need not be `Send`: each replay opens its own controller
//! on the worker thread through an [`OutputFactory`].

use crate::shortcuts::MouseButton;

/// Keys the replay engine synthesizes directly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthKey {
    Backspace,
    Enter,
    Shift,
}

/// Error types for synthetic input
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OutputError {
    /// The platform input backend could not be created
    #[error("Failed to create input simulator: {0}")]
    Init(String),
    /// The OS rejected a synthetic event
    #[error("Synthetic input rejected: {0}")]
    Input(String),
}

/// Keyboard and mouse synthesis
pub trait OutputController {
    fn press(&mut self, key: SynthKey) -> Result<(), OutputError>;

    fn release(&mut self, key: SynthKey) -> Result<(), OutputError>;

    /// Type a single line of text; `text` never contains a newline
    fn type_text(&mut self, text: &str) -> Result<(), OutputError>;

    /// Move the pointer to absolute screen coordinates
    fn move_to(&mut self, x: i32, y: i32) -> Result<(), OutputError>;

    fn click(&mut self, button: MouseButton, times: u32) -> Result<(), OutputError>;

    fn mouse_press(&mut self, button: MouseButton) -> Result<(), OutputError>;

    fn mouse_release(&mut self, button: MouseButton) -> Result<(), OutputError>;
}

/// Opens an OutputController on the calling thread
pub trait OutputFactory: Send + Sync {
    fn open(&self) -> Result<Box<dyn OutputController>, OutputError>;
}
