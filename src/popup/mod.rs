// Popup channel - messages from the hook thread to the UI thread
//
// The trigger state machine only ever sends. A single consumer on the UI side
// drains the channel; nothing here calls UI code from the hook thread.

pub mod placement;

pub use placement::{place_popup, CursorSource, PopupGeometry};

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::replay::{ReplayDispatcher, ReplayPlan};
use crate::shortcuts::TextExpansion;

/// How often an idle consumer checks the shutdown flag
const SHUTDOWN_POLL: Duration = Duration::from_millis(250);

/// Popup event names as constants for consistency
pub mod popup_events {
    pub const SHOW_POPUP: &str = "show_popup";
    pub const UPDATE_POPUP: &str = "update_popup";
    pub const SELECTION_MOVED: &str = "selection_moved";
    pub const CLOSE_POPUP: &str = "close_popup";
    pub const INSERT_TEXT: &str = "insert_text";
}

/// Message sent to the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PopupEvent {
    /// Open the search popup with its top-left corner at (x, y)
    ShowPopup { x: i32, y: i32 },
    /// The query changed; `results` is the new list, first item selected
    #[serde(rename_all = "camelCase")]
    UpdatePopup {
        query: String,
        results: Vec<TextExpansion>,
    },
    /// The selection cursor moved to `index`
    SelectionMoved { index: usize },
    /// Close the popup without inserting anything
    ClosePopup,
    /// Delete `backspaces` characters and type `text`
    InsertText { text: String, backspaces: usize },
}

impl PopupEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PopupEvent::ShowPopup { .. } => popup_events::SHOW_POPUP,
            PopupEvent::UpdatePopup { .. } => popup_events::UPDATE_POPUP,
            PopupEvent::SelectionMoved { .. } => popup_events::SELECTION_MOVED,
            PopupEvent::ClosePopup => popup_events::CLOSE_POPUP,
            PopupEvent::InsertText { .. } => popup_events::INSERT_TEXT,
        }
    }
}

/// Trait for emitting popup events
/// Allows collecting events in tests while using a channel in production
pub trait PopupEmitter: Send + Sync {
    fn emit(&self, event: PopupEvent);
}

/// Sending half of the popup channel
#[derive(Clone)]
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<PopupEvent>,
}

impl PopupEmitter for ChannelEmitter {
    fn emit(&self, event: PopupEvent) {
        let name = event.name();
        if self.tx.send(event).is_err() {
            crate::warn!("Popup consumer is gone, dropping {}", name);
        }
    }
}

/// Receiving half of the popup channel, owned by the UI loop
pub struct PopupReceiver {
    rx: mpsc::UnboundedReceiver<PopupEvent>,
}

impl PopupReceiver {
    pub async fn recv(&mut self) -> Option<PopupEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<PopupEvent> {
        self.rx.try_recv().ok()
    }
}

/// Create a connected emitter/receiver pair.
///
/// The channel is unbounded so that sending never blocks the hook thread.
pub fn channel() -> (ChannelEmitter, PopupReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelEmitter { tx }, PopupReceiver { rx })
}

/// Default consumer loop.
///
/// Rendering belongs to the UI; this loop logs popup state changes and
/// performs insertions through the replay engine. Returns when every
/// emitter is dropped or shutdown is signaled.
pub async fn run_consumer(mut receiver: PopupReceiver, replay: Arc<dyn ReplayDispatcher>) {
    crate::debug!("Popup consumer started");
    loop {
        let event = match tokio::time::timeout(SHUTDOWN_POLL, receiver.recv()).await {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(_) if crate::shutdown::is_shutting_down() => break,
            Err(_) => continue,
        };
        if crate::shutdown::is_shutting_down() {
            break;
        }
        match event {
            PopupEvent::ShowPopup { x, y } => {
                crate::info!("Search popup shown at ({}, {})", x, y);
            }
            PopupEvent::UpdatePopup { query, results } => {
                crate::debug!("Search popup query '{}': {} results", query, results.len());
            }
            PopupEvent::SelectionMoved { index } => {
                crate::trace!("Search popup selection at {}", index);
            }
            PopupEvent::ClosePopup => {
                crate::debug!("Search popup closed");
            }
            PopupEvent::InsertText { text, backspaces } => {
                crate::info!("Inserting template ({} chars, erasing {})", text.chars().count(), backspaces);
                replay.dispatch(ReplayPlan::replace_text(backspaces, text));
            }
        }
    }
    crate::debug!("Popup consumer stopped");
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
