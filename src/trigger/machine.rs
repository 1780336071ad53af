// Trigger state machine - turns raw key events into popup messages and replays
//
// Runs on the hook thread. Every path here is bookkeeping plus at most one
// registry lookup; anything slow is handed to the ReplayDispatcher or sent
// over the popup channel.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use super::buffer::{TypedBuffer, DEFAULT_BUFFER_CAPACITY};
use super::key::{KeyEvent, LogicalKey};
use crate::popup::{place_popup, CursorSource, PopupEmitter, PopupEvent, PopupGeometry};
use crate::replay::{ReplayDispatcher, ReplayPlan};
use crate::shortcuts::{RegistryError, Scope, TextExpansion, TriggerLookup};

/// Typing this opens the search popup
pub const SEARCH_PREFIX: &str = "//";

/// Top-level state of the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Normal,
    Search,
}

/// The "//" search popup session
#[derive(Debug, Clone, Default)]
pub struct SearchSession {
    pub active: bool,
    pub query: String,
    pub results: Arc<Vec<TextExpansion>>,
    pub selected: usize,
}

impl SearchSession {
    fn reset(&mut self) {
        self.active = false;
        self.query.clear();
        self.results = Arc::new(Vec::new());
        self.selected = 0;
    }

    fn selected_item(&self) -> Option<&TextExpansion> {
        self.results.get(self.selected)
    }
}

/// Recognizes "//" searches, Space-terminated trigger words and Alt+key macros
pub struct TriggerStateMachine {
    scope: Scope,
    buffer: TypedBuffer,
    search: SearchSession,
    alt_held: bool,
    lookup: Arc<dyn TriggerLookup>,
    popup: Arc<dyn PopupEmitter>,
    replay: Arc<dyn ReplayDispatcher>,
    cursor: Arc<dyn CursorSource>,
    geometry: PopupGeometry,
}

impl TriggerStateMachine {
    pub fn new(
        scope: Scope,
        lookup: Arc<dyn TriggerLookup>,
        popup: Arc<dyn PopupEmitter>,
        replay: Arc<dyn ReplayDispatcher>,
        cursor: Arc<dyn CursorSource>,
    ) -> Self {
        Self {
            scope,
            buffer: TypedBuffer::with_capacity(DEFAULT_BUFFER_CAPACITY),
            search: SearchSession::default(),
            alt_held: false,
            lookup,
            popup,
            replay,
            cursor,
            geometry: PopupGeometry::default(),
        }
    }

    /// Use a custom typed buffer capacity (builder pattern)
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer = TypedBuffer::with_capacity(capacity);
        self
    }

    /// Use a custom popup size for placement (builder pattern)
    pub fn with_popup_geometry(mut self, geometry: PopupGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn state(&self) -> TriggerState {
        if self.search.active {
            TriggerState::Search
        } else {
            TriggerState::Normal
        }
    }

    pub fn search(&self) -> &SearchSession {
        &self.search
    }

    pub fn buffer(&self) -> &TypedBuffer {
        &self.buffer
    }

    /// Hook entry point. Never panics and never returns an error: anything
    /// going wrong while handling one key is logged and the machine is reset.
    pub fn on_key(&mut self, event: &KeyEvent) {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.handle_key(event)));
        if outcome.is_err() {
            crate::error!("Key handler panicked on {:?}; resetting trigger state", event.key);
            if self.search.active {
                self.popup.emit(PopupEvent::ClosePopup);
            }
            self.search.reset();
            self.buffer.clear();
            self.alt_held = false;
        }
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        if event.key == LogicalKey::Alt {
            self.alt_held = event.pressed;
            return;
        }
        if !event.pressed {
            return;
        }

        if self.search.active {
            self.handle_search_key(event);
            return;
        }

        if self.alt_held {
            if let Some(c) = event.alt_char() {
                self.fire_alt_macro(c);
            }
            return;
        }

        match event.key {
            LogicalKey::Space => self.on_space(),
            LogicalKey::Enter | LogicalKey::Tab => self.buffer.clear(),
            _ => {
                if let Some(c) = event.printable() {
                    self.buffer.push(c);
                    crate::trace!("Typed buffer: {} chars", self.buffer.len());
                    if self.buffer.ends_with(SEARCH_PREFIX) {
                        self.enter_search();
                    }
                }
            }
        }
    }

    fn handle_search_key(&mut self, event: &KeyEvent) {
        match event.key {
            LogicalKey::Right | LogicalKey::Enter => self.accept_search(),
            LogicalKey::Escape | LogicalKey::Space => self.cancel_search(),
            LogicalKey::Backspace => {
                if self.search.query.pop().is_some() {
                    self.refresh_results();
                } else {
                    self.cancel_search();
                }
            }
            LogicalKey::Up => self.move_selection(-1),
            LogicalKey::Down => self.move_selection(1),
            _ => {
                if let Some(c) = event.printable() {
                    self.search.query.push(c);
                    self.refresh_results();
                }
            }
        }
    }

    fn enter_search(&mut self) {
        self.search.reset();
        self.search.active = true;

        let cursor = self.cursor.cursor_position().unwrap_or((0, 0));
        let (x, y) = place_popup(cursor, self.cursor.screen_size(), self.geometry);
        crate::debug!("Search started at ({}, {})", x, y);
        self.popup.emit(PopupEvent::ShowPopup { x, y });

        self.refresh_results();
    }

    fn refresh_results(&mut self) {
        let results = self.lookup.search(&self.scope, &self.search.query);
        self.search.results = degrade(results, "search");
        self.search.selected = 0;
        self.popup.emit(PopupEvent::UpdatePopup {
            query: self.search.query.clone(),
            results: self.search.results.as_ref().clone(),
        });
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.search.results.len();
        if len == 0 {
            return;
        }
        let next = self.search.selected.saturating_add_signed(delta).min(len - 1);
        self.search.selected = next;
        self.popup.emit(PopupEvent::SelectionMoved { index: next });
    }

    fn accept_search(&mut self) {
        let Some(item) = self.search.selected_item() else {
            crate::debug!("Search accept with no selection ignored");
            return;
        };
        let text = item.replacement.clone();
        let backspaces = SEARCH_PREFIX.chars().count() + self.search.query.chars().count();
        crate::info!("Search accepted '{}' (erasing {})", item.name, backspaces);

        self.search.reset();
        self.buffer.clear();
        self.popup.emit(PopupEvent::InsertText { text, backspaces });
    }

    fn cancel_search(&mut self) {
        crate::debug!("Search cancelled");
        self.search.reset();
        self.buffer.clear();
        self.popup.emit(PopupEvent::ClosePopup);
    }

    fn on_space(&mut self) {
        let word = self.buffer.trimmed();
        self.buffer.clear();
        if word.is_empty() {
            return;
        }

        // The typed word plus the Space that ended it
        let backspaces = word.chars().count() + 1;

        let expansions = degrade(self.lookup.text_expansions(&self.scope), "text expansions");
        if let Some(entry) = expansions.iter().find(|e| e.matches_word(&word)) {
            crate::info!("Text trigger '{}' expands template '{}'", word, entry.name);
            self.replay
                .dispatch(ReplayPlan::replace_text(backspaces, entry.replacement.clone()));
            return;
        }

        let macros = degrade(self.lookup.macros(&self.scope), "macros");
        if let Some(item) = macros
            .iter()
            .find(|m| m.active && m.trigger.is_text_word(&word))
        {
            crate::info!("Text trigger '{}' runs macro '{}'", word, item.title);
            self.replay
                .dispatch(ReplayPlan::with_erase(backspaces, item.actions.clone()));
        }
    }

    fn fire_alt_macro(&mut self, key: char) {
        let macros = degrade(self.lookup.macros(&self.scope), "macros");
        if let Some(item) = macros.iter().find(|m| m.active && m.trigger.is_alt_key(key)) {
            crate::info!("Alt+{} runs macro '{}'", key, item.title);
            self.replay.dispatch(ReplayPlan::new(item.actions.clone()));
        }
    }
}

/// A registry failure reads as "no trigger configured"
fn degrade<T>(result: Result<Arc<Vec<T>>, RegistryError>, what: &str) -> Arc<Vec<T>> {
    match result {
        Ok(items) => items,
        Err(e) => {
            crate::warn!("Lookup of {} failed, treating as no match: {}", what, e);
            Arc::new(Vec::new())
        }
    }
}

#[cfg(test)]
#[path = "machine_test.rs"]
mod tests;
