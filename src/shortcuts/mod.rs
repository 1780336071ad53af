// Shortcut registry module - text expansion templates and recorded macros
// Records are scoped per user/department and fetched through a ShortcutStore

mod cache;
pub mod lookup;
pub mod registry;

pub use cache::ShortcutCache;
pub use lookup::{BlockingLookup, TriggerLookup};
pub use registry::{ShortcutRegistry, ShortcutStore};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ownership scope of shortcut records
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    /// Owning user
    #[serde(default)]
    pub user_id: String,
    /// Department shared by several users (empty when unused)
    #[serde(default)]
    pub department: String,
}

impl Scope {
    pub fn new(user_id: impl Into<String>, department: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            department: department.into(),
        }
    }
}

/// A text template, optionally bound to a trigger word
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TextExpansion {
    pub id: String,
    /// Display name, searchable from the "//" popup
    pub name: String,
    /// Word that expands in place when followed by Space
    #[serde(default)]
    pub trigger: Option<String>,
    /// Text typed in place of the trigger
    pub replacement: String,
}

impl TextExpansion {
    /// True if `word` equals this template's trigger, ignoring case
    pub fn matches_word(&self, word: &str) -> bool {
        match &self.trigger {
            Some(trigger) => !trigger.trim().is_empty() && trigger.to_lowercase() == word.to_lowercase(),
            None => false,
        }
    }

    /// True if name or replacement contains `query`, ignoring case
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.replacement.to_lowercase().contains(&needle)
    }
}

/// How a macro is fired
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TriggerSpec {
    /// Alt + a single key
    AltKey(char),
    /// A word typed and followed by Space
    TextWord(String),
}

impl TriggerSpec {
    /// True if this is an Alt trigger on `key`, ignoring case
    pub fn is_alt_key(&self, key: char) -> bool {
        match self {
            TriggerSpec::AltKey(k) => k.to_lowercase().eq(key.to_lowercase()),
            TriggerSpec::TextWord(_) => false,
        }
    }

    /// True if this is a text trigger equal to `word`, ignoring case
    pub fn is_text_word(&self, word: &str) -> bool {
        match self {
            TriggerSpec::TextWord(w) => w.to_lowercase() == word.to_lowercase(),
            TriggerSpec::AltKey(_) => false,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            TriggerSpec::AltKey(c) => c.is_whitespace() || c.is_control(),
            TriggerSpec::TextWord(w) => w.trim().is_empty(),
        }
    }
}

/// Mouse button used by recorded clicks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// One recorded step of a macro
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Click {
        x: i32,
        y: i32,
        #[serde(default)]
        button: MouseButton,
        #[serde(default = "default_click_count")]
        count: u32,
    },
    Drag {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
    },
    Type {
        text: String,
    },
    Sleep {
        ms: u64,
    },
}

fn default_click_count() -> u32 {
    1
}

/// A named, ordered list of actions bound to a trigger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Macro {
    pub id: String,
    pub title: String,
    pub trigger: TriggerSpec,
    pub active: bool,
    pub actions: Vec<Action>,
}

impl Macro {
    /// Build a new inactive macro with a generated ID
    pub fn new(title: impl Into<String>, trigger: TriggerSpec, actions: Vec<Action>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            trigger,
            active: false,
            actions,
        }
    }
}

/// Error types for registry operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// Trigger is empty
    #[error("Trigger cannot be empty")]
    EmptyTrigger,
    /// Macro has no actions
    #[error("Macro must contain at least one action")]
    NoActions,
    /// Record not found
    #[error("Record with ID {0} not found")]
    NotFound(String),
    /// The backing store could not be reached
    #[error("Shortcut store unavailable: {0}")]
    Unavailable(String),
    /// A write was rejected by the store
    #[error("Failed to persist shortcuts: {0}")]
    Persistence(String),
}

/// Validate a macro before it is written
pub fn validate_macro(item: &Macro) -> Result<(), RegistryError> {
    if item.trigger.is_empty() {
        return Err(RegistryError::EmptyTrigger);
    }
    if item.actions.is_empty() {
        return Err(RegistryError::NoActions);
    }
    Ok(())
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
