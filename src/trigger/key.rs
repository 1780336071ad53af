//! Platform-neutral key events as delivered by the input hook.

/// Keys the trigger state machine distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalKey {
    /// A key producing a character; holds its unshifted base character
    Char(char),
    Space,
    Enter,
    Tab,
    Backspace,
    Escape,
    Up,
    Down,
    Left,
    Right,
    /// Either Alt key (AltGr excluded)
    Alt,
    /// Anything else (function keys, Ctrl, Shift, ...)
    Other,
}

/// One key transition from the OS hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: LogicalKey,
    /// Text the key produced under the active layout, if any
    pub character: Option<char>,
    pub pressed: bool,
}

impl KeyEvent {
    pub fn press(key: LogicalKey) -> Self {
        Self {
            key,
            character: None,
            pressed: true,
        }
    }

    pub fn release(key: LogicalKey) -> Self {
        Self {
            key,
            character: None,
            pressed: false,
        }
    }

    /// Press of a printable key producing `c`
    pub fn char(c: char) -> Self {
        Self {
            key: LogicalKey::Char(c.to_ascii_lowercase()),
            character: Some(c),
            pressed: true,
        }
    }

    /// The character this event types, if it is printable
    pub fn printable(&self) -> Option<char> {
        match self.character {
            Some(c) if !c.is_control() && c != ' ' => Some(c),
            _ => None,
        }
    }

    /// The character used for Alt+key matching.
    ///
    /// With Alt held many layouts produce a control character or nothing at
    /// all, so fall back to the key's base character.
    pub fn alt_char(&self) -> Option<char> {
        self.printable().or(match self.key {
            LogicalKey::Char(c) => Some(c),
            _ => None,
        })
    }
}

#[cfg(test)]
#[path = "key_test.rs"]
mod tests;
