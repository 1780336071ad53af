// rdev key translation
//
// Maps rdev's physical keys and layout-produced names onto the platform
// neutral KeyEvent the trigger state machine consumes.

use rdev::{Event, EventType, Key};

use crate::trigger::{KeyEvent, LogicalKey};

/// Translate a keyboard event; mouse and wheel events yield None
pub fn translate(event: &Event) -> Option<KeyEvent> {
    let (key, pressed) = match event.event_type {
        EventType::KeyPress(k) => (k, true),
        EventType::KeyRelease(k) => (k, false),
        _ => return None,
    };

    let logical = logical_key(key);
    let character = if pressed {
        event
            .name
            .as_deref()
            .and_then(single_char)
            .or(match logical {
                LogicalKey::Char(c) => Some(c),
                _ => None,
            })
    } else {
        None
    };

    Some(KeyEvent {
        key: logical,
        character,
        pressed,
    })
}

fn single_char(name: &str) -> Option<char> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Map an rdev key to the keys the state machine distinguishes
pub fn logical_key(key: Key) -> LogicalKey {
    match key {
        Key::Space => LogicalKey::Space,
        Key::Return | Key::KpReturn => LogicalKey::Enter,
        Key::Tab => LogicalKey::Tab,
        Key::Backspace => LogicalKey::Backspace,
        Key::Escape => LogicalKey::Escape,
        Key::UpArrow => LogicalKey::Up,
        Key::DownArrow => LogicalKey::Down,
        Key::LeftArrow => LogicalKey::Left,
        Key::RightArrow => LogicalKey::Right,
        Key::Alt => LogicalKey::Alt,
        other => match base_char(other) {
            Some(c) => LogicalKey::Char(c),
            None => LogicalKey::Other,
        },
    }
}

/// Unshifted US-layout character of a key
fn base_char(key: Key) -> Option<char> {
    let c = match key {
        Key::KeyA => 'a',
        Key::KeyB => 'b',
        Key::KeyC => 'c',
        Key::KeyD => 'd',
        Key::KeyE => 'e',
        Key::KeyF => 'f',
        Key::KeyG => 'g',
        Key::KeyH => 'h',
        Key::KeyI => 'i',
        Key::KeyJ => 'j',
        Key::KeyK => 'k',
        Key::KeyL => 'l',
        Key::KeyM => 'm',
        Key::KeyN => 'n',
        Key::KeyO => 'o',
        Key::KeyP => 'p',
        Key::KeyQ => 'q',
        Key::KeyR => 'r',
        Key::KeyS => 's',
        Key::KeyT => 't',
        Key::KeyU => 'u',
        Key::KeyV => 'v',
        Key::KeyW => 'w',
        Key::KeyX => 'x',
        Key::KeyY => 'y',
        Key::KeyZ => 'z',
        Key::Num0 | Key::Kp0 => '0',
        Key::Num1 | Key::Kp1 => '1',
        Key::Num2 | Key::Kp2 => '2',
        Key::Num3 | Key::Kp3 => '3',
        Key::Num4 | Key::Kp4 => '4',
        Key::Num5 | Key::Kp5 => '5',
        Key::Num6 | Key::Kp6 => '6',
        Key::Num7 | Key::Kp7 => '7',
        Key::Num8 | Key::Kp8 => '8',
        Key::Num9 | Key::Kp9 => '9',
        Key::Minus | Key::KpMinus => '-',
        Key::Equal => '=',
        Key::KpPlus => '+',
        Key::KpMultiply => '*',
        Key::KpDivide | Key::Slash => '/',
        Key::LeftBracket => '[',
        Key::RightBracket => ']',
        Key::SemiColon => ';',
        Key::Quote => '\'',
        Key::BackQuote => '`',
        Key::BackSlash | Key::IntlBackslash => '\\',
        Key::Comma => ',',
        Key::Dot => '.',
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
#[path = "rdev_backend_test.rs"]
mod tests;
