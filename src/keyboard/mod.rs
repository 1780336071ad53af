// Synthetic keyboard and mouse output backed by enigo
// Opened once per replay on the worker thread that runs it

use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};

use crate::replay::{OutputController, OutputError, OutputFactory, SynthKey};
use crate::shortcuts::MouseButton;

/// enigo-backed OutputController
pub struct EnigoOutput {
    enigo: Enigo,
}

impl EnigoOutput {
    pub fn new() -> Result<Self, OutputError> {
        let enigo = Enigo::new(&Settings::default()).map_err(|e| OutputError::Init(e.to_string()))?;
        Ok(Self { enigo })
    }

    fn key(&mut self, key: SynthKey, direction: Direction) -> Result<(), OutputError> {
        self.enigo
            .key(enigo_key(key), direction)
            .map_err(|e| OutputError::Input(format!("{:?} {:?}: {}", key, direction, e)))
    }

    fn button(&mut self, button: MouseButton, direction: Direction) -> Result<(), OutputError> {
        self.enigo
            .button(enigo_button(button), direction)
            .map_err(|e| OutputError::Input(format!("{:?} {:?}: {}", button, direction, e)))
    }
}

impl OutputController for EnigoOutput {
    fn press(&mut self, key: SynthKey) -> Result<(), OutputError> {
        self.key(key, Direction::Press)
    }

    fn release(&mut self, key: SynthKey) -> Result<(), OutputError> {
        self.key(key, Direction::Release)
    }

    fn type_text(&mut self, text: &str) -> Result<(), OutputError> {
        self.enigo
            .text(text)
            .map_err(|e| OutputError::Input(format!("typing {} chars: {}", text.chars().count(), e)))
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<(), OutputError> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| OutputError::Input(format!("move to ({}, {}): {}", x, y, e)))
    }

    fn click(&mut self, button: MouseButton, times: u32) -> Result<(), OutputError> {
        for _ in 0..times {
            self.button(button, Direction::Click)?;
        }
        Ok(())
    }

    fn mouse_press(&mut self, button: MouseButton) -> Result<(), OutputError> {
        self.button(button, Direction::Press)
    }

    fn mouse_release(&mut self, button: MouseButton) -> Result<(), OutputError> {
        self.button(button, Direction::Release)
    }
}

/// Opens a fresh EnigoOutput for every replay
#[derive(Debug, Default, Clone, Copy)]
pub struct EnigoFactory;

impl OutputFactory for EnigoFactory {
    fn open(&self) -> Result<Box<dyn OutputController>, OutputError> {
        Ok(Box::new(EnigoOutput::new()?))
    }
}

fn enigo_key(key: SynthKey) -> Key {
    match key {
        SynthKey::Backspace => Key::Backspace,
        SynthKey::Enter => Key::Return,
        SynthKey::Shift => Key::Shift,
    }
}

fn enigo_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Middle => Button::Middle,
    }
}

#[cfg(test)]
#[path = "keyboard_test.rs"]
mod tests;
