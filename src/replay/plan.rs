// Replay plans and their sequential execution
//
// run_plan is synchronous and sleeps between steps; it is only ever called
// from a blocking worker, never from the hook thread.

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::output::{OutputController, OutputError, SynthKey};
use crate::shortcuts::{Action, MouseButton};

/// Delays inserted between synthetic events, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplayTimings {
    /// Before the first event, so the triggering modifier is released
    pub settle_ms: u64,
    /// Between repeated clicks of one Click action
    pub click_interval_ms: u64,
    /// Between the steps of a Drag
    pub drag_settle_ms: u64,
    /// After each Shift+Enter line break
    pub line_break_settle_ms: u64,
    /// After every action
    pub inter_action_ms: u64,
    /// Between erase backspaces
    pub backspace_interval_ms: u64,
    /// After the last erase backspace
    pub erase_settle_ms: u64,
}

impl Default for ReplayTimings {
    fn default() -> Self {
        Self {
            settle_ms: 100,
            click_interval_ms: 80,
            drag_settle_ms: 50,
            line_break_settle_ms: 50,
            inter_action_ms: 50,
            backspace_interval_ms: 10,
            erase_settle_ms: 50,
        }
    }
}

impl ReplayTimings {
    /// No delays at all
    pub fn immediate() -> Self {
        Self {
            settle_ms: 0,
            click_interval_ms: 0,
            drag_settle_ms: 0,
            line_break_settle_ms: 0,
            inter_action_ms: 0,
            backspace_interval_ms: 0,
            erase_settle_ms: 0,
        }
    }
}

/// Work handed to the replay engine: erase typed characters, then run actions
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplayPlan {
    /// Backspaces issued before the first action
    pub erase: usize,
    pub actions: Vec<Action>,
}

impl ReplayPlan {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { erase: 0, actions }
    }

    /// Delete `erase` characters, then run `actions`
    pub fn with_erase(erase: usize, actions: Vec<Action>) -> Self {
        Self { erase, actions }
    }

    /// Delete `erase` characters, then type `text`
    pub fn replace_text(erase: usize, text: impl Into<String>) -> Self {
        Self {
            erase,
            actions: vec![Action::Type { text: text.into() }],
        }
    }
}

/// Error during replay; the rest of the plan was skipped
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReplayError {
    #[error("Could not open input simulator: {0}")]
    Output(OutputError),
    #[error("Erasing typed text failed: {0}")]
    Erase(OutputError),
    #[error("Action {index} failed: {source}")]
    Action {
        index: usize,
        #[source]
        source: OutputError,
    },
    #[error("Replay aborted: shutting down")]
    ShuttingDown,
    #[error("Replay task panicked: {0}")]
    TaskPanic(String),
}

fn pause(ms: u64) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms));
    }
}

/// Execute a plan strictly in order, stopping at the first failure.
pub fn run_plan(
    output: &mut dyn OutputController,
    plan: &ReplayPlan,
    timings: &ReplayTimings,
) -> Result<(), ReplayError> {
    pause(timings.settle_ms);

    if plan.erase > 0 {
        for _ in 0..plan.erase {
            tap(output, SynthKey::Backspace).map_err(ReplayError::Erase)?;
            pause(timings.backspace_interval_ms);
        }
        pause(timings.erase_settle_ms);
    }

    for (index, action) in plan.actions.iter().enumerate() {
        if crate::shutdown::is_shutting_down() {
            return Err(ReplayError::ShuttingDown);
        }
        run_action(output, action, timings).map_err(|source| ReplayError::Action { index, source })?;
        pause(timings.inter_action_ms);
    }

    Ok(())
}

fn tap(output: &mut dyn OutputController, key: SynthKey) -> Result<(), OutputError> {
    output.press(key)?;
    output.release(key)
}

fn run_action(
    output: &mut dyn OutputController,
    action: &Action,
    timings: &ReplayTimings,
) -> Result<(), OutputError> {
    match action {
        Action::Click { x, y, button, count } => {
            output.move_to(*x, *y)?;
            for i in 0..(*count).max(1) {
                if i > 0 {
                    pause(timings.click_interval_ms);
                }
                output.click(*button, 1)?;
            }
        }
        Action::Drag { x1, y1, x2, y2 } => {
            output.move_to(*x1, *y1)?;
            pause(timings.drag_settle_ms);
            output.mouse_press(MouseButton::Left)?;
            pause(timings.drag_settle_ms);
            if let Err(e) = output.move_to(*x2, *y2) {
                // Never leave the button held system-wide
                let _ = output.mouse_release(MouseButton::Left);
                return Err(e);
            }
            pause(timings.drag_settle_ms);
            output.mouse_release(MouseButton::Left)?;
        }
        Action::Type { text } => {
            // Shift+Enter inserts a soft line break instead of submitting
            for (i, line) in text.split('\n').enumerate() {
                if i > 0 {
                    output.press(SynthKey::Shift)?;
                    let chord = tap(output, SynthKey::Enter);
                    output.release(SynthKey::Shift)?;
                    chord?;
                    pause(timings.line_break_settle_ms);
                }
                let line = line.strip_suffix('\r').unwrap_or(line);
                if !line.is_empty() {
                    output.type_text(line)?;
                }
            }
        }
        Action::Sleep { ms } => {
            thread::sleep(Duration::from_millis(*ms));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
