// Trigger detection - typed buffer, key model and the hook-side state machine

pub mod buffer;
pub mod key;
pub mod machine;

pub use buffer::TypedBuffer;
pub use key::{KeyEvent, LogicalKey};
pub use machine::{SearchSession, TriggerState, TriggerStateMachine, SEARCH_PREFIX};
