//! Input events and the dispatcher that turns them into list commands.
//!
//! - **`keystroke`**: keys, modifiers and parseable keystroke strings
//! - **`event`**: `InputEvent`, its suppression flags and before-input normalisation
//! - **`dispatcher`**: per-kind listener chains with priorities and the composition gate
//! - **`listeners`**: the Tab, Enter and Backspace list rules
//! - **`event_log`**: bounded log of raw before-input and composition events

pub mod dispatcher;
pub mod event;
pub mod event_log;
pub mod keystroke;
pub mod listeners;

pub use dispatcher::{Decision, DispatchContext, InputDispatcher, InputListener, Outcome, Priority};
pub use event::{DeleteDirection, EventKind, InputEvent, InputKind, TargetRange};
pub use event_log::{EventLog, LogEntry};
pub use keystroke::{Key, Keystroke, KeystrokeError, Modifiers};
pub use listeners::{BackspaceListener, EnterListener, ListKeymap, TabKeyListener};
