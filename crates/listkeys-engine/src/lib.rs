//! List editing driven by keyboard and input events.
//!
//! Raw input signals from a host editing surface (keydown, enter, delete,
//! before-input, composition start/end) go through an `InputDispatcher`, which
//! classifies them against the current document and selection and runs at most
//! one list command per event:
//!
//! - Tab / Shift+Tab indent and outdent list items
//! - Enter in an empty list item outdents it
//! - Backspace at the start of the first item of a list outdents it
//!
//! ```
//! use listkeys_engine::{Editor, InputDispatcher, InputEvent, Key, Keystroke, ListKeymap};
//!
//! let mut editor = Editor::from_fixture("- foo\n- []bar").unwrap();
//! let mut dispatcher = InputDispatcher::with_list_rules(ListKeymap::default());
//!
//! let mut tab = InputEvent::key_down(Keystroke::plain(Key::Tab));
//! dispatcher.handle(&mut tab, &mut editor);
//!
//! assert!(tab.is_default_prevented());
//! assert_eq!(editor.document().to_fixture(), "- foo\n  - []bar\n");
//! ```

pub mod commands;
pub mod editor;
pub mod input;
pub mod model;
pub mod ui;

pub use commands::{Command, CommandError, CommandName, CommandRegistry, CommandState};
pub use editor::Editor;
pub use input::{
    DeleteDirection, EventKind, EventLog, InputDispatcher, InputEvent, InputKind, Key, Keystroke,
    ListKeymap, Modifiers, Outcome, Priority,
};
pub use model::{Document, ListType, Position, Selection};
pub use ui::{ButtonView, ListUi};
