//! The list keyboard rules.
//!
//! Each listener only classifies: it reads the event and the document and says
//! which command it wants. Whether the command is enabled, suppression and the
//! execution itself are left to the dispatcher.

use super::dispatcher::{Decision, DispatchContext, InputListener};
use super::{DeleteDirection, InputEvent, InputKind, Key, Keystroke, Modifiers};
use crate::commands::CommandName;
use crate::model::query::{closest_list_item, is_first_in_list};

/// Keystrokes bound to indenting and outdenting list items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListKeymap {
    pub indent: Keystroke,
    pub outdent: Keystroke,
}

impl Default for ListKeymap {
    fn default() -> Self {
        Self {
            indent: Keystroke::plain(Key::Tab),
            outdent: Keystroke::new(Key::Tab, Modifiers::NONE.with_shift()),
        }
    }
}

/// Tab indents, Shift+Tab outdents. Keystrokes must match exactly, so Alt+Tab
/// and Ctrl+Tab are left to the host.
#[derive(Debug, Clone, Default)]
pub struct TabKeyListener {
    keymap: ListKeymap,
}

impl TabKeyListener {
    pub fn new(keymap: ListKeymap) -> Self {
        Self { keymap }
    }
}

impl InputListener for TabKeyListener {
    fn name(&self) -> &str {
        "list-tab"
    }

    fn classify(&self, event: &InputEvent, _ctx: &DispatchContext<'_>) -> Decision {
        match event.kind() {
            InputKind::KeyDown(keystroke) if *keystroke == self.keymap.indent => {
                Decision::Execute(CommandName::IndentList)
            }
            InputKind::KeyDown(keystroke) if *keystroke == self.keymap.outdent => {
                Decision::Execute(CommandName::OutdentList)
            }
            _ => Decision::PassThrough,
        }
    }
}

/// Enter in an empty list item outdents it instead of adding another item
#[derive(Debug, Clone, Default)]
pub struct EnterListener;

impl InputListener for EnterListener {
    fn name(&self) -> &str {
        "list-enter"
    }

    fn classify(&self, event: &InputEvent, ctx: &DispatchContext<'_>) -> Decision {
        if !matches!(event.kind(), InputKind::Enter { .. }) {
            return Decision::PassThrough;
        }
        let outdent = || -> Option<bool> {
            let selection = ctx.document.selection()?;
            if !selection.is_collapsed() {
                return Some(false);
            }
            let chain = ctx.document.ancestors(selection.focus)?;
            let block = chain.innermost()?;
            if !block.is_list_item() {
                return Some(false);
            }
            ctx.document.is_block_empty(block.id)
        };

        match outdent() {
            Some(true) => Decision::Execute(CommandName::OutdentList),
            _ => Decision::PassThrough,
        }
    }
}

/// Backspace at the very start of the first item of a list outdents it.
///
/// "First" is judged among the item's siblings in its own container, so a list
/// opening a block quote counts as first even when the quote follows another
/// list, and an item after a block quote or a paragraph counts as first too.
#[derive(Debug, Clone, Default)]
pub struct BackspaceListener;

impl InputListener for BackspaceListener {
    fn name(&self) -> &str {
        "list-backspace"
    }

    fn classify(&self, event: &InputEvent, ctx: &DispatchContext<'_>) -> Decision {
        let InputKind::Delete {
            direction: DeleteDirection::Backward,
            ..
        } = event.kind()
        else {
            return Decision::PassThrough;
        };

        let outdent = || -> Option<bool> {
            let selection = ctx.document.selection()?;
            if !selection.is_collapsed() {
                return Some(false);
            }
            let position = selection.focus;
            let chain = ctx.document.ancestors(position)?;
            let item = closest_list_item(&chain)?;
            // The caret has to sit directly in the item, not in something nested below it
            if chain.innermost()? != item {
                return Some(false);
            }
            if !ctx.document.is_block_start(position)? {
                return Some(false);
            }
            let (_, indent) = item.list_attributes()?;
            let preceding = ctx.document.preceding_siblings(item.id)?;
            Some(is_first_in_list(indent, &preceding))
        };

        match outdent() {
            Some(true) => Decision::Execute(CommandName::OutdentList),
            _ => Decision::PassThrough,
        }
    }
}
