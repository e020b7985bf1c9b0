//! Toolbar buttons bound to command state.
//!
//! Buttons do not observe commands by themselves. The owner calls `sync` after
//! anything that can change command state (a command execution, a selection
//! change, an explicit `set_value`), and each button re-reads the state of its
//! bound command.

use crate::commands::{CommandName, CommandRegistry};

/// A toolbar button mirroring one command: `is_on` follows the command's value
/// and `is_enabled` its enabled state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub name: &'static str,
    pub label: &'static str,
    pub command: CommandName,
    pub is_on: bool,
    pub is_enabled: bool,
}

impl ButtonView {
    pub fn new(name: &'static str, label: &'static str, command: CommandName) -> Self {
        Self {
            name,
            label,
            command,
            is_on: false,
            is_enabled: false,
        }
    }

    pub fn sync(&mut self, commands: &CommandRegistry) {
        let state = commands.state(self.command).unwrap_or_default();
        self.is_on = state.value;
        self.is_enabled = state.is_enabled;
    }
}

/// The list feature's buttons, keyed by component name
#[derive(Debug, Clone)]
pub struct ListUi {
    buttons: Vec<ButtonView>,
}

impl Default for ListUi {
    fn default() -> Self {
        Self::new()
    }
}

impl ListUi {
    pub fn new() -> Self {
        Self {
            buttons: vec![
                ButtonView::new("bulletedList", "Bulleted List", CommandName::BulletedList),
                ButtonView::new("numberedList", "Numbered List", CommandName::NumberedList),
                ButtonView::new("indent", "Increase indent", CommandName::IndentList),
                ButtonView::new("outdent", "Decrease indent", CommandName::OutdentList),
            ],
        }
    }

    /// Look up a button by component name
    pub fn create(&self, name: &str) -> Option<&ButtonView> {
        self.buttons.iter().find(|button| button.name == name)
    }

    pub fn buttons(&self) -> &[ButtonView] {
        &self.buttons
    }

    pub fn sync(&mut self, commands: &CommandRegistry) {
        for button in &mut self.buttons {
            button.sync(commands);
        }
    }
}
