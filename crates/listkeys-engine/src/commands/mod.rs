//! Named editing commands.
//!
//! Every command exposes two pieces of state, recomputed from the document on
//! each refresh tick: `is_enabled` (may it run now?) and `value` (its current
//! toggle state, e.g. "the selection is a bulleted list"). UI buttons and the
//! input dispatcher only ever read that state through the `CommandRegistry`.

pub mod list;
pub mod registry;

pub use list::{IndentListCommand, ListCommand};
pub use registry::CommandRegistry;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::{Document, ModelError};

/// Names of the commands the list feature registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandName {
    IndentList,
    OutdentList,
    BulletedList,
    NumberedList,
}

impl CommandName {
    pub const ALL: [CommandName; 4] = [
        CommandName::IndentList,
        CommandName::OutdentList,
        CommandName::BulletedList,
        CommandName::NumberedList,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::IndentList => "indentList",
            CommandName::OutdentList => "outdentList",
            CommandName::BulletedList => "bulletedList",
            CommandName::NumberedList => "numberedList",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| CommandError::Unknown(s.to_string()))
    }
}

/// Observable state of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandState {
    pub is_enabled: bool,
    pub value: bool,
}

impl CommandState {
    pub fn enabled(value: bool) -> Self {
        Self {
            is_enabled: true,
            value,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("command '{0}' is not registered")]
    NotRegistered(CommandName),

    #[error("command '{0}' is disabled")]
    Disabled(CommandName),

    #[error("command needs a selection but the document has none")]
    NoSelection,

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// An editing operation over the document
pub trait Command {
    /// Compute the command's state for the current document
    fn refresh(&self, doc: &Document) -> CommandState;

    /// Apply the command. Only called while the command is enabled.
    fn execute(&mut self, doc: &mut Document) -> Result<(), CommandError>;
}
