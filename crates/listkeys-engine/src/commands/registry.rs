use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::{Command, CommandError, CommandName, CommandState, IndentListCommand, ListCommand};
use crate::model::{Document, ListType};

struct Entry {
    command: Box<dyn Command>,
    /// State computed by the last refresh, possibly overridden by `set_value`
    state: CommandState,
    /// Ids of everyone currently forcing the command off
    disabled_by: BTreeSet<String>,
}

impl Entry {
    fn effective_state(&self) -> CommandState {
        CommandState {
            is_enabled: self.state.is_enabled && self.disabled_by.is_empty(),
            value: self.state.value,
        }
    }
}

/// Command lookup plus the cached state observed by UI bindings and the dispatcher
#[derive(Default)]
pub struct CommandRegistry {
    entries: BTreeMap<CommandName, Entry>,
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(name, entry)| (name, entry.effective_state())),
            )
            .finish()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding indent/outdent and the two list toggles
    pub fn with_list_commands() -> Self {
        let mut registry = Self::new();
        registry.register(CommandName::IndentList, Box::new(IndentListCommand::indent()));
        registry.register(CommandName::OutdentList, Box::new(IndentListCommand::outdent()));
        registry.register(
            CommandName::BulletedList,
            Box::new(ListCommand::new(ListType::Bulleted)),
        );
        registry.register(
            CommandName::NumberedList,
            Box::new(ListCommand::new(ListType::Numbered)),
        );
        registry
    }

    /// Register a command, returning the one it replaces.
    ///
    /// The new command starts disabled until the next refresh.
    pub fn register(
        &mut self,
        name: CommandName,
        command: Box<dyn Command>,
    ) -> Option<Box<dyn Command>> {
        let previous = self.entries.insert(
            name,
            Entry {
                command,
                state: CommandState::disabled(),
                disabled_by: BTreeSet::new(),
            },
        );
        previous.map(|entry| entry.command)
    }

    pub fn contains(&self, name: CommandName) -> bool {
        self.entries.contains_key(&name)
    }

    pub fn names(&self) -> impl Iterator<Item = CommandName> + '_ {
        self.entries.keys().copied()
    }

    pub fn get(&self, name: CommandName) -> Option<&dyn Command> {
        self.entries.get(&name).map(|entry| entry.command.as_ref())
    }

    pub fn state(&self, name: CommandName) -> Option<CommandState> {
        self.entries.get(&name).map(Entry::effective_state)
    }

    /// Unregistered commands count as disabled
    pub fn is_enabled(&self, name: CommandName) -> bool {
        self.state(name).is_some_and(|state| state.is_enabled)
    }

    pub fn value(&self, name: CommandName) -> bool {
        self.state(name).is_some_and(|state| state.value)
    }

    /// Override a command's value until the next refresh
    pub fn set_value(&mut self, name: CommandName, value: bool) {
        if let Some(entry) = self.entries.get_mut(&name) {
            entry.state.value = value;
        }
    }

    /// Keep a command disabled, regardless of refreshes, until `id` clears it
    pub fn force_disabled(&mut self, name: CommandName, id: &str) {
        if let Some(entry) = self.entries.get_mut(&name) {
            entry.disabled_by.insert(id.to_string());
        }
    }

    pub fn clear_force_disabled(&mut self, name: CommandName, id: &str) {
        if let Some(entry) = self.entries.get_mut(&name) {
            entry.disabled_by.remove(id);
        }
    }

    /// Recompute every command's state from the document
    pub fn refresh(&mut self, doc: &Document) {
        for entry in self.entries.values_mut() {
            entry.state = entry.command.refresh(doc);
        }
    }

    /// Run an enabled command, then fix list indents and refresh all states
    pub fn execute(&mut self, name: CommandName, doc: &mut Document) -> Result<(), CommandError> {
        let entry = self
            .entries
            .get_mut(&name)
            .ok_or(CommandError::NotRegistered(name))?;
        if !entry.effective_state().is_enabled {
            return Err(CommandError::Disabled(name));
        }

        log::debug!("executing command {name}");
        entry.command.execute(doc)?;
        if doc.fix_list_indents() {
            log::trace!("list indents fixed after {name}");
        }
        self.refresh(doc);
        Ok(())
    }
}
