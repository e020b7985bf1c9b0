use crate::commands::{CommandError, CommandName, CommandRegistry};
use crate::input::{DeleteDirection, InputEvent, InputKind, Key};
use crate::model::{Document, ModelError, Motion, Selection};
use crate::ui::ListUi;

/// A document together with its commands and the buttons bound to them.
///
/// Command state and button state are refreshed after every change made
/// through the editor, so a following event always sees up to date state.
#[derive(Debug)]
pub struct Editor {
    document: Document,
    commands: CommandRegistry,
    ui: ListUi,
    executed: Vec<CommandName>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Document::new())
    }
}

impl Editor {
    /// Editor with the list commands registered
    pub fn new(document: Document) -> Self {
        Self::with_commands(document, CommandRegistry::with_list_commands())
    }

    pub fn with_commands(document: Document, commands: CommandRegistry) -> Self {
        let mut editor = Self {
            document,
            commands,
            ui: ListUi::new(),
            executed: Vec::new(),
        };
        editor.refresh();
        editor
    }

    pub fn from_markdown(markdown: &str) -> anyhow::Result<Self> {
        Ok(Self::new(Document::from_markdown(markdown)?))
    }

    pub fn from_fixture(fixture: &str) -> anyhow::Result<Self> {
        Ok(Self::new(Document::from_fixture(fixture)?))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Direct access to command state. Call `sync_ui` afterwards so buttons follow.
    pub fn commands_mut(&mut self) -> &mut CommandRegistry {
        &mut self.commands
    }

    pub fn ui(&self) -> &ListUi {
        &self.ui
    }

    /// Commands executed so far, in order
    pub fn execution_log(&self) -> &[CommandName] {
        &self.executed
    }

    pub fn execute(&mut self, name: CommandName) -> Result<(), CommandError> {
        self.commands.execute(name, &mut self.document)?;
        self.executed.push(name);
        self.ui.sync(&self.commands);
        Ok(())
    }

    /// Recompute command state from the document and update the buttons
    pub fn refresh(&mut self) {
        self.commands.refresh(&self.document);
        self.ui.sync(&self.commands);
    }

    /// Update the buttons from the current command state without recomputing it
    pub fn sync_ui(&mut self) {
        self.ui.sync(&self.commands);
    }

    /// Execute the command bound to a toolbar button
    pub fn press(&mut self, button: &str) -> Result<(), CommandError> {
        let command = self
            .ui
            .create(button)
            .map(|button| button.command)
            .ok_or_else(|| CommandError::Unknown(button.to_string()))?;
        self.execute(command)
    }

    /// Move the caret or selection and refresh command state
    pub fn set_selection(&mut self, selection: Selection) -> Result<(), ModelError> {
        self.document.set_selection(selection)?;
        self.refresh();
        Ok(())
    }

    /// What the host surface does with an event nobody suppressed: type text,
    /// split or join blocks, move the caret.
    ///
    /// Expects an event that already went through the dispatcher, so
    /// before-input events meaning Enter or a deletion arrive normalised.
    pub fn apply_default(&mut self, event: &InputEvent) -> Result<(), ModelError> {
        if event.is_default_prevented() {
            return Ok(());
        }

        match event.kind() {
            InputKind::BeforeInput {
                input_type, data, ..
            } => match (input_type.as_str(), data) {
                ("insertText" | "insertReplacementText", Some(text)) => {
                    self.document.insert_text(text)?
                }
                ("deleteByCut", _) => self.document.delete_selection_content()?,
                _ => return Ok(()),
            },
            // Blocks hold a single line, so a soft break splits too
            InputKind::Enter { .. } => self.document.split_block()?,
            InputKind::Delete { direction, unit } => match direction {
                DeleteDirection::Backward => self.document.delete_backward(*unit)?,
                DeleteDirection::Forward => self.document.delete_forward(*unit)?,
            },
            InputKind::KeyDown(keystroke) => {
                let motion = match keystroke.key {
                    Key::Left => Motion::Left,
                    Key::Right => Motion::Right,
                    Key::Up => Motion::Up,
                    Key::Down => Motion::Down,
                    Key::Home => Motion::LineStart,
                    Key::End => Motion::LineEnd,
                    _ => return Ok(()),
                };
                self.document.move_caret(motion)?
            }
            InputKind::CompositionStart { .. } | InputKind::CompositionEnd { .. } => {
                return Ok(());
            }
        }

        self.refresh();
        Ok(())
    }
}
