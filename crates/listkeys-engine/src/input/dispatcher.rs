use std::collections::BTreeMap;

use super::listeners::{BackspaceListener, EnterListener, ListKeymap, TabKeyListener};
use super::{EventKind, EventLog, InputEvent};
use crate::commands::{CommandName, CommandRegistry};
use crate::editor::Editor;
use crate::model::DocumentQuery;

/// Listener priority tiers; within a tier, listeners run in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Highest,
    High,
    #[default]
    Normal,
    Low,
    Lowest,
}

/// What a listener wants done with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    PassThrough,
    Execute(CommandName),
}

/// What the dispatcher did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No command ran; the event is untouched and the host default should apply
    PassThrough,
    /// The command ran (or was attempted) and the event was suppressed
    Handled(CommandName),
}

impl Outcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, Outcome::Handled(_))
    }
}

/// Read-only view handed to listeners while they classify an event
pub struct DispatchContext<'a> {
    pub document: &'a dyn DocumentQuery,
    pub commands: &'a CommandRegistry,
}

pub trait InputListener {
    /// Name used in logs
    fn name(&self) -> &str;

    fn classify(&self, event: &InputEvent, ctx: &DispatchContext<'_>) -> Decision;
}

struct Registration {
    priority: Priority,
    listener: Box<dyn InputListener>,
}

/// Routes input events to listeners and runs at most one command per event.
///
/// For each event:
///
/// 1. before-input and composition events are recorded in the event log, if any
/// 2. before-input events meaning Enter or a deletion are rewritten into those
/// 3. composition start/end toggle the composing flag
/// 4. while composing, keydown/enter/delete events pass through untouched
/// 5. listeners registered for the event kind are asked in priority order;
///    the first one asking for an *enabled* command wins, the event is
///    suppressed and the command executed
///
/// Nothing here returns an error. Failed lookups make a rule not match, and a
/// failing command is logged and absorbed.
pub struct InputDispatcher {
    listeners: BTreeMap<EventKind, Vec<Registration>>,
    composing: bool,
    event_log: Option<EventLog>,
}

impl Default for InputDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl InputDispatcher {
    /// Dispatcher with no listeners
    pub fn new() -> Self {
        Self {
            listeners: BTreeMap::new(),
            composing: false,
            event_log: None,
        }
    }

    /// Dispatcher with the Tab, Enter and Backspace list rules
    pub fn with_list_rules(keymap: ListKeymap) -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(
            EventKind::KeyDown,
            Priority::Normal,
            Box::new(TabKeyListener::new(keymap)),
        );
        dispatcher.register(EventKind::Enter, Priority::High, Box::new(EnterListener));
        dispatcher.register(EventKind::Delete, Priority::High, Box::new(BackspaceListener));
        dispatcher
    }

    pub fn with_event_log(mut self, log: EventLog) -> Self {
        self.event_log = Some(log);
        self
    }

    pub fn register(
        &mut self,
        kind: EventKind,
        priority: Priority,
        listener: Box<dyn InputListener>,
    ) {
        let chain = self.listeners.entry(kind).or_default();
        // Insert after every listener of the same or a higher tier
        let index = chain.partition_point(|r| r.priority <= priority);
        chain.insert(index, Registration { priority, listener });
    }

    pub fn is_composing(&self) -> bool {
        self.composing
    }

    pub fn event_log(&self) -> Option<&EventLog> {
        self.event_log.as_ref()
    }

    pub fn event_log_mut(&mut self) -> Option<&mut EventLog> {
        self.event_log.as_mut()
    }

    pub fn handle(&mut self, event: &mut InputEvent, editor: &mut Editor) -> Outcome {
        if let Some(log) = &mut self.event_log {
            log.record(event);
        }
        if event.normalize() {
            log::trace!("before-input normalised to {}", event.event_kind());
        }

        let kind = event.event_kind();
        match kind {
            EventKind::CompositionStart => {
                if self.composing {
                    log::warn!("compositionstart while already composing");
                }
                self.composing = true;
            }
            EventKind::CompositionEnd => {
                if !self.composing {
                    log::warn!("compositionend without compositionstart, ignored");
                }
                self.composing = false;
            }
            _ => {}
        }

        if kind.is_command_source() && (self.composing || event.is_composing()) {
            log::trace!("{kind} passed through during composition");
            return Outcome::PassThrough;
        }

        let Some(name) = self.classify(kind, event, editor) else {
            return Outcome::PassThrough;
        };

        event.prevent_default();
        event.stop_propagation();
        if let Err(err) = editor.execute(name) {
            log::warn!("{name} failed: {err}");
        }
        Outcome::Handled(name)
    }

    /// First enabled command asked for by the listener chain of `kind`
    fn classify(&self, kind: EventKind, event: &InputEvent, editor: &Editor) -> Option<CommandName> {
        let chain = self.listeners.get(&kind)?;
        let ctx = DispatchContext {
            document: editor.document(),
            commands: editor.commands(),
        };

        for registration in chain {
            let listener = registration.listener.as_ref();
            match listener.classify(event, &ctx) {
                Decision::PassThrough => {}
                Decision::Execute(name) if ctx.commands.is_enabled(name) => {
                    log::debug!("{} handles {kind} with {name}", listener.name());
                    return Some(name);
                }
                Decision::Execute(name) => {
                    log::trace!("{} wants {name} but it is disabled", listener.name());
                }
            }
        }
        None
    }
}
