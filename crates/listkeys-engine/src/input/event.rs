use std::fmt;

use super::Keystroke;
use crate::model::{DeleteUnit, Position};

/// Direction of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteDirection {
    /// Backspace
    Backward,
    /// Delete
    Forward,
}

/// Range the host surface says a before-input event will affect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetRange {
    pub start: Position,
    pub end: Position,
}

impl TargetRange {
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Payload of an input signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    KeyDown(Keystroke),
    /// Block break; `soft` for a line break (Shift+Enter)
    Enter {
        soft: bool,
    },
    Delete {
        direction: DeleteDirection,
        unit: DeleteUnit,
    },
    /// Raw before-input notification, `input_type` as the host names it
    /// (`insertText`, `insertParagraph`, `deleteContentBackward`, ...)
    BeforeInput {
        input_type: String,
        data: Option<String>,
        target_ranges: Vec<TargetRange>,
    },
    CompositionStart {
        data: Option<String>,
    },
    CompositionEnd {
        data: Option<String>,
    },
}

/// Discriminant of `InputKind`, the key of the dispatch table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    KeyDown,
    Enter,
    Delete,
    BeforeInput,
    CompositionStart,
    CompositionEnd,
}

impl EventKind {
    /// Kinds that can trigger editing commands and are therefore held back during composition
    pub fn is_command_source(&self) -> bool {
        matches!(self, EventKind::KeyDown | EventKind::Enter | EventKind::Delete)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::KeyDown => "keydown",
            EventKind::Enter => "enter",
            EventKind::Delete => "delete",
            EventKind::BeforeInput => "beforeinput",
            EventKind::CompositionStart => "compositionstart",
            EventKind::CompositionEnd => "compositionend",
        };
        f.write_str(name)
    }
}

/// One input signal from the host surface, with its suppression flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    kind: InputKind,
    /// Host tag for events produced while an IME composition is running
    is_composing: bool,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl InputEvent {
    pub fn new(kind: InputKind) -> Self {
        Self {
            kind,
            is_composing: false,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn key_down(keystroke: Keystroke) -> Self {
        Self::new(InputKind::KeyDown(keystroke))
    }

    pub fn enter() -> Self {
        Self::new(InputKind::Enter { soft: false })
    }

    pub fn delete(direction: DeleteDirection) -> Self {
        Self::new(InputKind::Delete {
            direction,
            unit: DeleteUnit::Character,
        })
    }

    pub fn before_input(input_type: impl Into<String>, data: Option<String>) -> Self {
        Self::new(InputKind::BeforeInput {
            input_type: input_type.into(),
            data,
            target_ranges: Vec::new(),
        })
    }

    pub fn composition_start() -> Self {
        Self::new(InputKind::CompositionStart { data: None })
    }

    pub fn composition_end(data: Option<String>) -> Self {
        Self::new(InputKind::CompositionEnd { data })
    }

    /// Mark the event as produced during composition
    pub fn composing(mut self) -> Self {
        self.is_composing = true;
        self
    }

    pub fn with_target_range(mut self, range: TargetRange) -> Self {
        if let InputKind::BeforeInput { target_ranges, .. } = &mut self.kind {
            target_ranges.push(range);
        }
        self
    }

    pub fn kind(&self) -> &InputKind {
        &self.kind
    }

    pub fn event_kind(&self) -> EventKind {
        match self.kind {
            InputKind::KeyDown(_) => EventKind::KeyDown,
            InputKind::Enter { .. } => EventKind::Enter,
            InputKind::Delete { .. } => EventKind::Delete,
            InputKind::BeforeInput { .. } => EventKind::BeforeInput,
            InputKind::CompositionStart { .. } => EventKind::CompositionStart,
            InputKind::CompositionEnd { .. } => EventKind::CompositionEnd,
        }
    }

    pub fn is_composing(&self) -> bool {
        self.is_composing
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Both suppression hooks were used
    pub fn is_suppressed(&self) -> bool {
        self.default_prevented && self.propagation_stopped
    }

    /// Rewrite before-input events that mean a block break or a deletion into
    /// `Enter`/`Delete`, so those rules see them whichever way the host reports them.
    ///
    /// Returns whether the event was rewritten.
    pub fn normalize(&mut self) -> bool {
        let InputKind::BeforeInput { input_type, .. } = &self.kind else {
            return false;
        };
        let kind = match input_type.as_str() {
            "insertParagraph" => InputKind::Enter { soft: false },
            "insertLineBreak" => InputKind::Enter { soft: true },
            "deleteContentBackward" => InputKind::Delete {
                direction: DeleteDirection::Backward,
                unit: DeleteUnit::Character,
            },
            "deleteWordBackward" => InputKind::Delete {
                direction: DeleteDirection::Backward,
                unit: DeleteUnit::Word,
            },
            "deleteContentForward" => InputKind::Delete {
                direction: DeleteDirection::Forward,
                unit: DeleteUnit::Character,
            },
            "deleteWordForward" => InputKind::Delete {
                direction: DeleteDirection::Forward,
                unit: DeleteUnit::Word,
            },
            _ => return false,
        };
        self.kind = kind;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("insertParagraph", Some(InputKind::Enter { soft: false }))]
    #[case("insertLineBreak", Some(InputKind::Enter { soft: true }))]
    #[case(
        "deleteContentBackward",
        Some(InputKind::Delete { direction: DeleteDirection::Backward, unit: DeleteUnit::Character })
    )]
    #[case(
        "deleteWordForward",
        Some(InputKind::Delete { direction: DeleteDirection::Forward, unit: DeleteUnit::Word })
    )]
    #[case("insertText", None)]
    fn test_normalize_before_input(#[case] input_type: &str, #[case] expected: Option<InputKind>) {
        let mut event = InputEvent::before_input(input_type, None);
        let rewritten = event.normalize();

        assert_eq!(rewritten, expected.is_some());
        if let Some(kind) = expected {
            assert_eq!(event.kind(), &kind);
        } else {
            assert_eq!(event.event_kind(), EventKind::BeforeInput);
        }
    }

    #[test]
    fn test_normalize_keeps_composing_flag() {
        let mut event = InputEvent::before_input("insertParagraph", None).composing();
        event.normalize();

        assert!(event.is_composing());
        assert_eq!(event.event_kind(), EventKind::Enter);
    }

    #[test]
    fn test_suppression_flags() {
        let mut event = InputEvent::enter();
        assert!(!event.is_suppressed());

        event.prevent_default();
        assert!(event.is_default_prevented());
        assert!(!event.is_suppressed());

        event.stop_propagation();
        assert!(event.is_suppressed());
    }
}
