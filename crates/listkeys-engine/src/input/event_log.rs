//! Diagnostic log of raw before-input and composition events.
//!
//! Meant for watching what a host surface actually emits while typing, in
//! particular during IME composition. Before-input events are numbered in
//! arrival order; composition start/end share a number so each pair reads as
//! one bracketed group.

use std::collections::VecDeque;
use std::fmt;

use super::{InputEvent, InputKind, TargetRange};

pub const DEFAULT_CAPACITY: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    BeforeInput {
        number: usize,
        input_type: String,
        data: Option<String>,
        is_composing: bool,
        first_range: Option<TargetRange>,
    },
    CompositionStart {
        number: usize,
    },
    CompositionEnd {
        number: usize,
    },
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEntry::BeforeInput {
                number,
                input_type,
                data,
                is_composing,
                first_range,
            } => {
                write!(f, "#{number} beforeInput (\"{input_type}\"")?;
                if *is_composing {
                    f.write_str(", isComposing")?;
                }
                f.write_str(")")?;
                match data {
                    Some(data) => write!(f, " data: \"{data}\"")?,
                    None => f.write_str(" data: null")?,
                }
                if let Some(range) = first_range {
                    write!(f, " first range: {}..{}", range.start, range.end)?;
                    if range.is_collapsed() {
                        f.write_str(" (collapsed)")?;
                    }
                }
                Ok(())
            }
            LogEntry::CompositionStart { number } => {
                write!(f, "┌──── #{number} compositionstart ────┐")
            }
            LogEntry::CompositionEnd { number } => {
                write!(f, "└──── #{number} compositionend ────┘")
            }
        }
    }
}

/// Bounded log; the oldest entries are dropped once `capacity` is reached
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    before_input_count: usize,
    composition_count: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
            before_input_count: 0,
            composition_count: 0,
        }
    }

    /// Record an event as the host reported it. Other event kinds are ignored.
    pub fn record(&mut self, event: &InputEvent) {
        let entry = match event.kind() {
            InputKind::BeforeInput {
                input_type,
                data,
                target_ranges,
            } => {
                self.before_input_count += 1;
                LogEntry::BeforeInput {
                    number: self.before_input_count,
                    input_type: input_type.clone(),
                    data: data.clone(),
                    is_composing: event.is_composing(),
                    first_range: target_ranges.first().copied(),
                }
            }
            InputKind::CompositionStart { .. } => {
                self.composition_count += 1;
                LogEntry::CompositionStart {
                    number: self.composition_count,
                }
            }
            InputKind::CompositionEnd { .. } => LogEntry::CompositionEnd {
                number: self.composition_count,
            },
            _ => return,
        };

        log::trace!("{entry}");
        self.push(entry);
    }

    fn push(&mut self, entry: LogEntry) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn before_input_count(&self) -> usize {
        self.before_input_count
    }

    /// Drop the entries but keep numbering
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
