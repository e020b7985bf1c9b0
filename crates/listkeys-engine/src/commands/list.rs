use super::{Command, CommandError, CommandState};
use crate::model::{BlockKind, Document, ListType, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndentDirection {
    Forward,
    Backward,
}

/// `indentList` / `outdentList`: change the indent of the selected list items.
///
/// Items nested below the last selected item move along with it. Outdenting an
/// item at indent 0 turns it into a paragraph.
#[derive(Debug, Clone)]
pub struct IndentListCommand {
    direction: IndentDirection,
}

impl IndentListCommand {
    pub fn indent() -> Self {
        Self {
            direction: IndentDirection::Forward,
        }
    }

    pub fn outdent() -> Self {
        Self {
            direction: IndentDirection::Backward,
        }
    }

    /// An item can only be indented under an earlier sibling item of the same
    /// indent and type.
    fn can_indent(doc: &Document, item: NodeId, list_type: ListType, indent: usize) -> bool {
        let mut previous = doc.previous_sibling(item);
        while let Some(sibling) = previous {
            match doc.list_attributes(sibling) {
                Some((sibling_type, sibling_indent)) if sibling_indent == indent => {
                    return sibling_type == list_type;
                }
                Some((_, sibling_indent)) if sibling_indent > indent => {
                    previous = doc.previous_sibling(sibling);
                }
                _ => return false,
            }
        }
        false
    }

    /// Selected items plus the items nested below the last one
    fn items_to_change(doc: &Document) -> Vec<NodeId> {
        let mut items: Vec<NodeId> = doc
            .selected_blocks()
            .into_iter()
            .filter(|&block| doc.list_attributes(block).is_some())
            .collect();

        if let Some(&last) = items.last()
            && let Some((_, last_indent)) = doc.list_attributes(last)
        {
            let mut next = doc.next_sibling(last);
            while let Some(sibling) = next {
                match doc.list_attributes(sibling) {
                    Some((_, indent)) if indent > last_indent => {
                        items.push(sibling);
                        next = doc.next_sibling(sibling);
                    }
                    _ => break,
                }
            }
        }
        items
    }
}

impl Command for IndentListCommand {
    fn refresh(&self, doc: &Document) -> CommandState {
        let Some(&first) = doc.selected_blocks().first() else {
            return CommandState::disabled();
        };
        let Some((list_type, indent)) = doc.list_attributes(first) else {
            return CommandState::disabled();
        };

        let enabled = match self.direction {
            IndentDirection::Forward => Self::can_indent(doc, first, list_type, indent),
            IndentDirection::Backward => true,
        };
        CommandState {
            is_enabled: enabled,
            value: false,
        }
    }

    fn execute(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        let mut items = Self::items_to_change(doc);
        if items.is_empty() {
            return Err(CommandError::NoSelection);
        }
        // Outdent from the bottom up so parents are never shallower than children mid-way
        if self.direction == IndentDirection::Backward {
            items.reverse();
        }

        for item in items {
            let Some((list_type, indent)) = doc.list_attributes(item) else {
                continue;
            };
            let kind = match self.direction {
                IndentDirection::Forward => BlockKind::list_item(list_type, indent + 1),
                IndentDirection::Backward => match indent.checked_sub(1) {
                    Some(indent) => BlockKind::list_item(list_type, indent),
                    None => BlockKind::Paragraph,
                },
            };
            doc.set_block_kind(item, kind)?;
        }
        Ok(())
    }
}

/// `bulletedList` / `numberedList`: toggle the selected blocks into or out of a list
#[derive(Debug, Clone)]
pub struct ListCommand {
    list_type: ListType,
}

impl ListCommand {
    pub fn new(list_type: ListType) -> Self {
        Self { list_type }
    }

    fn is_on(&self, doc: &Document, blocks: &[NodeId]) -> bool {
        !blocks.is_empty()
            && blocks
                .iter()
                .all(|&block| matches!(doc.list_attributes(block), Some((t, _)) if t == self.list_type))
    }
}

impl Command for ListCommand {
    fn refresh(&self, doc: &Document) -> CommandState {
        let blocks = doc.selected_blocks();
        if blocks.is_empty() {
            return CommandState::disabled();
        }
        CommandState::enabled(self.is_on(doc, &blocks))
    }

    fn execute(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        let blocks = doc.selected_blocks();
        if blocks.is_empty() {
            return Err(CommandError::NoSelection);
        }

        if self.is_on(doc, &blocks) {
            for block in blocks {
                doc.set_block_kind(block, BlockKind::Paragraph)?;
            }
        } else {
            for block in blocks {
                let indent = doc.list_attributes(block).map_or(0, |(_, indent)| indent);
                doc.set_block_kind(block, BlockKind::list_item(self.list_type, indent))?;
            }
        }
        Ok(())
    }
}
