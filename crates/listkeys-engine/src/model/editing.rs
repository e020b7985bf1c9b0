//! Default editing behaviour of the host surface.
//!
//! These run when the dispatcher lets an event through: plain typing, splitting
//! a block on Enter, character/word deletion with block merging, and caret
//! movement. List semantics live in the commands, not here.

use super::{BlockKind, Document, ModelError, NodeId, Position, Selection};

/// How much a single delete removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteUnit {
    Character,
    Word,
}

/// Caret movements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
}

fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map_or(text.len(), |(index, _)| index)
}

/// Char offset where the word ending at `offset` starts
fn word_start_before(text: &str, offset: usize) -> usize {
    let chars: Vec<char> = text.chars().take(offset).collect();
    let mut index = chars.len();
    while index > 0 && chars[index - 1].is_whitespace() {
        index -= 1;
    }
    while index > 0 && !chars[index - 1].is_whitespace() {
        index -= 1;
    }
    index
}

/// Char offset where the word starting at `offset` ends
fn word_end_after(text: &str, offset: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let mut index = offset.min(chars.len());
    while index < chars.len() && chars[index].is_whitespace() {
        index += 1;
    }
    while index < chars.len() && !chars[index].is_whitespace() {
        index += 1;
    }
    index
}

impl Document {
    fn caret(&self) -> Result<Position, ModelError> {
        let selection = self.raw_selection();
        self.validate(selection.focus)?;
        Ok(selection.focus)
    }

    fn remove_chars(&mut self, node: NodeId, from: usize, to: usize) -> Result<(), ModelError> {
        let text = self.text_mut(node)?;
        let start = byte_index(text, from);
        let end = byte_index(text, to);
        text.replace_range(start..end, "");
        Ok(())
    }

    /// Remove the selected content, leaving a collapsed caret at its start
    pub fn delete_selection_content(&mut self) -> Result<(), ModelError> {
        let Some((start, end)) = self.selection_range() else {
            return Ok(());
        };
        if start == end {
            return Ok(());
        }

        if start.node == end.node {
            self.remove_chars(start.node, start.offset, end.offset)?;
        } else {
            let blocks = self.blocks();
            let first = blocks.iter().position(|&b| b == start.node);
            let last = blocks.iter().position(|&b| b == end.node);
            let (Some(first), Some(last)) = (first, last) else {
                return Err(ModelError::Detached(end.node));
            };

            let tail: String = {
                let text = self.text(end.node).unwrap_or_default();
                text[byte_index(text, end.offset)..].to_string()
            };
            let head = self.text_mut(start.node)?;
            let cut = byte_index(head, start.offset);
            head.truncate(cut);
            head.push_str(&tail);

            for &block in &blocks[first + 1..=last] {
                self.remove(block)?;
            }
        }

        self.set_caret(start)
    }

    /// Insert text at the caret, replacing any selected content
    pub fn insert_text(&mut self, text: &str) -> Result<(), ModelError> {
        self.delete_selection_content()?;
        let caret = self.caret()?;
        let block = self.text_mut(caret.node)?;
        let at = byte_index(block, caret.offset);
        block.insert_str(at, text);
        self.set_caret(Position::new(caret.node, caret.offset + text.chars().count()))
    }

    /// Split the caret's block in two and move the caret to the new block.
    ///
    /// The new block keeps the kind of the old one, except that headings continue
    /// as paragraphs.
    pub fn split_block(&mut self) -> Result<(), ModelError> {
        self.delete_selection_content()?;
        let caret = self.caret()?;
        let kind = match self.block_kind(caret.node) {
            Some(BlockKind::Heading { .. }) | None => BlockKind::Paragraph,
            Some(kind) => kind.clone(),
        };

        let block = self.text_mut(caret.node)?;
        let at = byte_index(block, caret.offset);
        let tail = block.split_off(at);

        let new_block = self.insert_block_after(caret.node, kind, tail)?;
        self.set_caret(Position::new(new_block, 0))
    }

    /// Backspace: remove before the caret, merging into the previous block at its start
    pub fn delete_backward(&mut self, unit: DeleteUnit) -> Result<(), ModelError> {
        if !self.raw_selection().is_collapsed() {
            return self.delete_selection_content();
        }
        let caret = self.caret()?;

        if caret.offset > 0 {
            let text = self.text(caret.node).unwrap_or_default();
            let from = match unit {
                DeleteUnit::Character => caret.offset - 1,
                DeleteUnit::Word => word_start_before(text, caret.offset),
            };
            self.remove_chars(caret.node, from, caret.offset)?;
            return self.set_caret(Position::new(caret.node, from));
        }

        let Some(previous) = self.previous_block(caret.node) else {
            return Ok(());
        };
        self.merge_into(previous, caret.node)
    }

    /// Delete: remove after the caret, pulling the next block in at its end
    pub fn delete_forward(&mut self, unit: DeleteUnit) -> Result<(), ModelError> {
        if !self.raw_selection().is_collapsed() {
            return self.delete_selection_content();
        }
        let caret = self.caret()?;
        let len = self.char_len(caret.node).unwrap_or(0);

        if caret.offset < len {
            let text = self.text(caret.node).unwrap_or_default();
            let to = match unit {
                DeleteUnit::Character => caret.offset + 1,
                DeleteUnit::Word => word_end_after(text, caret.offset),
            };
            self.remove_chars(caret.node, caret.offset, to)?;
            return self.set_caret(caret);
        }

        let Some(next) = self.next_block(caret.node) else {
            return Ok(());
        };
        self.merge_into(caret.node, next)
    }

    /// Append `source` to `target`, remove `source` and put the caret at the seam
    fn merge_into(&mut self, target: NodeId, source: NodeId) -> Result<(), ModelError> {
        let seam = self.char_len(target).unwrap_or(0);
        let moved = self.text(source).unwrap_or_default().to_string();
        self.text_mut(target)?.push_str(&moved);
        self.remove(source)?;
        self.set_caret(Position::new(target, seam))
    }

    /// Move and collapse the caret
    pub fn move_caret(&mut self, motion: Motion) -> Result<(), ModelError> {
        let caret = self.caret()?;
        let len = self.char_len(caret.node).unwrap_or(0);

        let target = match motion {
            Motion::Left if caret.offset > 0 => Position::new(caret.node, caret.offset - 1),
            Motion::Left => match self.previous_block(caret.node) {
                Some(previous) => Position::new(previous, self.char_len(previous).unwrap_or(0)),
                None => caret,
            },
            Motion::Right if caret.offset < len => Position::new(caret.node, caret.offset + 1),
            Motion::Right => match self.next_block(caret.node) {
                Some(next) => Position::new(next, 0),
                None => caret,
            },
            Motion::Up => match self.previous_block(caret.node) {
                Some(previous) => {
                    let offset = caret.offset.min(self.char_len(previous).unwrap_or(0));
                    Position::new(previous, offset)
                }
                None => Position::new(caret.node, 0),
            },
            Motion::Down => match self.next_block(caret.node) {
                Some(next) => {
                    let offset = caret.offset.min(self.char_len(next).unwrap_or(0));
                    Position::new(next, offset)
                }
                None => Position::new(caret.node, len),
            },
            Motion::LineStart => Position::new(caret.node, 0),
            Motion::LineEnd => Position::new(caret.node, len),
        };

        self.set_selection(Selection::collapsed(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ListType;
    use pretty_assertions::assert_eq;

    fn doc(fixture: &str) -> Document {
        Document::from_fixture(fixture).unwrap()
    }

    #[test]
    fn test_insert_text_at_caret() {
        let mut d = doc("fo[]o");
        d.insert_text("XY").unwrap();
        assert_eq!(d.to_fixture(), "foXY[]o\n");
    }

    #[test]
    fn test_insert_text_replaces_selection_across_blocks() {
        let mut d = doc("a[bc\n\nde]f");
        d.insert_text("-").unwrap();
        assert_eq!(d.to_fixture(), "a-[]f\n");
    }

    #[test]
    fn test_insert_multibyte_text() {
        let mut d = doc("ż[]ółw");
        d.insert_text("é").unwrap();
        assert_eq!(d.to_fixture(), "żé[]ółw\n");
    }

    #[test]
    fn test_split_list_item_keeps_attributes() {
        let mut d = doc("- a\n  - fo[]o");
        d.split_block().unwrap();

        let blocks = d.blocks();
        assert_eq!(blocks.len(), 3);
        assert_eq!(d.list_attributes(blocks[2]), Some((ListType::Bulleted, 1)));
        assert_eq!(d.to_fixture(), "- a\n  - fo\n  - []o\n");
    }

    #[test]
    fn test_split_heading_continues_as_paragraph() {
        let mut d = doc("# Ti[]tle");
        d.split_block().unwrap();
        assert_eq!(d.to_fixture(), "# Ti\n\n[]tle\n");
    }

    #[test]
    fn test_delete_backward_character() {
        let mut d = doc("ab[]c");
        d.delete_backward(DeleteUnit::Character).unwrap();
        assert_eq!(d.to_fixture(), "a[]c\n");
    }

    #[test]
    fn test_delete_backward_word() {
        let mut d = doc("one two []three");
        d.delete_backward(DeleteUnit::Word).unwrap();
        assert_eq!(d.to_fixture(), "one []three\n");
    }

    #[test]
    fn test_delete_backward_merges_with_previous_block() {
        let mut d = doc("- foo\n- []bar");
        d.delete_backward(DeleteUnit::Character).unwrap();
        assert_eq!(d.to_fixture(), "- foo[]bar\n");
    }

    #[test]
    fn test_delete_backward_at_document_start_is_noop() {
        let mut d = doc("[]foo");
        d.delete_backward(DeleteUnit::Character).unwrap();
        assert_eq!(d.to_fixture(), "[]foo\n");
    }

    #[test]
    fn test_delete_backward_out_of_quote_prunes_it() {
        let mut d = doc("x\n\n> []y");
        d.delete_backward(DeleteUnit::Character).unwrap();
        assert_eq!(d.to_fixture(), "x[]y\n");
    }

    #[test]
    fn test_delete_forward_merges_next_block() {
        let mut d = doc("foo[]\n\nbar");
        d.delete_forward(DeleteUnit::Character).unwrap();
        assert_eq!(d.to_fixture(), "foo[]bar\n");
    }

    #[test]
    fn test_delete_forward_word() {
        let mut d = doc("[]one two");
        d.delete_forward(DeleteUnit::Word).unwrap();
        assert_eq!(d.to_fixture(), "[] two\n");
    }

    #[test]
    fn test_move_caret_crosses_blocks() {
        let mut d = doc("ab\n\n[]cd");
        d.move_caret(Motion::Left).unwrap();
        assert_eq!(d.to_fixture(), "ab[]\n\ncd\n");

        d.move_caret(Motion::Right).unwrap();
        d.move_caret(Motion::LineEnd).unwrap();
        assert_eq!(d.to_fixture(), "ab\n\ncd[]\n");

        d.move_caret(Motion::Up).unwrap();
        assert_eq!(d.to_fixture(), "ab[]\n\ncd\n");
    }
}
