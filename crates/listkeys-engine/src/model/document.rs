use std::cmp::Ordering;

use thiserror::Error;

use super::{BlockKind, ListType, NodeId, NodeInfo, NodeKind, Position, Selection};

/// Structural errors raised by document mutation and selection validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("node {0} is detached from the document")]
    Detached(NodeId),

    #[error("node {0} is not a text block")]
    NotATextBlock(NodeId),

    #[error("node {0} cannot contain children")]
    NotAContainer(NodeId),

    #[error("offset {offset} is out of range for node {node} (length {len})")]
    OffsetOutOfRange {
        node: NodeId,
        offset: usize,
        len: usize,
    },
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    text: String,
}

/// One text block flattened for display and assertions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    /// Number of block quotes wrapping the block
    pub quote_depth: usize,
    pub kind: BlockKind,
    pub text: String,
}

/// Arena-backed document tree with a single selection.
///
/// Nodes are never freed: removing a node detaches it from its parent, and any
/// `NodeId` or `Position` still pointing at it then fails validation. This is what
/// makes a stale selection observable as "no selection" instead of a panic.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    selection: Selection,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document holding one empty paragraph with the caret in it
    pub fn new() -> Self {
        let mut doc = Self::bare();
        doc.ensure_block();
        doc
    }

    /// Root-only document; callers must add a block before using the selection
    pub(crate) fn bare() -> Self {
        let root = NodeId(0);
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
                text: String::new(),
            }],
            root,
            selection: Selection::collapsed(Position::new(root, 0)),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> Result<&Node, ModelError> {
        self.nodes.get(id.0).ok_or(ModelError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, ModelError> {
        self.nodes.get_mut(id.0).ok_or(ModelError::UnknownNode(id))
    }

    /// Attached node lookup
    fn live(&self, id: NodeId) -> Result<&Node, ModelError> {
        let node = self.node(id)?;
        if !self.is_attached(id) {
            return Err(ModelError::Detached(id));
        }
        Ok(node)
    }

    /// Whether the node is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes.get(current.0).and_then(|node| node.parent) {
                Some(parent) => {
                    // The parent must still list the child, otherwise the link is stale
                    let listed = self
                        .nodes
                        .get(parent.0)
                        .is_some_and(|p| p.children.contains(&current));
                    if !listed {
                        return false;
                    }
                    current = parent;
                }
                None => return false,
            }
        }
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.live(id).ok().map(|node| &node.kind)
    }

    pub fn node_info(&self, id: NodeId) -> Option<NodeInfo> {
        self.kind(id).map(|kind| NodeInfo::new(id, kind.clone()))
    }

    pub fn block_kind(&self, id: NodeId) -> Option<&BlockKind> {
        self.kind(id).and_then(NodeKind::as_block)
    }

    pub fn list_attributes(&self, id: NodeId) -> Option<(ListType, usize)> {
        self.block_kind(id).and_then(BlockKind::list_attributes)
    }

    /// Text of a block, `None` for containers and unknown nodes
    pub fn text(&self, id: NodeId) -> Option<&str> {
        let node = self.live(id).ok()?;
        match node.kind {
            NodeKind::Block(_) => Some(node.text.as_str()),
            _ => None,
        }
    }

    /// Length of a block's text in chars
    pub fn char_len(&self, id: NodeId) -> Option<usize> {
        self.text(id).map(|text| text.chars().count())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.live(id).ok().and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.live(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    fn index_in_parent(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.children(parent).iter().position(|&c| c == id)?;
        Some((parent, index))
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Number of block quotes between the node and the root
    pub fn quote_depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(node) = current {
            if self.kind(node) == Some(&NodeKind::BlockQuote) {
                depth += 1;
            }
            current = self.parent(node);
        }
        depth
    }

    fn push_node(&mut self, kind: NodeKind, text: String) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
            text,
        });
        id
    }

    fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        kind: NodeKind,
        text: String,
    ) -> Result<NodeId, ModelError> {
        if !self.live(parent)?.kind.is_container() {
            return Err(ModelError::NotAContainer(parent));
        }
        let id = self.push_node(kind, text);
        self.node_mut(id)?.parent = Some(parent);
        let children = &mut self.node_mut(parent)?.children;
        let index = index.min(children.len());
        children.insert(index, id);
        Ok(id)
    }

    /// Append a text block as the last child of a container
    pub fn append_block(
        &mut self,
        parent: NodeId,
        kind: BlockKind,
        text: impl Into<String>,
    ) -> Result<NodeId, ModelError> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, NodeKind::Block(kind), text.into())
    }

    /// Append an empty block quote as the last child of a container
    pub fn append_block_quote(&mut self, parent: NodeId) -> Result<NodeId, ModelError> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, NodeKind::BlockQuote, String::new())
    }

    /// Insert a text block directly after `sibling`, in the same container
    pub(crate) fn insert_block_after(
        &mut self,
        sibling: NodeId,
        kind: BlockKind,
        text: String,
    ) -> Result<NodeId, ModelError> {
        let (parent, index) = self
            .index_in_parent(sibling)
            .ok_or(ModelError::Detached(sibling))?;
        self.insert_child(parent, index + 1, NodeKind::Block(kind), text)
    }

    /// Change a block's kind, keeping its text
    pub fn set_block_kind(&mut self, id: NodeId, kind: BlockKind) -> Result<(), ModelError> {
        let node = self.live(id)?;
        if !matches!(node.kind, NodeKind::Block(_)) {
            return Err(ModelError::NotATextBlock(id));
        }
        self.node_mut(id)?.kind = NodeKind::Block(kind);
        Ok(())
    }

    pub(crate) fn text_mut(&mut self, id: NodeId) -> Result<&mut String, ModelError> {
        let node = self.live(id)?;
        if !matches!(node.kind, NodeKind::Block(_)) {
            return Err(ModelError::NotATextBlock(id));
        }
        Ok(&mut self.node_mut(id)?.text)
    }

    /// Detach a node, pruning block quotes left empty by the removal.
    ///
    /// The root always keeps at least one block.
    pub(crate) fn remove(&mut self, id: NodeId) -> Result<(), ModelError> {
        let (parent, index) = self.index_in_parent(id).ok_or(ModelError::Detached(id))?;
        self.node_mut(parent)?.children.remove(index);
        self.node_mut(id)?.parent = None;

        if parent != self.root && self.children(parent).is_empty() {
            return self.remove(parent);
        }
        self.ensure_block();
        Ok(())
    }

    /// Make sure the document has a block to hold the caret
    pub(crate) fn ensure_block(&mut self) {
        if self.blocks().is_empty() {
            let root = self.root;
            let block = self.push_node(NodeKind::Block(BlockKind::Paragraph), String::new());
            self.nodes[block.0].parent = Some(root);
            self.nodes[root.0].children.push(block);
            self.selection = Selection::collapsed(Position::new(block, 0));
        }
    }

    /// All attached text blocks in document order
    pub fn blocks(&self) -> Vec<NodeId> {
        let mut blocks = Vec::new();
        self.collect_blocks(self.root, &mut blocks);
        blocks
    }

    fn collect_blocks(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in self.children(id) {
            match self.kind(child) {
                Some(NodeKind::Block(_)) => out.push(child),
                Some(_) => self.collect_blocks(child, out),
                None => {}
            }
        }
    }

    /// All attached containers (root first, then block quotes in document order)
    pub(crate) fn containers(&self) -> Vec<NodeId> {
        let mut containers = vec![self.root];
        let mut index = 0;
        while let Some(&container) = containers.get(index) {
            for &child in self.children(container) {
                if self.kind(child) == Some(&NodeKind::BlockQuote) {
                    containers.push(child);
                }
            }
            index += 1;
        }
        containers
    }

    pub(crate) fn previous_block(&self, id: NodeId) -> Option<NodeId> {
        let blocks = self.blocks();
        let index = blocks.iter().position(|&b| b == id)?;
        index.checked_sub(1).map(|i| blocks[i])
    }

    pub(crate) fn next_block(&self, id: NodeId) -> Option<NodeId> {
        let blocks = self.blocks();
        let index = blocks.iter().position(|&b| b == id)?;
        blocks.get(index + 1).copied()
    }

    /// Check that a position points inside an attached text block
    pub fn validate(&self, position: Position) -> Result<(), ModelError> {
        let len = self
            .char_len(position.node)
            .ok_or_else(|| match self.live(position.node) {
                Ok(_) => ModelError::NotATextBlock(position.node),
                Err(err) => err,
            })?;
        if position.offset > len {
            return Err(ModelError::OffsetOutOfRange {
                node: position.node,
                offset: position.offset,
                len,
            });
        }
        Ok(())
    }

    /// The current selection, or `None` when it points at removed content
    pub fn selection(&self) -> Option<Selection> {
        let selection = self.selection;
        (self.validate(selection.anchor).is_ok() && self.validate(selection.focus).is_ok())
            .then_some(selection)
    }

    pub fn set_selection(&mut self, selection: Selection) -> Result<(), ModelError> {
        self.validate(selection.anchor)?;
        self.validate(selection.focus)?;
        self.selection = selection;
        Ok(())
    }

    pub fn set_caret(&mut self, position: Position) -> Result<(), ModelError> {
        self.set_selection(Selection::collapsed(position))
    }

    /// Selection stored without validation, used while restructuring
    pub(crate) fn raw_selection(&self) -> Selection {
        self.selection
    }

    /// Document-order comparison of two positions
    pub fn compare(&self, a: Position, b: Position) -> Option<Ordering> {
        if a.node == b.node {
            return Some(a.offset.cmp(&b.offset));
        }
        let blocks = self.blocks();
        let ia = blocks.iter().position(|&n| n == a.node)?;
        let ib = blocks.iter().position(|&n| n == b.node)?;
        Some(ia.cmp(&ib))
    }

    /// Selection boundaries as `(start, end)` in document order
    pub fn selection_range(&self) -> Option<(Position, Position)> {
        let selection = self.selection()?;
        match self.compare(selection.anchor, selection.focus)? {
            Ordering::Greater => Some((selection.focus, selection.anchor)),
            _ => Some((selection.anchor, selection.focus)),
        }
    }

    /// Whether the focus lies before the anchor
    pub fn is_backward(&self) -> bool {
        self.selection()
            .and_then(|s| self.compare(s.anchor, s.focus))
            .is_some_and(|order| order == Ordering::Greater)
    }

    /// Blocks touched by the selection, in document order.
    ///
    /// A non-collapsed selection ending at offset 0 of a block does not select
    /// that block.
    pub fn selected_blocks(&self) -> Vec<NodeId> {
        let Some((start, end)) = self.selection_range() else {
            return Vec::new();
        };
        let blocks = self.blocks();
        let (Some(first), Some(mut last)) = (
            blocks.iter().position(|&b| b == start.node),
            blocks.iter().position(|&b| b == end.node),
        ) else {
            return Vec::new();
        };
        if last > first && end.offset == 0 {
            last -= 1;
        }
        blocks[first..=last].to_vec()
    }

    /// Restore the list indent invariant in every container.
    ///
    /// Within a run of consecutive list items the first item sits at indent 0 and
    /// no item is more than one level deeper than the item before it. An item that
    /// violates this is pulled back, and the items nested below it follow by the
    /// same amount so the shape of the sub-list survives.
    pub fn fix_list_indents(&mut self) -> bool {
        let mut changed = false;
        for container in self.containers() {
            let children = self.children(container).to_vec();
            let mut max_indent = 0;
            let mut fix_by: Option<usize> = None;

            for child in children {
                let Some((list_type, indent)) = self.list_attributes(child) else {
                    max_indent = 0;
                    fix_by = None;
                    continue;
                };

                if indent > max_indent {
                    let shift = match fix_by {
                        None => indent - max_indent,
                        Some(previous) => previous.min(indent),
                    };
                    fix_by = Some(shift);
                    let fixed = indent - shift;
                    if self
                        .set_block_kind(child, BlockKind::list_item(list_type, fixed))
                        .is_ok()
                    {
                        changed = true;
                    }
                } else {
                    fix_by = None;
                    max_indent = indent + 1;
                }
            }
        }
        changed
    }

    /// Flat view of all blocks with their quote depth
    pub fn outline(&self) -> Vec<OutlineEntry> {
        self.blocks()
            .into_iter()
            .filter_map(|id| {
                Some(OutlineEntry {
                    quote_depth: self.quote_depth(id),
                    kind: self.block_kind(id)?.clone(),
                    text: self.text(id)?.to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bulleted(indent: usize) -> BlockKind {
        BlockKind::list_item(ListType::Bulleted, indent)
    }

    fn indents(doc: &Document) -> Vec<Option<usize>> {
        doc.blocks()
            .into_iter()
            .map(|id| doc.list_attributes(id).map(|(_, indent)| indent))
            .collect()
    }

    #[test]
    fn test_new_document_has_caret_in_empty_paragraph() {
        let doc = Document::new();
        let blocks = doc.blocks();

        assert_eq!(blocks.len(), 1);
        assert_eq!(doc.block_kind(blocks[0]), Some(&BlockKind::Paragraph));
        assert_eq!(
            doc.selection(),
            Some(Selection::collapsed(Position::new(blocks[0], 0)))
        );
    }

    #[test]
    fn test_blocks_are_listed_in_document_order_across_quotes() {
        let mut doc = Document::bare();
        let root = doc.root();
        let a = doc.append_block(root, BlockKind::Paragraph, "a").unwrap();
        let quote = doc.append_block_quote(root).unwrap();
        let b = doc.append_block(quote, bulleted(0), "b").unwrap();
        let inner = doc.append_block_quote(quote).unwrap();
        let c = doc.append_block(inner, BlockKind::Paragraph, "c").unwrap();
        let d = doc.append_block(root, bulleted(0), "d").unwrap();

        assert_eq!(doc.blocks(), vec![a, b, c, d]);
        assert_eq!(doc.quote_depth(c), 2);
        assert_eq!(doc.quote_depth(d), 0);
    }

    #[test]
    fn test_append_to_block_is_rejected() {
        let mut doc = Document::new();
        let block = doc.blocks()[0];

        let result = doc.append_block(block, BlockKind::Paragraph, "x");

        assert_eq!(result, Err(ModelError::NotAContainer(block)));
    }

    #[test]
    fn test_selection_pointing_at_removed_block_is_none() {
        let mut doc = Document::bare();
        let root = doc.root();
        let a = doc.append_block(root, BlockKind::Paragraph, "a").unwrap();
        let b = doc.append_block(root, BlockKind::Paragraph, "b").unwrap();
        doc.set_caret(Position::new(b, 1)).unwrap();

        doc.remove(b).unwrap();

        assert!(!doc.is_attached(b));
        assert_eq!(doc.selection(), None);
        assert_eq!(doc.blocks(), vec![a]);
    }

    #[test]
    fn test_removing_last_child_prunes_empty_quotes() {
        let mut doc = Document::bare();
        let root = doc.root();
        let a = doc.append_block(root, BlockKind::Paragraph, "a").unwrap();
        let outer = doc.append_block_quote(root).unwrap();
        let inner = doc.append_block_quote(outer).unwrap();
        let b = doc.append_block(inner, BlockKind::Paragraph, "b").unwrap();

        doc.remove(b).unwrap();

        assert_eq!(doc.children(root), &[a]);
        assert!(!doc.is_attached(inner));
    }

    #[test]
    fn test_removing_only_block_leaves_empty_paragraph() {
        let mut doc = Document::new();
        let only = doc.blocks()[0];

        doc.remove(only).unwrap();

        let blocks = doc.blocks();
        assert_eq!(blocks.len(), 1);
        assert_ne!(blocks[0], only);
        assert!(doc.selection().is_some());
    }

    #[test]
    fn test_set_selection_rejects_offset_past_end() {
        let mut doc = Document::bare();
        let root = doc.root();
        let a = doc.append_block(root, BlockKind::Paragraph, "ab").unwrap();

        let result = doc.set_caret(Position::new(a, 3));

        assert_eq!(
            result,
            Err(ModelError::OffsetOutOfRange {
                node: a,
                offset: 3,
                len: 2
            })
        );
    }

    #[test]
    fn test_backward_selection() {
        let mut doc = Document::bare();
        let root = doc.root();
        let a = doc.append_block(root, BlockKind::Paragraph, "abc").unwrap();
        let b = doc.append_block(root, BlockKind::Paragraph, "def").unwrap();

        doc.set_selection(Selection::range(Position::new(b, 1), Position::new(a, 2)))
            .unwrap();

        assert!(doc.is_backward());
        assert_eq!(
            doc.selection_range(),
            Some((Position::new(a, 2), Position::new(b, 1)))
        );
    }

    #[test]
    fn test_selected_blocks_skips_block_ending_at_offset_zero() {
        let mut doc = Document::bare();
        let root = doc.root();
        let a = doc.append_block(root, bulleted(0), "a").unwrap();
        let b = doc.append_block(root, bulleted(0), "b").unwrap();
        let c = doc.append_block(root, bulleted(0), "c").unwrap();

        doc.set_selection(Selection::range(Position::new(a, 0), Position::new(c, 0)))
            .unwrap();

        assert_eq!(doc.selected_blocks(), vec![a, b]);
    }

    #[test]
    fn test_fix_list_indents_pulls_back_orphaned_sub_list() {
        let mut doc = Document::bare();
        let root = doc.root();
        doc.append_block(root, BlockKind::Paragraph, "p").unwrap();
        doc.append_block(root, bulleted(1), "a").unwrap();
        doc.append_block(root, bulleted(1), "b").unwrap();
        doc.append_block(root, bulleted(2), "c").unwrap();
        doc.append_block(root, bulleted(3), "d").unwrap();

        assert!(doc.fix_list_indents());

        assert_eq!(indents(&doc), vec![None, Some(0), Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_fix_list_indents_leaves_valid_lists_alone() {
        let mut doc = Document::bare();
        let root = doc.root();
        doc.append_block(root, bulleted(0), "a").unwrap();
        doc.append_block(root, bulleted(1), "b").unwrap();
        doc.append_block(root, bulleted(0), "c").unwrap();

        assert!(!doc.fix_list_indents());
        assert_eq!(indents(&doc), vec![Some(0), Some(1), Some(0)]);
    }

    #[test]
    fn test_fix_list_indents_runs_inside_quotes() {
        let mut doc = Document::bare();
        let root = doc.root();
        let quote = doc.append_block_quote(root).unwrap();
        doc.append_block(quote, bulleted(2), "a").unwrap();

        doc.fix_list_indents();

        assert_eq!(indents(&doc), vec![Some(0)]);
    }
}
