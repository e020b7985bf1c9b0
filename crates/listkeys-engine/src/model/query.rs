//! Read-only document queries used to classify input events.
//!
//! `DocumentQuery` is the seam between the dispatcher and whatever owns the
//! document. Every method answers `None` when the question cannot be answered
//! (unknown or detached node, stale position), which callers treat as "the rule
//! does not match". The free functions at the bottom are pure and work on the
//! owned values the trait returns, so they can be tested with synthetic chains.

use super::{Document, NodeId, NodeInfo, NodeKind, Position, Selection};

pub trait DocumentQuery {
    /// Current selection, if it points at live content
    fn selection(&self) -> Option<Selection>;

    fn node_info(&self, node: NodeId) -> Option<NodeInfo>;

    /// The block containing `position` followed by its ancestors up to the root
    fn ancestors(&self, position: Position) -> Option<AncestorChain>;

    /// Whether `position` is the first caret position of its block
    fn is_block_start(&self, position: Position) -> Option<bool>;

    /// Whether a block has no text at all
    fn is_block_empty(&self, node: NodeId) -> Option<bool>;

    /// Siblings before `node` within its parent, nearest first
    fn preceding_siblings(&self, node: NodeId) -> Option<Vec<NodeInfo>>;
}

/// Ancestor chain of a position, innermost first, ending with the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorChain {
    entries: Vec<NodeInfo>,
}

impl AncestorChain {
    pub fn new(entries: Vec<NodeInfo>) -> Self {
        Self { entries }
    }

    /// The block that directly contains the position
    pub fn innermost(&self) -> Option<&NodeInfo> {
        self.entries.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeInfo> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Containers (block quotes and the root) above the innermost block
    pub fn containers(&self) -> impl Iterator<Item = &NodeInfo> {
        self.entries.iter().filter(|entry| entry.kind.is_container())
    }

    pub fn quote_depth(&self) -> usize {
        self.entries.iter().filter(|e| e.is_block_quote()).count()
    }
}

impl DocumentQuery for Document {
    fn selection(&self) -> Option<Selection> {
        Document::selection(self)
    }

    fn node_info(&self, node: NodeId) -> Option<NodeInfo> {
        Document::node_info(self, node)
    }

    fn ancestors(&self, position: Position) -> Option<AncestorChain> {
        self.validate(position).ok()?;
        let mut entries = vec![self.node_info(position.node)?];
        let mut current = self.parent(position.node);
        while let Some(node) = current {
            entries.push(self.node_info(node)?);
            current = self.parent(node);
        }
        match entries.last() {
            Some(last) if last.kind == NodeKind::Root => Some(AncestorChain::new(entries)),
            _ => None,
        }
    }

    fn is_block_start(&self, position: Position) -> Option<bool> {
        self.validate(position).ok()?;
        Some(position.offset == 0)
    }

    fn is_block_empty(&self, node: NodeId) -> Option<bool> {
        self.text(node).map(str::is_empty)
    }

    fn preceding_siblings(&self, node: NodeId) -> Option<Vec<NodeInfo>> {
        let parent = self.parent(node)?;
        let children = self.children(parent);
        let index = children.iter().position(|&c| c == node)?;
        children[..index]
            .iter()
            .rev()
            .map(|&sibling| self.node_info(sibling))
            .collect()
    }
}

/// The closest list item in the chain, walking outwards from the position
pub fn closest_list_item(chain: &AncestorChain) -> Option<&NodeInfo> {
    chain.iter().find(|entry| entry.is_list_item())
}

/// Whether an item at `indent` opens its list.
///
/// `preceding` holds the item's earlier siblings, nearest first. Only the
/// uninterrupted run of list items directly before the item belongs to the same
/// list; anything else (a paragraph, a block quote) ends the walk. The item is
/// first when no item of that run sits at the same or a lower indent.
pub fn is_first_in_list(indent: usize, preceding: &[NodeInfo]) -> bool {
    for sibling in preceding {
        match sibling.list_attributes() {
            Some((_, sibling_indent)) if sibling_indent <= indent => return false,
            Some(_) => continue,
            None => return true,
        }
    }
    true
}
