//! In-memory document model.
//!
//! The document is a small tree: a root, any number of nested block quotes, and
//! text blocks as leaves. List items are *flat* blocks carrying a list type and
//! an indent depth rather than nested list containers, so "nesting" of a list
//! is expressed entirely through the `indent` attribute of consecutive siblings.
//!
//! ```text
//! Root
//! ├── Paragraph "x"
//! ├── BlockQuote
//! │   ├── ListItem { Bulleted, indent: 0 } "foo"
//! │   └── ListItem { Bulleted, indent: 1 } "bar"
//! └── ListItem { Numbered, indent: 0 } "baz"
//! ```
//!
//! - **`document`**: the `Document` arena, structure mutation and the list post-fixer
//! - **`selection`**: `Position` and `Selection`
//! - **`query`**: the read-only `DocumentQuery` seam plus pure helpers over ancestor chains
//! - **`editing`**: host default behaviours (typing, splitting, deleting, caret motion)
//! - **`markdown`**: import/export through pulldown-cmark, and selection fixtures

pub mod document;
pub mod editing;
pub mod markdown;
pub mod query;
pub mod selection;

pub use document::{Document, ModelError, OutlineEntry};
pub use editing::{DeleteUnit, Motion};
pub use query::{AncestorChain, DocumentQuery};
pub use selection::{Position, Selection};

use std::fmt;

/// Stable identifier of a node inside one `Document`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of list a list item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListType {
    /// Unordered list ("- item")
    Bulleted,
    /// Ordered list ("1. item")
    Numbered,
}

/// Text-carrying block kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading { level: u8 },
    ListItem { list_type: ListType, indent: usize },
}

impl BlockKind {
    pub fn list_item(list_type: ListType, indent: usize) -> Self {
        BlockKind::ListItem { list_type, indent }
    }

    /// List type and indent when this block is a list item
    pub fn list_attributes(&self) -> Option<(ListType, usize)> {
        match self {
            BlockKind::ListItem { list_type, indent } => Some((*list_type, *indent)),
            _ => None,
        }
    }
}

/// Kind of any node in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    BlockQuote,
    Block(BlockKind),
}

impl NodeKind {
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::BlockQuote)
    }

    pub fn as_block(&self) -> Option<&BlockKind> {
        match self {
            NodeKind::Block(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Snapshot of one node as seen by queries.
///
/// Queries hand out owned `NodeInfo`s rather than references into the tree so
/// classification code can hold them while the document is later mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub id: NodeId,
    pub kind: NodeKind,
}

impl NodeInfo {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self { id, kind }
    }

    pub fn list_attributes(&self) -> Option<(ListType, usize)> {
        self.kind.as_block().and_then(BlockKind::list_attributes)
    }

    pub fn is_list_item(&self) -> bool {
        self.list_attributes().is_some()
    }

    pub fn is_block_quote(&self) -> bool {
        self.kind == NodeKind::BlockQuote
    }
}
