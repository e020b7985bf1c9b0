//! Markdown import/export and selection fixtures.
//!
//! Import walks pulldown-cmark events and flattens nested lists into list items
//! carrying an indent, the way the document model stores them:
//!
//! ```markdown
//! - Parent
//!   - Child
//! > - Quoted
//! ```
//!
//! becomes `ListItem(indent 0) "Parent"`, `ListItem(indent 1) "Child"` and a
//! block quote holding `ListItem(indent 0) "Quoted"`. Indents restart at 0 inside
//! every block quote.
//!
//! Fixtures are Markdown with the selection marked inline: `[]` is a collapsed
//! caret, `[` and `]` delimit a range (possibly spanning blocks).

use std::collections::HashMap;

use pulldown_cmark::{Event, Parser, Tag};

use super::{BlockKind, Document, ListType, ModelError, NodeId, NodeKind, Position, Selection};

/// Open pulldown-cmark tag, tracked so end events need no variant matching
#[derive(Debug, Clone, Copy, PartialEq)]
enum Frame {
    Paragraph,
    Heading,
    List,
    Item,
    BlockQuote,
    CodeBlock,
    Other,
}

/// List nesting state of one container
#[derive(Debug, Default)]
struct ListContext {
    /// Types of the currently open lists, outermost first
    lists: Vec<ListType>,
    /// Kinds of the currently open items, outermost first
    items: Vec<BlockKind>,
}

struct PendingBlock {
    kind: BlockKind,
    text: String,
}

struct MarkdownProcessor {
    doc: Document,
    containers: Vec<NodeId>,
    contexts: Vec<ListContext>,
    frames: Vec<Frame>,
    pending: Option<PendingBlock>,
}

impl MarkdownProcessor {
    fn new() -> Self {
        let doc = Document::bare();
        let root = doc.root();
        Self {
            doc,
            containers: vec![root],
            contexts: vec![ListContext::default()],
            frames: Vec::new(),
            pending: None,
        }
    }

    fn container(&self) -> NodeId {
        self.containers.last().copied().unwrap_or(self.doc.root())
    }

    fn context(&mut self) -> &mut ListContext {
        if self.contexts.is_empty() {
            self.contexts.push(ListContext::default());
        }
        let last = self.contexts.len() - 1;
        &mut self.contexts[last]
    }

    /// Kind for a block opened at the current nesting: the open item's, or a paragraph
    fn block_kind_here(&mut self) -> BlockKind {
        self.context()
            .items
            .last()
            .cloned()
            .unwrap_or(BlockKind::Paragraph)
    }

    fn begin(&mut self, kind: BlockKind) -> Result<(), ModelError> {
        self.flush()?;
        self.pending = Some(PendingBlock {
            kind,
            text: String::new(),
        });
        Ok(())
    }

    fn push_text(&mut self, text: &str) {
        if self.pending.is_none() {
            let kind = self.block_kind_here();
            self.pending = Some(PendingBlock {
                kind,
                text: String::new(),
            });
        }
        if let Some(pending) = self.pending.as_mut() {
            pending.text.push_str(text);
        }
    }

    /// Emit the pending block into the current container
    fn flush(&mut self) -> Result<(), ModelError> {
        if let Some(pending) = self.pending.take() {
            let text = pending.text.trim_end_matches('\n').replace('\n', " ");
            let container = self.container();
            self.doc.append_block(container, pending.kind, text)?;
        }
        Ok(())
    }

    fn process_event(&mut self, event: Event) -> Result<(), ModelError> {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => self.end(),
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                self.push_text(&text);
                Ok(())
            }
            Event::Code(code) => {
                self.push_text(&format!("`{code}`"));
                Ok(())
            }
            Event::SoftBreak | Event::HardBreak => {
                self.push_text(" ");
                Ok(())
            }
            Event::Rule => self.flush(),
            _ => Ok(()),
        }
    }

    fn start(&mut self, tag: Tag) -> Result<(), ModelError> {
        let frame = match tag {
            Tag::Paragraph => {
                // The first paragraph of an item fills the item block itself
                let reuse = matches!(
                    &self.pending,
                    Some(p) if p.text.is_empty() && p.kind.list_attributes().is_some()
                );
                if !reuse {
                    let kind = self.block_kind_here();
                    self.begin(kind)?;
                }
                Frame::Paragraph
            }
            Tag::Heading { level, .. } => {
                self.begin(BlockKind::Heading { level: level as u8 })?;
                Frame::Heading
            }
            Tag::List(first_number) => {
                self.flush()?;
                let list_type = match first_number {
                    Some(_) => ListType::Numbered,
                    None => ListType::Bulleted,
                };
                self.context().lists.push(list_type);
                Frame::List
            }
            Tag::Item => {
                let context = self.context();
                let indent = context.lists.len().saturating_sub(1);
                let list_type = context.lists.last().copied().unwrap_or(ListType::Bulleted);
                let kind = BlockKind::list_item(list_type, indent);
                context.items.push(kind.clone());
                self.begin(kind)?;
                Frame::Item
            }
            Tag::BlockQuote(_) => {
                self.flush()?;
                let container = self.container();
                let quote = self.doc.append_block_quote(container)?;
                self.containers.push(quote);
                self.contexts.push(ListContext::default());
                Frame::BlockQuote
            }
            Tag::CodeBlock(_) => {
                let kind = self.block_kind_here();
                self.begin(kind)?;
                Frame::CodeBlock
            }
            _ => Frame::Other,
        };
        self.frames.push(frame);
        Ok(())
    }

    fn end(&mut self) -> Result<(), ModelError> {
        match self.frames.pop() {
            Some(Frame::Paragraph | Frame::Heading | Frame::CodeBlock) => self.flush(),
            Some(Frame::List) => {
                self.flush()?;
                self.context().lists.pop();
                Ok(())
            }
            Some(Frame::Item) => {
                // Flushing here keeps empty items ("- ") as empty list items
                self.flush()?;
                self.context().items.pop();
                Ok(())
            }
            Some(Frame::BlockQuote) => {
                self.flush()?;
                self.contexts.pop();
                if let Some(quote) = self.containers.pop()
                    && self.doc.children(quote).is_empty()
                {
                    self.doc.remove(quote)?;
                }
                Ok(())
            }
            Some(Frame::Other) | None => Ok(()),
        }
    }

    fn finalize(mut self) -> Result<Document, ModelError> {
        self.flush()?;
        let mut doc = self.doc;
        doc.ensure_block();
        doc.fix_list_indents();
        if let Some(&first) = doc.blocks().first() {
            doc.set_caret(Position::new(first, 0))?;
        }
        Ok(doc)
    }
}

fn char_offset(text: &str, byte_index: usize) -> usize {
    text[..byte_index].chars().count()
}

/// Backslash-escape a leading block marker so block text reads back as text.
///
/// Covers list bullets (`- `, `* `, `+ `), ordered list numbers (`1. `, `2) `),
/// ATX headings, block quotes, thematic breaks and code fences.
fn escape_block_start(text: &str) -> String {
    let start = text.len() - text.trim_start_matches([' ', '\t']).len();
    let rest = &text[start..];
    let ends_marker = |s: &str| s.is_empty() || s.starts_with([' ', '\t']);

    let escape_at = match rest.chars().next() {
        Some('>') => Some(start),
        Some('-' | '*' | '+') if ends_marker(&rest[1..]) => Some(start),
        Some(c @ ('-' | '*' | '_')) if is_thematic_break(rest, c) => Some(start),
        Some('`' | '~') if rest.starts_with("```") || rest.starts_with("~~~") => Some(start),
        Some('#') => {
            let hashes = rest.len() - rest.trim_start_matches('#').len();
            (hashes <= 6 && ends_marker(&rest[hashes..])).then_some(start)
        }
        Some('0'..='9') => {
            let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            let after = &rest[digits..];
            (digits <= 9 && after.starts_with(['.', ')']) && ends_marker(&after[1..]))
                .then_some(start + digits)
        }
        _ => None,
    };

    match escape_at {
        Some(index) => format!("{}\\{}", &text[..index], &text[index..]),
        None => text.to_string(),
    }
}

/// Three or more `c` with nothing but spaces between them
fn is_thematic_break(line: &str, c: char) -> bool {
    line.chars().all(|ch| ch == c || ch == ' ' || ch == '\t')
        && line.chars().filter(|&ch| ch == c).count() >= 3
}

impl Document {
    /// Parse Markdown into a document with the caret at the start of the first block
    pub fn from_markdown(markdown: &str) -> anyhow::Result<Self> {
        let mut processor = MarkdownProcessor::new();
        for event in Parser::new(markdown) {
            processor.process_event(event)?;
        }
        Ok(processor.finalize()?)
    }

    /// Parse a Markdown fixture whose selection is marked with `[]` or `[`...`]`
    pub fn from_fixture(fixture: &str) -> anyhow::Result<Self> {
        let mut doc = Self::from_markdown(fixture)?;
        let blocks = doc.blocks();

        for &block in &blocks {
            let text = doc.text(block).unwrap_or_default();
            if let Some(index) = text.find("[]") {
                let offset = char_offset(text, index);
                doc.text_mut(block)?.replace_range(index..index + 2, "");
                doc.set_caret(Position::new(block, offset))?;
                return Ok(doc);
            }
        }

        let mut anchor: Option<(usize, usize)> = None;
        for (block_index, &block) in blocks.iter().enumerate() {
            let text = doc.text(block).unwrap_or_default();
            let search_from = match anchor {
                Some((anchor_block, byte)) if anchor_block == block_index => byte,
                Some(_) => 0,
                None => match text.find('[') {
                    Some(byte) => {
                        doc.text_mut(block)?.remove(byte);
                        anchor = Some((block_index, byte));
                        byte
                    }
                    None => continue,
                },
            };

            let text = doc.text(block).unwrap_or_default();
            if let Some(found) = text[search_from..].find(']') {
                let byte = search_from + found;
                let focus_offset = char_offset(text, byte);
                doc.text_mut(block)?.remove(byte);

                let (anchor_block, anchor_byte) = anchor.unwrap_or((block_index, byte));
                let anchor_node = blocks[anchor_block];
                let anchor_text = doc.text(anchor_node).unwrap_or_default();
                let anchor_offset = char_offset(anchor_text, anchor_byte);

                doc.set_selection(Selection::range(
                    Position::new(anchor_node, anchor_offset),
                    Position::new(block, focus_offset),
                ))?;
                return Ok(doc);
            }
        }

        Ok(doc)
    }

    /// Serialize to Markdown
    pub fn to_markdown(&self) -> String {
        self.render(&HashMap::new())
    }

    /// Serialize to Markdown with the selection marked like `from_fixture` expects
    pub fn to_fixture(&self) -> String {
        let mut markers: HashMap<NodeId, Vec<(usize, &'static str)>> = HashMap::new();
        if let Some((start, end)) = self.selection_range() {
            if start == end {
                markers.entry(start.node).or_default().push((start.offset, "[]"));
            } else {
                markers.entry(start.node).or_default().push((start.offset, "["));
                markers.entry(end.node).or_default().push((end.offset, "]"));
            }
        }
        self.render(&markers)
    }

    fn render(&self, markers: &HashMap<NodeId, Vec<(usize, &'static str)>>) -> String {
        let mut lines = Vec::new();
        self.render_container(self.root(), "", markers, &mut lines);
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    fn marked_text(&self, id: NodeId, markers: &HashMap<NodeId, Vec<(usize, &'static str)>>) -> String {
        let text = self.text(id).unwrap_or_default();
        let Some(marks) = markers.get(&id) else {
            return text.to_string();
        };
        let mut chars: Vec<String> = text.chars().map(String::from).collect();
        let mut marks = marks.clone();
        marks.sort_by(|a, b| b.0.cmp(&a.0));
        for (offset, mark) in marks {
            chars.insert(offset.min(chars.len()), mark.to_string());
        }
        chars.concat()
    }

    fn render_container(
        &self,
        container: NodeId,
        prefix: &str,
        markers: &HashMap<NodeId, Vec<(usize, &'static str)>>,
        lines: &mut Vec<String>,
    ) {
        // Content column width of each open list level, and the numbering per level
        let mut widths: Vec<usize> = Vec::new();
        let mut counters: Vec<(ListType, usize)> = Vec::new();
        let mut previous_was_item = false;

        for (index, &child) in self.children(container).iter().enumerate() {
            let list = self.list_attributes(child);
            if index > 0 && !(list.is_some() && previous_was_item) {
                lines.push(prefix.trim_end().to_string());
            }
            if !previous_was_item {
                widths.clear();
                counters.clear();
            }

            match (self.kind(child), list) {
                (Some(NodeKind::BlockQuote), _) => {
                    self.render_container(child, &format!("{prefix}> "), markers, lines);
                }
                (_, Some((list_type, indent))) => {
                    counters.truncate(indent + 1);
                    while counters.len() < indent + 1 {
                        counters.push((list_type, 0));
                    }
                    if counters[indent].0 != list_type {
                        counters[indent] = (list_type, 0);
                    }
                    counters[indent].1 += 1;

                    let marker = match list_type {
                        ListType::Bulleted => "- ".to_string(),
                        ListType::Numbered => format!("{}. ", counters[indent].1),
                    };
                    widths.truncate(indent);
                    while widths.len() < indent {
                        widths.push(2);
                    }
                    let pad = " ".repeat(widths.iter().sum());
                    widths.push(marker.len());

                    let text = escape_block_start(&self.marked_text(child, markers));
                    let line = format!("{prefix}{pad}{marker}{text}");
                    lines.push(if text.is_empty() {
                        line.trim_end().to_string()
                    } else {
                        line
                    });
                }
                (Some(NodeKind::Block(BlockKind::Heading { level })), None) => {
                    let hashes = "#".repeat(usize::from(*level));
                    let text = escape_block_start(&self.marked_text(child, markers));
                    lines.push(format!("{prefix}{hashes} {text}"));
                }
                _ => {
                    let text = escape_block_start(&self.marked_text(child, markers));
                    lines.push(format!("{prefix}{text}"));
                }
            }
            previous_was_item = list.is_some();
        }
    }
}
