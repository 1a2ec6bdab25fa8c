//! The typed document model produced by conversion.
//!
//! Nodes live in an arena owned by [`Document`]; identity is a [`NodeId`].
//! Every append is validated against the allowed-children table for the
//! parent's kind. A violation panics: it signals a defect in the builder,
//! never bad input, since the builder is responsible for only ever
//! producing legal shapes from arbitrary markup.

mod attrs;

pub use attrs::{
    BoxStyle, ColorValue, FontStyle, FontWeight, ListMarker, TextAlign, TextDecoration, TextStyle,
    Thickness,
};

use crate::dom::SourceId;
use crate::length::CompoundLength;

/// Index of a node within its [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The document root, always the first node of the arena.
    pub const ROOT: NodeId = NodeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Closed set of node kinds, with per-kind payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Section,
    Paragraph {
        decoration: TextDecoration,
        /// First-line indent in pixels.
        text_indent: Option<f32>,
    },
    List {
        marker: ListMarker,
    },
    ListItem,
    Table {
        /// Column widths from geometry analysis; empty when the table was
        /// not analyzable.
        columns: Vec<f64>,
    },
    RowGroup,
    Row,
    Cell {
        col_span: u32,
        row_span: u32,
    },
    Span,
    Run {
        text: String,
    },
    Hyperlink {
        uri: String,
        target: Option<String>,
    },
    LineBreak,
    Image {
        source: String,
        width: Option<CompoundLength>,
        height: Option<CompoundLength>,
        max_width: Option<CompoundLength>,
        max_height: Option<CompoundLength>,
    },
    /// Hosts embedded non-text content at block position.
    BlockContainer,
    /// Hosts embedded non-text content at inline position.
    InlineContainer,
}

/// Child categories for the allowed-children table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChildSet {
    Blocks,
    Inlines,
    ListItems,
    RowGroups,
    Rows,
    Cells,
    None,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Section => "section",
            NodeKind::Paragraph { .. } => "paragraph",
            NodeKind::List { .. } => "list",
            NodeKind::ListItem => "list-item",
            NodeKind::Table { .. } => "table",
            NodeKind::RowGroup => "row-group",
            NodeKind::Row => "row",
            NodeKind::Cell { .. } => "cell",
            NodeKind::Span => "span",
            NodeKind::Run { .. } => "run",
            NodeKind::Hyperlink { .. } => "hyperlink",
            NodeKind::LineBreak => "line-break",
            NodeKind::Image { .. } => "image",
            NodeKind::BlockContainer => "block-container",
            NodeKind::InlineContainer => "inline-container",
        }
    }

    /// Whether this kind renders at block position.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            NodeKind::Section
                | NodeKind::Paragraph { .. }
                | NodeKind::List { .. }
                | NodeKind::Table { .. }
                | NodeKind::BlockContainer
        )
    }

    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Span
                | NodeKind::Run { .. }
                | NodeKind::Hyperlink { .. }
                | NodeKind::LineBreak
                | NodeKind::Image { .. }
                | NodeKind::InlineContainer
        )
    }

    fn child_set(&self) -> ChildSet {
        match self {
            NodeKind::Document
            | NodeKind::Section
            | NodeKind::ListItem
            | NodeKind::Cell { .. }
            | NodeKind::BlockContainer => ChildSet::Blocks,
            NodeKind::Paragraph { .. }
            | NodeKind::Span
            | NodeKind::Hyperlink { .. }
            | NodeKind::InlineContainer => ChildSet::Inlines,
            NodeKind::List { .. } => ChildSet::ListItems,
            NodeKind::Table { .. } => ChildSet::RowGroups,
            NodeKind::RowGroup => ChildSet::Rows,
            NodeKind::Row => ChildSet::Cells,
            NodeKind::Run { .. } | NodeKind::LineBreak | NodeKind::Image { .. } => ChildSet::None,
        }
    }

    fn allows_child(&self, child: &NodeKind) -> bool {
        match self.child_set() {
            ChildSet::Blocks => child.is_block(),
            ChildSet::Inlines => child.is_inline(),
            ChildSet::ListItems => matches!(child, NodeKind::ListItem),
            ChildSet::RowGroups => matches!(child, NodeKind::RowGroup),
            ChildSet::Rows => matches!(child, NodeKind::Row),
            ChildSet::Cells => matches!(child, NodeKind::Cell { .. }),
            ChildSet::None => false,
        }
    }
}

/// One node of the finished document.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub text_style: TextStyle,
    pub box_style: BoxStyle,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Back-pointer to the originating source element, if tracking was
    /// enabled for the conversion.
    pub source: Option<SourceId>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            text_style: TextStyle::default(),
            box_style: BoxStyle::default(),
            children: Vec::new(),
            parent: None,
            source: None,
        }
    }
}

/// The finished document tree.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Document)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Allocate a detached node.
    pub fn new_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind));
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Append a detached node to a parent.
    ///
    /// Panics if the child kind is not legal under the parent, or if the
    /// child is already attached; both indicate a builder defect.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let child_kind = &self.nodes[child.index()].kind;
        let parent_kind = &self.nodes[parent.index()].kind;
        assert!(
            parent_kind.allows_child(child_kind),
            "node kind {} does not allow {} children",
            parent_kind.name(),
            child_kind.name(),
        );
        assert!(
            self.nodes[child.index()].parent.is_none(),
            "node appended twice"
        );

        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Detach a node from its parent. Used only by the fragment-extraction
    /// post-pass; the builder itself never reparents.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|&c| c != id);
        }
    }

    /// Concatenated run text beneath a node.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let NodeKind::Run { text } = &self.nodes[id.index()].kind {
            out.push_str(text);
        }
        for &child in &self.nodes[id.index()].children {
            self.collect_text(child, out);
        }
    }

    /// Depth-first pre-order walk from a node.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: vec![id],
        }
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_appends() {
        let mut doc = Document::new();
        let section = doc.new_node(NodeKind::Section);
        doc.append(doc.root(), section);

        let para = doc.new_node(NodeKind::Paragraph {
            decoration: TextDecoration::None,
            text_indent: None,
        });
        doc.append(section, para);

        let run = doc.new_node(NodeKind::Run {
            text: "hello".into(),
        });
        doc.append(para, run);

        assert_eq!(doc.children(section), &[para]);
        assert_eq!(doc.text(section), "hello");
    }

    #[test]
    #[should_panic(expected = "does not allow")]
    fn test_run_under_document_panics() {
        let mut doc = Document::new();
        let run = doc.new_node(NodeKind::Run { text: "x".into() });
        doc.append(doc.root(), run);
    }

    #[test]
    #[should_panic(expected = "does not allow")]
    fn test_row_outside_row_group_panics() {
        let mut doc = Document::new();
        let table = doc.new_node(NodeKind::Table { columns: vec![] });
        doc.append(doc.root(), table);
        let row = doc.new_node(NodeKind::Row);
        doc.append(table, row);
    }

    #[test]
    #[should_panic(expected = "appended twice")]
    fn test_double_append_panics() {
        let mut doc = Document::new();
        let a = doc.new_node(NodeKind::Section);
        let b = doc.new_node(NodeKind::Section);
        doc.append(doc.root(), a);
        doc.append(doc.root(), b);
        doc.append(a, b);
    }

    #[test]
    fn test_detach_removes_from_parent() {
        let mut doc = Document::new();
        let a = doc.new_node(NodeKind::Section);
        doc.append(doc.root(), a);
        doc.detach(a);
        assert!(doc.children(doc.root()).is_empty());
        assert!(doc.node(a).parent.is_none());
    }

    #[test]
    fn test_descendants_preorder() {
        let mut doc = Document::new();
        let s = doc.new_node(NodeKind::Section);
        doc.append(doc.root(), s);
        let p1 = doc.new_node(NodeKind::Paragraph {
            decoration: TextDecoration::None,
            text_indent: None,
        });
        let p2 = doc.new_node(NodeKind::Paragraph {
            decoration: TextDecoration::None,
            text_indent: None,
        });
        doc.append(s, p1);
        doc.append(s, p2);

        let order: Vec<_> = doc.descendants(doc.root()).collect();
        assert_eq!(order, vec![doc.root(), s, p1, p2]);
    }
}
