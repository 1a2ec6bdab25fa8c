//! Arena source tree produced by the upstream HTML parser.
//!
//! html5ever repairs ill-formed markup into a well-formed element tree; this
//! module stores that tree in a flat arena and exposes the navigation the
//! converter needs: tag names (lower-cased by the parser), a namespace
//! marker, case-insensitive attribute lookup, ordered children including
//! text and comments, and sibling traversal for selector matching.

mod sink;

use std::collections::HashMap;

use html5ever::driver::ParseOpts;
use html5ever::tendril::TendrilSink;
use html5ever::{QualName, ns, parse_document};

pub use sink::SourceSink;

/// Identifier of a node in the source arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub u32);

impl SourceId {
    /// Sentinel value for no node.
    pub const NONE: SourceId = SourceId(u32::MAX);

    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Payload of a source node.
#[derive(Debug, Clone)]
pub enum SourceData {
    /// Document root.
    Document,
    Element {
        name: QualName,
        attrs: Vec<SourceAttribute>,
        /// Pre-extracted id for fast selector matching.
        id: Option<String>,
        /// Pre-extracted classes for fast selector matching.
        classes: Vec<String>,
    },
    Text(String),
    Comment(String),
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
}

/// Attribute on a source element.
#[derive(Debug, Clone)]
pub struct SourceAttribute {
    pub name: QualName,
    pub value: String,
}

/// A node in the source arena.
#[derive(Debug)]
pub struct SourceNode {
    pub data: SourceData,
    pub parent: SourceId,
    pub first_child: SourceId,
    pub last_child: SourceId,
    pub prev_sibling: SourceId,
    pub next_sibling: SourceId,
}

impl SourceNode {
    fn new(data: SourceData) -> Self {
        Self {
            data,
            parent: SourceId::NONE,
            first_child: SourceId::NONE,
            last_child: SourceId::NONE,
            prev_sibling: SourceId::NONE,
            next_sibling: SourceId::NONE,
        }
    }
}

/// Arena-backed source tree.
///
/// All nodes live in one contiguous vector; parent/child/sibling links are
/// indices into it. The tree is immutable once parsing finishes.
pub struct SourceDom {
    nodes: Vec<SourceNode>,
    document: SourceId,
    id_map: HashMap<String, SourceId>,
}

impl SourceDom {
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document: SourceId::NONE,
            id_map: HashMap::new(),
        };
        dom.document = dom.alloc(SourceNode::new(SourceData::Document));
        dom
    }

    /// Parse a complete HTML document.
    pub fn parse(html: &str) -> Self {
        let sink = SourceSink::new();
        parse_document(sink, ParseOpts::default())
            .from_utf8()
            .one(html.as_bytes())
            .into_dom()
    }

    fn alloc(&mut self, node: SourceNode) -> SourceId {
        let id = SourceId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn document(&self) -> SourceId {
        self.document
    }

    pub fn get(&self, id: SourceId) -> Option<&SourceNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: SourceId) -> Option<&mut SourceNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    pub fn create_element(&mut self, name: QualName, attrs: Vec<SourceAttribute>) -> SourceId {
        let mut id = None;
        let mut classes = Vec::new();

        for attr in &attrs {
            if attr.name.local.as_ref() == "id" {
                id = Some(attr.value.clone());
            } else if attr.name.local.as_ref() == "class" {
                classes = attr
                    .value
                    .split_whitespace()
                    .map(|s| s.to_string())
                    .collect();
            }
        }

        let node_id = self.alloc(SourceNode::new(SourceData::Element {
            name,
            attrs,
            id: id.clone(),
            classes,
        }));

        if let Some(id_str) = id {
            self.id_map.insert(id_str, node_id);
        }

        node_id
    }

    pub fn create_text(&mut self, text: String) -> SourceId {
        self.alloc(SourceNode::new(SourceData::Text(text)))
    }

    pub fn create_comment(&mut self, text: String) -> SourceId {
        self.alloc(SourceNode::new(SourceData::Comment(text)))
    }

    pub fn create_doctype(
        &mut self,
        name: String,
        public_id: String,
        system_id: String,
    ) -> SourceId {
        self.alloc(SourceNode::new(SourceData::Doctype {
            name,
            public_id,
            system_id,
        }))
    }

    pub fn append(&mut self, parent: SourceId, child: SourceId) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(SourceId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
        }

        if last_child.is_some() {
            if let Some(last_node) = self.get_mut(last_child) {
                last_node.next_sibling = child;
            }
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    pub fn insert_before(&mut self, sibling: SourceId, new_node: SourceId) {
        let parent = self
            .get(sibling)
            .map(|n| n.parent)
            .unwrap_or(SourceId::NONE);
        let prev = self
            .get(sibling)
            .map(|n| n.prev_sibling)
            .unwrap_or(SourceId::NONE);

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Append text, merging with an existing trailing text node.
    pub fn append_text(&mut self, parent: SourceId, text: &str) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(SourceId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let SourceData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text.to_string());
        self.append(parent, text_node);
    }

    pub fn get_by_id(&self, id: &str) -> Option<SourceId> {
        self.id_map.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn children(&self, parent: SourceId) -> ChildrenIter<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(SourceId::NONE);
        ChildrenIter {
            dom: self,
            current: first,
        }
    }

    /// Depth-first search for the first node matching a predicate.
    pub fn find<F>(&self, predicate: F) -> Option<SourceId>
    where
        F: Fn(&SourceNode) -> bool,
    {
        let mut stack = vec![self.document];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.get(id) {
                if predicate(node) {
                    return Some(id);
                }
                let mut children: Vec<_> = self.children(id).collect();
                children.reverse();
                stack.extend(children);
            }
        }
        None
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<SourceId> {
        self.find(|node| {
            if let SourceData::Element { name, .. } = &node.data {
                name.local.as_ref() == tag
            } else {
                false
            }
        })
    }
}

impl Default for SourceDom {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the ordered children of a node.
pub struct ChildrenIter<'a> {
    dom: &'a SourceDom,
    current: SourceId,
}

impl Iterator for ChildrenIter<'_> {
    type Item = SourceId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .dom
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(SourceId::NONE);
        Some(id)
    }
}

/// Element-level accessors.
impl SourceDom {
    /// Lower-cased tag name of an element.
    pub fn tag_name(&self, id: SourceId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            SourceData::Element { name, .. } => Some(name.local.as_ref()),
            _ => None,
        })
    }

    /// Whether an element belongs to the HTML namespace.
    ///
    /// Foreign-namespace elements are pruned from output, though their
    /// subtrees are still walked for comment markers.
    pub fn is_html_namespace(&self, id: SourceId) -> bool {
        self.get(id).is_some_and(|n| match &n.data {
            SourceData::Element { name, .. } => name.ns == ns!(html) || name.ns == ns!(),
            _ => false,
        })
    }

    /// Case-insensitive attribute lookup.
    pub fn attr(&self, id: SourceId, attr_name: &str) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            SourceData::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name.local.as_ref().eq_ignore_ascii_case(attr_name))
                .map(|a| a.value.as_str()),
            _ => None,
        })
    }

    /// Whether an element carries any attribute at all.
    pub fn has_attributes(&self, id: SourceId) -> bool {
        self.get(id).is_some_and(|n| match &n.data {
            SourceData::Element { attrs, .. } => !attrs.is_empty(),
            _ => false,
        })
    }

    pub fn element_id(&self, id: SourceId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            SourceData::Element { id, .. } => id.as_deref(),
            _ => None,
        })
    }

    pub fn element_classes(&self, id: SourceId) -> &[String] {
        static EMPTY: &[String] = &[];
        self.get(id)
            .and_then(|n| match &n.data {
                SourceData::Element { classes, .. } => Some(classes.as_slice()),
                _ => None,
            })
            .unwrap_or(EMPTY)
    }

    pub fn is_element(&self, id: SourceId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, SourceData::Element { .. }))
    }

    pub fn is_text(&self, id: SourceId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, SourceData::Text(_)))
    }

    pub fn text_content(&self, id: SourceId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            SourceData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn comment_content(&self, id: SourceId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            SourceData::Comment(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Parent node, if it is an element.
    pub fn parent_element(&self, id: SourceId) -> Option<SourceId> {
        let parent = self.get(id)?.parent;
        if self.is_element(parent) {
            Some(parent)
        } else {
            None
        }
    }

    /// Closest preceding sibling that is an element, skipping text and
    /// comment nodes.
    pub fn prev_element_sibling(&self, id: SourceId) -> Option<SourceId> {
        let mut current = self.get(id)?.prev_sibling;
        while current.is_some() {
            if self.is_element(current) {
                return Some(current);
            }
            current = self.get(current)?.prev_sibling;
        }
        None
    }

    /// Number of preceding element siblings; drives positional selectors.
    pub fn preceding_element_count(&self, id: SourceId) -> usize {
        let mut count = 0;
        let mut current = self.prev_element_sibling(id);
        while let Some(sib) = current {
            count += 1;
            current = self.prev_element_sibling(sib);
        }
        count
    }

    /// Next sibling regardless of node type.
    pub fn next_sibling(&self, id: SourceId) -> Option<SourceId> {
        let next = self.get(id)?.next_sibling;
        if next.is_some() { Some(next) } else { None }
    }
}
