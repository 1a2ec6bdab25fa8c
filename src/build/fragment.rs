//! Fragment markers and the optional extraction post-pass.
//!
//! Clipboard-style documents bracket the interesting region with
//! `<!--StartFragment-->` and `<!--EndFragment-->` comments. The builder
//! records where in the *output* tree each marker fell; extraction then
//! replaces the full tree with just that range.

use crate::doc::{Document, NodeId, NodeKind, TextDecoration};

#[derive(Debug, Default)]
pub(super) struct FragmentMarkers {
    start: Option<(NodeId, usize)>,
    end: Option<(NodeId, usize)>,
}

impl FragmentMarkers {
    /// Inspect a source comment; marker comments record the current output
    /// position. Only the first occurrence of each marker counts.
    pub(super) fn note_comment(&mut self, text: &str, parent: NodeId, doc: &Document) {
        let text = text.trim();
        if text.eq_ignore_ascii_case("StartFragment") && self.start.is_none() {
            self.start = Some((parent, doc.children(parent).len()));
        } else if text.eq_ignore_ascii_case("EndFragment") && self.end.is_none() {
            self.end = Some((parent, doc.children(parent).len()));
        }
    }

    /// Replace the document's content with the marked range.
    ///
    /// A single block node is promoted as-is; several blocks get a Section
    /// wrapper; inline-shaped content is wrapped in a Span hosted by a
    /// Paragraph (the root only accepts blocks). Markers that fell in
    /// different output parents cannot delimit a well-formed range, so the
    /// full tree is kept.
    pub(super) fn extract(self, doc: &mut Document) {
        let Some((parent, start_index)) = self.start else {
            return;
        };
        let end_index = match self.end {
            Some((end_parent, _)) if end_parent != parent => {
                log::debug!("fragment markers in different output parents, keeping full tree");
                return;
            }
            Some((_, index)) => index.max(start_index),
            None => doc.children(parent).len(),
        };

        let range: Vec<NodeId> = doc.children(parent)[start_index..end_index].to_vec();
        if range.is_empty() {
            log::debug!("empty fragment range, keeping full tree");
            return;
        }

        for &id in &range {
            doc.detach(id);
        }
        let root = doc.root();
        for id in doc.children(root).to_vec() {
            doc.detach(id);
        }

        let all_inline = range.iter().all(|&id| doc.kind(id).is_inline());
        if all_inline {
            let para = doc.new_node(NodeKind::Paragraph {
                decoration: TextDecoration::None,
                text_indent: None,
            });
            let span = doc.new_node(NodeKind::Span);
            doc.append(root, para);
            doc.append(para, span);
            for id in range {
                doc.append(span, id);
            }
        } else if let [only] = range.as_slice()
            && doc.kind(*only).is_block()
        {
            doc.append(root, *only);
        } else {
            let section = doc.new_node(NodeKind::Section);
            doc.append(root, section);
            for id in range {
                if doc.kind(id).is_block() {
                    doc.append(section, id);
                } else {
                    // Mixed range; inline strays get their own paragraph.
                    let para = doc.new_node(NodeKind::Paragraph {
                        decoration: TextDecoration::None,
                        text_indent: None,
                    });
                    doc.append(section, para);
                    doc.append(para, id);
                }
            }
        }
    }
}
