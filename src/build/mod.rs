//! Tree builder: recursive conversion of the source tree into the typed
//! document model.
//!
//! Each call converts one source node into zero or one output node appended
//! to a given parent, returning the last source node it consumed; a call may
//! consume several siblings atomically (implicit paragraphs, orphan list
//! items). Malformed or unsupported markup is always handled by silently
//! skipping or recursing into children; only builder defects panic.

mod fragment;
mod translate;

use crate::context::{DEFAULT_FONT_SIZE, SourceContext};
use crate::css::{CssValue, PropertyMap, Stylesheet};
use crate::doc::{BoxStyle, Document, NodeId, NodeKind, TextDecoration, Thickness};
use crate::dom::{SourceDom, SourceId};
use crate::length::{Axis, CompoundLength, Length};
use crate::style::element_properties;
use crate::table::{analyze_table, row_groups};
use crate::{ConvertOptions, css};

use fragment::FragmentMarkers;

/// Convert a parsed source tree into a document.
pub(crate) fn build(
    dom: &SourceDom,
    sheets: &[Stylesheet],
    options: &ConvertOptions,
) -> Document {
    let builder = Builder {
        dom,
        sheets,
        track_source: options.track_source_elements,
        doc: Document::new(),
        ctx: SourceContext::new(),
        markers: FragmentMarkers::default(),
    };
    builder.run(options.extract_fragment)
}

struct Builder<'a> {
    dom: &'a SourceDom,
    sheets: &'a [Stylesheet],
    track_source: bool,
    doc: Document,
    ctx: SourceContext,
    markers: FragmentMarkers,
}

impl Builder<'_> {
    fn run(mut self, extract_fragment: bool) -> Document {
        let dom = self.dom;
        let root_element = dom.find_by_tag("html");
        let body = dom.find_by_tag("body").or(root_element);

        if let Some(html) = root_element {
            let mut props = element_properties(dom, html, self.sheets);
            // The chain must bottom out at an absolute size for em/rem
            // resolution.
            props
                .entry("font-size".to_string())
                .or_insert(CssValue::Length(Length::Px(DEFAULT_FONT_SIZE)));
            self.ctx.push(html, props);
        }

        if let Some(body) = body {
            let props = self.push_element(body);
            let root = self.doc.root();
            self.doc.node_mut(root).text_style = translate::text_style(&props, &self.ctx);
            self.doc.node_mut(root).box_style = translate::box_style(&props, &self.ctx);

            self.convert_blocks(root, body);
            self.ctx.pop(body);
        }

        if let Some(html) = root_element {
            self.ctx.pop(html);
        }

        if extract_fragment {
            self.markers.extract(&mut self.doc);
        }
        self.doc
    }

    /// Resolve an element's cascade and push it onto the context stack.
    fn push_element(&mut self, element: SourceId) -> PropertyMap {
        let props = element_properties(self.dom, element, self.sheets);
        self.ctx.push(element, props.clone());
        props
    }

    fn note_source(&mut self, node: NodeId, element: SourceId) {
        if self.track_source {
            self.doc.node_mut(node).source = Some(element);
        }
    }

    /// Convert every child of `container` at block position under `parent`.
    fn convert_blocks(&mut self, parent: NodeId, container: SourceId) {
        let dom = self.dom;
        let mut current = dom.children(container).next();
        while let Some(node) = current {
            let last = self.add_block(parent, node);
            current = dom.next_sibling(last);
        }
    }

    /// Convert one source node at block position. Returns the last source
    /// node consumed.
    fn add_block(&mut self, parent: NodeId, node: SourceId) -> SourceId {
        let dom = self.dom;

        if let Some(comment) = dom.comment_content(node) {
            self.markers.note_comment(comment, parent, &self.doc);
            return node;
        }
        if dom.is_text(node) {
            return self.add_implicit_paragraph(parent, node);
        }
        if !dom.is_element(node) {
            return node;
        }
        if !dom.is_html_namespace(node) {
            // Pruned from output; the subtree is still scanned so fragment
            // markers inside it are not lost.
            self.scan_comments(node, parent);
            return node;
        }

        match dom.tag_name(node).unwrap_or_default() {
            "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "pre" => {
                self.add_paragraph(parent, node);
                node
            }
            "div" | "blockquote" | "center" | "address" | "form" | "main" | "article"
            | "section" | "aside" | "nav" | "header" | "footer" | "figure" | "figcaption"
            | "dl" | "dt" | "dd" => {
                self.add_container(parent, node);
                node
            }
            "ul" | "ol" => {
                self.add_list(parent, node);
                node
            }
            "li" => self.add_orphan_list_items(parent, node),
            "table" => {
                self.add_table(parent, node);
                node
            }
            "hr" => {
                self.add_horizontal_rule(parent, node);
                node
            }
            "style" | "script" | "head" | "title" | "meta" | "link" | "base" | "col"
            | "colgroup" | "caption" | "option" | "select" | "textarea" | "input" => node,
            // Anything else flows as inline content into an implicit
            // paragraph.
            _ => self.add_implicit_paragraph(parent, node),
        }
    }

    /// Collect consecutive inline-level siblings into one paragraph,
    /// discarded when it holds nothing visible.
    fn add_implicit_paragraph(&mut self, parent: NodeId, start: SourceId) -> SourceId {
        let dom = self.dom;
        let para = self.doc.new_node(NodeKind::Paragraph {
            decoration: translate::paragraph_decoration(&self.ctx),
            text_indent: None,
        });

        let mut last = start;
        let mut current = Some(start);
        while let Some(node) = current {
            if dom.is_element(node) && dom.is_html_namespace(node) && is_block_tag(dom, node) {
                break;
            }
            self.add_inline(para, node);
            last = node;
            current = dom.next_sibling(node);
        }

        if self.paragraph_has_content(para) {
            self.doc.append(parent, para);
        }
        last
    }

    /// Whether a paragraph holds visible text or a non-text inline.
    fn paragraph_has_content(&self, para: NodeId) -> bool {
        if !self.doc.text(para).trim().is_empty() {
            return true;
        }
        self.doc.descendants(para).any(|n| {
            matches!(
                self.doc.kind(n),
                NodeKind::Image { .. } | NodeKind::LineBreak | NodeKind::InlineContainer
            )
        })
    }

    /// Convert one source node at inline position.
    fn add_inline(&mut self, parent: NodeId, node: SourceId) {
        let dom = self.dom;

        if let Some(text) = dom.text_content(node) {
            if !text.is_empty() {
                let run = self.doc.new_node(NodeKind::Run {
                    text: text.to_string(),
                });
                self.doc.append(parent, run);
            }
            return;
        }
        if let Some(comment) = dom.comment_content(node) {
            self.markers.note_comment(comment, parent, &self.doc);
            return;
        }
        if !dom.is_element(node) {
            return;
        }
        if !dom.is_html_namespace(node) {
            self.scan_comments(node, parent);
            return;
        }

        match dom.tag_name(node).unwrap_or_default() {
            "br" => {
                let brk = self.doc.new_node(NodeKind::LineBreak);
                self.doc.append(parent, brk);
                self.note_source(brk, node);
            }
            "img" => self.add_image(parent, node),
            "a" => self.add_anchor(parent, node),
            "style" | "script" => {}
            _ => self.add_span(parent, node),
        }
    }

    fn add_span(&mut self, parent: NodeId, node: SourceId) {
        let props = self.push_element(node);
        let span = self.doc.new_node(NodeKind::Span);
        self.doc.node_mut(span).text_style = translate::text_style(&props, &self.ctx);
        self.note_source(span, node);

        for child in self.dom.children(node) {
            self.add_inline(span, child);
        }
        self.ctx.pop(node);

        if !self.doc.children(span).is_empty() {
            self.doc.append(parent, span);
        }
    }

    fn add_anchor(&mut self, parent: NodeId, node: SourceId) {
        let dom = self.dom;
        let href = dom.attr(node, "href").filter(|h| !h.is_empty());

        let Some(href) = href else {
            // Named anchors without a target: contents flow through.
            self.push_element(node);
            for child in dom.children(node) {
                self.add_inline(parent, child);
            }
            self.ctx.pop(node);
            return;
        };

        let props = self.push_element(node);
        let link = self.doc.new_node(NodeKind::Hyperlink {
            uri: href.to_string(),
            target: dom.attr(node, "target").map(str::to_string),
        });
        self.doc.node_mut(link).text_style = translate::text_style(&props, &self.ctx);
        self.note_source(link, node);

        for child in dom.children(node) {
            self.add_inline(link, child);
        }
        self.ctx.pop(node);
        self.doc.append(parent, link);
    }

    fn add_paragraph(&mut self, parent: NodeId, node: SourceId) {
        let props = self.push_element(node);
        let para = self.doc.new_node(NodeKind::Paragraph {
            decoration: translate::paragraph_decoration(&self.ctx),
            text_indent: translate::paragraph_indent(&props, &self.ctx),
        });
        self.doc.node_mut(para).text_style = translate::text_style(&props, &self.ctx);
        self.doc.node_mut(para).box_style = translate::box_style(&props, &self.ctx);
        self.note_source(para, node);

        for child in self.dom.children(node) {
            self.add_inline(para, child);
        }
        self.ctx.pop(node);

        if self.paragraph_has_content(para) {
            self.doc.append(parent, para);
        }
    }

    /// Generic container: degrades to a paragraph when it holds no
    /// block-level children, becomes a section otherwise. A section that
    /// would carry nothing of its own is skipped in favor of its children.
    fn add_container(&mut self, parent: NodeId, node: SourceId) {
        let dom = self.dom;
        let has_block_child = dom
            .children(node)
            .any(|c| dom.is_element(c) && dom.is_html_namespace(c) && is_block_tag(dom, c));

        if !has_block_child {
            self.add_paragraph(parent, node);
            return;
        }

        let props = self.push_element(node);
        let text_style = translate::text_style(&props, &self.ctx);
        let box_style = translate::box_style(&props, &self.ctx);

        if !dom.has_attributes(node) && text_style.is_empty() && box_style.is_empty() {
            // Redundant nesting; unwrap into the parent.
            self.convert_blocks(parent, node);
            self.ctx.pop(node);
            return;
        }

        let section = self.doc.new_node(NodeKind::Section);
        self.doc.node_mut(section).text_style = text_style;
        self.doc.node_mut(section).box_style = box_style;
        self.note_source(section, node);

        self.convert_blocks(section, node);
        self.ctx.pop(node);

        if !self.doc.children(section).is_empty() {
            self.doc.append(parent, section);
        }
    }

    fn add_list(&mut self, parent: NodeId, node: SourceId) {
        let props = self.push_element(node);
        let list = self.doc.new_node(NodeKind::List {
            marker: translate::list_marker(&self.ctx),
        });
        self.doc.node_mut(list).text_style = translate::text_style(&props, &self.ctx);
        self.doc.node_mut(list).box_style = translate::box_style(&props, &self.ctx);
        self.note_source(list, node);

        let dom = self.dom;
        for child in dom.children(node) {
            match dom.tag_name(child) {
                Some("li") => self.add_list_item(list, child),
                // A list nested directly under a list gets an item wrapper.
                Some("ul" | "ol") => {
                    let item = self.doc.new_node(NodeKind::ListItem);
                    self.add_list(item, child);
                    if !self.doc.children(item).is_empty() {
                        self.doc.append(list, item);
                    }
                }
                _ => {}
            }
        }
        self.ctx.pop(node);

        if !self.doc.children(list).is_empty() {
            self.doc.append(parent, list);
        }
    }

    fn add_list_item(&mut self, list: NodeId, node: SourceId) {
        let props = self.push_element(node);
        let item = self.doc.new_node(NodeKind::ListItem);
        self.doc.node_mut(item).text_style = translate::text_style(&props, &self.ctx);
        self.doc.node_mut(item).box_style = translate::box_style(&props, &self.ctx);
        self.note_source(item, node);

        self.convert_blocks(item, node);
        self.ctx.pop(node);
        self.doc.append(list, item);
    }

    /// Bare `<li>` siblings outside any list: append to an immediately
    /// preceding list, or start a new one. Consumes the whole run of items
    /// and returns the last one.
    fn add_orphan_list_items(&mut self, parent: NodeId, first: SourceId) -> SourceId {
        let dom = self.dom;

        let last_child = self.doc.children(parent).last().copied();
        let list = match last_child {
            Some(last) if matches!(self.doc.kind(last), NodeKind::List { .. }) => last,
            _ => {
                let list = self.doc.new_node(NodeKind::List {
                    marker: translate::list_marker(&self.ctx),
                });
                self.doc.append(parent, list);
                list
            }
        };

        let mut last = first;
        let mut current = Some(first);
        while let Some(node) = current {
            if dom.tag_name(node) == Some("li") {
                self.add_list_item(list, node);
            } else if !dom
                .text_content(node)
                .is_some_and(|t| t.trim().is_empty())
            {
                break;
            }
            last = node;
            current = dom.next_sibling(node);
        }
        last
    }

    fn add_table(&mut self, parent: NodeId, node: SourceId) {
        let dom = self.dom;
        let sheets = self.sheets;
        let geometry = analyze_table(dom, node, |cell| {
            element_properties(dom, cell, sheets)
                .get("width")
                .and_then(CssValue::as_length)
                .and_then(|l| l.absolute_px())
                .map(f64::from)
        });

        let groups = row_groups(dom, node);
        let cells: Vec<SourceId> = groups
            .iter()
            .flat_map(|(_, rows)| rows.iter())
            .flat_map(|&row| {
                dom.children(row)
                    .filter(|&c| matches!(dom.tag_name(c), Some("td" | "th")))
            })
            .collect();

        if let [only_cell] = cells.as_slice() {
            // A one-cell table is a layout shim; emit just its content.
            self.push_element(node);
            self.push_element(*only_cell);
            self.convert_blocks(parent, *only_cell);
            self.ctx.pop(*only_cell);
            self.ctx.pop(node);
            return;
        }

        let props = self.push_element(node);
        let table = self.doc.new_node(NodeKind::Table {
            columns: geometry.columns.clone(),
        });
        self.doc.node_mut(table).text_style = translate::text_style(&props, &self.ctx);
        self.doc.node_mut(table).box_style = translate::box_style(&props, &self.ctx);
        self.note_source(table, node);

        for (group_element, rows) in groups {
            let row_group = self.doc.new_node(NodeKind::RowGroup);
            if let Some(element) = group_element {
                let group_props = self.push_element(element);
                self.doc.node_mut(row_group).text_style =
                    translate::text_style(&group_props, &self.ctx);
                self.note_source(row_group, element);
            }

            for row in rows {
                self.add_table_row(row_group, row, &geometry.cell_spans);
            }

            if let Some(element) = group_element {
                self.ctx.pop(element);
            }
            if !self.doc.children(row_group).is_empty() {
                self.doc.append(table, row_group);
            }
        }
        self.ctx.pop(node);

        if !self.doc.children(table).is_empty() {
            self.doc.append(parent, table);
        }
    }

    fn add_table_row(
        &mut self,
        row_group: NodeId,
        row: SourceId,
        cell_spans: &std::collections::HashMap<SourceId, u32>,
    ) {
        let dom = self.dom;
        let row_props = self.push_element(row);
        let row_node = self.doc.new_node(NodeKind::Row);
        self.doc.node_mut(row_node).text_style = translate::text_style(&row_props, &self.ctx);
        self.note_source(row_node, row);

        let cells: Vec<SourceId> = dom
            .children(row)
            .filter(|&c| matches!(dom.tag_name(c), Some("td" | "th")))
            .collect();
        for cell in cells {
            let col_span = cell_spans.get(&cell).copied().unwrap_or_else(|| {
                dom.attr(cell, "colspan")
                    .and_then(|v| v.trim().parse::<u32>().ok())
                    .unwrap_or(1)
                    .max(1)
            });
            let row_span = dom
                .attr(cell, "rowspan")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .unwrap_or(1)
                .max(1);

            let cell_props = self.push_element(cell);
            let cell_node = self.doc.new_node(NodeKind::Cell { col_span, row_span });
            self.doc.node_mut(cell_node).text_style = translate::text_style(&cell_props, &self.ctx);
            self.doc.node_mut(cell_node).box_style = translate::box_style(&cell_props, &self.ctx);
            self.note_source(cell_node, cell);

            self.convert_blocks(cell_node, cell);
            self.ctx.pop(cell);
            self.doc.append(row_node, cell_node);
        }
        self.ctx.pop(row);

        if !self.doc.children(row_node).is_empty() {
            self.doc.append(row_group, row_node);
        }
    }

    /// `<hr>`: an empty paragraph carrying only a border.
    fn add_horizontal_rule(&mut self, parent: NodeId, node: SourceId) {
        let para = self.doc.new_node(NodeKind::Paragraph {
            decoration: TextDecoration::None,
            text_indent: None,
        });
        self.doc.node_mut(para).box_style = BoxStyle {
            border: Some(Thickness {
                top: 1.0,
                ..Thickness::default()
            }),
            border_color: Some(css::Color::rgb(128, 128, 128)),
            ..BoxStyle::default()
        };
        self.note_source(para, node);
        self.doc.append(parent, para);
    }

    /// Image sizing: explicit axis values win; an `auto` (or absent) axis
    /// emits nothing for that axis; max sizes always resolve against the
    /// ancestor chain.
    fn add_image(&mut self, parent: NodeId, node: SourceId) {
        let dom = self.dom;
        let Some(source) = dom.attr(node, "src").filter(|s| !s.is_empty()) else {
            log::debug!("image without src skipped");
            return;
        };

        // The image itself is a leaf; its properties are read without
        // pushing it, so the context top is the containing element.
        let props = element_properties(dom, node, self.sheets);

        let image = self.doc.new_node(NodeKind::Image {
            source: source.to_string(),
            width: self.image_axis(&props, "width", Axis::Horizontal),
            height: self.image_axis(&props, "height", Axis::Vertical),
            max_width: self.image_axis(&props, "max-width", Axis::Horizontal),
            max_height: self.image_axis(&props, "max-height", Axis::Vertical),
        });
        self.doc.node_mut(image).text_style = translate::text_style(&props, &self.ctx);
        self.note_source(image, node);
        self.doc.append(parent, image);
    }

    fn image_axis(
        &self,
        props: &PropertyMap,
        property: &str,
        axis: Axis,
    ) -> Option<CompoundLength> {
        let length = props.get(property).and_then(CssValue::as_length)?;
        let compound = self.ctx.compound_from(length)?;
        if compound.is_determined() {
            return Some(compound);
        }
        Some(compound.resolved_against(&self.ctx.compound_size_for_axis(axis)))
    }

    /// Walk a pruned subtree for fragment-marker comments only.
    fn scan_comments(&mut self, node: SourceId, parent: NodeId) {
        let dom = self.dom;
        for child in dom.children(node) {
            if let Some(comment) = dom.comment_content(child) {
                self.markers.note_comment(comment, parent, &self.doc);
            } else {
                self.scan_comments(child, parent);
            }
        }
    }
}

/// Tags that break inline flow.
fn is_block_tag(dom: &SourceDom, node: SourceId) -> bool {
    matches!(
        dom.tag_name(node),
        Some(
            "p" | "h1"
                | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
                | "pre"
                | "div"
                | "blockquote"
                | "center"
                | "address"
                | "form"
                | "main"
                | "article"
                | "section"
                | "aside"
                | "nav"
                | "header"
                | "footer"
                | "figure"
                | "figcaption"
                | "dl"
                | "dt"
                | "dd"
                | "ul"
                | "ol"
                | "li"
                | "table"
                | "hr"
        )
    )
}
