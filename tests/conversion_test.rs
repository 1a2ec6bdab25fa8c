//! End-to-end conversion tests: HTML strings in, typed document trees out.
//!
//! These cover the builder's structural policies (implicit paragraphs,
//! container degradation, list adoption, table collapse) and the cascade
//! as observed through resolved node styling.

use flowdoc::doc::{ColorValue, FontWeight, ListMarker, NodeKind, TextDecoration};
use flowdoc::length::CompoundLength;
use flowdoc::{ConvertOptions, Document, NodeId, convert_html};

fn convert(html: &str) -> Document {
    convert_html(html, &ConvertOptions::default()).expect("conversion failed")
}

fn convert_fragment(html: &str) -> Document {
    let options = ConvertOptions {
        extract_fragment: true,
        ..ConvertOptions::default()
    };
    convert_html(html, &options).expect("conversion failed")
}

/// First node (pre-order) whose kind matches the predicate.
fn find(doc: &Document, pred: impl Fn(&NodeKind) -> bool) -> Option<NodeId> {
    doc.descendants(doc.root()).find(|&n| pred(doc.kind(n)))
}

fn red() -> ColorValue {
    ColorValue::Color(flowdoc::css::Color::rgb(255, 0, 0))
}

fn blue() -> ColorValue {
    ColorValue::Color(flowdoc::css::Color::rgb(0, 0, 255))
}

// ============================================================================
// Block structure
// ============================================================================

#[test]
fn test_paragraph_with_bold_span() {
    let doc = convert("<p>Hello <b>World</b></p>");

    let root_children = doc.children(doc.root());
    assert_eq!(root_children.len(), 1);
    let para = root_children[0];
    assert!(matches!(doc.kind(para), NodeKind::Paragraph { .. }));

    let kids = doc.children(para);
    assert_eq!(kids.len(), 2);
    assert_eq!(
        doc.kind(kids[0]),
        &NodeKind::Run {
            text: "Hello ".into()
        }
    );
    assert!(matches!(doc.kind(kids[1]), NodeKind::Span));
    assert_eq!(doc.text(kids[1]), "World");
    assert!(
        doc.node(kids[1])
            .text_style
            .font_weight
            .is_some_and(|w| w.is_bold())
    );
}

#[test]
fn test_heading_gets_default_size_and_weight() {
    let doc = convert("<h1>Title</h1>");
    let para = doc.children(doc.root())[0];
    assert!(matches!(doc.kind(para), NodeKind::Paragraph { .. }));
    // 2em of the 16px default.
    assert_eq!(doc.node(para).text_style.font_size, Some(32.0));
    assert_eq!(doc.node(para).text_style.font_weight, Some(FontWeight::BOLD));
}

#[test]
fn test_bare_text_forms_implicit_paragraph() {
    let doc = convert("just some text");
    let children = doc.children(doc.root());
    assert_eq!(children.len(), 1);
    assert!(matches!(doc.kind(children[0]), NodeKind::Paragraph { .. }));
    assert_eq!(doc.text(children[0]), "just some text");
}

#[test]
fn test_whitespace_only_paragraph_is_discarded() {
    let doc = convert("<p>   \n  </p>");
    assert!(doc.children(doc.root()).is_empty());
}

#[test]
fn test_div_without_block_children_is_paragraph() {
    let doc = convert("<div>inline only</div>");
    let children = doc.children(doc.root());
    assert_eq!(children.len(), 1);
    assert!(matches!(doc.kind(children[0]), NodeKind::Paragraph { .. }));
}

#[test]
fn test_plain_div_wrapper_unwraps() {
    let doc = convert("<div><p>A</p><p>B</p></div>");
    let children = doc.children(doc.root());
    assert_eq!(children.len(), 2);
    assert!(
        children
            .iter()
            .all(|&c| matches!(doc.kind(c), NodeKind::Paragraph { .. }))
    );
}

#[test]
fn test_styled_div_becomes_section() {
    let doc = convert(r#"<div style="color: red"><p>A</p></div>"#);
    let children = doc.children(doc.root());
    assert_eq!(children.len(), 1);
    let section = children[0];
    assert!(matches!(doc.kind(section), NodeKind::Section));
    assert_eq!(doc.node(section).text_style.foreground, red());
    // The child paragraph inherits through context, not by value copy.
    let para = doc.children(section)[0];
    assert_eq!(doc.node(para).text_style.foreground, ColorValue::Unset);
}

#[test]
fn test_horizontal_rule_is_bordered_paragraph() {
    let doc = convert("<p>a</p><hr><p>b</p>");
    let children = doc.children(doc.root());
    assert_eq!(children.len(), 3);
    let rule = children[1];
    assert!(matches!(doc.kind(rule), NodeKind::Paragraph { .. }));
    let border = doc.node(rule).box_style.border.expect("hr has a border");
    assert_eq!(border.top, 1.0);
    assert_eq!(border.bottom, 0.0);
}

// ============================================================================
// Inline structure
// ============================================================================

#[test]
fn test_line_break() {
    let doc = convert("<p>a<br>b</p>");
    let para = doc.children(doc.root())[0];
    let kinds: Vec<_> = doc.children(para).iter().map(|&c| doc.kind(c)).collect();
    assert!(matches!(kinds[1], NodeKind::LineBreak));
    assert_eq!(doc.text(para), "ab");
}

#[test]
fn test_hyperlink_with_href() {
    let doc = convert(r#"<p><a href="https://example.com/" target="_blank">link</a></p>"#);
    let link = find(&doc, |k| matches!(k, NodeKind::Hyperlink { .. })).expect("hyperlink emitted");
    match doc.kind(link) {
        NodeKind::Hyperlink { uri, target } => {
            assert_eq!(uri, "https://example.com/");
            assert_eq!(target.as_deref(), Some("_blank"));
        }
        _ => unreachable!(),
    }
    assert_eq!(doc.text(link), "link");
}

#[test]
fn test_anchor_without_href_flows_through() {
    let doc = convert(r#"<p><a name="here">plain</a></p>"#);
    assert!(find(&doc, |k| matches!(k, NodeKind::Hyperlink { .. })).is_none());
    let para = doc.children(doc.root())[0];
    assert_eq!(doc.text(para), "plain");
}

#[test]
fn test_empty_span_is_discarded() {
    let doc = convert("<p>a<span></span>b</p>");
    assert!(find(&doc, |k| matches!(k, NodeKind::Span)).is_none());
}

// ============================================================================
// Lists
// ============================================================================

#[test]
fn test_unordered_list_structure() {
    let doc = convert("<ul><li>one</li><li>two</li></ul>");
    let list = doc.children(doc.root())[0];
    assert_eq!(
        doc.kind(list),
        &NodeKind::List {
            marker: ListMarker::Disc
        }
    );
    let items = doc.children(list);
    assert_eq!(items.len(), 2);
    assert!(matches!(doc.kind(items[0]), NodeKind::ListItem));
    assert_eq!(doc.text(items[0]), "one");
    assert_eq!(doc.text(items[1]), "two");
}

#[test]
fn test_ordered_list_marker() {
    let doc = convert("<ol><li>one</li></ol>");
    let list = doc.children(doc.root())[0];
    assert_eq!(
        doc.kind(list),
        &NodeKind::List {
            marker: ListMarker::Decimal
        }
    );
}

#[test]
fn test_nested_list_gets_item_wrapper() {
    let doc = convert("<ul><li>a</li><ul><li>b</li></ul></ul>");
    let outer = doc.children(doc.root())[0];
    let items = doc.children(outer);
    assert_eq!(items.len(), 2);
    let inner = doc.children(items[1])[0];
    assert!(matches!(doc.kind(inner), NodeKind::List { .. }));
    assert_eq!(doc.text(inner), "b");
}

#[test]
fn test_orphan_list_items_adopted_into_one_list() {
    let doc = convert("<p>intro</p><li>one</li><li>two</li>");
    let children = doc.children(doc.root());
    assert_eq!(children.len(), 2);
    let list = children[1];
    assert!(matches!(doc.kind(list), NodeKind::List { .. }));
    assert_eq!(doc.children(list).len(), 2);
}

#[test]
fn test_orphan_list_item_joins_preceding_list() {
    let doc = convert("<ul><li>one</li></ul><li>two</li>");
    let children = doc.children(doc.root());
    assert_eq!(children.len(), 1);
    assert_eq!(doc.children(children[0]).len(), 2);
}

// ============================================================================
// Tables
// ============================================================================

#[test]
fn test_table_structure_and_columns() {
    let doc = convert(concat!(
        "<table>",
        r#"<tr><td width="50">A</td><td width="50">B</td></tr>"#,
        r#"<tr><td width="100">C</td></tr>"#,
        "</table>",
    ));
    let table = doc.children(doc.root())[0];
    match doc.kind(table) {
        NodeKind::Table { columns } => assert_eq!(columns, &vec![50.0, 50.0]),
        other => panic!("expected table, got {}", other.name()),
    }

    let groups = doc.children(table);
    assert_eq!(groups.len(), 1);
    let rows = doc.children(groups[0]);
    assert_eq!(rows.len(), 2);

    // The full-width cell in the second row spans both derived columns.
    let wide = doc.children(rows[1])[0];
    assert_eq!(
        doc.kind(wide),
        &NodeKind::Cell {
            col_span: 2,
            row_span: 1
        }
    );
}

#[test]
fn test_single_cell_table_collapses_to_content() {
    let doc = convert("<table><tr><td><p>Only</p></td></tr></table>");
    assert!(find(&doc, |k| matches!(k, NodeKind::Table { .. })).is_none());
    let children = doc.children(doc.root());
    assert_eq!(children.len(), 1);
    assert!(matches!(doc.kind(children[0]), NodeKind::Paragraph { .. }));
    assert_eq!(doc.text(children[0]), "Only");
}

#[test]
fn test_head_and_body_become_separate_row_groups() {
    let doc = convert(concat!(
        "<table>",
        "<thead><tr><th>H</th><th>I</th></tr></thead>",
        "<tbody><tr><td>A</td><td>B</td></tr></tbody>",
        "</table>",
    ));
    let table = find(&doc, |k| matches!(k, NodeKind::Table { .. })).expect("table emitted");
    let groups = doc.children(table);
    assert_eq!(groups.len(), 2);
    assert!(groups
        .iter()
        .all(|&g| matches!(doc.kind(g), NodeKind::RowGroup)));
}

#[test]
fn test_cell_content_is_block_level() {
    let doc = convert("<table><tr><td>x</td><td><p>y</p><p>z</p></td></tr></table>");
    let cells: Vec<_> = doc
        .descendants(doc.root())
        .filter(|&n| matches!(doc.kind(n), NodeKind::Cell { .. }))
        .collect();
    assert_eq!(cells.len(), 2);
    // Bare text in a cell still gets a paragraph wrapper.
    assert!(matches!(
        doc.kind(doc.children(cells[0])[0]),
        NodeKind::Paragraph { .. }
    ));
    assert_eq!(doc.children(cells[1]).len(), 2);
}

// ============================================================================
// Images
// ============================================================================

#[test]
fn test_image_absolute_size() {
    let doc = convert(r#"<p><img src="pic.png" width="100" height="50"></p>"#);
    let image = find(&doc, |k| matches!(k, NodeKind::Image { .. })).expect("image emitted");
    match doc.kind(image) {
        NodeKind::Image {
            source,
            width,
            height,
            ..
        } => {
            assert_eq!(source, "pic.png");
            assert_eq!(*width, Some(CompoundLength::absolute(100.0)));
            assert_eq!(*height, Some(CompoundLength::absolute(50.0)));
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_image_auto_axis_emits_nothing() {
    let doc = convert(r#"<p><img src="pic.png" width="100"></p>"#);
    let image = find(&doc, |k| matches!(k, NodeKind::Image { .. })).expect("image emitted");
    match doc.kind(image) {
        NodeKind::Image { width, height, .. } => {
            assert!(width.is_some());
            assert!(height.is_none());
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_image_percent_width_resolves_against_sized_cell() {
    let doc = convert(concat!(
        "<table><tr>",
        r#"<td width="200"><img src="pic.png" width="50%"></td>"#,
        r#"<td width="100">filler</td>"#,
        "</tr></table>",
    ));
    let image = find(&doc, |k| matches!(k, NodeKind::Image { .. })).expect("image emitted");
    match doc.kind(image) {
        NodeKind::Image { width, .. } => {
            assert_eq!(*width, Some(CompoundLength::absolute(100.0)));
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_image_without_src_is_skipped() {
    let doc = convert("<p>text<img></p>");
    assert!(find(&doc, |k| matches!(k, NodeKind::Image { .. })).is_none());
}

// ============================================================================
// Cascade, observed through node styling
// ============================================================================

#[test]
fn test_class_selector_beats_tag_selector() {
    let doc = convert(concat!(
        "<style>p.note { color: blue } p { color: red }</style>",
        r#"<p class="note">text</p>"#,
    ));
    let para = doc.children(doc.root())[0];
    assert_eq!(doc.node(para).text_style.foreground, blue());
}

#[test]
fn test_later_rule_wins_at_equal_specificity() {
    let doc = convert("<style>p { color: blue } p { color: red }</style><p>text</p>");
    let para = doc.children(doc.root())[0];
    assert_eq!(doc.node(para).text_style.foreground, red());
}

#[test]
fn test_nth_child_starts_at_its_offset() {
    let doc = convert(concat!(
        "<style>li:nth-child(2n+3) { color: red }</style>",
        "<ul><li>a</li><li>b</li><li>c</li></ul>",
    ));
    let list = find(&doc, |k| matches!(k, NodeKind::List { .. })).expect("list emitted");
    let items = doc.children(list);
    // Only the third item onward can match 2n+3.
    assert_eq!(doc.node(items[0]).text_style.foreground, ColorValue::Unset);
    assert_eq!(doc.node(items[1]).text_style.foreground, ColorValue::Unset);
    assert_eq!(doc.node(items[2]).text_style.foreground, red());
}

#[test]
fn test_inline_style_beats_sheet() {
    let doc = convert(concat!(
        "<style>p { color: red }</style>",
        r#"<p style="color: blue">text</p>"#,
    ));
    let para = doc.children(doc.root())[0];
    assert_eq!(doc.node(para).text_style.foreground, blue());
}

#[test]
fn test_important_sheet_rule_beats_inline() {
    let doc = convert(concat!(
        "<style>p { color: red !important }</style>",
        r#"<p style="color: blue">text</p>"#,
    ));
    let para = doc.children(doc.root())[0];
    assert_eq!(doc.node(para).text_style.foreground, red());
}

#[test]
fn test_em_font_size_resolves_against_ancestors() {
    let doc = convert(concat!(
        "<style>body { font-size: 20px } p { font-size: 2em }</style>",
        "<p>text</p>",
    ));
    let para = doc.children(doc.root())[0];
    assert_eq!(doc.node(para).text_style.font_size, Some(40.0));
}

#[test]
fn test_rem_font_size_resolves_against_root() {
    let doc = convert(concat!(
        "<style>body { font-size: 20px } p { font-size: 2rem }</style>",
        "<p>text</p>",
    ));
    let para = doc.children(doc.root())[0];
    // rem ignores the body size and uses the 16px root default.
    assert_eq!(doc.node(para).text_style.font_size, Some(32.0));
}

#[test]
fn test_descendant_combinator() {
    let doc = convert(concat!(
        "<style>div b { color: red }</style>",
        "<div><p>a <b>match</b></p></div>",
        "<p>b <b>no match</b></p>",
    ));
    let spans: Vec<_> = doc
        .descendants(doc.root())
        .filter(|&n| matches!(doc.kind(n), NodeKind::Span))
        .collect();
    assert_eq!(spans.len(), 2);
    assert_eq!(doc.node(spans[0]).text_style.foreground, red());
    assert_eq!(doc.node(spans[1]).text_style.foreground, ColorValue::Unset);
}

#[test]
fn test_presentational_font_element() {
    let doc = convert(r#"<p><font color="red" size="5">big red</font></p>"#);
    let span = find(&doc, |k| matches!(k, NodeKind::Span)).expect("font becomes a span");
    assert_eq!(doc.node(span).text_style.foreground, red());
    assert_eq!(doc.node(span).text_style.font_size, Some(24.0));
}

#[test]
fn test_underline_decoration_on_paragraph() {
    let doc = convert(r#"<p style="text-decoration: underline">text</p>"#);
    let para = doc.children(doc.root())[0];
    assert_eq!(
        doc.kind(para),
        &NodeKind::Paragraph {
            decoration: TextDecoration::Underline,
            text_indent: None
        }
    );
}

#[test]
fn test_body_style_lands_on_document_root() {
    let doc = convert("<style>body { color: red }</style><p>text</p>");
    assert_eq!(doc.node(doc.root()).text_style.foreground, red());
}

// ============================================================================
// Fragment extraction
// ============================================================================

#[test]
fn test_fragment_extraction_keeps_marked_block() {
    let doc = convert_fragment(concat!(
        "<p>before</p>",
        "<!--StartFragment--><p>inside</p><!--EndFragment-->",
        "<p>after</p>",
    ));
    let children = doc.children(doc.root());
    assert_eq!(children.len(), 1);
    assert_eq!(doc.text(children[0]), "inside");
}

#[test]
fn test_inline_fragment_hosted_in_paragraph() {
    let doc = convert_fragment("<p>aa<!--StartFragment-->bb<!--EndFragment-->cc</p>");
    let children = doc.children(doc.root());
    assert_eq!(children.len(), 1);
    assert!(matches!(doc.kind(children[0]), NodeKind::Paragraph { .. }));
    assert_eq!(doc.text(children[0]), "bb");
}

#[test]
fn test_without_markers_extraction_is_a_no_op() {
    let doc = convert_fragment("<p>a</p><p>b</p>");
    assert_eq!(doc.children(doc.root()).len(), 2);
}

// ============================================================================
// Structural invariants
// ============================================================================

#[test]
fn test_children_are_always_legal() {
    // Deliberately messy markup: misnested blocks, orphan items, stray
    // cells. The output tree must still satisfy the allowed-children table.
    let doc = convert(concat!(
        "<div><p>a<div>b</div></p></div>",
        "<li>stray</li>",
        "<td>stray cell</td>",
        "<ul><p>not an item</p><li>item</li></ul>",
        "<table><tr><td><table><tr><td>x</td><td>y</td></tr></table></td>",
        "<td>z</td></tr></table>",
    ));

    for node in doc.descendants(doc.root()) {
        let kind = doc.kind(node);
        for &child in doc.children(node) {
            let child_kind = doc.kind(child);
            assert_eq!(doc.node(child).parent, Some(node));
            match kind {
                NodeKind::Document
                | NodeKind::Section
                | NodeKind::ListItem
                | NodeKind::Cell { .. }
                | NodeKind::BlockContainer => assert!(child_kind.is_block()),
                NodeKind::Paragraph { .. }
                | NodeKind::Span
                | NodeKind::Hyperlink { .. }
                | NodeKind::InlineContainer => assert!(child_kind.is_inline()),
                NodeKind::List { .. } => assert!(matches!(child_kind, NodeKind::ListItem)),
                NodeKind::Table { .. } => assert!(matches!(child_kind, NodeKind::RowGroup)),
                NodeKind::RowGroup => assert!(matches!(child_kind, NodeKind::Row)),
                NodeKind::Row => assert!(matches!(child_kind, NodeKind::Cell { .. })),
                NodeKind::Run { .. } | NodeKind::LineBreak | NodeKind::Image { .. } => {
                    panic!("leaf kind {} has children", kind.name())
                }
            }
        }
    }
}

#[test]
fn test_source_tracking() {
    let options = ConvertOptions {
        track_source_elements: true,
        ..ConvertOptions::default()
    };
    let doc = convert_html("<p>a</p>", &options).expect("conversion failed");
    let para = doc.children(doc.root())[0];
    assert!(doc.node(para).source.is_some());

    let doc = convert("<p>a</p>");
    let para = doc.children(doc.root())[0];
    assert!(doc.node(para).source.is_none());
}
