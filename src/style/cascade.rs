//! Per-element cascade: merge tag defaults, presentational attributes,
//! stylesheet rules, and inline style into one property map.

use crate::css::{
    CssValue, Declaration, PropertyMap, Stylesheet, parse_color_str, parse_inline_style,
};
use crate::dom::{SourceDom, SourceId};
use crate::length::Length;
use crate::selector::Specificity;

use super::apply_tag_defaults;

/// Resolve the properties declared on one element.
///
/// Stronger tiers are inserted first and weaker tiers fill the gaps, so a
/// single `or_insert` per property realizes the whole precedence order:
/// inline `!important`, sheet `!important`, inline, sheet (by specificity,
/// later declarations winning ties), presentational attributes, tag
/// defaults. Inherited values are NOT copied in; ancestors are consulted
/// through the context stack at lookup time.
pub fn element_properties(
    dom: &SourceDom,
    element: SourceId,
    sheets: &[Stylesheet],
) -> PropertyMap {
    let mut map = PropertyMap::new();

    let inline = dom
        .attr(element, "style")
        .map(parse_inline_style)
        .unwrap_or_default();
    let matched = match_sheet_declarations(dom, element, sheets);

    insert_declarations(&mut map, inline.iter().filter(|d| d.important));
    insert_declarations(
        &mut map,
        matched.iter().map(|m| m.declaration).filter(|d| d.important),
    );
    insert_declarations(&mut map, inline.iter().filter(|d| !d.important));
    insert_declarations(
        &mut map,
        matched
            .iter()
            .map(|m| m.declaration)
            .filter(|d| !d.important),
    );

    apply_presentational_attributes(dom, element, &mut map);

    if let Some(tag) = dom.tag_name(element) {
        apply_tag_defaults(tag, &mut map);
    }

    map
}

struct MatchedDeclaration<'a> {
    specificity: Specificity,
    /// Position of the owning rule across all sheets; later rules win ties.
    order: usize,
    declaration: &'a Declaration,
}

/// Declarations from every matching rule, strongest first.
fn match_sheet_declarations<'a>(
    dom: &SourceDom,
    element: SourceId,
    sheets: &'a [Stylesheet],
) -> Vec<MatchedDeclaration<'a>> {
    let mut matched = Vec::new();
    let mut order = 0;

    for sheet in sheets {
        for rule in &sheet.rules {
            if let Some(specificity) = rule.match_specificity(dom, element) {
                // Within one rule the last declaration of a property wins;
                // reversing here keeps the strongest-first contract.
                for declaration in rule.declarations.iter().rev() {
                    matched.push(MatchedDeclaration {
                        specificity,
                        order,
                        declaration,
                    });
                }
            }
            order += 1;
        }
    }

    // Descending so the or_insert pass sees the winner first; the sort is
    // stable, preserving the reversed within-rule order.
    matched.sort_by(|a, b| {
        b.specificity
            .cmp(&a.specificity)
            .then(b.order.cmp(&a.order))
    });
    matched
}

fn insert_declarations<'a>(
    map: &mut PropertyMap,
    declarations: impl Iterator<Item = &'a Declaration>,
) {
    // Within one strength tier the FIRST seen declaration of a property must
    // win under or_insert, so callers pass declarations strongest-first.
    for declaration in declarations {
        map.entry(declaration.property.clone())
            .or_insert_with(|| declaration.value.clone());
    }
}

/// Legacy markup attributes that act as weak style declarations.
fn apply_presentational_attributes(dom: &SourceDom, element: SourceId, map: &mut PropertyMap) {
    let mut set = |property: &str, value: CssValue| {
        map.entry(property.to_string()).or_insert(value);
    };

    if let Some(width) = dom.attr(element, "width")
        && let Some(length) = parse_attr_length(width)
    {
        set("width", CssValue::Length(length));
    }
    if let Some(height) = dom.attr(element, "height")
        && let Some(length) = parse_attr_length(height)
    {
        set("height", CssValue::Length(length));
    }
    if let Some(face) = dom.attr(element, "face") {
        set("font-family", CssValue::String(face.to_string()));
    }
    if let Some(size) = dom.attr(element, "size")
        && let Some(px) = font_size_attr_px(size)
    {
        set("font-size", CssValue::Length(Length::Px(px)));
    }
    if let Some(color) = dom.attr(element, "color")
        && let Some(color) = parse_color_str(color)
    {
        set("color", CssValue::Color(color));
    }
    if let Some(bgcolor) = dom.attr(element, "bgcolor")
        && let Some(color) = parse_color_str(bgcolor)
    {
        set("background-color", CssValue::Color(color));
    }
    if let Some(align) = dom.attr(element, "align") {
        let align = align.to_ascii_lowercase();
        if matches!(align.as_str(), "left" | "right" | "center" | "justify") {
            set("text-align", CssValue::Keyword(align));
        }
    }
}

/// `width="400"` means pixels; `width="50%"` means percent.
fn parse_attr_length(value: &str) -> Option<Length> {
    let value = value.trim();
    if let Some(percent) = value.strip_suffix('%') {
        return percent.trim().parse::<f32>().ok().map(Length::Percent);
    }
    let value = value.strip_suffix("px").unwrap_or(value);
    value.trim().parse::<f32>().ok().map(Length::Px)
}

/// `<font size>` values: absolute 1-7 tiers, or +n/-n relative to 3.
fn font_size_attr_px(value: &str) -> Option<f32> {
    let value = value.trim();
    let tier = if let Some(rel) = value.strip_prefix('+') {
        3 + rel.parse::<i32>().ok()?
    } else if value.starts_with('-') {
        3 + value.parse::<i32>().ok()?
    } else {
        value.parse::<i32>().ok()?
    };
    let px = match tier.clamp(1, 7) {
        1 => 10.0,
        2 => 13.0,
        3 => 16.0,
        4 => 18.0,
        5 => 24.0,
        6 => 32.0,
        _ => 48.0,
    };
    Some(px)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::Color;

    fn props_for(html: &str, css: &str, tag: &str) -> PropertyMap {
        let dom = SourceDom::parse(html);
        let element = dom.find_by_tag(tag).unwrap();
        let sheets = vec![Stylesheet::parse(css)];
        element_properties(&dom, element, &sheets)
    }

    #[test]
    fn test_sheet_rule_applies() {
        let props = props_for("<p>x</p>", "p { color: red }", "p");
        assert_eq!(
            props.get("color"),
            Some(&CssValue::Color(Color::rgb(255, 0, 0)))
        );
    }

    #[test]
    fn test_specificity_beats_order() {
        let props = props_for(
            r#"<p class="x">x</p>"#,
            "p.x { color: red } p { color: blue }",
            "p",
        );
        assert_eq!(
            props.get("color"),
            Some(&CssValue::Color(Color::rgb(255, 0, 0)))
        );
    }

    #[test]
    fn test_later_rule_wins_equal_specificity() {
        let props = props_for("<p>x</p>", "p { color: red } p { color: blue }", "p");
        assert_eq!(
            props.get("color"),
            Some(&CssValue::Color(Color::rgb(0, 0, 255)))
        );
    }

    #[test]
    fn test_inline_style_beats_sheet() {
        let props = props_for(
            r#"<p style="color: green">x</p>"#,
            "p { color: red !important }",
            "p",
        );
        // Sheet !important still beats plain inline.
        assert_eq!(
            props.get("color"),
            Some(&CssValue::Color(Color::rgb(255, 0, 0)))
        );
    }

    #[test]
    fn test_inline_important_beats_everything() {
        let props = props_for(
            r#"<p style="color: green !important">x</p>"#,
            "p { color: red !important }",
            "p",
        );
        assert_eq!(
            props.get("color"),
            Some(&CssValue::Color(Color::rgb(0, 128, 0)))
        );
    }

    #[test]
    fn test_important_beats_specificity() {
        let props = props_for(
            r#"<p id="a" class="x">x</p>"#,
            "p { color: blue !important } #a.x { color: red }",
            "p",
        );
        assert_eq!(
            props.get("color"),
            Some(&CssValue::Color(Color::rgb(0, 0, 255)))
        );
    }

    #[test]
    fn test_presentational_attributes() {
        let props = props_for(
            r##"<table width="400" bgcolor="#eee"><tr><td>x</td></tr></table>"##,
            "",
            "table",
        );
        assert_eq!(
            props.get("width"),
            Some(&CssValue::Length(Length::Px(400.0)))
        );
        assert_eq!(
            props.get("background-color"),
            Some(&CssValue::Color(Color::rgb(0xee, 0xee, 0xee)))
        );
    }

    #[test]
    fn test_percent_width_attribute() {
        let props = props_for(
            r#"<table><tr><td width="50%">x</td></tr></table>"#,
            "",
            "td",
        );
        assert_eq!(
            props.get("width"),
            Some(&CssValue::Length(Length::Percent(50.0)))
        );
    }

    #[test]
    fn test_sheet_beats_presentational_attribute() {
        let props = props_for(
            r#"<table><tr><td width="50%">x</td></tr></table>"#,
            "td { width: 120px }",
            "td",
        );
        assert_eq!(
            props.get("width"),
            Some(&CssValue::Length(Length::Px(120.0)))
        );
    }

    #[test]
    fn test_font_element_attributes() {
        let props = props_for(
            r#"<p><font face="Georgia" size="5" color="red">x</font></p>"#,
            "",
            "font",
        );
        assert_eq!(
            props.get("font-family"),
            Some(&CssValue::String("Georgia".into()))
        );
        assert_eq!(
            props.get("font-size"),
            Some(&CssValue::Length(Length::Px(24.0)))
        );
        assert_eq!(
            props.get("color"),
            Some(&CssValue::Color(Color::rgb(255, 0, 0)))
        );
    }

    #[test]
    fn test_tag_defaults_weakest() {
        let props = props_for("<b>x</b>", "b { font-weight: normal }", "b");
        assert_eq!(
            props.get("font-weight"),
            Some(&CssValue::Keyword("normal".into()))
        );

        let props = props_for("<b>x</b>", "", "b");
        assert_eq!(
            props.get("font-weight"),
            Some(&CssValue::Keyword("bold".into()))
        );
    }

    #[test]
    fn test_no_inheritance_copying() {
        let dom = SourceDom::parse(r#"<div style="color: red"><p>x</p></div>"#);
        let p = dom.find_by_tag("p").unwrap();
        let props = element_properties(&dom, p, &[]);
        assert!(props.get("color").is_none());
    }
}
