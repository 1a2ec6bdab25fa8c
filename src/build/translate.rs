//! Translation of resolved property maps into concrete node attributes.
//!
//! Runs with the owning element already on the context stack, so relative
//! lengths resolve against the live ancestor chain.

use crate::context::SourceContext;
use crate::css::{CssValue, PropertyMap};
use crate::doc::{
    BoxStyle, ColorValue, FontStyle, FontWeight, ListMarker, TextAlign, TextDecoration, TextStyle,
    Thickness,
};

/// Character styling from the element's own declarations.
pub(super) fn text_style(props: &PropertyMap, ctx: &SourceContext) -> TextStyle {
    let mut style = TextStyle::default();

    if let Some(family) = props.get("font-family") {
        style.font_family = match family {
            CssValue::String(s) => Some(s.clone()),
            CssValue::Keyword(k) => Some(k.clone()),
            _ => None,
        };
    }

    if props.contains_key("font-size") {
        // The element is on top of the stack, so the walk starts from its
        // own declaration.
        match ctx.absolute_font_size() {
            Ok(px) => style.font_size = Some(px),
            Err(err) => log::debug!("font size left unresolved: {err}"),
        }
    }

    if let Some(value) = props.get("font-style") {
        style.font_style = value.as_keyword().and_then(FontStyle::from_keyword);
    }

    if let Some(value) = props.get("font-weight") {
        style.font_weight = match value {
            CssValue::Keyword(k) => FontWeight::from_keyword(k),
            CssValue::Number(n) => Some(FontWeight(*n as u16)),
            _ => None,
        };
    }

    if let Some(color) = props.get("color").and_then(CssValue::as_color) {
        style.foreground = ColorValue::Color(color);
    }
    if let Some(color) = props.get("background-color").and_then(CssValue::as_color) {
        style.background = ColorValue::Color(color);
    }

    style
}

/// Box styling from the element's own declarations.
pub(super) fn box_style(props: &PropertyMap, ctx: &SourceContext) -> BoxStyle {
    let mut style = BoxStyle::default();

    style.margin = thickness(props, ctx, MARGIN_SIDES);
    style.padding = thickness(props, ctx, PADDING_SIDES);
    style.border = thickness(props, ctx, BORDER_SIDES);
    style.border_color = props.get("border-color").and_then(CssValue::as_color);

    if let Some(align) = props.get("text-align") {
        style.text_align = align.as_keyword().and_then(TextAlign::from_keyword);
    }

    if let Some(value) = props.get("line-height") {
        style.line_height = match value {
            CssValue::Number(n) => Some(*n),
            CssValue::Length(l) => line_height_multiplier(*l, ctx),
            _ => None,
        };
    }

    style
}

const MARGIN_SIDES: [&str; 4] = [
    "margin-top",
    "margin-right",
    "margin-bottom",
    "margin-left",
];
const PADDING_SIDES: [&str; 4] = [
    "padding-top",
    "padding-right",
    "padding-bottom",
    "padding-left",
];
const BORDER_SIDES: [&str; 4] = [
    "border-top-width",
    "border-right-width",
    "border-bottom-width",
    "border-left-width",
];

/// Assemble a thickness from four side properties. Sides without an
/// absolute-resolvable value stay zero; absent on all four sides means no
/// thickness at all.
fn thickness(props: &PropertyMap, ctx: &SourceContext, sides: [&str; 4]) -> Option<Thickness> {
    let mut any = false;
    let mut px = [0.0f32; 4];

    for (i, side) in sides.iter().enumerate() {
        let Some(length) = props.get(*side).and_then(CssValue::as_length) else {
            continue;
        };
        any = true;
        if let Ok(Some(value)) = ctx.resolve_length(length) {
            px[i] = value;
        }
    }

    any.then(|| Thickness {
        top: px[0],
        right: px[1],
        bottom: px[2],
        left: px[3],
    })
}

fn line_height_multiplier(length: crate::length::Length, ctx: &SourceContext) -> Option<f32> {
    let px = ctx.resolve_length(length).ok().flatten()?;
    let font = ctx.absolute_font_size().ok()?;
    (font > 0.0).then(|| px / font)
}

/// Paragraph decoration, inherited through the ancestor chain.
pub(super) fn paragraph_decoration(ctx: &SourceContext) -> TextDecoration {
    ctx.lookup("text-decoration")
        .and_then(CssValue::as_keyword)
        .and_then(TextDecoration::from_keywords)
        .unwrap_or_default()
}

/// First-line indent from the element's own declaration, in pixels.
pub(super) fn paragraph_indent(props: &PropertyMap, ctx: &SourceContext) -> Option<f32> {
    let length = props.get("text-indent").and_then(CssValue::as_length)?;
    ctx.resolve_length(length).ok().flatten()
}

/// Marker style for a list element; inheritable so nested content can
/// override it.
pub(super) fn list_marker(ctx: &SourceContext) -> ListMarker {
    ctx.lookup("list-style-type")
        .and_then(CssValue::as_keyword)
        .and_then(ListMarker::from_keyword)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::Color;
    use crate::dom::SourceId;
    use crate::length::Length;

    fn props(pairs: &[(&str, CssValue)]) -> PropertyMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn ctx_with(pairs: &[(&str, CssValue)]) -> (SourceContext, PropertyMap) {
        let mut ctx = SourceContext::new();
        ctx.push(
            SourceId(0),
            props(&[("font-size", CssValue::Length(Length::Px(16.0)))]),
        );
        let map = props(pairs);
        ctx.push(SourceId(1), map.clone());
        (ctx, map)
    }

    #[test]
    fn test_text_style_translation() {
        let (ctx, map) = ctx_with(&[
            ("font-size", CssValue::Length(Length::Em(2.0))),
            ("font-weight", CssValue::Keyword("bold".into())),
            ("color", CssValue::Color(Color::rgb(1, 2, 3))),
        ]);
        let style = text_style(&map, &ctx);
        assert_eq!(style.font_size, Some(32.0));
        assert_eq!(style.font_weight, Some(FontWeight::BOLD));
        assert_eq!(style.foreground, ColorValue::Color(Color::rgb(1, 2, 3)));
        assert_eq!(style.background, ColorValue::Unset);
    }

    #[test]
    fn test_margin_thickness_resolves_relative_units() {
        let (ctx, map) = ctx_with(&[
            ("margin-top", CssValue::Length(Length::Em(1.0))),
            ("margin-left", CssValue::Length(Length::Px(4.0))),
        ]);
        let style = box_style(&map, &ctx);
        let margin = style.margin.unwrap();
        assert_eq!(margin.top, 16.0);
        assert_eq!(margin.left, 4.0);
        assert_eq!(margin.right, 0.0);
    }

    #[test]
    fn test_no_box_declarations_is_empty_style() {
        let (ctx, map) = ctx_with(&[]);
        assert!(box_style(&map, &ctx).is_empty());
    }

    #[test]
    fn test_line_height_length_becomes_multiplier() {
        let (ctx, map) = ctx_with(&[("line-height", CssValue::Length(Length::Px(24.0)))]);
        let style = box_style(&map, &ctx);
        assert_eq!(style.line_height, Some(1.5));
    }

    #[test]
    fn test_decoration_inherits_through_chain() {
        let mut ctx = SourceContext::new();
        ctx.push(
            SourceId(0),
            props(&[("text-decoration", CssValue::Keyword("underline".into()))]),
        );
        ctx.push(SourceId(1), PropertyMap::new());
        assert_eq!(paragraph_decoration(&ctx), TextDecoration::Underline);
    }
}
