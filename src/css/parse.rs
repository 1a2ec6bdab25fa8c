//! cssparser glue: stylesheet text into rules, declarations, and selectors.
//!
//! All parsing is lenient. A rule whose selector group fails to parse is
//! skipped whole; an unparseable declaration or unknown property name is
//! skipped on its own. Neither is ever an error.

use cssparser::{
    AtRuleParser, ParseError, Parser, ParserInput, QualifiedRuleParser, RuleBodyItemParser,
    RuleBodyParser, StyleSheetParser, Token, parse_nth,
};

use crate::length::Length;
use crate::selector::{Combinator, CompoundSelector, Selector, SelectorList, SimpleSelector};

use super::{Color, CssValue, Declaration, Rule, Stylesheet};

/// Parse a full stylesheet.
pub(super) fn parse_stylesheet(css: &str) -> Stylesheet {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut rules = Vec::new();

    let mut rule_parser = TopLevelRuleParser { rules: &mut rules };
    let stylesheet_parser = StyleSheetParser::new(&mut parser, &mut rule_parser);

    for result in stylesheet_parser {
        // Ignore errors - lenient parsing
        let _ = result;
    }

    Stylesheet { rules }
}

/// Parse the body of an inline `style` attribute.
pub(super) fn parse_declaration_block(text: &str) -> Vec<Declaration> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let mut declarations = Vec::new();

    let mut decl_parser = DeclarationListParser {
        declarations: &mut declarations,
    };
    for result in RuleBodyParser::new(&mut parser, &mut decl_parser) {
        let _ = result;
    }

    declarations
}

/// Parser for top-level stylesheet rules.
struct TopLevelRuleParser<'a> {
    rules: &'a mut Vec<Rule>,
}

impl<'i> AtRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        // At-rules (@media, @font-face, @import handled elsewhere) are outside
        // the documented subset; skip them.
        Err(input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = SelectorList;
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        parse_selector_list(input)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &cssparser::ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let mut declarations = Vec::new();
        let mut decl_parser = DeclarationListParser {
            declarations: &mut declarations,
        };

        for result in RuleBodyParser::new(input, &mut decl_parser) {
            // Ignore errors - lenient parsing
            let _ = result;
        }

        self.rules.push(Rule {
            selectors: prelude,
            declarations,
        });

        Ok(())
    }
}

struct DeclarationListParser<'a> {
    declarations: &'a mut Vec<Declaration>,
}

impl<'i> cssparser::AtRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &cssparser::ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> cssparser::QualifiedRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &cssparser::ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> cssparser::DeclarationParser<'i> for DeclarationListParser<'_> {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &cssparser::ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let parsed = parse_property(&name.to_ascii_lowercase(), input);
        if !parsed.is_empty() {
            let important = input.try_parse(cssparser::parse_important).is_ok();
            self.declarations
                .extend(parsed.into_iter().map(|(property, value)| Declaration {
                    property: property.to_string(),
                    value,
                    important,
                }));
        }
        Ok(())
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for DeclarationListParser<'_> {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Property values
// ---------------------------------------------------------------------------

/// Parse one declaration's value, expanding shorthands to canonical
/// property names. Unknown property names yield nothing.
fn parse_property(name: &str, input: &mut Parser<'_, '_>) -> Vec<(&'static str, CssValue)> {
    match name {
        "color" => single_color("color", input),
        "background-color" => single_color("background-color", input),
        "background" => parse_background_shorthand(input)
            .map(|c| vec![("background-color", CssValue::Color(c))])
            .unwrap_or_default(),
        "border-color" => single_color("border-color", input),

        "font-family" => parse_font_family(input)
            .map(|f| vec![("font-family", CssValue::String(f))])
            .unwrap_or_default(),
        "font-size" => parse_font_size(input)
            .map(|l| vec![("font-size", CssValue::Length(l))])
            .unwrap_or_default(),
        "font-style" => single_keyword("font-style", input, &["normal", "italic", "oblique"]),
        "font-weight" => parse_font_weight(input),

        "text-align" => single_keyword(
            "text-align",
            input,
            &["left", "right", "center", "justify"],
        ),
        "text-decoration" | "text-decoration-line" => parse_text_decoration(input)
            .map(|k| vec![("text-decoration", CssValue::Keyword(k))])
            .unwrap_or_default(),
        "text-indent" => single_length("text-indent", input),
        "line-height" => parse_line_height(input)
            .map(|v| vec![("line-height", v)])
            .unwrap_or_default(),

        "margin" => parse_rect_shorthand(
            input,
            ["margin-top", "margin-right", "margin-bottom", "margin-left"],
        ),
        "margin-top" => single_length("margin-top", input),
        "margin-right" => single_length("margin-right", input),
        "margin-bottom" => single_length("margin-bottom", input),
        "margin-left" => single_length("margin-left", input),

        "padding" => parse_rect_shorthand(
            input,
            [
                "padding-top",
                "padding-right",
                "padding-bottom",
                "padding-left",
            ],
        ),
        "padding-top" => single_length("padding-top", input),
        "padding-right" => single_length("padding-right", input),
        "padding-bottom" => single_length("padding-bottom", input),
        "padding-left" => single_length("padding-left", input),

        "width" => single_length("width", input),
        "height" => single_length("height", input),
        "max-width" => single_length("max-width", input),
        "max-height" => single_length("max-height", input),

        "border" => parse_border_shorthand(input),
        "border-width" => parse_rect_shorthand(
            input,
            [
                "border-top-width",
                "border-right-width",
                "border-bottom-width",
                "border-left-width",
            ],
        ),
        "border-top-width" => single_length("border-top-width", input),
        "border-right-width" => single_length("border-right-width", input),
        "border-bottom-width" => single_length("border-bottom-width", input),
        "border-left-width" => single_length("border-left-width", input),
        "border-style" => single_keyword(
            "border-style",
            input,
            &[
                "none", "hidden", "solid", "dotted", "dashed", "double", "groove", "ridge",
                "inset", "outset",
            ],
        ),

        "list-style-type" => single_keyword(
            "list-style-type",
            input,
            &[
                "disc",
                "circle",
                "square",
                "decimal",
                "lower-alpha",
                "upper-alpha",
                "lower-latin",
                "upper-latin",
                "lower-roman",
                "upper-roman",
                "none",
            ],
        ),
        "list-style" => parse_list_style_shorthand(input),

        // Everything else is outside the documented subset.
        _ => Vec::new(),
    }
}

fn single_color(name: &'static str, input: &mut Parser<'_, '_>) -> Vec<(&'static str, CssValue)> {
    parse_color(input)
        .map(|c| vec![(name, CssValue::Color(c))])
        .unwrap_or_default()
}

fn single_length(name: &'static str, input: &mut Parser<'_, '_>) -> Vec<(&'static str, CssValue)> {
    parse_length(input)
        .map(|l| vec![(name, CssValue::Length(l))])
        .unwrap_or_default()
}

fn single_keyword(
    name: &'static str,
    input: &mut Parser<'_, '_>,
    allowed: &[&str],
) -> Vec<(&'static str, CssValue)> {
    let Ok(ident) = input.expect_ident_cloned() else {
        return Vec::new();
    };
    let ident = ident.to_ascii_lowercase();
    if allowed.contains(&ident.as_str()) {
        vec![(name, CssValue::Keyword(ident))]
    } else {
        Vec::new()
    }
}

/// Box shorthand: 1 value for all sides, 2 for vertical/horizontal,
/// 3 for top/horizontal/bottom, 4 for top/right/bottom/left.
fn parse_rect_shorthand(
    input: &mut Parser<'_, '_>,
    names: [&'static str; 4],
) -> Vec<(&'static str, CssValue)> {
    let mut values = Vec::with_capacity(4);
    while values.len() < 4 {
        match input.try_parse(|i| parse_length(i).ok_or_else(|| i.new_custom_error::<_, ()>(()))) {
            Ok(l) => values.push(l),
            Err(_) => break,
        }
    }

    let [top, right, bottom, left] = match values.as_slice() {
        [a] => [*a; 4],
        [a, b] => [*a, *b, *a, *b],
        [a, b, c] => [*a, *b, *c, *b],
        [a, b, c, d] => [*a, *b, *c, *d],
        _ => return Vec::new(),
    };

    vec![
        (names[0], CssValue::Length(top)),
        (names[1], CssValue::Length(right)),
        (names[2], CssValue::Length(bottom)),
        (names[3], CssValue::Length(left)),
    ]
}

/// `border` shorthand: width, style, and color in any order.
fn parse_border_shorthand(input: &mut Parser<'_, '_>) -> Vec<(&'static str, CssValue)> {
    let mut width: Option<Length> = None;
    let mut color: Option<Color> = None;
    let mut style: Option<String> = None;

    loop {
        if width.is_none()
            && let Ok(l) =
                input.try_parse(|i| parse_length(i).ok_or_else(|| i.new_custom_error::<_, ()>(())))
        {
            width = Some(l);
            continue;
        }
        if color.is_none()
            && let Ok(c) =
                input.try_parse(|i| parse_color(i).ok_or_else(|| i.new_custom_error::<_, ()>(())))
        {
            color = Some(c);
            continue;
        }
        if style.is_none()
            && let Ok(ident) = input.try_parse(|i| {
                let ident = i.expect_ident_cloned()?;
                match ident.to_ascii_lowercase().as_str() {
                    s @ ("none" | "hidden" | "solid" | "dotted" | "dashed" | "double" | "groove"
                    | "ridge" | "inset" | "outset") => Ok(s.to_string()),
                    _ => Err(i.new_custom_error::<_, ()>(())),
                }
            })
        {
            // Keyword border widths only appear in the shorthand.
            style = Some(ident);
            continue;
        }
        if input
            .try_parse(|i| {
                let ident = i.expect_ident_cloned()?;
                match ident.to_ascii_lowercase().as_str() {
                    "thin" | "medium" | "thick" => Ok(ident),
                    _ => Err(i.new_custom_error::<_, ()>(())),
                }
            })
            .map(|ident| {
                if width.is_none() {
                    width = Some(match ident.to_ascii_lowercase().as_str() {
                        "thin" => Length::Px(1.0),
                        "thick" => Length::Px(5.0),
                        _ => Length::Px(3.0),
                    });
                }
            })
            .is_ok()
        {
            continue;
        }
        break;
    }

    let mut out = Vec::new();
    if let Some(w) = width {
        for side in [
            "border-top-width",
            "border-right-width",
            "border-bottom-width",
            "border-left-width",
        ] {
            out.push((side, CssValue::Length(w)));
        }
    }
    if let Some(c) = color {
        out.push(("border-color", CssValue::Color(c)));
    }
    if let Some(s) = style {
        out.push(("border-style", CssValue::Keyword(s)));
    }
    out
}

/// `list-style` shorthand: extract just the marker type.
fn parse_list_style_shorthand(input: &mut Parser<'_, '_>) -> Vec<(&'static str, CssValue)> {
    while let Ok(ident) = input.try_parse(|i| i.expect_ident_cloned()) {
        let ident = ident.to_ascii_lowercase();
        match ident.as_str() {
            "disc" | "circle" | "square" | "decimal" | "lower-alpha" | "upper-alpha"
            | "lower-latin" | "upper-latin" | "lower-roman" | "upper-roman" | "none" => {
                return vec![("list-style-type", CssValue::Keyword(ident))];
            }
            // position/image keywords: skip
            _ => continue,
        }
    }
    Vec::new()
}

fn parse_font_family(input: &mut Parser<'_, '_>) -> Option<String> {
    let mut families = Vec::new();
    loop {
        if let Ok(name) = input.try_parse(|i| i.expect_string_cloned()) {
            families.push(name.to_string());
        } else {
            // Unquoted family names may span several idents.
            let mut words = Vec::new();
            while let Ok(word) = input.try_parse(|i| i.expect_ident_cloned()) {
                words.push(word.to_string());
            }
            if words.is_empty() {
                break;
            }
            families.push(words.join(" "));
        }
        if input.try_parse(|i| i.expect_comma()).is_err() {
            break;
        }
    }
    if families.is_empty() {
        None
    } else {
        Some(families.join(", "))
    }
}

fn parse_font_size(input: &mut Parser<'_, '_>) -> Option<Length> {
    if let Ok(length) =
        input.try_parse(|i| parse_length(i).ok_or_else(|| i.new_custom_error::<_, ()>(())))
    {
        if !length.is_auto() {
            return Some(length);
        }
        return None;
    }

    let ident = input.try_parse(|i| i.expect_ident_cloned()).ok()?;
    // Absolute keyword sizes follow the common browser tiers; relative
    // keywords become font-relative lengths.
    match ident.to_ascii_lowercase().as_str() {
        "xx-small" => Some(Length::Px(9.0)),
        "x-small" => Some(Length::Px(10.0)),
        "small" => Some(Length::Px(13.0)),
        "medium" => Some(Length::Px(16.0)),
        "large" => Some(Length::Px(18.0)),
        "x-large" => Some(Length::Px(24.0)),
        "xx-large" => Some(Length::Px(32.0)),
        "smaller" => Some(Length::Em(0.833)),
        "larger" => Some(Length::Em(1.2)),
        _ => None,
    }
}

fn parse_font_weight(input: &mut Parser<'_, '_>) -> Vec<(&'static str, CssValue)> {
    if let Ok(ident) = input.try_parse(|i| i.expect_ident_cloned()) {
        return match ident.to_ascii_lowercase().as_str() {
            k @ ("normal" | "bold" | "bolder" | "lighter") => {
                vec![("font-weight", CssValue::Keyword(k.to_string()))]
            }
            _ => Vec::new(),
        };
    }
    if let Ok(Token::Number { value, .. }) = input.next().cloned() {
        let weight = value.clamp(1.0, 1000.0);
        return vec![("font-weight", CssValue::Number(weight))];
    }
    Vec::new()
}

fn parse_text_decoration(input: &mut Parser<'_, '_>) -> Option<String> {
    let mut parts = Vec::new();
    while let Ok(ident) = input.try_parse(|i| i.expect_ident_cloned()) {
        match ident.to_ascii_lowercase().as_str() {
            k @ ("underline" | "overline" | "line-through" | "none") => parts.push(k.to_string()),
            _ => continue,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn parse_line_height(input: &mut Parser<'_, '_>) -> Option<CssValue> {
    match input.next().ok()? {
        Token::Number { value, .. } => Some(CssValue::Number(*value)),
        Token::Dimension { value, unit, .. } => {
            dimension_to_length(*value, unit.as_ref()).map(CssValue::Length)
        }
        Token::Percentage { unit_value, .. } => {
            // Percentage line-height is a multiplier of the font size.
            Some(CssValue::Number(*unit_value))
        }
        Token::Ident(ident) if ident.eq_ignore_ascii_case("normal") => {
            Some(CssValue::Keyword("normal".to_string()))
        }
        _ => None,
    }
}

pub(crate) fn parse_length(input: &mut Parser<'_, '_>) -> Option<Length> {
    match input.next().ok()? {
        Token::Dimension { value, unit, .. } => dimension_to_length(*value, unit.as_ref()),
        Token::Percentage { unit_value, .. } => Some(Length::Percent(*unit_value * 100.0)),
        Token::Number { value, .. } if *value == 0.0 => Some(Length::Px(0.0)),
        Token::Ident(ident) if ident.eq_ignore_ascii_case("auto") => Some(Length::Auto),
        _ => None,
    }
}

fn dimension_to_length(value: f32, unit: &str) -> Option<Length> {
    let length = match unit {
        "px" => Length::Px(value),
        "pt" => Length::Pt(value),
        "em" => Length::Em(value),
        "ex" => Length::Ex(value),
        "ch" => Length::Ch(value),
        "rem" => Length::Rem(value),
        "%" => Length::Percent(value),
        "vw" => Length::Vw(value),
        "vh" => Length::Vh(value),
        "vmin" => Length::Vmin(value),
        "vmax" => Length::Vmax(value),
        // Physical units normalize to pixels.
        "in" => Length::Px(value * 96.0),
        "cm" => Length::Px(value * 96.0 / 2.54),
        "mm" => Length::Px(value * 96.0 / 25.4),
        "pc" => Length::Px(value * 16.0),
        _ => return None,
    };
    Some(length)
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

/// Parse a color from attribute text. Legacy markup may omit the `#` on
/// hex colors, so a bare hex string is accepted as a fallback.
pub(crate) fn parse_color_str(text: &str) -> Option<Color> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    parse_color(&mut parser).or_else(|| parse_hex_color(text.trim()))
}

pub(crate) fn parse_color(input: &mut Parser<'_, '_>) -> Option<Color> {
    if let Ok(token) = input.try_parse(|i| i.expect_ident_cloned()) {
        return named_color(&token.to_ascii_lowercase());
    }

    // Hex colors arrive as IDHash (identifier-shaped) or Hash (digit-leading).
    // The token type must be checked inside try_parse so a failed match
    // rewinds the parser.
    if let Ok(hash) = input.try_parse(|i| -> Result<_, ParseError<'_, ()>> {
        match i.next()? {
            Token::IDHash(h) | Token::Hash(h) => Ok(h.clone()),
            _ => Err(i.new_custom_error(())),
        }
    }) && let Some(color) = parse_hex_color(hash.as_ref())
    {
        return Some(color);
    }

    if let Ok(color) = input.try_parse(parse_rgb_function) {
        return Some(color);
    }

    None
}

fn named_color(name: &str) -> Option<Color> {
    let color = match name {
        "black" => Color::BLACK,
        "white" => Color::WHITE,
        "red" => Color::rgb(255, 0, 0),
        "green" => Color::rgb(0, 128, 0),
        "blue" => Color::rgb(0, 0, 255),
        "yellow" => Color::rgb(255, 255, 0),
        "cyan" | "aqua" => Color::rgb(0, 255, 255),
        "magenta" | "fuchsia" => Color::rgb(255, 0, 255),
        "gray" | "grey" => Color::rgb(128, 128, 128),
        "silver" => Color::rgb(192, 192, 192),
        "maroon" => Color::rgb(128, 0, 0),
        "olive" => Color::rgb(128, 128, 0),
        "lime" => Color::rgb(0, 255, 0),
        "navy" => Color::rgb(0, 0, 128),
        "teal" => Color::rgb(0, 128, 128),
        "purple" => Color::rgb(128, 0, 128),
        "orange" => Color::rgb(255, 165, 0),
        "brown" => Color::rgb(165, 42, 42),
        "transparent" => Color::TRANSPARENT,
        _ => return None,
    };
    Some(color)
}

fn parse_hex_color(hex: &str) -> Option<Color> {
    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(Color::rgb(r, g, b))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color::rgb(r, g, b))
        }
        8 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
            Some(Color::rgba(r, g, b, a))
        }
        _ => None,
    }
}

fn parse_rgb_function<'i>(input: &mut Parser<'i, '_>) -> Result<Color, ParseError<'i, ()>> {
    let name = input.expect_function()?.clone();
    if !name.eq_ignore_ascii_case("rgb") && !name.eq_ignore_ascii_case("rgba") {
        return Err(input.new_custom_error(()));
    }
    input.parse_nested_block(|input| {
        let r = parse_color_component(input)?;
        let _ = input.try_parse(|i| i.expect_comma());
        let g = parse_color_component(input)?;
        let _ = input.try_parse(|i| i.expect_comma());
        let b = parse_color_component(input)?;
        // Optional alpha, slash- or comma-separated.
        let _ = input.try_parse(|i| i.expect_comma());
        let _ = input.try_parse(|i| i.expect_delim('/'));
        if let Ok(alpha) = input.try_parse(|i| -> Result<f32, ParseError<'_, ()>> {
            let location = i.current_source_location();
            match i.next()? {
                Token::Number { value, .. } => Ok(*value),
                Token::Percentage { unit_value, .. } => Ok(*unit_value),
                _ => Err(location.new_custom_error(())),
            }
        }) {
            let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
            return Ok(Color::rgba(r, g, b, a));
        }
        Ok(Color::rgb(r, g, b))
    })
}

fn parse_color_component<'i>(input: &mut Parser<'i, '_>) -> Result<u8, ParseError<'i, ()>> {
    let location = input.current_source_location();
    match input.next()? {
        Token::Number { value, .. } => Ok(value.round().clamp(0.0, 255.0) as u8),
        Token::Percentage { unit_value, .. } => {
            Ok((unit_value * 255.0).round().clamp(0.0, 255.0) as u8)
        }
        _ => Err(location.new_custom_error(())),
    }
}

/// `background` shorthand: extract just the color component, skipping
/// images, positions, and repeat keywords.
fn parse_background_shorthand(input: &mut Parser<'_, '_>) -> Option<Color> {
    let mut color: Option<Color> = None;

    loop {
        if color.is_none()
            && let Ok(c) =
                input.try_parse(|i| parse_color(i).ok_or_else(|| i.new_custom_error::<_, ()>(())))
        {
            color = Some(c);
            continue;
        }
        if input.try_parse(|i| i.expect_url()).is_ok() {
            continue;
        }
        if input
            .try_parse(|i: &mut Parser<'_, '_>| {
                let _ = i.expect_function()?;
                i.parse_nested_block(|nested| -> Result<(), ParseError<'_, ()>> {
                    while nested.next().is_ok() {}
                    Ok(())
                })
            })
            .is_ok()
        {
            continue;
        }
        if input
            .try_parse(|i| match i.next() {
                Ok(
                    Token::Ident(_)
                    | Token::Dimension { .. }
                    | Token::Percentage { .. }
                    | Token::Number { .. }
                    | Token::Delim('/'),
                ) => Ok(()),
                _ => Err(i.new_custom_error::<_, ()>(())),
            })
            .is_ok()
        {
            continue;
        }
        break;
    }

    color
}

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

fn parse_selector_list<'i>(
    input: &mut Parser<'i, '_>,
) -> Result<SelectorList, ParseError<'i, ()>> {
    let selectors = input.parse_comma_separated(parse_complex_selector)?;
    if selectors.is_empty() {
        return Err(input.new_custom_error(()));
    }
    Ok(SelectorList { selectors })
}

/// Parse one complex selector off the token stream.
///
/// Builds the compound chain left-to-right, then reverses it into the
/// right-to-left layout the matcher evaluates. A combinator token (or bare
/// whitespace between compounds) closes the current compound; the
/// combinator is recorded as linking it to the compound that follows.
fn parse_complex_selector<'i>(input: &mut Parser<'i, '_>) -> Result<Selector, ParseError<'i, ()>> {
    // Closed compounds, each with the combinator to its right-hand neighbor.
    let mut chain: Vec<(CompoundSelector, Combinator)> = Vec::new();
    let mut current = CompoundSelector::default();
    let mut seen_whitespace = false;

    loop {
        let token = match input.next_including_whitespace() {
            Ok(t) => t.clone(),
            Err(_) => break,
        };

        match token {
            Token::WhiteSpace(_) => {
                if !current.parts.is_empty() {
                    seen_whitespace = true;
                }
            }
            Token::Delim(c @ ('>' | '+' | '~')) => {
                if current.parts.is_empty() {
                    return Err(input.new_custom_error(()));
                }
                let combinator = match c {
                    '>' => Combinator::Child,
                    '+' => Combinator::NextSibling,
                    _ => Combinator::SubsequentSibling,
                };
                chain.push((std::mem::take(&mut current), combinator));
                seen_whitespace = false;
            }
            other => {
                if seen_whitespace && !current.parts.is_empty() {
                    chain.push((std::mem::take(&mut current), Combinator::Descendant));
                }
                seen_whitespace = false;
                let part = parse_simple_selector(other, input)?;
                current.parts.push(part);
            }
        }
    }

    if current.parts.is_empty() {
        return Err(input.new_custom_error(()));
    }

    // Rightmost compound becomes the key; earlier compounds flip into
    // right-to-left order, each keeping the combinator that linked it to
    // its successor.
    let key = current;
    let rest = chain
        .into_iter()
        .rev()
        .map(|(compound, combinator)| (combinator, compound))
        .collect();

    Ok(Selector { key, rest })
}

fn parse_simple_selector<'i>(
    token: Token<'i>,
    input: &mut Parser<'i, '_>,
) -> Result<SimpleSelector, ParseError<'i, ()>> {
    match token {
        Token::Delim('*') => Ok(SimpleSelector::Universal),
        Token::Ident(name) => Ok(SimpleSelector::Tag(name.to_ascii_lowercase())),
        Token::IDHash(id) => Ok(SimpleSelector::Id(id.to_string())),
        Token::Hash(id) => Ok(SimpleSelector::Id(id.to_string())),
        Token::Delim('.') => {
            let class = input.expect_ident_cloned()?;
            Ok(SimpleSelector::Class(class.to_string()))
        }
        Token::Colon => {
            let location = input.current_source_location();
            match input.next()?.clone() {
                Token::Ident(name) => match name.to_ascii_lowercase().as_str() {
                    "first-child" => Ok(SimpleSelector::NthChild { offset: 0, step: 0 }),
                    // Pseudo-classes outside the subset: the rule never
                    // matches, which lenient parsing realizes by skipping it.
                    _ => Err(location.new_custom_error(())),
                },
                Token::Function(name) => match name.to_ascii_lowercase().as_str() {
                    "nth-child" => {
                        let (a, b) =
                            input.parse_nested_block(|i| parse_nth(i).map_err(Into::into))?;
                        Ok(SimpleSelector::NthChild {
                            offset: b - 1,
                            step: a,
                        })
                    }
                    _ => Err(location.new_custom_error(())),
                },
                _ => Err(location.new_custom_error(())),
            }
        }
        _ => Err(input.new_custom_error(())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(css: &str) -> Rule {
        let sheet = parse_stylesheet(css);
        assert_eq!(sheet.rules.len(), 1, "expected one rule from {css:?}");
        sheet.rules.into_iter().next().unwrap()
    }

    #[test]
    fn test_basic_rule() {
        let rule = parse_one("p { color: red; margin-top: 10px }");
        assert_eq!(rule.selectors.selectors.len(), 1);
        assert_eq!(rule.declarations.len(), 2);
        assert_eq!(
            rule.declarations[0].value,
            CssValue::Color(Color::rgb(255, 0, 0))
        );
        assert_eq!(
            rule.declarations[1].value,
            CssValue::Length(Length::Px(10.0))
        );
    }

    #[test]
    fn test_unknown_property_skipped() {
        let rule = parse_one("p { flex-grow: 1; color: blue }");
        assert_eq!(rule.declarations.len(), 1);
        assert_eq!(rule.declarations[0].property, "color");
    }

    #[test]
    fn test_malformed_rule_skipped_rest_survives() {
        let sheet = parse_stylesheet("p::broken { color: red } h1 { font-weight: bold }");
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].declarations[0].property, "font-weight");
    }

    #[test]
    fn test_unknown_pseudo_class_drops_rule() {
        let sheet = parse_stylesheet("p:hover { color: red }");
        assert!(sheet.rules.is_empty());
    }

    #[test]
    fn test_at_rule_skipped() {
        let sheet = parse_stylesheet("@media print { p { color: red } } h1 { color: blue }");
        assert_eq!(sheet.rules.len(), 1);
    }

    #[test]
    fn test_important_flag() {
        let rule = parse_one("p { color: red !important; font-style: italic }");
        assert!(rule.declarations[0].important);
        assert!(!rule.declarations[1].important);
    }

    #[test]
    fn test_selector_combinators_right_to_left() {
        let rule = parse_one("div.article > p b { color: red }");
        let selector = &rule.selectors.selectors[0];
        assert_eq!(
            selector.key.parts,
            vec![SimpleSelector::Tag("b".to_string())]
        );
        assert_eq!(selector.rest.len(), 2);
        assert_eq!(selector.rest[0].0, Combinator::Descendant);
        assert_eq!(
            selector.rest[0].1.parts,
            vec![SimpleSelector::Tag("p".to_string())]
        );
        assert_eq!(selector.rest[1].0, Combinator::Child);
        assert_eq!(
            selector.rest[1].1.parts,
            vec![
                SimpleSelector::Tag("div".to_string()),
                SimpleSelector::Class("article".to_string()),
            ]
        );
    }

    #[test]
    fn test_selector_group() {
        let rule = parse_one("h1, h2, .title { font-weight: bold }");
        assert_eq!(rule.selectors.selectors.len(), 3);
    }

    #[test]
    fn test_nth_child_mapping() {
        let rule = parse_one("li:nth-child(2n+1) { color: red }");
        assert_eq!(
            rule.selectors.selectors[0].key.parts[1],
            SimpleSelector::NthChild { offset: 0, step: 2 }
        );

        let rule = parse_one("li:first-child { color: red }");
        assert_eq!(
            rule.selectors.selectors[0].key.parts[1],
            SimpleSelector::NthChild { offset: 0, step: 0 }
        );
    }

    #[test]
    fn test_margin_shorthand_expansion() {
        let rule = parse_one("p { margin: 1px 2px 3px 4px }");
        let props: Vec<_> = rule
            .declarations
            .iter()
            .map(|d| (d.property.as_str(), d.value.clone()))
            .collect();
        assert_eq!(
            props,
            vec![
                ("margin-top", CssValue::Length(Length::Px(1.0))),
                ("margin-right", CssValue::Length(Length::Px(2.0))),
                ("margin-bottom", CssValue::Length(Length::Px(3.0))),
                ("margin-left", CssValue::Length(Length::Px(4.0))),
            ]
        );
    }

    #[test]
    fn test_margin_two_value_shorthand() {
        let rule = parse_one("p { margin: 1em 2em }");
        assert_eq!(
            rule.declarations[3].value,
            CssValue::Length(Length::Em(2.0))
        );
        assert_eq!(
            rule.declarations[2].value,
            CssValue::Length(Length::Em(1.0))
        );
    }

    #[test]
    fn test_border_shorthand() {
        let rule = parse_one("td { border: 1px solid #ccc }");
        let widths: Vec<_> = rule
            .declarations
            .iter()
            .filter(|d| d.property.ends_with("-width"))
            .collect();
        assert_eq!(widths.len(), 4);
        let color = rule
            .declarations
            .iter()
            .find(|d| d.property == "border-color")
            .unwrap();
        assert_eq!(color.value, CssValue::Color(Color::rgb(204, 204, 204)));
    }

    #[test]
    fn test_background_shorthand_extracts_color() {
        let rule = parse_one("div { background: url(x.png) no-repeat #ff0000 }");
        assert_eq!(rule.declarations.len(), 1);
        assert_eq!(rule.declarations[0].property, "background-color");
        assert_eq!(
            rule.declarations[0].value,
            CssValue::Color(Color::rgb(255, 0, 0))
        );
    }

    #[test]
    fn test_font_size_keywords() {
        let rule = parse_one("p { font-size: x-large }");
        assert_eq!(
            rule.declarations[0].value,
            CssValue::Length(Length::Px(24.0))
        );

        let rule = parse_one("p { font-size: smaller }");
        assert_eq!(
            rule.declarations[0].value,
            CssValue::Length(Length::Em(0.833))
        );
    }

    #[test]
    fn test_colors() {
        let mut input = ParserInput::new("#abc");
        let mut parser = Parser::new(&mut input);
        assert_eq!(
            parse_color(&mut parser),
            Some(Color::rgb(0xaa, 0xbb, 0xcc))
        );

        let mut input = ParserInput::new("rgb(10, 20, 30)");
        let mut parser = Parser::new(&mut input);
        assert_eq!(parse_color(&mut parser), Some(Color::rgb(10, 20, 30)));

        let mut input = ParserInput::new("rgba(10, 20, 30, 0.5)");
        let mut parser = Parser::new(&mut input);
        assert_eq!(
            parse_color(&mut parser),
            Some(Color::rgba(10, 20, 30, 128))
        );
    }

    #[test]
    fn test_physical_units_normalize_to_px() {
        let rule = parse_one("p { margin-top: 1in }");
        assert_eq!(
            rule.declarations[0].value,
            CssValue::Length(Length::Px(96.0))
        );
    }

    #[test]
    fn test_inline_declaration_block() {
        let decls = parse_declaration_block("color: green; font-weight: bold");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].property, "color");
        assert_eq!(decls[1].property, "font-weight");
    }
}
