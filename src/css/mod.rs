//! Stylesheet model: rules, declarations, values, and sheet discovery.
//!
//! Tokenization is delegated to `cssparser`; this module owns the value and
//! rule model the cascade consumes. Parsing is lenient throughout: rules or
//! declarations that fail to parse are skipped, never surfaced as errors.

mod discover;
mod parse;

use std::collections::HashMap;

use crate::length::Length;
use crate::selector::{SelectorList, Specificity};

pub use discover::{
    FileLoader, NullLoader, StylesheetLoader, discover_stylesheets, resolve_relative_path,
};
pub(crate) use parse::parse_color_str;

/// RGBA color value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// A parsed declaration value.
///
/// Values are typed by content, matching what the cascade stores in a
/// property map: lengths, colors, enumerated keywords, free-form strings
/// (font family lists), and unitless numbers (line-height multipliers,
/// numeric font weights).
#[derive(Debug, Clone, PartialEq)]
pub enum CssValue {
    Length(Length),
    Color(Color),
    Keyword(String),
    String(String),
    Number(f32),
}

impl CssValue {
    pub fn as_length(&self) -> Option<Length> {
        match self {
            CssValue::Length(l) => Some(*l),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            CssValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            CssValue::Keyword(k) => Some(k.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            CssValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// One `property: value` pair, already canonicalized (shorthands expanded).
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Lower-cased canonical property name.
    pub property: String,
    pub value: CssValue,
    pub important: bool,
}

/// A rule: selector group plus its declarations, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Rule {
    pub selectors: SelectorList,
    pub declarations: Vec<Declaration>,
}

impl Rule {
    /// Specificity of the first matching selector, if any member matches.
    pub fn match_specificity(
        &self,
        dom: &crate::dom::SourceDom,
        element: crate::dom::SourceId,
    ) -> Option<Specificity> {
        self.selectors.match_element(dom, element)
    }
}

/// An ordered list of rules from one sheet.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    /// Parse stylesheet text. Never fails; unparseable rules are dropped.
    pub fn parse(css: &str) -> Self {
        parse::parse_stylesheet(css)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Parse the contents of an inline `style="…"` attribute into declarations.
pub fn parse_inline_style(text: &str) -> Vec<Declaration> {
    parse::parse_declaration_block(text)
}

/// Resolved property values for one element; lives for one recursion frame
/// and is reachable by descendants through the context stack.
pub type PropertyMap = HashMap<String, CssValue>;
