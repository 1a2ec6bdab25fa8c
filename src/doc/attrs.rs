//! Resolved node attributes: text styling and block box styling.

use crate::css::Color;

/// A color slot on a node: explicitly unset, inherited from the parent
/// node, or a concrete value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorValue {
    #[default]
    Unset,
    Inherit,
    Color(Color),
}

impl ColorValue {
    pub fn is_set(&self) -> bool {
        matches!(self, ColorValue::Color(_))
    }
}

/// Numeric font weight on the usual 1-1000 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const BOLD: FontWeight = FontWeight(700);

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "normal" => Some(Self::NORMAL),
            "bold" => Some(Self::BOLD),
            // Without tracking the parent weight, bolder/lighter degrade to
            // their usual endpoints.
            "bolder" => Some(Self::BOLD),
            "lighter" => Some(FontWeight(300)),
            _ => None,
        }
    }

    pub fn is_bold(&self) -> bool {
        self.0 >= 600
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FontStyle {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "normal" => Some(FontStyle::Normal),
            "italic" => Some(FontStyle::Italic),
            "oblique" => Some(FontStyle::Oblique),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Right,
    Center,
    Justify,
}

impl TextAlign {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "left" => Some(TextAlign::Left),
            "right" => Some(TextAlign::Right),
            "center" => Some(TextAlign::Center),
            "justify" => Some(TextAlign::Justify),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    Overline,
    LineThrough,
}

impl TextDecoration {
    /// First recognized decoration in a space-separated keyword list.
    pub fn from_keywords(keywords: &str) -> Option<Self> {
        keywords.split_ascii_whitespace().find_map(|k| match k {
            "none" => Some(TextDecoration::None),
            "underline" => Some(TextDecoration::Underline),
            "overline" => Some(TextDecoration::Overline),
            "line-through" => Some(TextDecoration::LineThrough),
            _ => None,
        })
    }
}

/// List marker style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListMarker {
    #[default]
    Disc,
    Circle,
    Square,
    Decimal,
    LowerAlpha,
    UpperAlpha,
    LowerRoman,
    UpperRoman,
    None,
}

impl ListMarker {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "disc" => Some(ListMarker::Disc),
            "circle" => Some(ListMarker::Circle),
            "square" => Some(ListMarker::Square),
            "decimal" => Some(ListMarker::Decimal),
            "lower-alpha" | "lower-latin" => Some(ListMarker::LowerAlpha),
            "upper-alpha" | "upper-latin" => Some(ListMarker::UpperAlpha),
            "lower-roman" => Some(ListMarker::LowerRoman),
            "upper-roman" => Some(ListMarker::UpperRoman),
            "none" => Some(ListMarker::None),
            _ => None,
        }
    }
}

/// Four-sided pixel thickness.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Thickness {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Thickness {
    pub fn uniform(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0 && self.left == 0.0
    }
}

/// Character-level styling shared by every node kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextStyle {
    pub font_family: Option<String>,
    /// Absolute pixels.
    pub font_size: Option<f32>,
    pub font_style: Option<FontStyle>,
    pub font_weight: Option<FontWeight>,
    pub foreground: ColorValue,
    pub background: ColorValue,
}

impl TextStyle {
    pub fn is_empty(&self) -> bool {
        *self == TextStyle::default()
    }
}

/// Box-level styling carried by block-family nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoxStyle {
    pub margin: Option<Thickness>,
    pub padding: Option<Thickness>,
    pub border: Option<Thickness>,
    pub border_color: Option<Color>,
    pub text_align: Option<TextAlign>,
    /// Multiplier of the font size.
    pub line_height: Option<f32>,
}

impl BoxStyle {
    pub fn is_empty(&self) -> bool {
        *self == BoxStyle::default()
    }
}
