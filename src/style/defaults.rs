//! Built-in presentation defaults per tag, the weakest cascade tier.

use crate::css::{Color, CssValue, PropertyMap};
use crate::length::Length;

/// Insert the tag's default presentation into `map`, without overwriting
/// anything a stronger tier already set.
pub(crate) fn apply_tag_defaults(tag: &str, map: &mut PropertyMap) {
    let mut set = |property: &str, value: CssValue| {
        map.entry(property.to_string()).or_insert(value);
    };

    match tag {
        "h1" => {
            set("font-size", CssValue::Length(Length::Em(2.0)));
            set("font-weight", CssValue::Keyword("bold".into()));
        }
        "h2" => {
            set("font-size", CssValue::Length(Length::Em(1.5)));
            set("font-weight", CssValue::Keyword("bold".into()));
        }
        "h3" => {
            set("font-size", CssValue::Length(Length::Em(1.17)));
            set("font-weight", CssValue::Keyword("bold".into()));
        }
        "h4" => {
            set("font-weight", CssValue::Keyword("bold".into()));
        }
        "h5" => {
            set("font-size", CssValue::Length(Length::Em(0.83)));
            set("font-weight", CssValue::Keyword("bold".into()));
        }
        "h6" => {
            set("font-size", CssValue::Length(Length::Em(0.67)));
            set("font-weight", CssValue::Keyword("bold".into()));
        }
        "b" | "strong" => {
            set("font-weight", CssValue::Keyword("bold".into()));
        }
        "i" | "em" | "cite" | "dfn" | "var" | "address" => {
            set("font-style", CssValue::Keyword("italic".into()));
        }
        "u" | "ins" => {
            set("text-decoration", CssValue::Keyword("underline".into()));
        }
        "s" | "strike" | "del" => {
            set("text-decoration", CssValue::Keyword("line-through".into()));
        }
        "pre" => {
            set("font-family", CssValue::String("monospace".into()));
            set("text-align", CssValue::Keyword("left".into()));
        }
        "code" | "tt" | "kbd" | "samp" => {
            set("font-family", CssValue::String("monospace".into()));
        }
        "ul" => {
            set("list-style-type", CssValue::Keyword("disc".into()));
        }
        "ol" => {
            set("list-style-type", CssValue::Keyword("decimal".into()));
        }
        "a" => {
            set("color", CssValue::Color(Color::rgb(0, 0, 238)));
            set("text-decoration", CssValue::Keyword("underline".into()));
        }
        "center" => {
            set("text-align", CssValue::Keyword("center".into()));
        }
        "th" => {
            set("font-weight", CssValue::Keyword("bold".into()));
            set("text-align", CssValue::Keyword("center".into()));
        }
        "sub" | "sup" | "small" => {
            set("font-size", CssValue::Length(Length::Em(0.83)));
        }
        "big" => {
            set("font-size", CssValue::Length(Length::Em(1.2)));
        }
        _ => {}
    }
}
