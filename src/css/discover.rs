//! Stylesheet discovery: `<style>` elements and `<link rel="stylesheet">`
//! references, in document order.

use std::fs;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::dom::{SourceDom, SourceId};

use super::Stylesheet;

/// Resolves external stylesheet references to their text.
///
/// The converter never touches the network; a loader decides what a `href`
/// means. Returning `None` skips the reference silently.
pub trait StylesheetLoader {
    fn load(&self, path: &str) -> Option<String>;
}

/// Loader that reads stylesheets from the filesystem, relative to the
/// directory of the input document.
pub struct FileLoader {
    base: PathBuf,
}

impl FileLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl StylesheetLoader for FileLoader {
    fn load(&self, path: &str) -> Option<String> {
        let full = resolve_relative_path(&self.base, path);
        match fs::read_to_string(&full) {
            Ok(text) => Some(text),
            Err(err) => {
                log::debug!("skipping stylesheet {}: {err}", full.display());
                None
            }
        }
    }
}

/// Loader that resolves nothing; inline `<style>` content still applies.
pub struct NullLoader;

impl StylesheetLoader for NullLoader {
    fn load(&self, _path: &str) -> Option<String> {
        None
    }
}

/// Collect every stylesheet the document references, in document order.
///
/// `<style>` contents are read from the element's text and comment children
/// (legacy documents wrap CSS in an HTML comment). `<link rel="stylesheet">`
/// hrefs are percent-decoded and handed to the loader.
pub fn discover_stylesheets(dom: &SourceDom, loader: &dyn StylesheetLoader) -> Vec<Stylesheet> {
    let mut sheets = Vec::new();
    collect(dom, dom.document(), loader, &mut sheets);
    sheets
}

fn collect(
    dom: &SourceDom,
    node: SourceId,
    loader: &dyn StylesheetLoader,
    sheets: &mut Vec<Stylesheet>,
) {
    if let Some(tag) = dom.tag_name(node) {
        match tag {
            "style" => {
                let css = style_element_text(dom, node);
                if !css.trim().is_empty() {
                    sheets.push(Stylesheet::parse(&css));
                }
                return;
            }
            "link" => {
                if let Some(css) = load_linked_sheet(dom, node, loader) {
                    sheets.push(Stylesheet::parse(&css));
                }
                return;
            }
            _ => {}
        }
    }

    for child in dom.children(node) {
        collect(dom, child, loader, sheets);
    }
}

/// Concatenated CSS text of a `<style>` element, including comment children.
fn style_element_text(dom: &SourceDom, style: SourceId) -> String {
    let mut css = String::new();
    for child in dom.children(style) {
        if let Some(text) = dom.text_content(child) {
            css.push_str(text);
        } else if let Some(comment) = dom.comment_content(child) {
            css.push_str(comment);
        }
    }
    css
}

fn load_linked_sheet(
    dom: &SourceDom,
    link: SourceId,
    loader: &dyn StylesheetLoader,
) -> Option<String> {
    let rel = dom.attr(link, "rel")?;
    if !rel.eq_ignore_ascii_case("stylesheet") {
        return None;
    }
    let href = dom.attr(link, "href")?;
    let decoded = percent_decode_str(href).decode_utf8().ok()?;
    loader.load(decoded.as_ref())
}

/// Resolve `href` against a base directory, consuming leading `../`
/// segments one directory level at a time.
pub fn resolve_relative_path(base_dir: &Path, href: &str) -> PathBuf {
    let mut dir = base_dir.to_path_buf();
    let mut rest = href;
    while let Some(stripped) = rest.strip_prefix("../") {
        dir.pop();
        rest = stripped;
    }
    dir.join(rest)
}
