//! # flowdoc
//!
//! Converts styled HTML into a strongly-typed flow-document tree.
//!
//! The converter parses an HTML element tree, resolves CSS (embedded,
//! linked, and inline) through a full cascade, and builds a read-only
//! document model of typed nodes: sections, paragraphs, lists, tables,
//! spans, runs, hyperlinks, and images, each carrying resolved text and box
//! styling. Downstream renderers consume the tree without ever touching
//! markup or stylesheets.
//!
//! ## Quick Start
//!
//! ```
//! use flowdoc::{ConvertOptions, convert_html};
//!
//! let html = r#"<p style="color: red">Hello <b>World</b></p>"#;
//! let doc = convert_html(html, &ConvertOptions::default()).unwrap();
//! assert_eq!(doc.text(doc.root()), "Hello World");
//! ```
//!
//! ## Design
//!
//! - Malformed markup never fails a conversion: the parser repairs it and
//!   the builder falls back to documented defaults, so errors are reserved
//!   for genuine failure modes at the API boundary.
//! - Inheritance is resolved by consulting an explicit ancestor-context
//!   stack during the build, not by copying values down the tree.
//! - Lengths that cannot be fully resolved (percentages of an unsized
//!   container, viewport units) survive into the output as compound
//!   lengths for the renderer to finish.

pub mod context;
pub mod css;
pub mod doc;
pub mod dom;
pub mod error;
pub mod length;
pub mod selector;
pub mod style;
pub mod table;

mod build;

use std::path::{Path, PathBuf};

pub use css::{FileLoader, NullLoader, Stylesheet, StylesheetLoader};
pub use doc::{Document, Node, NodeId, NodeKind};
pub use dom::SourceDom;
pub use error::{Error, Result};
pub use length::{Axis, CompoundLength, Length};

/// Conversion options.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Return only the region bracketed by `StartFragment`/`EndFragment`
    /// comment markers, when present.
    pub extract_fragment: bool,
    /// Record each output node's originating source element.
    pub track_source_elements: bool,
    /// Directory linked stylesheets resolve against. When unset, linked
    /// sheets are skipped and only embedded and inline styles apply.
    pub base_path: Option<PathBuf>,
}

/// Convert an HTML string into a document.
///
/// Stylesheets are discovered from the markup itself: `<style>` elements
/// always, `<link rel="stylesheet">` references only when
/// [`ConvertOptions::base_path`] names a directory to load them from.
pub fn convert_html(html: &str, options: &ConvertOptions) -> Result<Document> {
    let dom = SourceDom::parse(html);
    let sheets = match &options.base_path {
        Some(base) => css::discover_stylesheets(&dom, &FileLoader::new(base.clone())),
        None => css::discover_stylesheets(&dom, &NullLoader),
    };
    convert_document(&dom, &sheets, options)
}

/// Convert an HTML file into a document.
///
/// Unless [`ConvertOptions::base_path`] is set, linked stylesheets resolve
/// relative to the file's own directory.
pub fn convert_file(path: impl AsRef<Path>, options: &ConvertOptions) -> Result<Document> {
    let path = path.as_ref();
    let html = std::fs::read_to_string(path)?;

    let mut options = options.clone();
    if options.base_path.is_none() {
        options.base_path = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);
    }
    convert_html(&html, &options)
}

/// Convert an already-parsed source tree with an explicit sheet set.
///
/// The sheets apply in the given order, weakest first; inline `style`
/// attributes still take priority over all of them.
pub fn convert_document(
    dom: &SourceDom,
    sheets: &[Stylesheet],
    options: &ConvertOptions,
) -> Result<Document> {
    Ok(build::build(dom, sheets, options))
}
