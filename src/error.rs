//! Error types for flowdoc conversions.

use thiserror::Error;

/// Errors that can occur while converting markup into a document tree.
///
/// Malformed input never produces an error: bad markup, unknown tags, and
/// unparseable values all fall back to documented defaults. These variants
/// cover the few genuine failure modes at the API boundary.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No ancestor carried an absolute font size. The conversion root is
    /// always seeded with one, so this indicates a caller-built context
    /// missing its root entry.
    #[error("font size could not be resolved: no absolute size on the ancestor chain")]
    UnresolvedFontSize,
}

pub type Result<T> = std::result::Result<T, Error>;
