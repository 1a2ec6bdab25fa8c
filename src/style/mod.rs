//! Cascading style resolution.
//!
//! For each source element the cascade merges four tiers, weakest first:
//! built-in tag defaults, presentational attributes, stylesheet rules, and
//! the inline `style` attribute. The resolved [`PropertyMap`] holds only
//! values declared *on* the element; inheritance happens at lookup time
//! through the context stack, never by copying values down.

mod cascade;
mod defaults;

pub use cascade::element_properties;
pub(crate) use defaults::apply_tag_defaults;
