//! Ancestor-context stack.
//!
//! Inheritance and relative-unit resolution both need visibility into an
//! arbitrary number of ancestor levels, so the builder maintains an explicit
//! stack of (source element, resolved property map) pairs, pushed and popped
//! in lock-step with recursion. Resolution functions walk the stack outward
//! instead of copying inherited values down.

use crate::css::{CssValue, PropertyMap};
use crate::dom::SourceId;
use crate::error::{Error, Result};
use crate::length::{Axis, CompoundLength, Length};

/// Default root font size in pixels.
pub const DEFAULT_FONT_SIZE: f32 = 16.0;

/// One recursion frame: a source element and its resolved properties.
#[derive(Debug)]
pub struct ContextEntry {
    pub element: SourceId,
    pub props: PropertyMap,
}

/// Stack of ancestor entries, innermost last.
#[derive(Debug, Default)]
pub struct SourceContext {
    entries: Vec<ContextEntry>,
}

impl SourceContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: SourceId, props: PropertyMap) {
        self.entries.push(ContextEntry { element, props });
    }

    /// Pop the innermost entry. The caller names the element it expects to
    /// pop; a mismatch means push/pop fell out of lock-step with recursion,
    /// which is a builder defect.
    pub fn pop(&mut self, element: SourceId) {
        let entry = self
            .entries
            .pop()
            .unwrap_or_else(|| panic!("context stack underflow"));
        assert_eq!(
            entry.element, element,
            "context stack popped out of order"
        );
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Innermost declaration of an inherited property, if any ancestor
    /// (including the current element) declares it.
    pub fn lookup(&self, property: &str) -> Option<&CssValue> {
        self.entries
            .iter()
            .rev()
            .find_map(|entry| entry.props.get(property))
    }

    /// Absolute font size of the document root.
    ///
    /// The outermost entry's declared size if absolute, 16 px otherwise.
    pub fn root_font_size(&self) -> f32 {
        self.entries
            .first()
            .and_then(|entry| entry.props.get("font-size"))
            .and_then(CssValue::as_length)
            .and_then(|l| l.absolute_px())
            .unwrap_or(DEFAULT_FONT_SIZE)
    }

    /// Absolute font size at the innermost level.
    ///
    /// Walks outward multiplying relative factors until the first absolute
    /// declaration; `rem` short-circuits to the root size. The root is
    /// expected to carry an absolute default, so exhaustion means the
    /// context was never seeded.
    pub fn absolute_font_size(&self) -> Result<f32> {
        self.font_size_at(self.entries.len())
    }

    /// Font size considering only the outermost `levels` entries.
    fn font_size_at(&self, levels: usize) -> Result<f32> {
        let mut factor = 1.0f32;
        for entry in self.entries[..levels].iter().rev() {
            let Some(length) = entry.props.get("font-size").and_then(CssValue::as_length)
            else {
                continue;
            };
            match length {
                Length::Em(v) => factor *= v,
                Length::Percent(v) => factor *= v / 100.0,
                Length::Ex(v) | Length::Ch(v) => factor *= v * 0.5,
                Length::Rem(v) => return Ok(self.root_font_size() * v * factor),
                Length::Auto => {}
                other => {
                    if let Some(px) = other.absolute_px() {
                        return Ok(px * factor);
                    }
                    // Viewport-relative font sizes are outside the model.
                }
            }
        }
        Err(Error::UnresolvedFontSize)
    }

    /// Resolve a length to absolute pixels where its unit allows.
    ///
    /// Font-relative units resolve against the innermost absolute font size
    /// (`ex`/`ch` as half of it), `rem` against the root. Percent, viewport
    /// units, and `auto` have no absolute value here and yield `None`.
    pub fn resolve_length(&self, length: Length) -> Result<Option<f32>> {
        let px = match length {
            Length::Em(v) => Some(self.absolute_font_size()? * v),
            Length::Ex(v) | Length::Ch(v) => Some(self.absolute_font_size()? * v * 0.5),
            Length::Rem(v) => Some(self.root_font_size() * v),
            Length::Percent(_)
            | Length::Vw(_)
            | Length::Vh(_)
            | Length::Vmin(_)
            | Length::Vmax(_)
            | Length::Auto => None,
            other => other.absolute_px(),
        };
        Ok(px)
    }

    /// Compound form of a length at the innermost level. Font-relative
    /// units collapse to absolute terms; `auto` has no compound form.
    pub fn compound_from(&self, length: Length) -> Option<CompoundLength> {
        self.compound_at(length, self.entries.len())
    }

    fn compound_at(&self, length: Length, levels: usize) -> Option<CompoundLength> {
        let mut compound = CompoundLength::none();
        match length {
            Length::Percent(v) => compound = CompoundLength::percent(f64::from(v)),
            Length::Vw(v) => compound.add_term(crate::length::UnitKind::ViewportWidth, f64::from(v)),
            Length::Vh(v) => {
                compound.add_term(crate::length::UnitKind::ViewportHeight, f64::from(v))
            }
            Length::Vmin(v) => {
                compound.add_term(crate::length::UnitKind::ViewportMin, f64::from(v))
            }
            Length::Vmax(v) => {
                compound.add_term(crate::length::UnitKind::ViewportMax, f64::from(v))
            }
            Length::Auto => return None,
            Length::Em(_) | Length::Ex(_) | Length::Ch(_) | Length::Rem(_) => {
                // Fall back to the default size on an unseeded chain; an
                // unresolvable font size is an input irregularity here.
                let font = self.font_size_for_compound(levels);
                let px = match length {
                    Length::Em(v) => font * v,
                    Length::Ex(v) | Length::Ch(v) => font * v * 0.5,
                    Length::Rem(v) => self.root_font_size() * v,
                    _ => unreachable!(),
                };
                compound = CompoundLength::absolute(f64::from(px));
            }
            other => {
                let px = other.absolute_px()?;
                compound = CompoundLength::absolute(f64::from(px));
            }
        }
        Some(compound)
    }

    fn font_size_for_compound(&self, levels: usize) -> f32 {
        self.font_size_at(levels).unwrap_or(DEFAULT_FONT_SIZE)
    }

    /// Container size along an axis as a compound length.
    ///
    /// Walks outward from the innermost entry. An explicit axis length at a
    /// level becomes that level's size; `auto` (or nothing) synthesizes
    /// "100% of the next container" minus the level's margin, border, and
    /// padding on that axis. Percent terms accumulated so far resolve
    /// against each level, and the walk stops as soon as the result is
    /// determined. An exhausted chain leaves the remaining percentage
    /// unresolved, bottoming out at `{100%}`.
    pub fn compound_size_for_axis(&self, axis: Axis) -> CompoundLength {
        let mut acc = CompoundLength::none();

        for levels in (1..=self.entries.len()).rev() {
            let entry = &self.entries[levels - 1];
            let level_size = self.level_size(entry, axis, levels);

            acc = if acc.is_empty() {
                level_size
            } else {
                acc.resolved_against(&level_size)
            };

            if acc.is_determined() {
                return acc;
            }
        }

        if acc.is_empty() {
            acc = CompoundLength::percent(100.0);
        }
        acc
    }

    /// The size one level contributes: its explicit axis length, or a
    /// synthesized `100% - margin - border - padding`.
    fn level_size(&self, entry: &ContextEntry, axis: Axis, levels: usize) -> CompoundLength {
        let explicit = entry
            .props
            .get(axis.size_property())
            .and_then(CssValue::as_length)
            .filter(|l| !l.is_auto())
            .and_then(|l| self.compound_at(l, levels));
        if let Some(compound) = explicit {
            return compound;
        }

        let mut synthesized = CompoundLength::percent(100.0);
        for property in axis.edge_properties() {
            if let Some(length) = entry.props.get(*property).and_then(CssValue::as_length)
                && let Some(compound) = self.compound_at(length, levels)
            {
                synthesized.add(&compound, -1.0);
            }
        }
        synthesized
    }
}

impl Axis {
    fn size_property(self) -> &'static str {
        match self {
            Axis::Horizontal => "width",
            Axis::Vertical => "height",
        }
    }

    fn edge_properties(self) -> &'static [&'static str] {
        match self {
            Axis::Horizontal => &[
                "margin-left",
                "margin-right",
                "border-left-width",
                "border-right-width",
                "padding-left",
                "padding-right",
            ],
            Axis::Vertical => &[
                "margin-top",
                "margin-bottom",
                "border-top-width",
                "border-bottom-width",
                "padding-top",
                "padding-bottom",
            ],
        }
    }
}
