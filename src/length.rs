//! Length values and the compound-length algebra.
//!
//! CSS lengths arrive in a mix of units: absolute (`px`, `pt`), font-relative
//! (`em`, `ex`, `ch`, `rem`), percentages, and viewport-relative (`vw`, `vh`,
//! `vmin`, `vmax`). Font-relative units collapse to absolute pixels once the
//! ancestor chain is known (see [`crate::context`]), but percentages and
//! viewport units can survive all the way into the finished document. A
//! [`CompoundLength`] holds such a partially-resolved value as a sum of terms,
//! one per unit kind.

/// Ratio for converting typographic points to CSS pixels.
pub const PX_PER_PT: f32 = 96.0 / 72.0;

/// A single parsed CSS length, before any resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f32),
    Pt(f32),
    Em(f32),
    /// x-height; resolved as half the font size.
    Ex(f32),
    /// Advance width of "0"; resolved as half the font size.
    Ch(f32),
    Rem(f32),
    Percent(f32),
    Vw(f32),
    Vh(f32),
    Vmin(f32),
    Vmax(f32),
    Auto,
}

impl Length {
    /// Absolute pixel value, if this length needs no context to resolve.
    pub fn absolute_px(&self) -> Option<f32> {
        match self {
            Length::Px(v) => Some(*v),
            Length::Pt(v) => Some(*v * PX_PER_PT),
            _ => None,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Length::Auto)
    }
}

/// Axis selector for size resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Unit kind of one term in a [`CompoundLength`].
///
/// Font-relative units never appear here: they are converted to `Absolute`
/// against the ancestor chain before a term is accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// CSS pixels.
    Absolute,
    /// Percent of the containing level; the one kind that keeps a compound
    /// length undetermined.
    Percent,
    ViewportWidth,
    ViewportHeight,
    ViewportMin,
    ViewportMax,
}

impl UnitKind {
    const COUNT: usize = 6;

    pub const ALL: [UnitKind; Self::COUNT] = [
        UnitKind::Absolute,
        UnitKind::Percent,
        UnitKind::ViewportWidth,
        UnitKind::ViewportHeight,
        UnitKind::ViewportMin,
        UnitKind::ViewportMax,
    ];

    #[inline]
    fn index(self) -> usize {
        match self {
            UnitKind::Absolute => 0,
            UnitKind::Percent => 1,
            UnitKind::ViewportWidth => 2,
            UnitKind::ViewportHeight => 3,
            UnitKind::ViewportMin => 4,
            UnitKind::ViewportMax => 5,
        }
    }
}

/// An unreconciled sum of length terms in different units.
///
/// `{50% + 10px}` is a compound length with two terms. Combining it against a
/// containing `{200px}` yields a determined `{110px}`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompoundLength {
    terms: [Option<f64>; UnitKind::COUNT],
}

impl CompoundLength {
    /// A compound length with no terms.
    pub const fn none() -> Self {
        Self {
            terms: [None; UnitKind::COUNT],
        }
    }

    /// A single absolute term, in pixels.
    pub fn absolute(px: f64) -> Self {
        let mut len = Self::none();
        len.add_term(UnitKind::Absolute, px);
        len
    }

    /// A single percent term.
    pub fn percent(value: f64) -> Self {
        let mut len = Self::none();
        len.add_term(UnitKind::Percent, value);
        len
    }

    /// The accumulated value for one unit kind.
    pub fn term(&self, unit: UnitKind) -> Option<f64> {
        self.terms[unit.index()]
    }

    /// Accumulate one term, collapsing with any existing same-unit term.
    pub fn add_term(&mut self, unit: UnitKind, value: f64) {
        let slot = &mut self.terms[unit.index()];
        *slot = Some(slot.unwrap_or(0.0) + value);
    }

    /// Accumulate every term of `other`, scaled by `factor`.
    pub fn add(&mut self, other: &CompoundLength, factor: f64) {
        for unit in UnitKind::ALL {
            if let Some(v) = other.term(unit) {
                self.add_term(unit, v * factor);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.iter().all(Option::is_none)
    }

    /// Determined once no percent term remains; viewport terms are fine
    /// since they no longer depend on the ancestor chain.
    pub fn is_determined(&self) -> bool {
        self.term(UnitKind::Percent).is_none()
    }

    pub fn is_purely_absolute(&self) -> bool {
        UnitKind::ALL
            .into_iter()
            .filter(|u| *u != UnitKind::Absolute)
            .all(|u| self.term(u).is_none())
    }

    /// The pixel value of a purely absolute compound length.
    pub fn absolute_px(&self) -> Option<f64> {
        if self.is_purely_absolute() {
            self.term(UnitKind::Absolute)
        } else {
            None
        }
    }

    /// Resolve this length's percent term against a containing level.
    ///
    /// The percent term multiplies every term of `container`; all other
    /// terms of `self` carry over unchanged. Used while climbing the
    /// ancestor chain: the result may itself still hold a percent term if
    /// the container does.
    pub fn resolved_against(&self, container: &CompoundLength) -> CompoundLength {
        let Some(pct) = self.term(UnitKind::Percent) else {
            return *self;
        };

        let mut result = *self;
        result.terms[UnitKind::Percent.index()] = None;
        result.add(container, pct / 100.0);
        result
    }
}
