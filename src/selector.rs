//! Selector model and matching.
//!
//! Covers the documented subset: universal, tag, `#id`, `.class`, positional
//! (first-child-style) selectors, compounds, comma lists, and the four
//! combinators. Complex selectors are evaluated right-to-left against the
//! source tree. Matching has no side effects; failure is simply "no match".

use crate::dom::{SourceDom, SourceId};

/// One simple selector component.
#[derive(Debug, Clone, PartialEq)]
pub enum SimpleSelector {
    /// `*`
    Universal,
    /// Tag name, stored lower-cased.
    Tag(String),
    /// `#id`
    Id(String),
    /// `.class`
    Class(String),
    /// Positional selector over the count of preceding element siblings.
    ///
    /// Matches counts of the form `offset + n * step` for `n >= 0`: a
    /// positive step counts up from `offset`, a negative step counts down
    /// from it, and a zero step requires the count to equal `offset`
    /// exactly. `:first-child` is `{ offset: 0, step: 0 }`;
    /// `:nth-child(an+b)` maps to `{ offset: b - 1, step: a }`.
    NthChild { offset: i32, step: i32 },
}

/// Several simple selectors that must all match one element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundSelector {
    pub parts: Vec<SimpleSelector>,
}

/// Relationship between a compound and the one to its right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace: any ancestor.
    Descendant,
    /// `>`: the parent element.
    Child,
    /// `+`: the immediately preceding element sibling.
    NextSibling,
    /// `~`: any preceding element sibling.
    SubsequentSibling,
}

/// A full complex selector, e.g. `div.article > p:first-child`.
///
/// `key` is the rightmost compound; `rest` holds the earlier compounds in
/// right-to-left order, each with the combinator linking it to its successor.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub key: CompoundSelector,
    pub rest: Vec<(Combinator, CompoundSelector)>,
}

/// A comma-separated selector group; the first matching member wins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectorList {
    pub selectors: Vec<Selector>,
}

/// Selector priority for cascade ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Specificity {
    pub ids: u32,
    pub classes: u32,
    pub elements: u32,
}

impl CompoundSelector {
    fn accumulate_specificity(&self, spec: &mut Specificity) {
        for part in &self.parts {
            match part {
                SimpleSelector::Universal => {}
                SimpleSelector::Tag(_) => spec.elements += 1,
                SimpleSelector::Id(_) => spec.ids += 1,
                SimpleSelector::Class(_) | SimpleSelector::NthChild { .. } => spec.classes += 1,
            }
        }
    }

    /// Whether every simple selector matches the given element.
    pub fn matches(&self, dom: &SourceDom, element: SourceId) -> bool {
        self.parts.iter().all(|part| match part {
            SimpleSelector::Universal => true,
            SimpleSelector::Tag(tag) => dom
                .tag_name(element)
                .is_some_and(|name| name.eq_ignore_ascii_case(tag)),
            SimpleSelector::Id(id) => dom.element_id(element) == Some(id.as_str()),
            SimpleSelector::Class(class) => dom
                .element_classes(element)
                .iter()
                .any(|c| c == class),
            SimpleSelector::NthChild { offset, step } => {
                let count = dom.preceding_element_count(element) as i32;
                if *step > 0 {
                    count >= *offset && (count - offset).rem_euclid(*step) == 0
                } else if *step < 0 {
                    count <= *offset && (offset - count).rem_euclid(-*step) == 0
                } else {
                    count == *offset
                }
            }
        })
    }
}

impl Selector {
    pub fn specificity(&self) -> Specificity {
        let mut spec = Specificity::default();
        self.key.accumulate_specificity(&mut spec);
        for (_, compound) in &self.rest {
            compound.accumulate_specificity(&mut spec);
        }
        spec
    }

    /// Match this selector against an element, walking combinators
    /// right-to-left through the source tree.
    pub fn matches(&self, dom: &SourceDom, element: SourceId) -> bool {
        if !self.key.matches(dom, element) {
            return false;
        }

        let mut current = element;
        for (combinator, compound) in &self.rest {
            match combinator {
                Combinator::Child => {
                    let Some(parent) = dom.parent_element(current) else {
                        return false;
                    };
                    if !compound.matches(dom, parent) {
                        return false;
                    }
                    current = parent;
                }
                Combinator::Descendant => {
                    // Scan outward until a match or the chain is exhausted.
                    let mut candidate = dom.parent_element(current);
                    loop {
                        match candidate {
                            Some(ancestor) if compound.matches(dom, ancestor) => {
                                current = ancestor;
                                break;
                            }
                            Some(ancestor) => candidate = dom.parent_element(ancestor),
                            None => return false,
                        }
                    }
                }
                Combinator::NextSibling => {
                    let Some(prev) = dom.prev_element_sibling(current) else {
                        return false;
                    };
                    if !compound.matches(dom, prev) {
                        return false;
                    }
                    current = prev;
                }
                Combinator::SubsequentSibling => {
                    let mut candidate = dom.prev_element_sibling(current);
                    loop {
                        match candidate {
                            Some(sib) if compound.matches(dom, sib) => {
                                current = sib;
                                break;
                            }
                            Some(sib) => candidate = dom.prev_element_sibling(sib),
                            None => return false,
                        }
                    }
                }
            }
        }

        true
    }
}

impl SelectorList {
    /// First matching member, with its specificity.
    pub fn match_element(&self, dom: &SourceDom, element: SourceId) -> Option<Specificity> {
        self.selectors
            .iter()
            .find(|s| s.matches(dom, element))
            .map(Selector::specificity)
    }
}
