//! Selector matching algorithm.
//!
//! Matching is structural: simple selectors ask the [`SelectorModel`], and
//! combinators walk the parent and previous-sibling chains from the subject
//! outwards.

use std::iter;

use super::{AttributeOp, Combinator, PseudoClass, Selector, SelectorGroup};
use crate::model::SelectorModel;

impl Selector {
    /// Check whether this selector matches `element`.
    pub fn matches<M: SelectorModel + ?Sized>(&self, model: &M, element: &M::Element) -> bool {
        match self {
            Selector::Universal => true,
            Selector::Nothing => false,
            Selector::Type(name) => model.has_type(element, name.namespace(), &name.name),
            Selector::Id(id) => model.has_id(element, id),
            Selector::Class(class) => model.has_style_class(element, class),
            Selector::Attribute { op, name, value } => {
                let ns = name.namespace();
                let value = value.as_deref().unwrap_or_default();
                match op {
                    AttributeOp::Exists => model.attribute_exists(element, ns, &name.name),
                    AttributeOp::Equals => model.attribute_equals(element, ns, &name.name, value),
                    AttributeOp::Include => {
                        model.attribute_contains_word(element, ns, &name.name, value)
                    }
                    AttributeOp::Dash => model.attribute_dash_match(element, ns, &name.name, value),
                    AttributeOp::Prefix => {
                        model.attribute_starts_with(element, ns, &name.name, value)
                    }
                    AttributeOp::Suffix => model.attribute_ends_with(element, ns, &name.name, value),
                    AttributeOp::Substring => {
                        model.attribute_contains(element, ns, &name.name, value)
                    }
                }
            }
            Selector::PseudoClass(PseudoClass::Simple(name)) => model.has_pseudo_class(element, name),
            Selector::PseudoClass(PseudoClass::Function { name, terms }) => {
                model.matches_functional_pseudo_class(element, name, terms)
            }
            Selector::PseudoClass(PseudoClass::Negation { inner, .. }) => {
                !inner.matches(model, element)
            }
            Selector::And(left, right) => {
                right.matches(model, element) && left.matches(model, element)
            }
            Selector::Combined {
                combinator,
                left,
                right,
            } => {
                if !right.matches(model, element) {
                    return false;
                }
                match combinator {
                    Combinator::Descendant => {
                        iter::successors(model.parent(element), |e| model.parent(e))
                            .any(|ancestor| left.matches(model, &ancestor))
                    }
                    Combinator::Child => model
                        .parent(element)
                        .is_some_and(|parent| left.matches(model, &parent)),
                    Combinator::AdjacentSibling => model
                        .previous_sibling(element)
                        .is_some_and(|sibling| left.matches(model, &sibling)),
                    Combinator::GeneralSibling => {
                        iter::successors(model.previous_sibling(element), |e| {
                            model.previous_sibling(e)
                        })
                        .any(|sibling| left.matches(model, &sibling))
                    }
                }
            }
        }
    }
}

impl SelectorGroup {
    /// The first alternative that matches `element`.
    ///
    /// The returned selector carries the specificity the match is ranked by.
    pub fn match_selector<M: SelectorModel + ?Sized>(
        &self,
        model: &M,
        element: &M::Element,
    ) -> Option<&Selector> {
        self.selectors.iter().find(|s| s.matches(model, element))
    }

    /// Check whether any alternative matches `element`.
    pub fn matches<M: SelectorModel + ?Sized>(&self, model: &M, element: &M::Element) -> bool {
        self.match_selector(model, element).is_some()
    }
}
