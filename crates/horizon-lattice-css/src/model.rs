//! Element capability interface.
//!
//! The engine never sees a concrete document. Hosts implement
//! [`SelectorModel`] over their own element handles; selectors query it, and
//! the cascade writes resolved values back through it.

use crate::resolve::StyleOrigin;
use crate::rules::QualifiedName;
use crate::selector::NthExpr;
use crate::syntax::Token;

/// Trait for documents that selectors can match against and the cascade can
/// style.
///
/// All methods take `&self`: writes go through the host's own interior
/// mutability so that independent elements can be styled concurrently.
///
/// # Example
///
/// ```ignore
/// impl SelectorModel for Scene {
///     type Element = NodeId;
///
///     fn has_id(&self, element: &NodeId, id: &str) -> bool {
///         self.node(*element).id.as_deref() == Some(id)
///     }
///     // ...
/// }
/// ```
pub trait SelectorModel {
    /// Opaque element handle.
    type Element: Clone;

    /// Check the element's id.
    fn has_id(&self, element: &Self::Element, id: &str) -> bool;

    /// Check the element's type name.
    ///
    /// `namespace` follows [`QualifiedName`]: `None` means any namespace.
    fn has_type(&self, element: &Self::Element, namespace: Option<&str>, name: &str) -> bool;

    /// Check whether the element carries a style class.
    fn has_style_class(&self, element: &Self::Element, class: &str) -> bool;

    /// Read an attribute value.
    fn attribute_value(
        &self,
        element: &Self::Element,
        namespace: Option<&str>,
        name: &str,
    ) -> Option<String>;

    /// All attribute names present on the element.
    fn attribute_names(&self, element: &Self::Element) -> Vec<QualifiedName>;

    /// The parent element, if any.
    fn parent(&self, element: &Self::Element) -> Option<Self::Element>;

    /// The immediately preceding sibling, if any.
    fn previous_sibling(&self, element: &Self::Element) -> Option<Self::Element>;

    /// The immediately following sibling, if any.
    fn next_sibling(&self, element: &Self::Element) -> Option<Self::Element>;

    /// Write a cascaded value, or clear it with `None`.
    fn set_style_value(
        &self,
        element: &Self::Element,
        origin: StyleOrigin,
        name: &QualifiedName,
        value: Option<Vec<Token>>,
    );

    /// Drop every value the cascade wrote to the element.
    ///
    /// Values of [`StyleOrigin::User`] must be kept.
    fn reset_style_values(&self, element: &Self::Element);

    /// Check a host-defined state such as `hover` or `checked`.
    fn has_state(&self, _element: &Self::Element, _state: &str) -> bool {
        false
    }

    /// Check a simple pseudo-class such as `:hover`.
    ///
    /// The default answers the structural ones from the parent and sibling
    /// links (`root`, `first-child`, `last-child`) and hands every other name
    /// to [`has_state`](Self::has_state).
    fn has_pseudo_class(&self, element: &Self::Element, name: &str) -> bool {
        match name.to_ascii_lowercase().as_str() {
            "root" => self.parent(element).is_none(),
            "first-child" => {
                self.parent(element).is_some() && self.previous_sibling(element).is_none()
            }
            "last-child" => self.parent(element).is_some() && self.next_sibling(element).is_none(),
            _ => self.has_state(element, name),
        }
    }

    /// Check a functional pseudo-class such as `:nth-child(2n+1)`.
    ///
    /// The default evaluates `nth-child` by counting previous siblings.
    fn matches_functional_pseudo_class(
        &self,
        element: &Self::Element,
        name: &str,
        terms: &[Token],
    ) -> bool {
        if !name.eq_ignore_ascii_case("nth-child") {
            return false;
        }
        let Some(expr) = NthExpr::parse(terms) else {
            return false;
        };
        expr.matches(self.sibling_index(element))
    }

    /// The inline style declarations of the element, if any.
    fn style_attribute(&self, element: &Self::Element) -> Option<String> {
        self.attribute_value(element, None, "style")
    }

    /// Zero-based position among siblings.
    fn sibling_index(&self, element: &Self::Element) -> usize {
        let mut index = 0;
        let mut current = self.previous_sibling(element);
        while let Some(sibling) = current {
            index += 1;
            current = self.previous_sibling(&sibling);
        }
        index
    }

    /// Namespace-agnostic attribute lookup.
    ///
    /// Asks [`attribute_value`](Self::attribute_value) first, then falls back
    /// to the first attribute from [`attribute_names`](Self::attribute_names)
    /// with the same local name when the namespace is unspecified or `*`.
    fn find_attribute(
        &self,
        element: &Self::Element,
        namespace: Option<&str>,
        name: &str,
    ) -> Option<String> {
        match namespace {
            None | Some("*") => self.attribute_value(element, None, name).or_else(|| {
                self.attribute_names(element)
                    .into_iter()
                    .find(|n| n.name == name)
                    .and_then(|n| self.attribute_value(element, n.namespace(), &n.name))
            }),
            Some(ns) => self.attribute_value(element, Some(ns), name),
        }
    }

    /// `[name]`
    fn attribute_exists(&self, element: &Self::Element, namespace: Option<&str>, name: &str) -> bool {
        self.find_attribute(element, namespace, name).is_some()
    }

    /// `[name=value]`
    fn attribute_equals(
        &self,
        element: &Self::Element,
        namespace: Option<&str>,
        name: &str,
        value: &str,
    ) -> bool {
        self.find_attribute(element, namespace, name)
            .is_some_and(|v| v == value)
    }

    /// `[name~=value]`: whitespace-separated word match.
    fn attribute_contains_word(
        &self,
        element: &Self::Element,
        namespace: Option<&str>,
        name: &str,
        word: &str,
    ) -> bool {
        !word.is_empty()
            && self
                .find_attribute(element, namespace, name)
                .is_some_and(|v| v.split_whitespace().any(|w| w == word))
    }

    /// `[name|=value]`: exact match or `value-` prefix.
    fn attribute_dash_match(
        &self,
        element: &Self::Element,
        namespace: Option<&str>,
        name: &str,
        value: &str,
    ) -> bool {
        self.find_attribute(element, namespace, name).is_some_and(|v| {
            v == value
                || (v.starts_with(value) && v[value.len()..].starts_with('-'))
        })
    }

    /// `[name^=value]`
    fn attribute_starts_with(
        &self,
        element: &Self::Element,
        namespace: Option<&str>,
        name: &str,
        prefix: &str,
    ) -> bool {
        !prefix.is_empty()
            && self
                .find_attribute(element, namespace, name)
                .is_some_and(|v| v.starts_with(prefix))
    }

    /// `[name$=value]`
    fn attribute_ends_with(
        &self,
        element: &Self::Element,
        namespace: Option<&str>,
        name: &str,
        suffix: &str,
    ) -> bool {
        !suffix.is_empty()
            && self
                .find_attribute(element, namespace, name)
                .is_some_and(|v| v.ends_with(suffix))
    }

    /// `[name*=value]`
    fn attribute_contains(
        &self,
        element: &Self::Element,
        namespace: Option<&str>,
        name: &str,
        needle: &str,
    ) -> bool {
        !needle.is_empty()
            && self
                .find_attribute(element, namespace, name)
                .is_some_and(|v| v.contains(needle))
    }
}
