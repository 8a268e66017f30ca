//! Custom property (`--name`) tables for `var()` lookups.

use std::collections::HashMap;
use std::sync::Arc;

use crate::rules::{Declaration, Stylesheet};
use crate::syntax::Token;

/// Custom property values keyed by their full `--name`.
pub type PropertyTable = HashMap<String, Vec<Token>>;

/// Layered custom property lookup.
///
/// Layers are searched in the order they were pushed, so the most specific
/// source (the element's style attribute, then the Inline origin) goes first.
#[derive(Clone, Debug, Default)]
pub struct CustomProperties {
    layers: Vec<Arc<PropertyTable>>,
}

impl CustomProperties {
    /// Create an empty lookup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer searched after all existing ones.
    pub fn push(&mut self, layer: Arc<PropertyTable>) {
        self.layers.push(layer);
    }

    /// Builder form of [`push`](Self::push).
    pub fn with_layer(mut self, layer: Arc<PropertyTable>) -> Self {
        self.push(layer);
        self
    }

    /// Look up a custom property value.
    pub fn get(&self, name: &str) -> Option<&[Token]> {
        self.layers
            .iter()
            .find_map(|layer| layer.get(name))
            .map(Vec::as_slice)
    }

    /// Returns true if no layer holds any property.
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(|layer| layer.is_empty())
    }
}

/// Build a table from declarations; later declarations override earlier ones.
pub fn collect<'a>(declarations: impl IntoIterator<Item = &'a Declaration>) -> PropertyTable {
    declarations
        .into_iter()
        .filter(|decl| decl.is_custom_property())
        .map(|decl| (decl.name.name.clone(), decl.terms.clone()))
        .collect()
}

/// Build a table from every style rule of the given stylesheets, in order.
pub fn collect_stylesheets<'a>(stylesheets: impl IntoIterator<Item = &'a Stylesheet>) -> PropertyTable {
    collect(stylesheets.into_iter().flat_map(Stylesheet::custom_properties))
}
