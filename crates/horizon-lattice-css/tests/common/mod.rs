//! Arena-backed element tree used by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};

use horizon_lattice_css::rules::QualifiedName;
use horizon_lattice_css::syntax::{Token, serialize_tokens, tokenize};
use horizon_lattice_css::{SelectorModel, StyleOrigin};
use parking_lot::RwLock;

#[derive(Debug, Default, Clone)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub states: Vec<String>,
    pub parent: Option<usize>,
}

/// Route engine logs to the test harness output. Safe to call repeatedly.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

type Values = BTreeMap<StyleOrigin, Vec<Token>>;

/// A flat element tree; children always come after their parent.
#[derive(Debug, Default)]
pub struct Scene {
    elements: Vec<Element>,
    styles: RwLock<HashMap<(usize, String), Values>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element from a tiny selector-like description: `tag#id.class1.class2`.
    pub fn add(&mut self, parent: Option<usize>, description: &str) -> usize {
        let mut element = Element {
            parent,
            ..Default::default()
        };
        let mut rest = description;
        let tag_end = rest.find(['#', '.']).unwrap_or(rest.len());
        element.tag = rest[..tag_end].to_string();
        rest = &rest[tag_end..];
        while !rest.is_empty() {
            let marker = rest.as_bytes()[0];
            let end = rest[1..].find(['#', '.']).map_or(rest.len(), |i| i + 1);
            let name = rest[1..end].to_string();
            match marker {
                b'#' => element.id = Some(name),
                _ => element.classes.push(name),
            }
            rest = &rest[end..];
        }
        self.elements.push(element);
        self.elements.len() - 1
    }

    pub fn set_attribute(&mut self, element: usize, name: &str, value: &str) {
        self.elements[element]
            .attributes
            .push((name.to_string(), value.to_string()));
    }

    pub fn set_state(&mut self, element: usize, state: &str) {
        self.elements[element].states.push(state.to_string());
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Set a host value the cascade must leave alone.
    pub fn set_user_value(&self, element: usize, property: &str, css: &str) {
        self.styles
            .write()
            .entry((element, property.to_string()))
            .or_default()
            .insert(StyleOrigin::User, tokenize(css));
    }

    /// Winning value of a property, serialized.
    pub fn value(&self, element: usize, property: &str) -> Option<String> {
        self.tokens(element, property).map(|tokens| serialize_tokens(&tokens))
    }

    /// Winning value of a property.
    pub fn tokens(&self, element: usize, property: &str) -> Option<Vec<Token>> {
        self.styles
            .read()
            .get(&(element, property.to_string()))
            .and_then(|values| values.values().next_back().cloned())
    }

    /// Origin of the winning value.
    pub fn origin(&self, element: usize, property: &str) -> Option<StyleOrigin> {
        self.styles
            .read()
            .get(&(element, property.to_string()))
            .and_then(|values| values.keys().next_back().copied())
    }

    /// Value written for one origin.
    pub fn value_at(&self, element: usize, origin: StyleOrigin, property: &str) -> Option<String> {
        self.styles
            .read()
            .get(&(element, property.to_string()))
            .and_then(|values| values.get(&origin))
            .map(|tokens| serialize_tokens(tokens))
    }
}

impl SelectorModel for Scene {
    type Element = usize;

    fn has_id(&self, element: &usize, id: &str) -> bool {
        self.elements[*element].id.as_deref() == Some(id)
    }

    fn has_type(&self, element: &usize, _namespace: Option<&str>, name: &str) -> bool {
        self.elements[*element].tag.eq_ignore_ascii_case(name)
    }

    fn has_style_class(&self, element: &usize, class: &str) -> bool {
        self.elements[*element].classes.iter().any(|c| c == class)
    }

    fn attribute_value(&self, element: &usize, _namespace: Option<&str>, name: &str) -> Option<String> {
        self.elements[*element]
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn attribute_names(&self, element: &usize) -> Vec<QualifiedName> {
        self.elements[*element]
            .attributes
            .iter()
            .map(|(n, _)| QualifiedName::new(n.as_str()))
            .collect()
    }

    fn has_state(&self, element: &usize, state: &str) -> bool {
        self.elements[*element].states.iter().any(|s| s == state)
    }

    fn parent(&self, element: &usize) -> Option<usize> {
        self.elements[*element].parent
    }

    fn previous_sibling(&self, element: &usize) -> Option<usize> {
        let parent = self.elements[*element].parent?;
        (0..*element)
            .rev()
            .find(|i| self.elements[*i].parent == Some(parent))
    }

    fn next_sibling(&self, element: &usize) -> Option<usize> {
        let parent = self.elements[*element].parent?;
        (*element + 1..self.elements.len()).find(|i| self.elements[*i].parent == Some(parent))
    }

    fn set_style_value(
        &self,
        element: &usize,
        origin: StyleOrigin,
        name: &QualifiedName,
        value: Option<Vec<Token>>,
    ) {
        let mut styles = self.styles.write();
        let values = styles.entry((*element, name.name.clone())).or_default();
        match value {
            Some(tokens) => {
                values.insert(origin, tokens);
            }
            None => {
                values.remove(&origin);
            }
        }
    }

    fn reset_style_values(&self, element: &usize) {
        let mut styles = self.styles.write();
        for ((owner, _), values) in styles.iter_mut() {
            if owner == element {
                values.retain(|origin, _| !origin.is_cascaded());
            }
        }
        styles.retain(|_, values| !values.is_empty());
    }
}
