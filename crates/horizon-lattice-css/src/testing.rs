//! Arena-backed element model shared by unit tests.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::model::SelectorModel;
use crate::resolve::StyleOrigin;
use crate::rules::QualifiedName;
use crate::syntax::{Token, serialize_tokens};

#[derive(Debug, Default)]
pub(crate) struct Node {
    pub type_name: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<(QualifiedName, String)>,
    pub pseudo_classes: Vec<String>,
    pub parent: Option<usize>,
}

type StyleKey = (usize, StyleOrigin, QualifiedName);

#[derive(Debug, Default)]
pub(crate) struct Document {
    pub nodes: Vec<Node>,
    styles: Mutex<HashMap<StyleKey, Vec<Token>>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, parent: Option<usize>, type_name: &str) -> usize {
        self.nodes.push(Node {
            type_name: type_name.to_string(),
            parent,
            ..Default::default()
        });
        self.nodes.len() - 1
    }

    pub fn node(&mut self, index: usize) -> &mut Node {
        &mut self.nodes[index]
    }

    pub fn set_attribute(&mut self, index: usize, name: &str, value: &str) {
        self.nodes[index]
            .attributes
            .push((QualifiedName::new(name), value.to_string()));
    }

    /// The winning value of a property, serialized.
    pub fn value(&self, index: usize, name: &str) -> Option<String> {
        let styles = self.styles.lock();
        styles
            .iter()
            .filter(|((node, _, prop), _)| *node == index && prop.name == name)
            .max_by_key(|((_, origin, _), _)| *origin)
            .map(|(_, tokens)| serialize_tokens(tokens))
    }

    pub fn origin_of(&self, index: usize, name: &str) -> Option<StyleOrigin> {
        let styles = self.styles.lock();
        styles
            .keys()
            .filter(|(node, _, prop)| *node == index && prop.name == name)
            .map(|(_, origin, _)| *origin)
            .max()
    }
}

impl SelectorModel for Document {
    type Element = usize;

    fn has_id(&self, element: &usize, id: &str) -> bool {
        self.nodes[*element].id.as_deref() == Some(id)
    }

    fn has_type(&self, element: &usize, _namespace: Option<&str>, name: &str) -> bool {
        self.nodes[*element].type_name == name
    }

    fn has_style_class(&self, element: &usize, class: &str) -> bool {
        self.nodes[*element].classes.iter().any(|c| c == class)
    }

    fn attribute_value(&self, element: &usize, namespace: Option<&str>, name: &str) -> Option<String> {
        self.nodes[*element]
            .attributes
            .iter()
            .find(|(n, _)| n.name == name && (namespace.is_none() || n.namespace() == namespace))
            .map(|(_, v)| v.clone())
    }

    fn attribute_names(&self, element: &usize) -> Vec<QualifiedName> {
        self.nodes[*element]
            .attributes
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    fn has_state(&self, element: &usize, state: &str) -> bool {
        self.nodes[*element].pseudo_classes.iter().any(|p| p == state)
    }

    fn parent(&self, element: &usize) -> Option<usize> {
        self.nodes[*element].parent
    }

    fn previous_sibling(&self, element: &usize) -> Option<usize> {
        let parent = self.nodes[*element].parent?;
        (0..*element).rev().find(|i| self.nodes[*i].parent == Some(parent))
    }

    fn next_sibling(&self, element: &usize) -> Option<usize> {
        let parent = self.nodes[*element].parent?;
        (*element + 1..self.nodes.len()).find(|i| self.nodes[*i].parent == Some(parent))
    }

    fn set_style_value(
        &self,
        element: &usize,
        origin: StyleOrigin,
        name: &QualifiedName,
        value: Option<Vec<Token>>,
    ) {
        let key = (*element, origin, name.clone());
        let mut styles = self.styles.lock();
        match value {
            Some(tokens) => {
                styles.insert(key, tokens);
            }
            None => {
                styles.remove(&key);
            }
        }
    }

    fn reset_style_values(&self, element: &usize) {
        self.styles
            .lock()
            .retain(|(node, origin, _), _| *node != *element || !origin.is_cascaded());
    }
}
