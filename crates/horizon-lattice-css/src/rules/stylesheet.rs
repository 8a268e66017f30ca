//! Parsed stylesheets.

use std::fmt;

use super::{Declaration, Rule, StyleRule};

/// An ordered, immutable list of rules.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stylesheet {
    rules: Vec<Rule>,
}

impl Stylesheet {
    /// Create a stylesheet from rules.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Parse a stylesheet from CSS text, discarding parse errors.
    ///
    /// Use [`parse_stylesheet`](crate::parser::parse_stylesheet) to see them.
    pub fn from_css(css: &str) -> Self {
        crate::parser::parse_stylesheet(css).0
    }

    /// All rules in source order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Style rules in source order.
    pub fn style_rules(&self) -> impl Iterator<Item = &StyleRule> {
        self.rules.iter().filter_map(Rule::as_style)
    }

    /// Custom property declarations of all style rules, in source order.
    pub fn custom_properties(&self) -> impl Iterator<Item = &Declaration> {
        self.style_rules()
            .flat_map(|rule| rule.declarations.iter())
            .filter(|decl| decl.is_custom_property())
    }

    /// Get the number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the stylesheet is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Display for Stylesheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}
