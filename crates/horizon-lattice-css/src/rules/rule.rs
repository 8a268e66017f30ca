//! Rule and declaration definitions.

use std::fmt;

use super::QualifiedName;
use crate::selector::{Selector, SelectorGroup, Specificity};
use crate::syntax::{Span, Token, serialize_tokens};

/// A property declaration (`name: terms`).
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Property name, optionally namespace-qualified.
    pub name: QualifiedName,
    /// Value tokens with comments dropped and surrounding whitespace trimmed.
    pub terms: Vec<Token>,
    /// Where the declaration starts.
    pub span: Span,
}

impl Declaration {
    /// Create a declaration.
    pub fn new(name: impl Into<QualifiedName>, terms: Vec<Token>) -> Self {
        Self {
            name: name.into(),
            terms,
            span: Span::default(),
        }
    }

    /// Attach a source span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The property name.
    pub fn property(&self) -> &str {
        &self.name.name
    }

    /// Returns true if the value has no tokens; such declarations are never applied.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Returns true for custom property declarations (`--name: ...`).
    pub fn is_custom_property(&self) -> bool {
        self.name.is_custom_property()
    }

    /// The value serialized back to CSS text.
    pub fn value_text(&self) -> String {
        serialize_tokens(&self.terms)
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value_text())
    }
}

/// A style rule mapping a selector group to declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    /// The selector alternatives.
    pub selector_group: SelectorGroup,
    /// Declarations in source order.
    pub declarations: Vec<Declaration>,
}

impl StyleRule {
    /// Create a new style rule.
    pub fn new(selector_group: impl Into<SelectorGroup>, declarations: Vec<Declaration>) -> Self {
        Self {
            selector_group: selector_group.into(),
            declarations,
        }
    }

    /// Create a rule with a type selector.
    pub fn for_type(type_name: impl Into<String>, declarations: Vec<Declaration>) -> Self {
        Self::new(Selector::type_selector(type_name), declarations)
    }

    /// Create a rule with a class selector.
    pub fn for_class(class: impl Into<String>, declarations: Vec<Declaration>) -> Self {
        Self::new(Selector::class(class), declarations)
    }

    /// Create a rule with an ID selector.
    pub fn for_id(id: impl Into<String>, declarations: Vec<Declaration>) -> Self {
        Self::new(Selector::id(id), declarations)
    }

    /// Highest specificity among the alternatives.
    pub fn max_specificity(&self) -> Specificity {
        self.selector_group
            .iter()
            .map(Selector::specificity)
            .max()
            .unwrap_or_default()
    }
}

impl fmt::Display for StyleRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {{", self.selector_group)?;
        for declaration in &self.declarations {
            writeln!(f, "  {};", declaration)?;
        }
        write!(f, "}}")
    }
}

/// An at-rule such as `@media screen { ... }` or `@import "a.css";`.
///
/// Header and body are kept as raw tokens; the engine does not interpret
/// at-rules.
#[derive(Debug, Clone, PartialEq)]
pub struct AtRule {
    /// The keyword without `@`.
    pub keyword: String,
    /// Prelude tokens between the keyword and the block or `;`.
    pub header: Vec<Token>,
    /// Block contents, `None` for statement at-rules.
    pub body: Option<Vec<Token>>,
}

impl fmt::Display for AtRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", crate::syntax::from_token(&Token::ident(self.keyword.as_str())))?;
        if !self.header.is_empty() {
            write!(f, " {}", serialize_tokens(&self.header))?;
        }
        match &self.body {
            Some(body) => write!(f, " {{{}}}", serialize_tokens(body)),
            None => write!(f, ";"),
        }
    }
}

/// A stylesheet rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// A selector group with declarations.
    Style(StyleRule),
    /// An uninterpreted at-rule.
    At(AtRule),
}

impl Rule {
    /// The style rule, if this is one.
    pub fn as_style(&self) -> Option<&StyleRule> {
        match self {
            Rule::Style(rule) => Some(rule),
            Rule::At(_) => None,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Style(rule) => write!(f, "{}", rule),
            Rule::At(rule) => write!(f, "{}", rule),
        }
    }
}
