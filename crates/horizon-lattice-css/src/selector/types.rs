//! Selector type definitions.

use std::fmt;

use crate::rules::QualifiedName;
use crate::syntax::{Token, TokenKind, escape_ident, format_number, from_token, serialize_tokens};

/// A CSS selector tree (e.g. `div.primary:hover > span`).
///
/// Compound selectors are chains of [`Selector::And`]; combinators hold the
/// selector on their left and the subject on their right. Trees are built
/// left-associatively, so `a b > c` is `Child(Descendant(a, b), c)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// `*`
    Universal,
    /// Type selector, e.g. `div` or `svg|rect`.
    Type(QualifiedName),
    /// `#id`
    Id(String),
    /// `.class`
    Class(String),
    /// Attribute selector, e.g. `[lang|=en]`.
    Attribute {
        /// Comparison operator.
        op: AttributeOp,
        /// Attribute name.
        name: QualifiedName,
        /// Comparison value (absent for [`AttributeOp::Exists`]).
        value: Option<String>,
    },
    /// Pseudo-class selector.
    PseudoClass(PseudoClass),
    /// Both selectors must match the same element.
    And(Box<Selector>, Box<Selector>),
    /// Two selectors joined by a combinator.
    Combined {
        /// How `left` relates to the subject.
        combinator: Combinator,
        /// The ancestor or sibling selector.
        left: Box<Selector>,
        /// The subject selector.
        right: Box<Selector>,
    },
    /// Matches nothing; stands in for a selector that failed to parse.
    Nothing,
}

impl Selector {
    /// Create a type selector.
    pub fn type_selector(name: impl Into<String>) -> Self {
        Self::Type(QualifiedName::new(name))
    }

    /// Create a class selector.
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }

    /// Create an ID selector.
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Create an attribute selector.
    pub fn attribute(op: AttributeOp, name: impl Into<String>, value: Option<&str>) -> Self {
        Self::Attribute {
            op,
            name: QualifiedName::new(name),
            value: value.map(str::to_string),
        }
    }

    /// Create a simple pseudo-class selector.
    pub fn pseudo(name: impl Into<String>) -> Self {
        Self::PseudoClass(PseudoClass::Simple(name.into()))
    }

    /// Require `other` on the same element.
    pub fn and(self, other: Selector) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Join with a combinator; `self` becomes the left side.
    pub fn combine(self, combinator: Combinator, subject: Selector) -> Self {
        Self::Combined {
            combinator,
            left: Box::new(self),
            right: Box::new(subject),
        }
    }

    /// `self subject`
    pub fn descendant(self, subject: Selector) -> Self {
        self.combine(Combinator::Descendant, subject)
    }

    /// `self > subject`
    pub fn child(self, subject: Selector) -> Self {
        self.combine(Combinator::Child, subject)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Universal => write!(f, "*"),
            Selector::Type(name) => write!(f, "{}", name),
            Selector::Id(id) => write!(f, "#{}", ident(id)),
            Selector::Class(class) => write!(f, ".{}", ident(class)),
            Selector::Attribute { op, name, value } => {
                write!(f, "[{}", name)?;
                if let Some(value) = value {
                    write!(f, "{}{}", op, from_token(&Token::string(value.as_str())))?;
                }
                write!(f, "]")
            }
            Selector::PseudoClass(pseudo) => write!(f, ":{}", pseudo),
            Selector::And(left, right) => write!(f, "{}{}", left, right),
            Selector::Combined {
                combinator,
                left,
                right,
            } => write!(f, "{}{}{}", left, combinator, right),
            // Never matches anything, and parses back to a selector.
            Selector::Nothing => write!(f, ":not(*)"),
        }
    }
}

fn ident(name: &str) -> String {
    let mut out = String::new();
    escape_ident(name, &mut out);
    out
}

/// A comma-separated list of selector alternatives.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectorGroup {
    /// The alternatives, in source order.
    pub selectors: Vec<Selector>,
}

impl SelectorGroup {
    /// Create a group from alternatives.
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self { selectors }
    }

    /// A group that matches nothing.
    pub fn nothing() -> Self {
        Self::new(vec![Selector::Nothing])
    }

    /// Iterate over the alternatives.
    pub fn iter(&self) -> impl Iterator<Item = &Selector> {
        self.selectors.iter()
    }

    /// Number of alternatives.
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// Check if the group has no alternatives.
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

impl From<Selector> for SelectorGroup {
    fn from(selector: Selector) -> Self {
        Self::new(vec![selector])
    }
}

impl fmt::Display for SelectorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, selector) in self.selectors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", selector)?;
        }
        Ok(())
    }
}

/// Attribute selector operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeOp {
    /// `[name]`
    Exists,
    /// `[name=value]`
    Equals,
    /// `[name~=value]`
    Include,
    /// `[name|=value]`
    Dash,
    /// `[name^=value]`
    Prefix,
    /// `[name$=value]`
    Suffix,
    /// `[name*=value]`
    Substring,
}

impl AttributeOp {
    /// Map a match-operator token to its operator.
    pub fn from_token_kind(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Delim('=') => Some(Self::Equals),
            TokenKind::IncludeMatch => Some(Self::Include),
            TokenKind::DashMatch => Some(Self::Dash),
            TokenKind::PrefixMatch => Some(Self::Prefix),
            TokenKind::SuffixMatch => Some(Self::Suffix),
            TokenKind::SubstringMatch => Some(Self::Substring),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeOp::Exists => Ok(()),
            AttributeOp::Equals => write!(f, "="),
            AttributeOp::Include => write!(f, "~="),
            AttributeOp::Dash => write!(f, "|="),
            AttributeOp::Prefix => write!(f, "^="),
            AttributeOp::Suffix => write!(f, "$="),
            AttributeOp::Substring => write!(f, "*="),
        }
    }
}

/// Combinator between selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Descendant combinator (space): matches any descendant.
    Descendant,
    /// Child combinator (>): matches direct child only.
    Child,
    /// Adjacent sibling (+): matches immediately following sibling.
    AdjacentSibling,
    /// General sibling (~): matches any following sibling.
    GeneralSibling,
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::Descendant => write!(f, " "),
            Combinator::Child => write!(f, " > "),
            Combinator::AdjacentSibling => write!(f, " + "),
            Combinator::GeneralSibling => write!(f, " ~ "),
        }
    }
}

/// Pseudo-class selectors.
///
/// Names are kept as written; the model decides what they mean.
#[derive(Debug, Clone, PartialEq)]
pub enum PseudoClass {
    /// `:name`
    Simple(String),
    /// `:name(terms)`, e.g. `:nth-child(2n+1)`.
    Function {
        /// Function name.
        name: String,
        /// Argument tokens, trimmed of surrounding whitespace.
        terms: Vec<Token>,
    },
    /// `:not(selector)`.
    Negation {
        /// Function name as written (`not`).
        name: String,
        /// Argument tokens.
        terms: Vec<Token>,
        /// The parsed argument.
        inner: Box<Selector>,
    },
}

impl PseudoClass {
    /// The pseudo-class name.
    pub fn name(&self) -> &str {
        match self {
            PseudoClass::Simple(name) => name,
            PseudoClass::Function { name, .. } | PseudoClass::Negation { name, .. } => name,
        }
    }
}

impl fmt::Display for PseudoClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PseudoClass::Simple(name) => write!(f, "{}", ident(name)),
            PseudoClass::Function { name, terms } => {
                write!(f, "{}({})", ident(name), serialize_tokens(terms))
            }
            PseudoClass::Negation { name, inner, .. } => write!(f, "{}({})", ident(name), inner),
        }
    }
}

/// Expression for :nth-child (An+B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NthExpr {
    /// Coefficient (A in An+B).
    pub a: i32,
    /// Offset (B in An+B).
    pub b: i32,
}

impl NthExpr {
    /// Create a new nth expression.
    pub fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    /// Parse from the argument tokens of a functional pseudo-class.
    pub fn parse(terms: &[Token]) -> Option<Self> {
        let mut text = String::new();
        for token in terms.iter().filter(|t| !t.kind().is_insignificant()) {
            if token.kind() == TokenKind::Number {
                let value = token.number_value()?;
                // A signed offset such as `+1` loses its sign in the token.
                if !text.is_empty() && value >= 0.0 && !text.ends_with(['+', '-']) {
                    text.push('+');
                }
                text.push_str(&format_number(value));
            } else {
                text.push_str(&from_token(token));
            }
        }
        Self::from_css(&text)
    }

    /// Parse `odd`, `even`, `B`, or `An+B` text.
    pub fn from_css(s: &str) -> Option<Self> {
        let s: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match s.as_str() {
            "odd" => return Some(Self::odd()),
            "even" => return Some(Self::even()),
            "" => return None,
            _ => {}
        }
        match s.find('n') {
            Some(pos) => {
                let a = match &s[..pos] {
                    "" | "+" => 1,
                    "-" => -1,
                    a => a.parse().ok()?,
                };
                let b = match &s[pos + 1..] {
                    "" => 0,
                    b if b.starts_with(['+', '-']) => b.parse().ok()?,
                    _ => return None,
                };
                Some(Self::new(a, b))
            }
            None => s.parse().ok().map(|b| Self::new(0, b)),
        }
    }

    /// Check if a 0-indexed position matches this expression.
    ///
    /// Computed in `i64`, so no `a`/`b` pair can overflow.
    pub fn matches(&self, index: usize) -> bool {
        let Some(n) = i64::try_from(index).ok().and_then(|i| i.checked_add(1)) else {
            return false;
        };
        let (a, b) = (i64::from(self.a), i64::from(self.b));
        if a == 0 {
            return n == b;
        }
        let diff = n - b;
        diff % a == 0 && (diff == 0 || (diff > 0) == (a > 0))
    }

    /// :nth-child(odd) = 2n+1.
    pub fn odd() -> Self {
        Self { a: 2, b: 1 }
    }

    /// :nth-child(even) = 2n.
    pub fn even() -> Self {
        Self { a: 2, b: 0 }
    }
}
