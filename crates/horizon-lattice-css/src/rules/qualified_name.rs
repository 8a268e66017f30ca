//! Namespace-qualified names for attributes and properties.

use std::cmp::Ordering;
use std::fmt;

use crate::syntax::escape_ident;

/// An optional namespace plus a local name.
///
/// `namespace` is `None` when no prefix was written (any namespace),
/// `Some("")` for the explicit no-namespace form `|name`, and `Some("*")` for
/// `*|name`. Ordering looks at the local name only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// Namespace prefix, if any.
    pub namespace: Option<String>,
    /// Local name.
    pub name: String,
}

impl QualifiedName {
    /// A name without namespace prefix.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    /// A name with a namespace prefix.
    pub fn with_namespace(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    /// The namespace prefix as a string slice.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns true for custom property names (`--name`).
    pub fn is_custom_property(&self) -> bool {
        self.name.starts_with("--")
    }
}

impl From<&str> for QualifiedName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialOrd for QualifiedName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QualifiedName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        match self.namespace.as_deref() {
            None => {}
            Some("*") => out.push_str("*|"),
            Some(ns) => {
                escape_ident(ns, &mut out);
                out.push('|');
            }
        }
        escape_ident(&self.name, &mut out);
        f.write_str(&out)
    }
}
