//! Stylesheet AST: rules, declarations and names.

mod qualified_name;
mod rule;
mod stylesheet;

pub use qualified_name::QualifiedName;
pub use rule::{AtRule, Declaration, Rule, StyleRule};
pub use stylesheet::Stylesheet;
