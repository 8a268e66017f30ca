//! CSS engine for Horizon Lattice.
//!
//! This crate turns CSS text into styled elements, featuring:
//!
//! - **Syntax**: A CSS Syntax Level 3 tokenizer over strings or readers, and
//!   a serializer that writes tokens back as CSS
//! - **Parsing**: An error-recovering stylesheet parser that keeps every
//!   well-formed rule and reports the rest
//! - **Selectors**: Type, class, ID, attribute, pseudo-class and combinator
//!   selectors with specificity
//! - **Functions**: `var()`, `calc()`, `attr()` plus `concat()`,
//!   `replace()` and `round()` in declaration values
//! - **Cascading**: Origin and specificity ordered application to any
//!   document that implements [`SelectorModel`]
//! - **Hot Reload**: Automatically reload stylesheets during development
//!
//! # Example
//!
//! ```ignore
//! use horizon_lattice_css::prelude::*;
//!
//! let mut manager = StylesheetManager::new(document);
//! manager.add_stylesheet(StyleOrigin::UserAgent, "div { display: block }");
//! manager.add_stylesheet(StyleOrigin::Author, std::path::Path::new("styles/app.css"));
//!
//! // Writes resolved values through SelectorModel::set_style_value
//! manager.apply_to(&element)?;
//! ```

pub mod config;
pub mod function;
pub mod logging;
pub mod model;
pub mod parser;
pub mod resolve;
pub mod rules;
pub mod selector;
pub mod syntax;

#[cfg(feature = "hot-reload")]
pub mod hot_reload;

mod error;

#[cfg(test)]
mod testing;

pub use config::{CascadeConfig, ProcessorConfig, UnitConfig};
pub use error::{Error, FunctionError, Result};
pub use model::SelectorModel;
pub use resolve::{StyleOrigin, StylesheetManager};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::config::{CascadeConfig, ProcessorConfig, UnitConfig};
    pub use crate::function::{DefaultUnitConverter, FunctionProcessor, UnitConverter};
    pub use crate::model::SelectorModel;
    pub use crate::parser::{ParseError, parse_declaration_list, parse_selector_group, parse_stylesheet};
    pub use crate::resolve::{StyleOrigin, StylesheetEntry, StylesheetManager, StylesheetSource};
    pub use crate::rules::{Declaration, QualifiedName, Rule, StyleRule, Stylesheet};
    pub use crate::selector::{Combinator, PseudoClass, Selector, SelectorGroup, Specificity};
    pub use crate::syntax::{Token, TokenKind, Tokenizer, tokenize};
    pub use crate::{Error, Result};

    #[cfg(feature = "hot-reload")]
    pub use crate::hot_reload::StylesheetWatcher;
}
