//! CSS parsing module.

mod css_parser;
mod error;
mod selector_parser;

pub use css_parser::{StylesheetParser, parse_declaration_list, parse_selector_group, parse_stylesheet};
pub use error::ParseError;
