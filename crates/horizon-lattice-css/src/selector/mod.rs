//! CSS selector types and matching.

mod matcher;
mod specificity;
mod types;

pub use specificity::Specificity;
pub use types::*;
