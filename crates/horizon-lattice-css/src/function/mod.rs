//! Declaration value functions.
//!
//! Supported functions:
//!
//! - `var(--name [, fallback])` - custom property substitution
//! - `calc(expression)` - arithmetic with `+ - * /` and parentheses
//! - `attr(name [type-or-unit] [, fallback])` - element attribute values
//! - `concat(...)`, `replace(string, regex, replacement)`, `round(value)` -
//!   extensions, switchable with [`ProcessorConfig::extensions`]
//!
//! [`ProcessorConfig::extensions`]: crate::config::ProcessorConfig::extensions

mod attr;
mod calc;
mod extensions;
mod processor;
mod units;

pub use processor::FunctionProcessor;
pub use units::{DefaultUnitConverter, UnitConverter};
