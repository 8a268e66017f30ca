//! Stylesheet loading and the cascade.

pub mod custom_properties;
mod entry;
mod manager;
mod origin;

pub use custom_properties::{CustomProperties, PropertyTable};
pub use entry::{StylesheetEntry, StylesheetSource};
pub use manager::StylesheetManager;
pub use origin::StyleOrigin;
