//! Reloading file-backed stylesheets when they change on disk.
//!
//! Requires the `hot-reload` feature. The watcher only reports changes;
//! [`StylesheetWatcher::apply_changes`] hands them to a
//! [`StylesheetManager`](crate::StylesheetManager), and the host re-runs the
//! cascade for the elements it cares about.

mod watcher;

pub use watcher::{ChangeKind, StylesheetChangeEvent, StylesheetWatcher};
