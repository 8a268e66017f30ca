//! Tracing targets used by the engine.
//!
//! The crate never installs a subscriber; hosts filter on these targets,
//! e.g. `RUST_LOG=horizon_lattice_css::cascade=debug`.

/// Log targets, one per subsystem.
pub mod targets {
    /// Stylesheet and declaration parsing.
    pub const PARSER: &str = "horizon_lattice_css::parser";
    /// Selector matching and value application.
    pub const CASCADE: &str = "horizon_lattice_css::cascade";
    /// `var()`, `calc()`, `attr()` and extension evaluation.
    pub const FUNCTION: &str = "horizon_lattice_css::function";
    /// Stylesheet entry loading.
    pub const STYLESHEET: &str = "horizon_lattice_css::stylesheet";
    /// File watching.
    pub const HOT_RELOAD: &str = "horizon_lattice_css::hot_reload";
}
