//! Configuration for value processing and the cascade.

/// Reference sizes used when converting between units.
///
/// All lengths are in CSS pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitConfig {
    /// Size of `1em`.
    pub font_size: f64,
    /// Size of `1rem`.
    pub root_font_size: f64,
    /// Size of `1ex` (also used for `ch`).
    pub x_height: f64,
    /// The length `100%` resolves to.
    pub percentage_base: f64,
    /// Viewport width for `vw`, `vmin` and `vmax`.
    pub viewport_width: f64,
    /// Viewport height for `vh`, `vmin` and `vmax`.
    pub viewport_height: f64,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            root_font_size: 16.0,
            x_height: 8.0,
            percentage_base: 100.0,
            viewport_width: 1024.0,
            viewport_height: 768.0,
        }
    }
}

impl UnitConfig {
    /// Create a unit configuration with default sizes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the size of `1em`.
    pub fn font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    /// Set the size of `1rem`.
    pub fn root_font_size(mut self, size: f64) -> Self {
        self.root_font_size = size;
        self
    }

    /// Set the size of `1ex`.
    pub fn x_height(mut self, size: f64) -> Self {
        self.x_height = size;
        self
    }

    /// Set the length that `100%` resolves to.
    pub fn percentage_base(mut self, base: f64) -> Self {
        self.percentage_base = base;
        self
    }

    /// Set the viewport size.
    pub fn viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }
}

/// Configuration for the declaration-value function processor.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessorConfig {
    /// Maximum function nesting depth. Deeper evaluations fail.
    pub max_depth: usize,
    /// Enable `concat()`, `replace()` and `round()`.
    pub extensions: bool,
    /// Unit conversion reference sizes.
    pub units: UnitConfig,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            extensions: true,
            units: UnitConfig::default(),
        }
    }
}

impl ProcessorConfig {
    /// Create a processor configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum nesting depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Enable or disable the extension functions.
    pub fn extensions(mut self, enabled: bool) -> Self {
        self.extensions = enabled;
        self
    }

    /// Set the unit reference sizes.
    pub fn units(mut self, units: UnitConfig) -> Self {
        self.units = units;
        self
    }
}

/// Configuration for [`StylesheetManager`](crate::StylesheetManager).
#[derive(Clone, Debug, PartialEq)]
pub struct CascadeConfig {
    /// Function processor settings.
    pub processor: ProcessorConfig,
    /// Log and skip declarations whose functions fail instead of failing
    /// the whole `apply_to` call.
    pub suppress_errors: bool,
    /// Apply the element's `style` attribute after all stylesheets.
    pub apply_style_attribute: bool,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            processor: ProcessorConfig::default(),
            suppress_errors: true,
            apply_style_attribute: true,
        }
    }
}

impl CascadeConfig {
    /// Create a cascade configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the function processor settings.
    pub fn processor(mut self, processor: ProcessorConfig) -> Self {
        self.processor = processor;
        self
    }

    /// Choose whether function errors are suppressed.
    pub fn suppress_errors(mut self, suppress: bool) -> Self {
        self.suppress_errors = suppress;
        self
    }

    /// Choose whether the `style` attribute is applied.
    pub fn apply_style_attribute(mut self, apply: bool) -> Self {
        self.apply_style_attribute = apply;
        self
    }
}
