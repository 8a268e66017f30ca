//! Unit conversion for `calc()` and typed `attr()`.

use std::f64::consts::PI;

use crate::config::UnitConfig;

/// Converts values between units of the same dimension.
///
/// Unit names are the dimension suffixes as written (`px`, `em`, `deg`), or
/// `%` for percentages. Matching is ASCII case-insensitive.
pub trait UnitConverter: Send + Sync {
    /// Convert `value` from `from` to `to`, or `None` if the units are not
    /// convertible.
    fn convert(&self, value: f64, from: &str, to: &str) -> Option<f64>;

    /// Returns true if `unit` is a length unit.
    fn is_length(&self, unit: &str) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Dimension {
    Length,
    Angle,
    Time,
    Frequency,
    Resolution,
}

/// Converter covering absolute and font-relative lengths, viewport units,
/// percentages, angles, times, frequencies and resolutions.
///
/// Relative lengths resolve against the reference sizes in [`UnitConfig`];
/// percentages are treated as lengths of `percentage_base`.
#[derive(Clone, Debug, Default)]
pub struct DefaultUnitConverter {
    units: UnitConfig,
}

impl DefaultUnitConverter {
    /// Create a converter for the given reference sizes.
    pub fn new(units: UnitConfig) -> Self {
        Self { units }
    }

    /// The reference sizes in use.
    pub fn units(&self) -> &UnitConfig {
        &self.units
    }

    /// Dimension and factor to the canonical unit (px, deg, s, Hz, dppx).
    fn canonical(&self, unit: &str) -> Option<(Dimension, f64)> {
        let u = &self.units;
        let unit = unit.to_ascii_lowercase();
        let entry = match unit.as_str() {
            "px" => (Dimension::Length, 1.0),
            "in" => (Dimension::Length, 96.0),
            "cm" => (Dimension::Length, 96.0 / 2.54),
            "mm" => (Dimension::Length, 96.0 / 25.4),
            "q" => (Dimension::Length, 96.0 / 101.6),
            "pt" => (Dimension::Length, 96.0 / 72.0),
            "pc" => (Dimension::Length, 16.0),
            "em" => (Dimension::Length, u.font_size),
            "rem" => (Dimension::Length, u.root_font_size),
            "ex" | "ch" => (Dimension::Length, u.x_height),
            "vw" => (Dimension::Length, u.viewport_width / 100.0),
            "vh" => (Dimension::Length, u.viewport_height / 100.0),
            "vmin" => (Dimension::Length, u.viewport_width.min(u.viewport_height) / 100.0),
            "vmax" => (Dimension::Length, u.viewport_width.max(u.viewport_height) / 100.0),
            "%" => (Dimension::Length, u.percentage_base / 100.0),
            "deg" => (Dimension::Angle, 1.0),
            "rad" => (Dimension::Angle, 180.0 / PI),
            "grad" => (Dimension::Angle, 0.9),
            "turn" => (Dimension::Angle, 360.0),
            "s" => (Dimension::Time, 1.0),
            "ms" => (Dimension::Time, 0.001),
            "hz" => (Dimension::Frequency, 1.0),
            "khz" => (Dimension::Frequency, 1000.0),
            "dppx" | "x" => (Dimension::Resolution, 1.0),
            "dpi" => (Dimension::Resolution, 1.0 / 96.0),
            "dpcm" => (Dimension::Resolution, 2.54 / 96.0),
            _ => return None,
        };
        Some(entry)
    }
}

impl UnitConverter for DefaultUnitConverter {
    fn convert(&self, value: f64, from: &str, to: &str) -> Option<f64> {
        if from.eq_ignore_ascii_case(to) {
            return Some(value);
        }
        let (from_dim, from_factor) = self.canonical(from)?;
        let (to_dim, to_factor) = self.canonical(to)?;
        if from_dim != to_dim || to_factor == 0.0 {
            return None;
        }
        Some(value * from_factor / to_factor)
    }

    fn is_length(&self, unit: &str) -> bool {
        unit != "%" && matches!(self.canonical(unit), Some((Dimension::Length, _)))
    }
}
