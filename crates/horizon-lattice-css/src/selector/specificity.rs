//! Selector specificity.

use std::fmt;
use std::ops::Add;

use super::{PseudoClass, Selector};

/// Specificity as an `(ids, classes, types)` triple.
///
/// Attribute selectors and pseudo-classes count as classes. The derived
/// ordering is lexicographic, so one ID outweighs any number of classes:
/// (1,0,0) > (0,99,99).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl Specificity {
    /// Specificity of `*`.
    pub const ZERO: Self = Self(0, 0, 0);

    const ID: Self = Self(1, 0, 0);
    const CLASS: Self = Self(0, 1, 0);
    const TYPE: Self = Self(0, 0, 1);

    /// Sum the simple selectors of a compound or complex selector.
    pub fn of_selector(selector: &Selector) -> Self {
        match selector {
            Selector::Universal | Selector::Nothing => Self::ZERO,
            Selector::Id(_) => Self::ID,
            Selector::Class(_) | Selector::Attribute { .. } => Self::CLASS,
            Selector::PseudoClass(PseudoClass::Negation { inner, .. }) => Self::of_selector(inner),
            Selector::PseudoClass(_) => Self::CLASS,
            Selector::Type(_) => Self::TYPE,
            Selector::And(left, right) | Selector::Combined { left, right, .. } => {
                Self::of_selector(left) + Self::of_selector(right)
            }
        }
    }

    /// Number of ID selectors.
    pub fn ids(&self) -> u32 {
        self.0
    }

    /// Number of class, attribute and pseudo-class selectors.
    pub fn classes(&self) -> u32 {
        self.1
    }

    /// Number of type selectors.
    pub fn types(&self) -> u32 {
        self.2
    }

    /// Pack into one integer weight, 8 bits per component.
    ///
    /// Components saturate at 255, so the packed order agrees with the
    /// triple order for all realistic selectors.
    pub fn as_u32(&self) -> u32 {
        let clamp = |v: u32| v.min(0xFF);
        (clamp(self.0) << 16) | (clamp(self.1) << 8) | clamp(self.2)
    }
}

impl Add for Specificity {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(
            self.0.saturating_add(other.0),
            self.1.saturating_add(other.1),
            self.2.saturating_add(other.2),
        )
    }
}

impl Selector {
    /// Specificity of this selector.
    pub fn specificity(&self) -> Specificity {
        Specificity::of_selector(self)
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.0, self.1, self.2)
    }
}
