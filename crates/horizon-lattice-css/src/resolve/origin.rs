//! Style origins.

use std::fmt;

/// Provenance tier of a style value.
///
/// Ordered from lowest to highest precedence. The cascade writes
/// `UserAgent`, `Author` and `Inline`; `User` marks values the host set
/// directly, which the cascade never writes or resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum StyleOrigin {
    /// Built-in defaults.
    UserAgent = 0,
    /// Application stylesheets.
    Author = 1,
    /// Inline stylesheets and the element's style attribute.
    Inline = 2,
    /// Values set by the host application.
    User = 3,
}

impl StyleOrigin {
    /// Origins the cascade applies, lowest first.
    pub const CASCADED: [StyleOrigin; 3] = [Self::UserAgent, Self::Author, Self::Inline];

    /// Returns true for origins the cascade manages.
    pub fn is_cascaded(&self) -> bool {
        !matches!(self, Self::User)
    }
}

impl fmt::Display for StyleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleOrigin::UserAgent => write!(f, "user-agent"),
            StyleOrigin::Author => write!(f, "author"),
            StyleOrigin::Inline => write!(f, "inline"),
            StyleOrigin::User => write!(f, "user"),
        }
    }
}
