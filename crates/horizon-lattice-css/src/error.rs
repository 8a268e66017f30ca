//! Error types for the CSS engine.

use std::path::PathBuf;

use crate::parser::ParseError;

/// Result type alias for CSS operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing, loading or applying stylesheets.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// CSS parsing error.
    #[error("CSS parse error at line {line} [{start}..{end}]: {message}")]
    Parse {
        message: String,
        line: usize,
        start: usize,
        end: usize,
    },

    /// Selector parsing error.
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    /// Stylesheet I/O error.
    #[error("Failed to read stylesheet '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Declaration value function error.
    #[error(transparent)]
    Function(#[from] FunctionError),

    /// Stylesheet source that cannot be loaded (e.g. a non-file URL).
    #[error("Unsupported stylesheet source: {0}")]
    UnsupportedSource(String),

    /// Hot-reload error.
    #[cfg(feature = "hot-reload")]
    #[error("Hot-reload error: {0}")]
    HotReload(String),
}

impl Error {
    /// Create a selector error.
    pub fn invalid_selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true for I/O errors that only mean "try again later".
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::Interrupted)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Self::Parse {
            message: err.message,
            line: err.line,
            start: err.start,
            end: err.end,
        }
    }
}

/// Errors raised while evaluating `var()`, `calc()`, `attr()` and the
/// extension functions.
#[derive(Debug, thiserror::Error)]
pub enum FunctionError {
    /// A custom property with no value and no fallback.
    #[error("Unresolved custom property '{name}'")]
    UnresolvedVariable { name: String },

    /// Function nesting went past the configured depth.
    #[error("Function '{function}' nested deeper than {max_depth} levels")]
    RecursionLimit { function: String, max_depth: usize },

    /// Malformed function arguments.
    #[error("Invalid arguments to '{function}()': {message}")]
    InvalidArguments { function: String, message: String },

    /// `calc()` evaluation failure.
    #[error("calc() error: {0}")]
    Calc(String),

    /// An attribute value that does not convert to the requested type.
    #[error("Cannot convert attribute '{attribute}' value '{value}' to {expected}")]
    Coercion {
        attribute: String,
        expected: String,
        value: String,
    },

    /// Bad pattern passed to `replace()`.
    #[error("Invalid regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl FunctionError {
    /// Create an invalid-arguments error.
    pub fn invalid_arguments(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Create a calc error.
    pub fn calc(message: impl Into<String>) -> Self {
        Self::Calc(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_converts_with_span() {
        let err: Error = ParseError::new("unexpected '}'", 3, 10, 11).into();
        match err {
            Error::Parse { line, start, end, .. } => assert_eq!((line, start, end), (3, 10, 11)),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn interrupted_io_is_detected() {
        let err = Error::io(
            "a.css",
            std::io::Error::new(std::io::ErrorKind::Interrupted, "again"),
        );
        assert!(err.is_interrupted());
        assert!(!Error::io("a.css", std::io::Error::other("gone")).is_interrupted());
    }

    #[test]
    fn function_errors_display() {
        let err = FunctionError::RecursionLimit {
            function: "var".into(),
            max_depth: 4,
        };
        assert_eq!(err.to_string(), "Function 'var' nested deeper than 4 levels");
        let err: Error = FunctionError::calc("division by zero").into();
        assert_eq!(err.to_string(), "calc() error: division by zero");
    }
}
