//! CSS parsing errors.

use crate::syntax::Span;

/// CSS parse error with location information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The error message describing what went wrong.
    pub message: String,
    /// Line number where the error occurred (1-indexed).
    pub line: usize,
    /// Character offset where the offending input starts.
    pub start: usize,
    /// Character offset one past the offending input.
    pub end: usize,
}

impl ParseError {
    /// Create a new parse error with the given message and location.
    pub fn new(message: impl Into<String>, line: usize, start: usize, end: usize) -> Self {
        Self {
            message: message.into(),
            line,
            start,
            end,
        }
    }

    /// Create a parse error covering a token span.
    pub fn at(message: impl Into<String>, span: Span) -> Self {
        Self::new(message, span.line, span.start, span.end)
    }

    /// The error location as a span.
    pub fn span(&self) -> Span {
        Span::new(self.line, self.start, self.end)
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CSS parse error at line {} [{}..{}]: {}",
            self.line, self.start, self.end, self.message
        )
    }
}

impl std::error::Error for ParseError {}
