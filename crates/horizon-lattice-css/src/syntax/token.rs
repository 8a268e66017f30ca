//! Token type definitions.

use std::fmt;

/// Kind of a CSS token.
///
/// Punctuation that CSS Syntax Level 3 gives its own token type gets its own
/// variant; every other single code point is a [`TokenKind::Delim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// An identifier, e.g. `red` or `--main-color`.
    Ident,
    /// A function name followed by `(`, e.g. `calc(`.
    Function,
    /// `@` followed by an identifier, e.g. `@media`.
    AtKeyword,
    /// `#` followed by name characters, e.g. `#fff`.
    Hash,
    /// A quoted string.
    String,
    /// A string interrupted by an unescaped newline.
    BadString,
    /// `url(...)` with an unquoted or quoted value.
    Url,
    /// A malformed `url(...)`.
    BadUrl,
    /// A plain number.
    Number,
    /// A number followed by `%`.
    Percentage,
    /// A number followed by a unit identifier.
    Dimension,
    /// A run of whitespace.
    Whitespace,
    /// `/* ... */`.
    Comment,
    /// A comment that reached the end of input.
    BadComment,
    /// `<!--`
    Cdo,
    /// `-->`
    Cdc,
    /// `~=`
    IncludeMatch,
    /// `|=`
    DashMatch,
    /// `^=`
    PrefixMatch,
    /// `$=`
    SuffixMatch,
    /// `*=`
    SubstringMatch,
    /// `||`
    Column,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// Any other single code point.
    Delim(char),
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Returns true for whitespace and comment tokens.
    pub fn is_insignificant(&self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment | Self::BadComment)
    }

    /// Returns the closing kind for an opening bracket kind.
    ///
    /// Function tokens close with `)`.
    pub fn closing(&self) -> Option<TokenKind> {
        match self {
            Self::LeftBrace => Some(Self::RightBrace),
            Self::LeftBracket => Some(Self::RightBracket),
            Self::LeftParen | Self::Function => Some(Self::RightParen),
            _ => None,
        }
    }
}

/// Source provenance of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// 1-based line on which the token starts.
    pub line: usize,
    /// 0-based character offset of the first character.
    pub start: usize,
    /// 0-based character offset one past the last character.
    pub end: usize,
}

impl Span {
    /// Create a new span.
    pub fn new(line: usize, start: usize, end: usize) -> Self {
        Self { line, start, end }
    }
}

/// A CSS token.
///
/// Tokens are plain values: the tokenizer hands out fresh copies and the
/// parser archives them into declaration terms unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    kind: TokenKind,
    string: Option<String>,
    number: Option<f64>,
    quote: char,
    span: Span,
}

impl Token {
    fn raw(kind: TokenKind, string: Option<String>, number: Option<f64>) -> Self {
        Self {
            kind,
            string,
            number,
            quote: '"',
            span: Span::default(),
        }
    }

    /// Create a token of a kind that carries no payload.
    ///
    /// Payload-carrying kinds get an empty string or zero so that the
    /// payload invariant still holds; prefer the typed constructors.
    pub fn of_kind(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Number | TokenKind::Percentage => Self::raw(kind, None, Some(0.0)),
            TokenKind::Dimension => Self::raw(kind, Some(String::new()), Some(0.0)),
            TokenKind::Ident
            | TokenKind::Function
            | TokenKind::AtKeyword
            | TokenKind::Hash
            | TokenKind::String
            | TokenKind::BadString
            | TokenKind::Url
            | TokenKind::BadUrl
            | TokenKind::Comment
            | TokenKind::BadComment => Self::raw(kind, Some(String::new()), None),
            TokenKind::Whitespace => Self::raw(kind, Some(" ".to_string()), None),
            _ => Self::raw(kind, None, None),
        }
    }

    /// Create a token with a string payload.
    pub fn with_string(kind: TokenKind, value: impl Into<String>) -> Self {
        Self::raw(kind, Some(value.into()), None)
    }

    /// An identifier token.
    pub fn ident(name: impl Into<String>) -> Self {
        Self::with_string(TokenKind::Ident, name)
    }

    /// A function token (the name without the opening parenthesis).
    pub fn function(name: impl Into<String>) -> Self {
        Self::with_string(TokenKind::Function, name)
    }

    /// An at-keyword token (the name without `@`).
    pub fn at_keyword(name: impl Into<String>) -> Self {
        Self::with_string(TokenKind::AtKeyword, name)
    }

    /// A hash token (the name without `#`).
    pub fn hash(name: impl Into<String>) -> Self {
        Self::with_string(TokenKind::Hash, name)
    }

    /// A string token with `"` as preferred quote.
    pub fn string(value: impl Into<String>) -> Self {
        Self::with_string(TokenKind::String, value)
    }

    /// A string token with an explicit preferred quote character.
    pub fn quoted(value: impl Into<String>, quote: char) -> Self {
        let mut token = Self::string(value);
        token.quote = if quote == '\'' { '\'' } else { '"' };
        token
    }

    /// A url token.
    pub fn url(value: impl Into<String>) -> Self {
        Self::with_string(TokenKind::Url, value)
    }

    /// A number token.
    pub fn number(value: f64) -> Self {
        Self::raw(TokenKind::Number, None, Some(value))
    }

    /// A percentage token; `value` is the number before `%`.
    pub fn percentage(value: f64) -> Self {
        Self::raw(TokenKind::Percentage, None, Some(value))
    }

    /// A dimension token.
    pub fn dimension(value: f64, unit: impl Into<String>) -> Self {
        Self::raw(TokenKind::Dimension, Some(unit.into()), Some(value))
    }

    /// A whitespace token.
    pub fn whitespace() -> Self {
        Self::of_kind(TokenKind::Whitespace)
    }

    /// A delimiter token.
    pub fn delim(ch: char) -> Self {
        Self::raw(TokenKind::Delim(ch), None, None)
    }

    /// Attach a source span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub(crate) fn set_quote(&mut self, quote: char) {
        self.quote = quote;
    }

    /// The token kind.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The string payload: the name, text or unit depending on the kind.
    pub fn string_value(&self) -> Option<&str> {
        self.string.as_deref()
    }

    /// The numeric payload.
    pub fn number_value(&self) -> Option<f64> {
        self.number
    }

    /// The preferred quote character for string tokens.
    pub fn quote(&self) -> char {
        self.quote
    }

    /// Where the token came from.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Check the kind and, for ident-like kinds, the name (ASCII case-insensitive).
    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == TokenKind::Ident
            && self
                .string
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(name))
    }

    /// Returns true if this is the given delimiter.
    pub fn is_delim(&self, ch: char) -> bool {
        self.kind == TokenKind::Delim(ch)
    }

    /// Compare kind and payloads, ignoring span and preferred quote.
    pub fn same_value(&self, other: &Token) -> bool {
        self.kind == other.kind && self.string == other.string && self.number == other.number
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::serialize::from_token(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_fill_required_payloads() {
        let dim = Token::dimension(8.0, "px");
        assert_eq!(dim.kind(), TokenKind::Dimension);
        assert_eq!(dim.number_value(), Some(8.0));
        assert_eq!(dim.string_value(), Some("px"));

        let pct = Token::of_kind(TokenKind::Percentage);
        assert_eq!(pct.number_value(), Some(0.0));
        assert!(pct.string_value().is_none());

        assert_eq!(Token::of_kind(TokenKind::Semicolon).string_value(), None);
    }

    #[test]
    fn same_value_ignores_span_and_quote() {
        let a = Token::quoted("x", '\'').with_span(Span::new(1, 0, 3));
        let b = Token::string("x");
        assert!(a.same_value(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn ident_comparison_is_case_insensitive() {
        assert!(Token::ident("NONE").is_ident("none"));
        assert!(!Token::string("none").is_ident("none"));
    }
}
