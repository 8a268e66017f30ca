//! CSS Syntax Level 3 tokenizer.
//!
//! The tokenizer pulls characters from a [`CharScanner`] and keeps exactly
//! one current token, which can be pushed back once. Malformed strings, urls
//! and comments come out as `Bad*` tokens; the tokenizer itself never fails.

use super::scanner::{CharScanner, REPLACEMENT_CHARACTER, StrScanner};
use super::token::{Span, Token, TokenKind};

/// Largest valid Unicode code point.
const MAX_CODE_POINT: u32 = 0x10FFFF;

/// Streaming CSS tokenizer with one-token pushback.
pub struct Tokenizer<S> {
    scanner: S,
    current: Token,
    pushed_back: bool,
}

impl Tokenizer<StrScanner> {
    /// Tokenizer over an in-memory string.
    pub fn from_text(input: &str) -> Self {
        Self::new(StrScanner::new(input))
    }
}

impl<S: CharScanner> Tokenizer<S> {
    /// Create a tokenizer reading from `scanner`.
    pub fn new(scanner: S) -> Self {
        Self {
            scanner,
            current: Token::of_kind(TokenKind::Eof),
            pushed_back: false,
        }
    }

    /// Advance to the next significant token, skipping whitespace and comments.
    pub fn next(&mut self) -> TokenKind {
        loop {
            let kind = self.next_no_skip();
            if !kind.is_insignificant() {
                return kind;
            }
        }
    }

    /// Advance by exactly one token, whitespace and comments included.
    pub fn next_no_skip(&mut self) -> TokenKind {
        if self.pushed_back {
            self.pushed_back = false;
            return self.current.kind();
        }

        let line = self.scanner.line_number();
        let start = self.scanner.position();
        let token = self.consume_token();
        let end = self.scanner.position();
        self.current = token.with_span(Span::new(line, start, end));
        self.current.kind()
    }

    /// Make the next advance return the current token again.
    ///
    /// Pushback is one token deep; pushing back twice has no further effect.
    pub fn push_back(&mut self) {
        self.pushed_back = true;
    }

    /// Kind of the current token.
    pub fn current(&self) -> TokenKind {
        self.current.kind()
    }

    /// String payload of the current token.
    pub fn current_string(&self) -> Option<&str> {
        self.current.string_value()
    }

    /// Numeric payload of the current token.
    pub fn current_number(&self) -> Option<f64> {
        self.current.number_value()
    }

    /// Span of the current token.
    pub fn span(&self) -> Span {
        self.current.span()
    }

    /// A copy of the current token for archival.
    pub fn get_token(&self) -> Token {
        self.current.clone()
    }

    /// Line of the next character to be read.
    pub fn line_number(&self) -> usize {
        self.scanner.line_number()
    }

    /// Offset of the next character to be read.
    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    /// Access the underlying scanner.
    pub fn scanner_mut(&mut self) -> &mut S {
        &mut self.scanner
    }

    // ------------------------------------------------------------------
    // Character helpers
    // ------------------------------------------------------------------

    fn lookahead<const N: usize>(&mut self) -> [Option<char>; N] {
        let mut chars = [None; N];
        for slot in chars.iter_mut() {
            *slot = self.scanner.next_char();
        }
        for ch in chars.iter().rev() {
            self.scanner.push_back(*ch);
        }
        chars
    }

    fn peek(&mut self) -> Option<char> {
        let [ch] = self.lookahead::<1>();
        ch
    }

    fn advance_if(&mut self, expected: char) -> bool {
        let ch = self.scanner.next_char();
        if ch == Some(expected) {
            true
        } else {
            self.scanner.push_back(ch);
            false
        }
    }

    fn skip_whitespace_chars(&mut self) {
        loop {
            let ch = self.scanner.next_char();
            if !ch.is_some_and(is_whitespace) {
                self.scanner.push_back(ch);
                return;
            }
        }
    }

    // ------------------------------------------------------------------
    // Token consumption
    // ------------------------------------------------------------------

    fn consume_token(&mut self) -> Token {
        let Some(ch) = self.scanner.next_char() else {
            return Token::of_kind(TokenKind::Eof);
        };

        match ch {
            c if is_whitespace(c) => {
                let mut text = String::from(c);
                loop {
                    let next = self.scanner.next_char();
                    match next {
                        Some(n) if is_whitespace(n) => text.push(n),
                        _ => {
                            self.scanner.push_back(next);
                            break;
                        }
                    }
                }
                Token::with_string(TokenKind::Whitespace, text)
            }
            '"' | '\'' => self.consume_string(ch),
            '#' => {
                let [a, b] = self.lookahead::<2>();
                if a.is_some_and(is_name_char) || is_valid_escape(a, b) {
                    Token::hash(self.consume_name())
                } else {
                    Token::delim('#')
                }
            }
            '$' => self.match_operator(ch, TokenKind::SuffixMatch),
            '*' => self.match_operator(ch, TokenKind::SubstringMatch),
            '^' => self.match_operator(ch, TokenKind::PrefixMatch),
            '~' => self.match_operator(ch, TokenKind::IncludeMatch),
            '|' => {
                if self.advance_if('=') {
                    Token::of_kind(TokenKind::DashMatch)
                } else if self.advance_if('|') {
                    Token::of_kind(TokenKind::Column)
                } else {
                    Token::delim('|')
                }
            }
            '(' => Token::of_kind(TokenKind::LeftParen),
            ')' => Token::of_kind(TokenKind::RightParen),
            '[' => Token::of_kind(TokenKind::LeftBracket),
            ']' => Token::of_kind(TokenKind::RightBracket),
            '{' => Token::of_kind(TokenKind::LeftBrace),
            '}' => Token::of_kind(TokenKind::RightBrace),
            ',' => Token::of_kind(TokenKind::Comma),
            ':' => Token::of_kind(TokenKind::Colon),
            ';' => Token::of_kind(TokenKind::Semicolon),
            '+' | '.' => {
                let [a, b] = self.lookahead::<2>();
                if starts_number(Some(ch), a, b) {
                    self.scanner.push_back(Some(ch));
                    self.consume_numeric()
                } else {
                    Token::delim(ch)
                }
            }
            '-' => {
                let [a, b] = self.lookahead::<2>();
                if starts_number(Some(ch), a, b) {
                    self.scanner.push_back(Some(ch));
                    self.consume_numeric()
                } else if a == Some('-') && b == Some('>') {
                    self.scanner.next_char();
                    self.scanner.next_char();
                    Token::of_kind(TokenKind::Cdc)
                } else if starts_ident(Some(ch), a, b) {
                    self.scanner.push_back(Some(ch));
                    self.consume_ident_like()
                } else {
                    Token::delim(ch)
                }
            }
            '/' => {
                if self.advance_if('*') {
                    self.consume_comment()
                } else {
                    Token::delim(ch)
                }
            }
            '<' => {
                if self.lookahead::<3>() == [Some('!'), Some('-'), Some('-')] {
                    for _ in 0..3 {
                        self.scanner.next_char();
                    }
                    Token::of_kind(TokenKind::Cdo)
                } else {
                    Token::delim(ch)
                }
            }
            '@' => {
                let [a, b, c] = self.lookahead::<3>();
                if starts_ident(a, b, c) {
                    Token::at_keyword(self.consume_name())
                } else {
                    Token::delim(ch)
                }
            }
            '\\' => {
                if is_valid_escape(Some(ch), self.peek()) {
                    self.scanner.push_back(Some(ch));
                    self.consume_ident_like()
                } else {
                    Token::delim(ch)
                }
            }
            c if c.is_ascii_digit() => {
                self.scanner.push_back(Some(c));
                self.consume_numeric()
            }
            c if is_name_start(c) => {
                self.scanner.push_back(Some(c));
                self.consume_ident_like()
            }
            c => Token::delim(c),
        }
    }

    fn match_operator(&mut self, ch: char, kind: TokenKind) -> Token {
        if self.advance_if('=') {
            Token::of_kind(kind)
        } else {
            Token::delim(ch)
        }
    }

    fn consume_comment(&mut self) -> Token {
        let mut text = String::new();
        loop {
            match self.scanner.next_char() {
                None => return Token::with_string(TokenKind::BadComment, text),
                Some('*') if self.advance_if('/') => {
                    return Token::with_string(TokenKind::Comment, text);
                }
                Some(c) => text.push(c),
            }
        }
    }

    /// Consume a string after its opening quote.
    fn consume_string(&mut self, quote: char) -> Token {
        let (kind, text) = match self.consume_string_body(quote) {
            Ok(text) => (TokenKind::String, text),
            Err(text) => (TokenKind::BadString, text),
        };
        let mut token = Token::with_string(kind, text);
        token.set_quote(quote);
        token
    }

    /// Returns `Err` with the partial text on an unescaped newline.
    fn consume_string_body(&mut self, quote: char) -> Result<String, String> {
        let mut text = String::new();
        loop {
            match self.scanner.next_char() {
                None => return Ok(text),
                Some(c) if c == quote => return Ok(text),
                Some('\n') => {
                    self.scanner.push_back(Some('\n'));
                    return Err(text);
                }
                Some('\\') => match self.scanner.next_char() {
                    None => {}
                    Some('\n') => {}
                    next => {
                        self.scanner.push_back(next);
                        text.push(self.consume_escape());
                    }
                },
                Some(c) => text.push(c),
            }
        }
    }

    /// Consume an escaped code point; the backslash is already consumed.
    fn consume_escape(&mut self) -> char {
        let Some(first) = self.scanner.next_char() else {
            return REPLACEMENT_CHARACTER;
        };
        let Some(mut value) = first.to_digit(16) else {
            return first;
        };

        for _ in 1..6 {
            let ch = self.scanner.next_char();
            match ch.and_then(|c| c.to_digit(16)) {
                Some(digit) => value = value * 16 + digit,
                None => {
                    self.scanner.push_back(ch);
                    break;
                }
            }
        }
        let ch = self.scanner.next_char();
        if !ch.is_some_and(is_whitespace) {
            self.scanner.push_back(ch);
        }

        if value == 0 || value > MAX_CODE_POINT {
            REPLACEMENT_CHARACTER
        } else {
            char::from_u32(value).unwrap_or(REPLACEMENT_CHARACTER)
        }
    }

    fn consume_name(&mut self) -> String {
        let mut name = String::new();
        loop {
            let ch = self.scanner.next_char();
            match ch {
                Some(c) if is_name_char(c) => name.push(c),
                Some('\\') if is_valid_escape(ch, self.peek()) => {
                    name.push(self.consume_escape());
                }
                _ => {
                    self.scanner.push_back(ch);
                    return name;
                }
            }
        }
    }

    fn consume_ident_like(&mut self) -> Token {
        let name = self.consume_name();
        if self.advance_if('(') {
            if name.eq_ignore_ascii_case("url") {
                self.consume_url()
            } else {
                Token::function(name)
            }
        } else {
            Token::ident(name)
        }
    }

    /// Consume a url after `url(`.
    fn consume_url(&mut self) -> Token {
        self.skip_whitespace_chars();

        let first = self.scanner.next_char();
        if let Some(quote @ ('"' | '\'')) = first {
            return match self.consume_string_body(quote) {
                Ok(value) => {
                    self.skip_whitespace_chars();
                    match self.scanner.next_char() {
                        None | Some(')') => Token::url(value),
                        _ => {
                            self.consume_bad_url_remnants();
                            Token::with_string(TokenKind::BadUrl, value)
                        }
                    }
                }
                Err(partial) => {
                    self.consume_bad_url_remnants();
                    Token::with_string(TokenKind::BadUrl, partial)
                }
            };
        }
        self.scanner.push_back(first);

        let mut value = String::new();
        loop {
            let ch = self.scanner.next_char();
            match ch {
                None | Some(')') => return Token::url(value),
                Some(c) if is_whitespace(c) => {
                    self.skip_whitespace_chars();
                    return match self.scanner.next_char() {
                        None | Some(')') => Token::url(value),
                        _ => {
                            self.consume_bad_url_remnants();
                            Token::with_string(TokenKind::BadUrl, value)
                        }
                    };
                }
                Some('"' | '\'' | '(') => {
                    self.consume_bad_url_remnants();
                    return Token::with_string(TokenKind::BadUrl, value);
                }
                Some(c) if is_non_printable(c) => {
                    self.consume_bad_url_remnants();
                    return Token::with_string(TokenKind::BadUrl, value);
                }
                Some('\\') => {
                    if is_valid_escape(ch, self.peek()) {
                        value.push(self.consume_escape());
                    } else {
                        self.consume_bad_url_remnants();
                        return Token::with_string(TokenKind::BadUrl, value);
                    }
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn consume_bad_url_remnants(&mut self) {
        loop {
            let ch = self.scanner.next_char();
            match ch {
                None | Some(')') => return,
                Some('\\') if is_valid_escape(ch, self.peek()) => {
                    self.consume_escape();
                }
                _ => {}
            }
        }
    }

    fn consume_numeric(&mut self) -> Token {
        let value = self.consume_number();
        let [a, b, c] = self.lookahead::<3>();
        if starts_ident(a, b, c) {
            Token::dimension(value, self.consume_name())
        } else if self.advance_if('%') {
            Token::percentage(value)
        } else {
            Token::number(value)
        }
    }

    fn consume_number(&mut self) -> f64 {
        let mut repr = String::new();

        let sign = self.scanner.next_char();
        match sign {
            Some(c @ ('+' | '-')) => repr.push(c),
            other => self.scanner.push_back(other),
        }
        self.consume_digits(&mut repr);

        if let [Some('.'), Some(d)] = self.lookahead::<2>()
            && d.is_ascii_digit()
        {
            self.scanner.next_char();
            repr.push('.');
            self.consume_digits(&mut repr);
        }

        let [e, s, d] = self.lookahead::<3>();
        if matches!(e, Some('e' | 'E')) {
            let digit = |c: Option<char>| c.is_some_and(|c| c.is_ascii_digit());
            if digit(s) {
                self.scanner.next_char();
                repr.push('e');
                self.consume_digits(&mut repr);
            } else if matches!(s, Some('+' | '-')) && digit(d) {
                self.scanner.next_char();
                self.scanner.next_char();
                repr.push('e');
                repr.extend(s);
                self.consume_digits(&mut repr);
            }
        }

        repr.parse().unwrap_or(0.0)
    }

    fn consume_digits(&mut self, repr: &mut String) {
        loop {
            let ch = self.scanner.next_char();
            match ch {
                Some(c) if c.is_ascii_digit() => repr.push(c),
                _ => {
                    self.scanner.push_back(ch);
                    return;
                }
            }
        }
    }
}

/// Tokenize `input` completely, keeping whitespace and comments.
///
/// The trailing end-of-input token is not included.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokenizer = Tokenizer::from_text(input);
    let mut tokens = vec![];
    while tokenizer.next_no_skip() != TokenKind::Eof {
        tokens.push(tokenizer.get_token());
    }
    tokens
}

pub(crate) fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n')
}

pub(crate) fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-'
}

pub(crate) fn is_non_printable(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{E}'..='\u{1F}' | '\u{7F}')
}

fn is_valid_escape(first: Option<char>, second: Option<char>) -> bool {
    first == Some('\\') && second != Some('\n')
}

fn starts_ident(a: Option<char>, b: Option<char>, c: Option<char>) -> bool {
    match a {
        Some('-') => b.is_some_and(|b| is_name_start(b) || b == '-') || is_valid_escape(b, c),
        Some('\\') => is_valid_escape(a, b),
        Some(x) => is_name_start(x),
        None => false,
    }
}

fn starts_number(a: Option<char>, b: Option<char>, c: Option<char>) -> bool {
    let digit = |c: Option<char>| c.is_some_and(|c| c.is_ascii_digit());
    match a {
        Some('+' | '-') => digit(b) || (b == Some('.') && digit(c)),
        Some('.') => digit(b),
        other => digit(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).iter().map(Token::kind).collect()
    }

    fn single(input: &str) -> Token {
        let tokens = tokenize(input);
        assert_eq!(tokens.len(), 1, "expected one token for {input:?}: {tokens:?}");
        tokens.into_iter().next().unwrap()
    }

    #[test]
    fn tokenizes_simple_rule() {
        assert_eq!(
            kinds(".a { color: red; }"),
            vec![
                TokenKind::Delim('.'),
                TokenKind::Ident,
                TokenKind::Whitespace,
                TokenKind::LeftBrace,
                TokenKind::Whitespace,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Whitespace,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Whitespace,
                TokenKind::RightBrace,
            ]
        );
    }

    #[test]
    fn numbers_percentages_and_dimensions() {
        let token = single("-12.5e2");
        assert_eq!(token.kind(), TokenKind::Number);
        assert_eq!(token.number_value(), Some(-1250.0));

        let token = single("50%");
        assert_eq!(token.kind(), TokenKind::Percentage);
        assert_eq!(token.number_value(), Some(50.0));

        let token = single("+.5em");
        assert_eq!(token.kind(), TokenKind::Dimension);
        assert_eq!(token.number_value(), Some(0.5));
        assert_eq!(token.string_value(), Some("em"));

        // An `e` that does not start an exponent begins the unit.
        let token = single("3ex");
        assert_eq!(token.kind(), TokenKind::Dimension);
        assert_eq!(token.string_value(), Some("ex"));
    }

    #[test]
    fn idents_with_dashes_escapes_and_non_ascii() {
        assert_eq!(single("--main-color").string_value(), Some("--main-color"));
        assert_eq!(single("-webkit-box").string_value(), Some("-webkit-box"));
        assert_eq!(single("caf\u{e9}").string_value(), Some("caf\u{e9}"));
        assert_eq!(single("\\31 0").string_value(), Some("10"));
        assert_eq!(single("a\\.b").string_value(), Some("a.b"));
    }

    #[test]
    fn strings_and_bad_strings() {
        let token = single("'it\\'s'");
        assert_eq!(token.kind(), TokenKind::String);
        assert_eq!(token.string_value(), Some("it's"));
        assert_eq!(token.quote(), '\'');

        let token = single("\"a\\\nb\"");
        assert_eq!(token.string_value(), Some("ab"));

        let tokens = tokenize("\"abc\ndef");
        assert_eq!(tokens[0].kind(), TokenKind::BadString);
        assert_eq!(tokens[0].string_value(), Some("abc"));
        assert_eq!(tokens[1].kind(), TokenKind::Whitespace);
    }

    #[test]
    fn urls_quoted_unquoted_and_bad() {
        let token = single("url( images/a.png )");
        assert_eq!(token.kind(), TokenKind::Url);
        assert_eq!(token.string_value(), Some("images/a.png"));

        let token = single("url(\"b c.png\")");
        assert_eq!(token.kind(), TokenKind::Url);
        assert_eq!(token.string_value(), Some("b c.png"));

        let token = single("url(a b)");
        assert_eq!(token.kind(), TokenKind::BadUrl);

        let token = single("url(a\"b)");
        assert_eq!(token.kind(), TokenKind::BadUrl);
        assert_eq!(token.string_value(), Some("a"));
    }

    #[test]
    fn comments_and_bad_comments() {
        let token = single("/* note */");
        assert_eq!(token.kind(), TokenKind::Comment);
        assert_eq!(token.string_value(), Some(" note "));

        let token = single("/* open");
        assert_eq!(token.kind(), TokenKind::BadComment);
    }

    #[test]
    fn match_operators_and_cdo_cdc() {
        assert_eq!(
            kinds("~=|=^=$=*=||<!---->"),
            vec![
                TokenKind::IncludeMatch,
                TokenKind::DashMatch,
                TokenKind::PrefixMatch,
                TokenKind::SuffixMatch,
                TokenKind::SubstringMatch,
                TokenKind::Column,
                TokenKind::Cdo,
                TokenKind::Cdc,
            ]
        );
    }

    #[test]
    fn hashes_at_keywords_and_functions() {
        let token = single("#1a2b");
        assert_eq!(token.kind(), TokenKind::Hash);
        assert_eq!(token.string_value(), Some("1a2b"));

        let token = single("@media");
        assert_eq!(token.kind(), TokenKind::AtKeyword);
        assert_eq!(token.string_value(), Some("media"));

        let tokens = tokenize("calc(1)");
        assert_eq!(tokens[0].kind(), TokenKind::Function);
        assert_eq!(tokens[0].string_value(), Some("calc"));

        assert_eq!(single("#").kind(), TokenKind::Delim('#'));
        assert_eq!(single("@").kind(), TokenKind::Delim('@'));
    }

    #[test]
    fn next_skips_whitespace_and_comments() {
        let mut tokenizer = Tokenizer::from_text("  /* c */ a  b");
        assert_eq!(tokenizer.next(), TokenKind::Ident);
        assert_eq!(tokenizer.current_string(), Some("a"));
        assert_eq!(tokenizer.next_no_skip(), TokenKind::Whitespace);
        assert_eq!(tokenizer.next(), TokenKind::Ident);
        assert_eq!(tokenizer.current_string(), Some("b"));
        assert_eq!(tokenizer.next(), TokenKind::Eof);
        assert_eq!(tokenizer.next(), TokenKind::Eof);
    }

    #[test]
    fn push_back_is_one_token_deep() {
        let mut tokenizer = Tokenizer::from_text("a b");
        tokenizer.next();
        tokenizer.push_back();
        tokenizer.push_back();
        assert_eq!(tokenizer.next(), TokenKind::Ident);
        assert_eq!(tokenizer.current_string(), Some("a"));
        assert_eq!(tokenizer.next(), TokenKind::Ident);
        assert_eq!(tokenizer.current_string(), Some("b"));
    }

    #[test]
    fn spans_track_lines_and_offsets() {
        let mut tokenizer = Tokenizer::from_text("a\n  bc");
        tokenizer.next();
        assert_eq!(tokenizer.span(), Span::new(1, 0, 1));
        tokenizer.next();
        assert_eq!(tokenizer.span(), Span::new(2, 4, 6));
    }

    #[test]
    fn escape_edge_cases_produce_replacement_character() {
        assert_eq!(single("\\0 x").string_value(), Some("\u{FFFD}x"));
        assert_eq!(single("\\110000").string_value(), Some("\u{FFFD}"));
        assert_eq!(single("\\d800").string_value(), Some("\u{FFFD}"));
    }
}
