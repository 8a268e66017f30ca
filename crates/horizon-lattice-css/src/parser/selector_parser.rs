//! Selector parsing.
//!
//! Selectors are parsed from an already collected token run (the prelude of a
//! style rule), so a malformed selector never disturbs the surrounding
//! stream. Whitespace tokens are significant here: they are the descendant
//! combinator.

use super::ParseError;
use crate::rules::QualifiedName;
use crate::selector::{AttributeOp, Combinator, PseudoClass, Selector, SelectorGroup};
use crate::syntax::{Span, Token, TokenKind};

type ParseResult<T> = std::result::Result<T, ParseError>;

/// Deepest allowed `:not()` nesting.
const MAX_NEGATION_DEPTH: usize = 16;

/// Most simple selectors one complex selector may hold, nested ones included.
const MAX_SIMPLE_SELECTORS: usize = 256;

/// Cursor over a selector token run.
pub(crate) struct SelectorParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    negation_depth: usize,
    simple_selectors: usize,
}

impl<'a> SelectorParser<'a> {
    /// Create a parser; comment tokens must already be removed.
    pub(crate) fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            negation_depth: 0,
            simple_selectors: 0,
        }
    }

    /// Parse a comma-separated group, consuming the whole run.
    pub(crate) fn parse_group(mut self) -> ParseResult<SelectorGroup> {
        let mut selectors = vec![];
        loop {
            self.skip_whitespace();
            self.simple_selectors = 0;
            selectors.push(self.parse_selector()?);
            self.skip_whitespace();
            match self.bump() {
                None => break,
                Some(token) if token.kind() == TokenKind::Comma => continue,
                Some(token) => return Err(unexpected(token, "in selector")),
            }
        }
        Ok(SelectorGroup::new(selectors))
    }

    /// Parse one complex selector, consuming the whole run.
    fn parse_single(&mut self) -> ParseResult<Selector> {
        self.skip_whitespace();
        let selector = self.parse_selector()?;
        self.skip_whitespace();
        match self.bump() {
            None => Ok(selector),
            Some(token) => Err(unexpected(token, "after selector")),
        }
    }

    fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(Token::kind)
    }

    fn bump(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek_kind(0) == Some(TokenKind::Whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn count_simple_selector(&mut self) -> ParseResult<()> {
        self.simple_selectors += 1;
        if self.simple_selectors > MAX_SIMPLE_SELECTORS {
            let span = self
                .tokens
                .get(self.pos.saturating_sub(1))
                .map(Token::span)
                .unwrap_or_default();
            return Err(ParseError::at("selector is too long", span));
        }
        Ok(())
    }

    fn end_span(&self) -> Span {
        self.tokens.last().map(Token::span).unwrap_or_default()
    }

    fn expect_ident(&mut self, context: &str) -> ParseResult<&'a Token> {
        match self.bump() {
            Some(token) if token.kind() == TokenKind::Ident => Ok(token),
            Some(token) => Err(unexpected(token, context)),
            None => Err(ParseError::at(
                format!("unexpected end of selector {context}"),
                self.end_span(),
            )),
        }
    }

    /// `compound { combinator compound }`, built left-associatively.
    fn parse_selector(&mut self) -> ParseResult<Selector> {
        let mut selector = self.parse_compound()?;
        loop {
            let had_whitespace = self.skip_whitespace();
            let combinator = match self.peek_kind(0) {
                None | Some(TokenKind::Comma) => break,
                Some(TokenKind::Delim('>')) => Combinator::Child,
                Some(TokenKind::Delim('+')) => Combinator::AdjacentSibling,
                Some(TokenKind::Delim('~')) => Combinator::GeneralSibling,
                Some(_) if had_whitespace => {
                    selector = selector.descendant(self.parse_compound()?);
                    continue;
                }
                Some(_) => {
                    let token = &self.tokens[self.pos];
                    return Err(unexpected(token, "in selector"));
                }
            };
            self.pos += 1;
            self.skip_whitespace();
            selector = selector.combine(combinator, self.parse_compound()?);
        }
        Ok(selector)
    }

    fn parse_compound(&mut self) -> ParseResult<Selector> {
        let mut compound = self.parse_type_selector()?;
        if compound.is_some() {
            self.count_simple_selector()?;
        }
        loop {
            let simple = match self.peek_kind(0) {
                Some(TokenKind::Hash) => {
                    let token = self.tokens[self.pos].clone();
                    self.pos += 1;
                    Selector::Id(token.string_value().unwrap_or_default().to_string())
                }
                Some(TokenKind::Delim('.')) => {
                    self.pos += 1;
                    let name = self.expect_ident("after '.'")?;
                    Selector::Class(name.string_value().unwrap_or_default().to_string())
                }
                Some(TokenKind::LeftBracket) => {
                    self.pos += 1;
                    self.parse_attribute()?
                }
                Some(TokenKind::Colon) => {
                    self.pos += 1;
                    self.parse_pseudo_class()?
                }
                _ => break,
            };
            self.count_simple_selector()?;
            compound = Some(match compound {
                Some(left) => left.and(simple),
                None => simple,
            });
        }

        compound.ok_or_else(|| match self.tokens.get(self.pos) {
            Some(token) => unexpected(token, "where a selector was expected"),
            None => ParseError::at("expected a selector", self.end_span()),
        })
    }

    /// Leading type or universal selector, with an optional namespace prefix.
    fn parse_type_selector(&mut self) -> ParseResult<Option<Selector>> {
        let Some((namespace, name)) = self.parse_name_with_namespace(true)? else {
            return Ok(None);
        };
        Ok(Some(match name {
            None => Selector::Universal,
            Some(name) => Selector::Type(QualifiedName { namespace, name }),
        }))
    }

    /// Parse `name`, `ns|name`, `*|name` or `|name`.
    ///
    /// Returns `None` when the cursor does not start a name. With
    /// `allow_universal`, `*` is accepted as the local name and reported as
    /// `Some((namespace, None))`.
    #[allow(clippy::type_complexity)]
    fn parse_name_with_namespace(
        &mut self,
        allow_universal: bool,
    ) -> ParseResult<Option<(Option<String>, Option<String>)>> {
        let is_local = |kind: Option<TokenKind>| {
            kind == Some(TokenKind::Ident) || (allow_universal && kind == Some(TokenKind::Delim('*')))
        };
        let local = |token: &Token| match token.kind() {
            TokenKind::Ident => Some(token.string_value().unwrap_or_default().to_string()),
            _ => None,
        };

        let first = self.peek_kind(0);
        let has_prefix = self.peek_kind(1) == Some(TokenKind::Delim('|'))
            && (first == Some(TokenKind::Ident) || first == Some(TokenKind::Delim('*')));

        if has_prefix {
            if !is_local(self.peek_kind(2)) {
                let token = self.tokens.get(self.pos + 2).unwrap_or(&self.tokens[self.pos + 1]);
                return Err(unexpected(token, "after namespace prefix"));
            }
            let prefix = &self.tokens[self.pos];
            let namespace = match prefix.kind() {
                TokenKind::Delim('*') => "*".to_string(),
                _ => prefix.string_value().unwrap_or_default().to_string(),
            };
            let name = local(&self.tokens[self.pos + 2]);
            self.pos += 3;
            return Ok(Some((Some(namespace), name)));
        }

        if first == Some(TokenKind::Delim('|')) {
            if !is_local(self.peek_kind(1)) {
                return Err(unexpected(&self.tokens[self.pos], "in selector"));
            }
            let name = local(&self.tokens[self.pos + 1]);
            self.pos += 2;
            return Ok(Some((Some(String::new()), name)));
        }

        if is_local(first) {
            let name = local(&self.tokens[self.pos]);
            self.pos += 1;
            return Ok(Some((None, name)));
        }

        Ok(None)
    }

    /// Attribute selector after `[`.
    fn parse_attribute(&mut self) -> ParseResult<Selector> {
        self.skip_whitespace();
        let (namespace, name) = match self.parse_name_with_namespace(false)? {
            Some((namespace, Some(name))) => (namespace, name),
            _ => {
                return Err(match self.tokens.get(self.pos) {
                    Some(token) => unexpected(token, "in attribute selector"),
                    None => ParseError::at("unterminated attribute selector", self.end_span()),
                });
            }
        };
        let name = QualifiedName { namespace, name };
        self.skip_whitespace();

        let Some(token) = self.bump() else {
            return Err(ParseError::at("unterminated attribute selector", self.end_span()));
        };
        if token.kind() == TokenKind::RightBracket {
            return Ok(Selector::Attribute {
                op: AttributeOp::Exists,
                name,
                value: None,
            });
        }
        let Some(op) = AttributeOp::from_token_kind(token.kind()) else {
            return Err(unexpected(token, "in attribute selector"));
        };

        self.skip_whitespace();
        let value = match self.bump() {
            Some(token) if matches!(token.kind(), TokenKind::Ident | TokenKind::String) => {
                token.string_value().unwrap_or_default().to_string()
            }
            Some(token) => return Err(unexpected(token, "as attribute value")),
            None => return Err(ParseError::at("missing attribute value", self.end_span())),
        };
        self.skip_whitespace();
        match self.bump() {
            Some(token) if token.kind() == TokenKind::RightBracket => Ok(Selector::Attribute {
                op,
                name,
                value: Some(value),
            }),
            Some(token) => Err(unexpected(token, "in attribute selector")),
            None => Err(ParseError::at("unterminated attribute selector", self.end_span())),
        }
    }

    /// Pseudo-class after `:`.
    fn parse_pseudo_class(&mut self) -> ParseResult<Selector> {
        let Some(token) = self.bump() else {
            return Err(ParseError::at("expected pseudo-class name", self.end_span()));
        };
        let name = token.string_value().unwrap_or_default().to_string();
        match token.kind() {
            TokenKind::Ident => Ok(Selector::PseudoClass(PseudoClass::Simple(name))),
            TokenKind::Function => {
                let terms = self.function_arguments(token)?;
                if name.eq_ignore_ascii_case("not") {
                    if self.negation_depth >= MAX_NEGATION_DEPTH {
                        return Err(ParseError::at("':not()' nested too deeply", token.span()));
                    }
                    let mut nested = SelectorParser {
                        tokens: &terms,
                        pos: 0,
                        negation_depth: self.negation_depth + 1,
                        simple_selectors: self.simple_selectors,
                    };
                    let inner = nested.parse_single()?;
                    self.simple_selectors = nested.simple_selectors;
                    Ok(Selector::PseudoClass(PseudoClass::Negation {
                        name,
                        terms,
                        inner: Box::new(inner),
                    }))
                } else {
                    Ok(Selector::PseudoClass(PseudoClass::Function { name, terms }))
                }
            }
            TokenKind::Colon => Err(ParseError::at(
                "pseudo-elements are not supported",
                token.span(),
            )),
            _ => Err(unexpected(token, "after ':'")),
        }
    }

    /// Arguments of a function token up to its matching `)`, trimmed.
    fn function_arguments(&mut self, function: &Token) -> ParseResult<Vec<Token>> {
        let start = self.pos;
        let mut depth = 1usize;
        while let Some(token) = self.bump() {
            match token.kind() {
                TokenKind::Function | TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        let mut terms = self.tokens[start..self.pos - 1].to_vec();
                        trim_whitespace(&mut terms);
                        return Ok(terms);
                    }
                }
                _ => {}
            }
        }
        Err(ParseError::at(
            format!(
                "unterminated ':{}(' in selector",
                function.string_value().unwrap_or_default()
            ),
            function.span(),
        ))
    }
}

/// Drop leading and trailing whitespace tokens.
pub(crate) fn trim_whitespace(tokens: &mut Vec<Token>) {
    while tokens.last().is_some_and(|t| t.kind() == TokenKind::Whitespace) {
        tokens.pop();
    }
    let leading = tokens
        .iter()
        .take_while(|t| t.kind() == TokenKind::Whitespace)
        .count();
    tokens.drain(..leading);
}

pub(crate) fn unexpected(token: &Token, context: &str) -> ParseError {
    let text = match token.kind() {
        TokenKind::Eof => "end of input".to_string(),
        _ => format!("'{}'", token),
    };
    ParseError::at(format!("unexpected {text} {context}"), token.span())
}
