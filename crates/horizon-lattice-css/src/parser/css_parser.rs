//! Recursive-descent stylesheet parser.
//!
//! The parser owns its tokenizer and never gives up on a stylesheet: a
//! malformed rule or declaration is recorded as a [`ParseError`] and parsing
//! resumes at the next rule boundary (a balanced `{...}` block) or
//! declaration boundary (`;` or `}`).

use std::io::Read;

use super::ParseError;
use super::selector_parser::{SelectorParser, trim_whitespace, unexpected};
use crate::logging::targets;
use crate::rules::{AtRule, Declaration, QualifiedName, Rule, StyleRule, Stylesheet};
use crate::selector::{Selector, SelectorGroup};
use crate::syntax::{CharScanner, ReaderScanner, StrScanner, Token, TokenKind, Tokenizer};
use crate::{Error, Result};

type ParseResult<T> = std::result::Result<T, ParseError>;

/// Parse a CSS stylesheet.
///
/// Never fails: every problem ends up in the returned error list and the
/// well-formed rules are kept.
///
/// # Example
///
/// ```
/// use horizon_lattice_css::parser::parse_stylesheet;
///
/// let (sheet, errors) = parse_stylesheet("foo{ bad !!! } bar{color:green}");
/// assert_eq!(errors.len(), 1);
/// assert_eq!(sheet.len(), 2);
/// ```
pub fn parse_stylesheet(css: &str) -> (Stylesheet, Vec<ParseError>) {
    StylesheetParser::new(css).parse_stylesheet()
}

/// Parse a standalone declaration list, such as a `style` attribute.
pub fn parse_declaration_list(css: &str) -> (Vec<Declaration>, Vec<ParseError>) {
    StylesheetParser::new(css).parse_declaration_list()
}

/// Parse a comma-separated selector group.
pub fn parse_selector_group(css: &str) -> Result<SelectorGroup> {
    let tokens: Vec<Token> = crate::syntax::tokenize(css)
        .into_iter()
        .filter(|t| !matches!(t.kind(), TokenKind::Comment | TokenKind::BadComment))
        .collect();
    if tokens.iter().all(|t| t.kind() == TokenKind::Whitespace) {
        return Err(Error::invalid_selector(css, "empty selector"));
    }
    SelectorParser::new(&tokens)
        .parse_group()
        .map_err(|e| Error::invalid_selector(css, e.message))
}

/// Stylesheet parser over a character scanner.
pub struct StylesheetParser<S> {
    tokenizer: Tokenizer<S>,
    errors: Vec<ParseError>,
}

impl StylesheetParser<StrScanner> {
    /// Parser over CSS text.
    pub fn new(css: &str) -> Self {
        Self::from_scanner(StrScanner::new(css))
    }
}

impl<R: Read> StylesheetParser<ReaderScanner<R>> {
    /// Parse a stylesheet streamed from `reader`.
    ///
    /// Returns [`Error::Io`] if reading fails part way; syntax problems are
    /// reported in the error list as usual.
    pub fn parse_reader(reader: R) -> Result<(Stylesheet, Vec<ParseError>)> {
        let mut parser = Self::from_scanner(ReaderScanner::new(reader));
        let stylesheet = parser.stylesheet();
        if let Some(err) = parser.tokenizer.scanner_mut().take_error() {
            return Err(Error::io("<reader>", err));
        }
        Ok((stylesheet, parser.errors))
    }
}

impl<S: CharScanner> StylesheetParser<S> {
    /// Parser over any scanner.
    pub fn from_scanner(scanner: S) -> Self {
        Self {
            tokenizer: Tokenizer::new(scanner),
            errors: vec![],
        }
    }

    /// Parse the whole input as a stylesheet.
    pub fn parse_stylesheet(mut self) -> (Stylesheet, Vec<ParseError>) {
        let stylesheet = self.stylesheet();
        (stylesheet, self.errors)
    }

    /// Parse the whole input as a declaration list.
    pub fn parse_declaration_list(mut self) -> (Vec<Declaration>, Vec<ParseError>) {
        let declarations = self.declarations(false);
        (declarations, self.errors)
    }

    fn record(&mut self, error: ParseError) {
        tracing::warn!(target: targets::PARSER, "CSS parse error: {}", error);
        self.errors.push(error);
    }

    // ------------------------------------------------------------------
    // Rules
    // ------------------------------------------------------------------

    fn stylesheet(&mut self) -> Stylesheet {
        let mut rules = vec![];
        loop {
            match self.tokenizer.next() {
                TokenKind::Eof => break,
                TokenKind::Cdo | TokenKind::Cdc => continue,
                TokenKind::AtKeyword => rules.push(Rule::At(self.at_rule())),
                _ => {
                    self.tokenizer.push_back();
                    match self.style_rule() {
                        Ok(rule) => rules.push(Rule::Style(rule)),
                        Err(e) => {
                            self.record(e);
                            self.skip_rule();
                        }
                    }
                }
            }
        }
        tracing::debug!(
            target: targets::PARSER,
            rules = rules.len(),
            errors = self.errors.len(),
            "Parsed stylesheet"
        );
        Stylesheet::new(rules)
    }

    /// At-rule after its keyword. Header and body are kept verbatim.
    fn at_rule(&mut self) -> AtRule {
        let keyword = self.tokenizer.current_string().unwrap_or_default().to_string();
        let mut header = vec![];
        let mut body = None;
        loop {
            let kind = self.tokenizer.next_no_skip();
            match kind {
                TokenKind::Eof | TokenKind::Semicolon => break,
                TokenKind::Comment | TokenKind::BadComment => continue,
                TokenKind::LeftBrace => {
                    let mut block = vec![];
                    self.capture_balanced(kind, &mut block);
                    if block.last().is_some_and(|t| t.kind() == TokenKind::RightBrace) {
                        block.pop();
                    }
                    body = Some(block);
                    break;
                }
                _ => {
                    header.push(self.tokenizer.get_token());
                    if kind.closing().is_some() {
                        self.capture_balanced(kind, &mut header);
                    }
                }
            }
        }
        trim_whitespace(&mut header);
        AtRule {
            keyword,
            header,
            body,
        }
    }

    fn style_rule(&mut self) -> ParseResult<StyleRule> {
        let mut prelude = vec![];
        loop {
            let kind = self.tokenizer.next_no_skip();
            match kind {
                TokenKind::LeftBrace => break,
                TokenKind::Eof => {
                    return Err(ParseError::at(
                        "unexpected end of input before '{'",
                        self.tokenizer.span(),
                    ));
                }
                TokenKind::RightBrace => {
                    let error = unexpected(&self.tokenizer.get_token(), "outside of a block");
                    self.tokenizer.push_back();
                    return Err(error);
                }
                TokenKind::Comment | TokenKind::BadComment => continue,
                _ => {
                    prelude.push(self.tokenizer.get_token());
                    if kind.closing().is_some() {
                        self.capture_balanced(kind, &mut prelude);
                    }
                }
            }
        }

        trim_whitespace(&mut prelude);
        let selector_group = if prelude.is_empty() {
            SelectorGroup::from(Selector::Universal)
        } else {
            match SelectorParser::new(&prelude).parse_group() {
                Ok(group) => group,
                Err(e) => {
                    self.record(e);
                    SelectorGroup::nothing()
                }
            }
        };

        let declarations = self.declarations(true);
        Ok(StyleRule::new(selector_group, declarations))
    }

    /// Discard tokens up to and including the next top-level block or `}`.
    fn skip_rule(&mut self) {
        let mut discarded = vec![];
        loop {
            let kind = self.tokenizer.next_no_skip();
            match kind {
                TokenKind::Eof | TokenKind::RightBrace => return,
                TokenKind::LeftBrace => {
                    self.capture_balanced(kind, &mut discarded);
                    return;
                }
                _ if kind.closing().is_some() => self.capture_balanced(kind, &mut discarded),
                _ => {}
            }
        }
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    /// Declarations up to the closing `}` of a block, or to end of input.
    fn declarations(&mut self, in_block: bool) -> Vec<Declaration> {
        let mut declarations = vec![];
        loop {
            match self.tokenizer.next() {
                TokenKind::Eof => break,
                TokenKind::RightBrace if in_block => break,
                TokenKind::Semicolon => continue,
                _ => {
                    self.tokenizer.push_back();
                    match self.declaration() {
                        Ok(declaration) => declarations.push(declaration),
                        Err(e) => {
                            self.record(e);
                            self.skip_declaration(in_block);
                        }
                    }
                }
            }
        }
        declarations
    }

    /// `name S* ':' terms`
    fn declaration(&mut self) -> ParseResult<Declaration> {
        self.tokenizer.next();
        let span = self.tokenizer.span();
        let name = self.property_name()?;

        if self.tokenizer.next() != TokenKind::Colon {
            return Err(self.unexpected_here("after property name"));
        }

        let terms = self.terms()?;
        Ok(Declaration::new(name, terms).with_span(span))
    }

    /// Property name at the current token: `name`, `ns|name`, `*|name` or `|name`.
    fn property_name(&mut self) -> ParseResult<QualifiedName> {
        let first = self.tokenizer.get_token();
        match first.kind() {
            TokenKind::Ident => {
                if self.tokenizer.next_no_skip() != TokenKind::Delim('|') {
                    self.tokenizer.push_back();
                    return Ok(QualifiedName::new(first.string_value().unwrap_or_default()));
                }
                let namespace = first.string_value().unwrap_or_default().to_string();
                self.namespaced_local(namespace)
            }
            TokenKind::Delim('*') => {
                if self.tokenizer.next_no_skip() != TokenKind::Delim('|') {
                    return Err(self.unexpected_here("after '*' in property name"));
                }
                self.namespaced_local("*".to_string())
            }
            TokenKind::Delim('|') => self.namespaced_local(String::new()),
            _ => {
                self.tokenizer.push_back();
                Err(unexpected(&first, "where a property name was expected"))
            }
        }
    }

    fn namespaced_local(&mut self, namespace: String) -> ParseResult<QualifiedName> {
        if self.tokenizer.next_no_skip() != TokenKind::Ident {
            return Err(self.unexpected_here("after namespace prefix"));
        }
        let name = self.tokenizer.current_string().unwrap_or_default();
        Ok(QualifiedName::with_namespace(namespace, name))
    }

    /// Value tokens up to `;` (consumed) or `}` (left for the caller).
    fn terms(&mut self) -> ParseResult<Vec<Token>> {
        let mut terms = vec![];
        loop {
            let kind = self.tokenizer.next_no_skip();
            match kind {
                TokenKind::Eof | TokenKind::Semicolon => break,
                TokenKind::RightBrace => {
                    self.tokenizer.push_back();
                    break;
                }
                TokenKind::Comment | TokenKind::BadComment => continue,
                TokenKind::BadString | TokenKind::BadUrl => {
                    return Err(ParseError::at(
                        "malformed string or url in value",
                        self.tokenizer.span(),
                    ));
                }
                _ => {
                    terms.push(self.tokenizer.get_token());
                    if kind.closing().is_some() {
                        self.capture_balanced(kind, &mut terms);
                    }
                }
            }
        }
        trim_whitespace(&mut terms);
        Ok(terms)
    }

    /// Discard tokens up to the next `;` (consumed) or `}` (left in place).
    ///
    /// Outside a block a stray `}` is consumed as well, so the declaration
    /// list keeps moving.
    fn skip_declaration(&mut self, in_block: bool) {
        let mut discarded = vec![];
        loop {
            let kind = self.tokenizer.next_no_skip();
            match kind {
                TokenKind::Eof | TokenKind::Semicolon => return,
                TokenKind::RightBrace => {
                    if in_block {
                        self.tokenizer.push_back();
                    }
                    return;
                }
                _ if kind.closing().is_some() => self.capture_balanced(kind, &mut discarded),
                _ => {}
            }
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Error for the current token; boundary and opening tokens are pushed
    /// back so that recovery sees them.
    fn unexpected_here(&mut self, context: &str) -> ParseError {
        let token = self.tokenizer.get_token();
        let kind = token.kind();
        if matches!(
            kind,
            TokenKind::Eof | TokenKind::Semicolon | TokenKind::RightBrace
        ) || kind.closing().is_some()
        {
            self.tokenizer.push_back();
        }
        unexpected(&token, context)
    }

    /// Append tokens up to and including the closer matching `open`.
    ///
    /// Nested groups are tracked with an explicit stack; mismatched closers
    /// are kept as ordinary tokens. Comments are dropped.
    fn capture_balanced(&mut self, open: TokenKind, out: &mut Vec<Token>) {
        let mut expected: Vec<TokenKind> = open.closing().into_iter().collect();
        while let Some(&close) = expected.last() {
            let kind = self.tokenizer.next_no_skip();
            match kind {
                TokenKind::Eof => return,
                TokenKind::Comment | TokenKind::BadComment => continue,
                _ => {}
            }
            out.push(self.tokenizer.get_token());
            if kind == close {
                expected.pop();
            } else if let Some(nested) = kind.closing() {
                expected.push(nested);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::{AttributeOp, Combinator, PseudoClass};
    use crate::syntax::serialize_tokens;

    fn only_style_rule(css: &str) -> StyleRule {
        let (sheet, errors) = parse_stylesheet(css);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        assert_eq!(sheet.len(), 1);
        sheet.rules()[0].as_style().unwrap().clone()
    }

    #[test]
    fn parse_simple_rule() {
        let rule = only_style_rule(".a { color: red; }");
        assert_eq!(rule.selector_group.selectors, vec![Selector::class("a")]);
        assert_eq!(rule.declarations.len(), 1);
        assert_eq!(rule.declarations[0].property(), "color");
        assert_eq!(rule.declarations[0].terms, vec![Token::ident("red")]);
    }

    #[test]
    fn parse_multiple_rules_and_markup_comments() {
        let (sheet, errors) = parse_stylesheet("<!-- a { x: 1 } --> b { y: 2 } /* c */ d { z: 3 }");
        assert!(errors.is_empty());
        assert_eq!(sheet.style_rules().count(), 3);
    }

    #[test]
    fn malformed_declaration_is_skipped_with_one_error() {
        let (sheet, errors) = parse_stylesheet("foo{ bad !!! } bar{color:green}");
        assert_eq!(errors.len(), 1);
        let bar = sheet.style_rules().nth(1).unwrap();
        assert_eq!(bar.selector_group.to_string(), "bar");
        assert_eq!(bar.declarations[0].property(), "color");
        assert_eq!(bar.declarations[0].terms, vec![Token::ident("green")]);
    }

    #[test]
    fn recovery_continues_within_block() {
        let rule = {
            let (sheet, errors) = parse_stylesheet("a { color red; width: 1px; : x; height: 2px }");
            assert_eq!(errors.len(), 2);
            sheet.rules()[0].as_style().unwrap().clone()
        };
        let names: Vec<_> = rule.declarations.iter().map(|d| d.property()).collect();
        assert_eq!(names, vec!["width", "height"]);
    }

    #[test]
    fn bad_selector_degrades_to_nothing() {
        let (sheet, errors) = parse_stylesheet("a..b { color: red } b { color: blue }");
        assert_eq!(errors.len(), 1);
        let first = sheet.rules()[0].as_style().unwrap();
        assert_eq!(first.selector_group, SelectorGroup::nothing());
        assert_eq!(first.declarations.len(), 1);
        assert_eq!(sheet.style_rules().count(), 2);
    }

    #[test]
    fn stray_closing_brace_is_reported() {
        let (sheet, errors) = parse_stylesheet("} a { b: c }");
        assert_eq!(errors.len(), 1);
        assert_eq!(sheet.style_rules().count(), 1);
    }

    #[test]
    fn unterminated_rule_at_end_of_input() {
        let (sheet, errors) = parse_stylesheet("a { b: c } d");
        assert_eq!(errors.len(), 1);
        assert_eq!(sheet.len(), 1);

        // A block cut off by end of input still yields its declarations.
        let (sheet, errors) = parse_stylesheet("a { b: c");
        assert!(errors.is_empty());
        assert_eq!(sheet.style_rules().next().unwrap().declarations.len(), 1);
    }

    #[test]
    fn at_rules_keep_raw_tokens() {
        let (sheet, errors) = parse_stylesheet(
            "@import url(a.css) screen; @media (min-width: 10px) { a { b: c } } x { y: z }",
        );
        assert!(errors.is_empty());
        assert_eq!(sheet.len(), 3);
        let Rule::At(import) = &sheet.rules()[0] else {
            panic!("expected at-rule");
        };
        assert_eq!(import.keyword, "import");
        assert!(import.body.is_none());
        assert_eq!(serialize_tokens(&import.header), "url(a.css) screen");

        let Rule::At(media) = &sheet.rules()[1] else {
            panic!("expected at-rule");
        };
        assert_eq!(serialize_tokens(&media.header), "(min-width: 10px)");
        assert_eq!(serialize_tokens(media.body.as_ref().unwrap()), " a { b: c } ");
    }

    #[test]
    fn values_capture_balanced_groups_and_drop_comments() {
        let rule = only_style_rule("a { grid: [full] 1fr /* note */ { x; y } calc(1px + (2px * 3)); }");
        let value = rule.declarations[0].value_text();
        assert_eq!(value, "[full] 1fr  { x; y } calc(1px + (2px * 3))");
    }

    #[test]
    fn empty_value_is_kept_as_empty_declaration() {
        let rule = only_style_rule("a { color: ; width: 1px }");
        assert!(rule.declarations[0].is_empty());
        assert!(!rule.declarations[1].is_empty());
    }

    #[test]
    fn namespaced_property_names() {
        let rule = only_style_rule("a { svg|fill: red; |plain: 1; *|any: 2 }");
        let names: Vec<_> = rule.declarations.iter().map(|d| d.name.clone()).collect();
        assert_eq!(
            names,
            vec![
                QualifiedName::with_namespace("svg", "fill"),
                QualifiedName::with_namespace("", "plain"),
                QualifiedName::with_namespace("*", "any"),
            ]
        );
    }

    #[test]
    fn selector_trees_are_left_associative() {
        let group = parse_selector_group("a b > c").unwrap();
        let expected = Selector::type_selector("a")
            .descendant(Selector::type_selector("b"))
            .child(Selector::type_selector("c"));
        assert_eq!(group.selectors, vec![expected]);
    }

    #[test]
    fn compound_and_sibling_selectors() {
        let group = parse_selector_group("div.x#y[title~=\"big\"]:hover + p ~ *").unwrap();
        let Selector::Combined { combinator, left, right } = &group.selectors[0] else {
            panic!("expected combinator");
        };
        assert_eq!(*combinator, Combinator::GeneralSibling);
        assert_eq!(**right, Selector::Universal);
        assert!(matches!(
            **left,
            Selector::Combined {
                combinator: Combinator::AdjacentSibling,
                ..
            }
        ));
        assert_eq!(group.to_string(), "div.x#y[title~=\"big\"]:hover + p ~ *");
    }

    #[test]
    fn namespaced_selectors() {
        let group = parse_selector_group("svg|rect, *|g, |x, ns|*, [xlink|href^=http]").unwrap();
        assert_eq!(
            group.selectors[0],
            Selector::Type(QualifiedName::with_namespace("svg", "rect"))
        );
        assert_eq!(
            group.selectors[1],
            Selector::Type(QualifiedName::with_namespace("*", "g"))
        );
        assert_eq!(
            group.selectors[2],
            Selector::Type(QualifiedName::with_namespace("", "x"))
        );
        assert_eq!(group.selectors[3], Selector::Universal);
        assert_eq!(
            group.selectors[4],
            Selector::Attribute {
                op: AttributeOp::Prefix,
                name: QualifiedName::with_namespace("xlink", "href"),
                value: Some("http".into()),
            }
        );
    }

    #[test]
    fn functional_and_negated_pseudo_classes() {
        let group = parse_selector_group("li:nth-child( 2n + 1 ):not(.a.b)").unwrap();
        let Selector::And(left, right) = &group.selectors[0] else {
            panic!("expected compound");
        };
        let Selector::And(_, nth) = &**left else {
            panic!("expected compound");
        };
        let Selector::PseudoClass(PseudoClass::Function { name, terms }) = &**nth else {
            panic!("expected functional pseudo-class");
        };
        assert_eq!(name, "nth-child");
        assert_eq!(serialize_tokens(terms), "2n + 1");
        let Selector::PseudoClass(PseudoClass::Negation { inner, .. }) = &**right else {
            panic!("expected negation");
        };
        assert_eq!(**inner, Selector::class("a").and(Selector::class("b")));
    }

    #[test]
    fn invalid_selectors_are_errors() {
        assert!(parse_selector_group("").is_err());
        assert!(parse_selector_group("a,").is_err());
        assert!(parse_selector_group(".").is_err());
        assert!(parse_selector_group("a::before").is_err());
        assert!(parse_selector_group("[x=]").is_err());
        assert!(parse_selector_group(":not(").is_err());
        assert!(parse_selector_group("a > > b").is_err());
    }

    #[test]
    fn selector_nesting_is_bounded() {
        let negations = |depth: usize| format!("{}a{}", ":not(".repeat(depth), ")".repeat(depth));
        assert!(parse_selector_group(&negations(16)).is_ok());
        assert!(parse_selector_group(&negations(17)).is_err());
        assert!(parse_selector_group(&negations(100_000)).is_err());

        let classes = |count: usize| format!("a{}", ".c".repeat(count));
        assert!(parse_selector_group(&classes(255)).is_ok());
        assert!(parse_selector_group(&classes(256)).is_err());
        assert!(parse_selector_group(&"a ".repeat(10_000)).is_err());

        // Each alternative gets its own allowance.
        let long = classes(200);
        assert!(parse_selector_group(&format!("{long}, {long}")).is_ok());
    }

    #[test]
    fn overlong_selector_keeps_declarations() {
        let css = format!("{} {{ color: red }} b {{ color: blue }}", ":not(".repeat(50) + "a" + &")".repeat(50));
        let (sheet, errors) = parse_stylesheet(&css);
        assert_eq!(errors.len(), 1);
        let rules: Vec<&StyleRule> = sheet.style_rules().collect();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].selector_group, SelectorGroup::nothing());
        assert_eq!(rules[0].declarations.len(), 1);
    }

    #[test]
    fn declaration_list_for_style_attributes() {
        let (declarations, errors) = parse_declaration_list("color: red; --gap: 4px ;; width:calc(1px + 2px)");
        assert!(errors.is_empty());
        assert_eq!(declarations.len(), 3);
        assert_eq!(declarations[1].property(), "--gap");
        assert_eq!(declarations[2].value_text(), "calc(1px + 2px)");

        let (declarations, errors) = parse_declaration_list("a: 1; } b: 2");
        assert_eq!(errors.len(), 1);
        assert_eq!(declarations.len(), 2);
    }

    #[test]
    fn spans_point_at_declarations() {
        let rule = only_style_rule("a {\n  color: red;\n}");
        let span = rule.declarations[0].span;
        assert_eq!(span.line, 2);
        assert_eq!(span.start, 6);
    }

    #[test]
    fn reader_input_matches_string_input() {
        let css = "a { color: red } b { margin: 1px 2px }";
        let (from_reader, errors) = StylesheetParser::parse_reader(css.as_bytes()).unwrap();
        assert!(errors.is_empty());
        assert_eq!(from_reader, parse_stylesheet(css).0);
    }

    #[test]
    fn reader_failure_is_io_error() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk gone"))
            }
        }
        assert!(matches!(
            StylesheetParser::parse_reader(Failing),
            Err(Error::Io { .. })
        ));
    }
}
