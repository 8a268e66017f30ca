//! Token serialization.
//!
//! [`from_token`] is the inverse of the tokenizer: feeding its output back
//! through [`tokenize`](super::tokenize) yields a token of the same kind
//! carrying the same payload.

use std::fmt::Write;

use super::token::{Token, TokenKind};
use super::tokenizer::{is_name_char, is_whitespace};

/// Serialize a single token to CSS text.
pub fn from_token(token: &Token) -> String {
    let text = token.string_value().unwrap_or_default();
    let number = token.number_value().unwrap_or_default();
    let mut out = String::new();

    match token.kind() {
        TokenKind::Ident => escape_ident(text, &mut out),
        TokenKind::Function => {
            escape_ident(text, &mut out);
            out.push('(');
        }
        TokenKind::AtKeyword => {
            out.push('@');
            escape_ident(text, &mut out);
        }
        TokenKind::Hash => {
            out.push('#');
            escape_name(text, &mut out);
        }
        TokenKind::String => {
            let quote = pick_quote(text, token.quote());
            out.push(quote);
            escape_string(text, quote, &mut out);
            out.push(quote);
        }
        TokenKind::BadString => {
            let quote = pick_quote(text, token.quote());
            out.push(quote);
            escape_string(text, quote, &mut out);
            out.push('\n');
        }
        TokenKind::Url => {
            out.push_str("url(");
            escape_url(text, &mut out);
            out.push(')');
        }
        TokenKind::BadUrl => {
            out.push_str("url(");
            escape_url(text, &mut out);
            out.push_str("()");
        }
        TokenKind::Number => out.push_str(&format_number(number)),
        TokenKind::Percentage => {
            out.push_str(&format_number(number));
            out.push('%');
        }
        TokenKind::Dimension => {
            out.push_str(&format_number(number));
            escape_unit(text, &mut out);
        }
        TokenKind::Whitespace => out.push_str(if text.is_empty() { " " } else { text }),
        TokenKind::Comment => {
            out.push_str("/*");
            out.push_str(text);
            out.push_str("*/");
        }
        TokenKind::BadComment => {
            out.push_str("/*");
            out.push_str(text);
        }
        TokenKind::Cdo => out.push_str("<!--"),
        TokenKind::Cdc => out.push_str("-->"),
        TokenKind::IncludeMatch => out.push_str("~="),
        TokenKind::DashMatch => out.push_str("|="),
        TokenKind::PrefixMatch => out.push_str("^="),
        TokenKind::SuffixMatch => out.push_str("$="),
        TokenKind::SubstringMatch => out.push_str("*="),
        TokenKind::Column => out.push_str("||"),
        TokenKind::Colon => out.push(':'),
        TokenKind::Semicolon => out.push(';'),
        TokenKind::Comma => out.push(','),
        TokenKind::LeftBracket => out.push('['),
        TokenKind::RightBracket => out.push(']'),
        TokenKind::LeftParen => out.push('('),
        TokenKind::RightParen => out.push(')'),
        TokenKind::LeftBrace => out.push('{'),
        TokenKind::RightBrace => out.push('}'),
        // A lone backslash only stays a delimiter when a newline follows.
        TokenKind::Delim('\\') => out.push_str("\\\n"),
        TokenKind::Delim(c) => out.push(c),
        TokenKind::Eof => {}
    }
    out
}

/// Serialize a token run by concatenation.
///
/// The run is expected to carry its own whitespace tokens where adjacent
/// tokens would otherwise merge.
pub fn serialize_tokens<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> String {
    tokens.into_iter().map(from_token).collect()
}

/// Format a number the way CSS authors write it: integers without a fraction.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Escape an identifier so that it tokenizes back to an ident.
pub fn escape_ident(name: &str, out: &mut String) {
    if name == "-" {
        out.push_str("\\-");
        return;
    }
    let starts_with_dash = name.starts_with('-');
    for (i, c) in name.chars().enumerate() {
        let needs_hex =
            (i == 0 && c.is_ascii_digit()) || (i == 1 && starts_with_dash && c.is_ascii_digit());
        if needs_hex {
            hex_escape(c, out);
        } else {
            escape_name_char(c, out);
        }
    }
}

/// Escape the name part of a hash, which has no start restrictions.
fn escape_name(name: &str, out: &mut String) {
    for c in name.chars() {
        escape_name_char(c, out);
    }
}

fn escape_name_char(c: char, out: &mut String) {
    if is_name_char(c) {
        out.push(c);
    } else if is_control(c) || is_whitespace(c) {
        hex_escape(c, out);
    } else {
        out.push('\\');
        out.push(c);
    }
}

/// Escape a dimension unit.
///
/// Besides the ident rules, a unit that would read as an exponent (`e3`,
/// `e-3`) gets its leading `e` escaped.
fn escape_unit(unit: &str, out: &mut String) {
    let mut chars = unit.chars();
    let first = chars.next();
    let second = chars.next();
    let third = chars.next();
    let digit = |c: Option<char>| c.is_some_and(|c| c.is_ascii_digit());
    let exponent_like = matches!(first, Some('e' | 'E'))
        && (digit(second) || (matches!(second, Some('+' | '-')) && digit(third)));

    if exponent_like {
        if let Some(e) = first {
            hex_escape(e, out);
        }
        escape_name(&unit[1..], out);
    } else {
        escape_ident(unit, out);
    }
}

fn pick_quote(text: &str, preferred: char) -> char {
    let other = if preferred == '\'' { '"' } else { '\'' };
    if text.contains(preferred) && !text.contains(other) {
        other
    } else {
        preferred
    }
}

fn escape_string(text: &str, quote: char, out: &mut String) {
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if is_control(c) => hex_escape(c, out),
            c => out.push(c),
        }
    }
}

fn escape_url(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            c if is_whitespace(c) || is_control(c) => hex_escape(c, out),
            '"' | '\'' | '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
}

/// C0 controls and DEL. Written raw, CR and FF would come back as LF.
fn is_control(c: char) -> bool {
    c < ' ' || c == '\u{7F}'
}

fn hex_escape(c: char, out: &mut String) {
    let _ = write!(out, "\\{:x} ", c as u32);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::tokenize;

    fn round_trip(token: Token) {
        let text = from_token(&token);
        let tokens = tokenize(&text);
        assert_eq!(tokens.len(), 1, "{text:?} produced {tokens:?}");
        assert!(
            tokens[0].same_value(&token),
            "{text:?} produced {:?}, expected {token:?}",
            tokens[0]
        );
    }

    #[test]
    fn round_trips_idents_with_awkward_characters() {
        round_trip(Token::ident("plain"));
        round_trip(Token::ident("1st"));
        round_trip(Token::ident("-9lives"));
        round_trip(Token::ident("-"));
        round_trip(Token::ident("--"));
        round_trip(Token::ident("a b.c"));
        round_trip(Token::ident("caf\u{e9}"));
        round_trip(Token::function("my func"));
        round_trip(Token::at_keyword("3d"));
        round_trip(Token::hash("123"));
    }

    #[test]
    fn round_trips_numbers_and_units() {
        round_trip(Token::number(42.0));
        round_trip(Token::number(-0.5));
        round_trip(Token::number(1.25));
        round_trip(Token::percentage(12.5));
        round_trip(Token::dimension(3.0, "px"));
        round_trip(Token::dimension(1.0, "e3"));
        round_trip(Token::dimension(1.0, "e-x"));
        round_trip(Token::dimension(2.0, "E-3"));
        round_trip(Token::dimension(2.0, "%"));
        round_trip(Token::dimension(2.0, "-9"));
    }

    #[test]
    fn round_trips_strings_urls_and_bad_tokens() {
        round_trip(Token::string("it's \"quoted\""));
        round_trip(Token::string("line\nbreak"));
        round_trip(Token::string("back\\slash"));
        round_trip(Token::url("a b(c).png"));
        round_trip(Token::with_string(TokenKind::BadUrl, "x"));
        round_trip(Token::with_string(TokenKind::Comment, " c "));
        round_trip(Token::with_string(TokenKind::BadComment, " open"));
        round_trip(Token::delim('!'));
    }

    #[test]
    fn control_characters_are_hex_escaped() {
        assert_eq!(from_token(&Token::ident("a\rb")), "a\\d b");
        assert_eq!(from_token(&Token::string("a\u{c}b")), "\"a\\c b\"");
        round_trip(Token::ident("\rx"));
        round_trip(Token::ident("x\u{c}"));
        round_trip(Token::hash("a\r"));
        round_trip(Token::string("cr\rff\u{c}tab\t"));
        round_trip(Token::url("a\rb"));
        round_trip(Token::dimension(1.0, "p\rx"));

        let parsed = tokenize("\\d x");
        assert_eq!(parsed.len(), 1);
        round_trip(parsed[0].clone());
    }

    #[test]
    fn backslash_delim_is_followed_by_newline() {
        let tokens = tokenize(&from_token(&Token::delim('\\')));
        assert_eq!(tokens[0].kind(), TokenKind::Delim('\\'));
        assert_eq!(tokens[1].kind(), TokenKind::Whitespace);
    }

    #[test]
    fn bad_string_round_trips_with_trailing_newline() {
        let token = Token::with_string(TokenKind::BadString, "abc");
        let tokens = tokenize(&from_token(&token));
        assert!(tokens[0].same_value(&token));
        assert_eq!(tokens[1].kind(), TokenKind::Whitespace);
    }

    #[test]
    fn quote_choice_avoids_escaping() {
        assert_eq!(from_token(&Token::string("it's")), "\"it's\"");
        assert_eq!(from_token(&Token::string("say \"hi\"")), "'say \"hi\"'");
        assert_eq!(from_token(&Token::quoted("plain", '\'')), "'plain'");
    }

    #[test]
    fn numbers_format_without_trailing_zeroes() {
        assert_eq!(format_number(8.0), "8");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(format_number(f64::NAN), "0");
    }
}
