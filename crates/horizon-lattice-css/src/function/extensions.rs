//! Non-standard value functions: `concat()`, `replace()` and `round()`.

use regex::Regex;

use crate::error::FunctionError;
use crate::syntax::{Token, TokenKind, format_number, from_token};

/// Join every argument's text into one string token.
pub(crate) fn concat(args: &[Vec<Token>]) -> Token {
    let text: String = args.iter().map(|arg| text_of(arg)).collect();
    Token::string(text)
}

/// `replace(string, pattern, replacement)`: replace every match in a
/// single pass. The replacement may use `$1`-style group references.
pub(crate) fn replace(args: &[Vec<Token>]) -> Result<Token, FunctionError> {
    let [subject, pattern, replacement] = args else {
        return Err(FunctionError::invalid_arguments(
            "replace",
            format!("expected 3 arguments, got {}", args.len()),
        ));
    };
    let pattern = text_of(pattern);
    let regex = Regex::new(&pattern).map_err(|source| FunctionError::InvalidRegex {
        pattern: pattern.clone(),
        source,
    })?;
    let subject = text_of(subject);
    let replacement = text_of(replacement);
    let result = regex.replace_all(&subject, replacement.as_str());
    Ok(Token::string(result.into_owned()))
}

/// Round a numeric argument to the nearest integer, keeping its unit.
pub(crate) fn round(args: &[Vec<Token>]) -> Result<Token, FunctionError> {
    let token = match args {
        [arg] => {
            let mut significant = arg.iter().filter(|t| !t.kind().is_insignificant());
            match (significant.next(), significant.next()) {
                (Some(token), None) => token,
                _ => return Err(FunctionError::invalid_arguments("round", "expected one value")),
            }
        }
        _ => {
            return Err(FunctionError::invalid_arguments(
                "round",
                format!("expected 1 argument, got {}", args.len()),
            ));
        }
    };
    let value = token.number_value().unwrap_or_default().round();
    match token.kind() {
        TokenKind::Number => Ok(Token::number(value)),
        TokenKind::Percentage => Ok(Token::percentage(value)),
        TokenKind::Dimension => Ok(Token::dimension(value, token.string_value().unwrap_or_default())),
        _ => Err(FunctionError::invalid_arguments(
            "round",
            format!("'{token}' is not a number"),
        )),
    }
}

/// Unquoted text of an argument.
fn text_of(tokens: &[Token]) -> String {
    let mut text = String::new();
    for token in tokens {
        match token.kind() {
            TokenKind::String | TokenKind::Ident | TokenKind::Url => {
                text.push_str(token.string_value().unwrap_or_default());
            }
            TokenKind::Number => text.push_str(&format_number(token.number_value().unwrap_or_default())),
            TokenKind::Percentage => {
                text.push_str(&format_number(token.number_value().unwrap_or_default()));
                text.push('%');
            }
            TokenKind::Dimension => {
                text.push_str(&format_number(token.number_value().unwrap_or_default()));
                text.push_str(token.string_value().unwrap_or_default());
            }
            TokenKind::Whitespace => text.push(' '),
            TokenKind::Comment | TokenKind::BadComment => {}
            _ => text.push_str(&from_token(token)),
        }
    }
    text
}
