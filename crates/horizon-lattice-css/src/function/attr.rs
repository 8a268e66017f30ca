//! `attr()` argument parsing and value coercion.

use super::UnitConverter;
use crate::error::FunctionError;
use crate::syntax::{Span, Token, TokenKind, tokenize};

/// Requested type of an `attr()` value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum AttrType {
    String,
    Ident,
    Number,
    Integer,
    Length,
    Percentage,
    Url,
    /// A bare number in the attribute, emitted with this unit.
    Unit(String),
}

impl AttrType {
    fn from_token(token: &Token) -> Option<Self> {
        match token.kind() {
            TokenKind::Delim('%') => Some(Self::Unit("%".to_string())),
            TokenKind::Ident => {
                let name = token.string_value()?;
                Some(match name.to_ascii_lowercase().as_str() {
                    "string" => Self::String,
                    "ident" => Self::Ident,
                    "number" => Self::Number,
                    "integer" => Self::Integer,
                    "length" => Self::Length,
                    "percentage" => Self::Percentage,
                    "url" => Self::Url,
                    _ => Self::Unit(name.to_string()),
                })
            }
            _ => None,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Ident => "ident",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Length => "length",
            Self::Percentage => "percentage",
            Self::Url => "url",
            Self::Unit(unit) => unit,
        }
    }
}

/// Parsed `attr(name [type])` head, before the fallback comma.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AttrArgs {
    pub name: String,
    pub ty: AttrType,
}

impl AttrArgs {
    pub(crate) fn parse(head: &[Token]) -> Result<Self, FunctionError> {
        let mut significant = head.iter().filter(|t| !t.kind().is_insignificant());
        let name = match significant.next() {
            Some(token) if token.kind() == TokenKind::Ident => {
                token.string_value().unwrap_or_default().to_string()
            }
            Some(token) => {
                return Err(FunctionError::invalid_arguments(
                    "attr",
                    format!("expected attribute name, found '{token}'"),
                ));
            }
            None => return Err(FunctionError::invalid_arguments("attr", "missing attribute name")),
        };
        let ty = match significant.next() {
            None => AttrType::String,
            Some(token) => AttrType::from_token(token).ok_or_else(|| {
                FunctionError::invalid_arguments("attr", format!("invalid type '{token}'"))
            })?,
        };
        if let Some(token) = significant.next() {
            return Err(FunctionError::invalid_arguments(
                "attr",
                format!("unexpected '{token}'"),
            ));
        }
        Ok(Self { name, ty })
    }

    /// Convert a raw attribute value to a token of the requested type.
    pub(crate) fn coerce(&self, value: &str, converter: &dyn UnitConverter) -> Result<Token, FunctionError> {
        let coerced = match &self.ty {
            AttrType::String => Some(Token::string(value)),
            AttrType::Url => Some(Token::url(value.trim())),
            AttrType::Ident => single_token(value).filter(|t| t.kind() == TokenKind::Ident),
            AttrType::Number => single_token(value).filter(|t| t.kind() == TokenKind::Number),
            AttrType::Integer => single_token(value).filter(|t| {
                t.kind() == TokenKind::Number && t.number_value().is_some_and(|n| n.fract() == 0.0)
            }),
            AttrType::Percentage => single_token(value).filter(|t| t.kind() == TokenKind::Percentage),
            AttrType::Length => single_token(value).filter(|t| match t.kind() {
                TokenKind::Dimension => t.string_value().is_some_and(|u| converter.is_length(u)),
                TokenKind::Number => t.number_value() == Some(0.0),
                _ => false,
            }),
            AttrType::Unit(unit) => single_token(value)
                .filter(|t| t.kind() == TokenKind::Number)
                .and_then(|t| t.number_value())
                .map(|n| match unit.as_str() {
                    "%" => Token::percentage(n),
                    unit => Token::dimension(n, unit),
                }),
        };
        coerced.ok_or_else(|| FunctionError::Coercion {
            attribute: self.name.clone(),
            expected: self.ty.name().to_string(),
            value: value.to_string(),
        })
    }
}

/// The value's only significant token, if it has exactly one, detached
/// from its position in the attribute text.
fn single_token(value: &str) -> Option<Token> {
    let mut tokens = tokenize(value.trim());
    tokens.retain(|t| !t.kind().is_insignificant());
    match tokens.len() {
        1 => tokens.pop().map(|t| t.with_span(Span::default())),
        _ => None,
    }
}
