//! Declaration value function evaluation.

use super::attr::AttrArgs;
use super::{UnitConverter, calc, extensions};
use crate::config::ProcessorConfig;
use crate::error::FunctionError;
use crate::logging::targets;
use crate::model::SelectorModel;
use crate::resolve::CustomProperties;
use crate::syntax::{Token, TokenKind};

type FunctionResult<T> = std::result::Result<T, FunctionError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Builtin {
    Var,
    Calc,
    Attr,
    Concat,
    Replace,
    Round,
}

/// Resolves `var()`, `calc()`, `attr()` and the extension functions in a
/// declaration's terms for one element.
///
/// Evaluation recurses with an explicit depth: every evaluated function,
/// including each `var()` substitution, is one level. Unknown functions are
/// kept with their arguments resolved and do not count.
///
/// # Example
///
/// ```ignore
/// let processor = FunctionProcessor::new(&model, &variables, &config, &converter);
/// let value = processor.process(&element, &declaration.terms)?;
/// ```
pub struct FunctionProcessor<'a, M: SelectorModel + ?Sized> {
    model: &'a M,
    variables: &'a CustomProperties,
    config: &'a ProcessorConfig,
    converter: &'a dyn UnitConverter,
}

impl<'a, M: SelectorModel + ?Sized> FunctionProcessor<'a, M> {
    /// Create a processor.
    pub fn new(
        model: &'a M,
        variables: &'a CustomProperties,
        config: &'a ProcessorConfig,
        converter: &'a dyn UnitConverter,
    ) -> Self {
        Self {
            model,
            variables,
            config,
            converter,
        }
    }

    /// Resolve every function in `tokens`.
    pub fn process(&self, element: &M::Element, tokens: &[Token]) -> FunctionResult<Vec<Token>> {
        self.process_at(element, tokens, 0)
    }

    fn builtin(&self, name: &str) -> Option<Builtin> {
        let builtin = match name.to_ascii_lowercase().as_str() {
            "var" => Builtin::Var,
            "calc" => Builtin::Calc,
            "attr" => Builtin::Attr,
            "concat" => Builtin::Concat,
            "replace" => Builtin::Replace,
            "round" => Builtin::Round,
            _ => return None,
        };
        match builtin {
            Builtin::Concat | Builtin::Replace | Builtin::Round if !self.config.extensions => None,
            builtin => Some(builtin),
        }
    }

    fn process_at(
        &self,
        element: &M::Element,
        tokens: &[Token],
        depth: usize,
    ) -> FunctionResult<Vec<Token>> {
        let mut out = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            if token.kind() != TokenKind::Function {
                out.push(token.clone());
                i += 1;
                continue;
            }
            let name = token.string_value().unwrap_or_default();
            let Some(builtin) = self.builtin(name) else {
                // Unknown functions stay; their arguments are resolved as
                // the scan continues through them.
                out.push(token.clone());
                i += 1;
                continue;
            };
            let end = closing_paren(tokens, i + 1);
            out.extend(self.evaluate(element, builtin, name, &tokens[i + 1..end], depth + 1)?);
            i = end + 1;
        }
        Ok(out)
    }

    fn evaluate(
        &self,
        element: &M::Element,
        builtin: Builtin,
        name: &str,
        args: &[Token],
        depth: usize,
    ) -> FunctionResult<Vec<Token>> {
        if depth > self.config.max_depth {
            return Err(FunctionError::RecursionLimit {
                function: name.to_ascii_lowercase(),
                max_depth: self.config.max_depth,
            });
        }
        tracing::trace!(target: targets::FUNCTION, function = name, depth, "evaluating");

        match builtin {
            Builtin::Var => self.var(element, args, depth),
            Builtin::Attr => self.attr(element, args, depth),
            Builtin::Calc => {
                let resolved = self.process_at(element, args, depth)?;
                Ok(vec![calc::evaluate(&resolved, self.converter)?])
            }
            Builtin::Concat => Ok(vec![extensions::concat(&self.arguments(element, args, depth)?)]),
            Builtin::Replace => Ok(vec![extensions::replace(&self.arguments(element, args, depth)?)?]),
            Builtin::Round => Ok(vec![extensions::round(&self.arguments(element, args, depth)?)?]),
        }
    }

    /// `var(--name [, fallback])`
    fn var(&self, element: &M::Element, args: &[Token], depth: usize) -> FunctionResult<Vec<Token>> {
        let (head, fallback) = split_first_comma(args);
        let name = match trim(head) {
            [token] if token.kind() == TokenKind::Ident => {
                token.string_value().unwrap_or_default()
            }
            _ => {
                return Err(FunctionError::invalid_arguments(
                    "var",
                    "expected a single custom property name",
                ));
            }
        };
        if !name.starts_with("--") {
            return Err(FunctionError::invalid_arguments(
                "var",
                format!("'{name}' is not a custom property"),
            ));
        }

        match (self.variables.get(name), fallback) {
            (Some(value), _) => self.process_at(element, value, depth),
            (None, Some(fallback)) => self.process_at(element, trim(fallback), depth),
            (None, None) => Err(FunctionError::UnresolvedVariable {
                name: name.to_string(),
            }),
        }
    }

    /// `attr(name [type-or-unit] [, fallback])`
    fn attr(&self, element: &M::Element, args: &[Token], depth: usize) -> FunctionResult<Vec<Token>> {
        let (head, fallback) = split_first_comma(args);
        let attr = AttrArgs::parse(head)?;
        let Some(value) = self.model.find_attribute(element, None, &attr.name) else {
            return match fallback {
                Some(fallback) => self.process_at(element, trim(fallback), depth),
                None => Ok(vec![Token::ident("none")]),
            };
        };
        match (attr.coerce(&value, self.converter), fallback) {
            (Ok(token), _) => Ok(vec![token]),
            (Err(_), Some(fallback)) => self.process_at(element, trim(fallback), depth),
            (Err(err), None) => Err(err),
        }
    }

    /// Comma-separated arguments, each resolved and trimmed.
    fn arguments(
        &self,
        element: &M::Element,
        args: &[Token],
        depth: usize,
    ) -> FunctionResult<Vec<Vec<Token>>> {
        let resolved = self.process_at(element, args, depth)?;
        if trim(&resolved).is_empty() {
            return Ok(vec![]);
        }
        Ok(split_commas(&resolved)
            .into_iter()
            .map(|arg| trim(arg).to_vec())
            .collect())
    }
}

/// Index of the `)` closing a function whose arguments start at `start`, or
/// the slice length if it is unterminated.
fn closing_paren(tokens: &[Token], start: usize) -> usize {
    let mut depth = 1usize;
    for (i, token) in tokens.iter().enumerate().skip(start) {
        match token.kind() {
            TokenKind::Function | TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    tokens.len()
}

/// Positions of top-level commas.
fn top_level_commas(tokens: &[Token]) -> impl Iterator<Item = usize> + '_ {
    let mut depth = 0usize;
    tokens.iter().enumerate().filter_map(move |(i, token)| {
        match token.kind() {
            TokenKind::Function
            | TokenKind::LeftParen
            | TokenKind::LeftBracket
            | TokenKind::LeftBrace => depth += 1,
            TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                depth = depth.saturating_sub(1);
            }
            TokenKind::Comma if depth == 0 => return Some(i),
            _ => {}
        }
        None
    })
}

fn split_first_comma(tokens: &[Token]) -> (&[Token], Option<&[Token]>) {
    match top_level_commas(tokens).next() {
        Some(i) => (&tokens[..i], Some(&tokens[i + 1..])),
        None => (tokens, None),
    }
}

fn split_commas(tokens: &[Token]) -> Vec<&[Token]> {
    let mut parts = vec![];
    let mut start = 0;
    for i in top_level_commas(tokens) {
        parts.push(&tokens[start..i]);
        start = i + 1;
    }
    parts.push(&tokens[start..]);
    parts
}

fn trim(tokens: &[Token]) -> &[Token] {
    let start = tokens
        .iter()
        .position(|t| !t.kind().is_insignificant())
        .unwrap_or(tokens.len());
    let end = tokens
        .iter()
        .rposition(|t| !t.kind().is_insignificant())
        .map_or(start, |i| i + 1);
    &tokens[start..end]
}
