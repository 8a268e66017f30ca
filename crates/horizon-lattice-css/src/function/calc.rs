//! `calc()` expression evaluation.
//!
//! Arguments arrive with nested functions already resolved, so the
//! expression is made of numbers, percentages, dimensions, the four
//! operators and parentheses.

use super::UnitConverter;
use crate::error::FunctionError;
use crate::syntax::{Token, TokenKind};

type CalcResult<T> = std::result::Result<T, FunctionError>;

/// Deepest allowed run of nested parentheses and signs.
const MAX_NESTING: usize = 64;

#[derive(Clone, Debug, PartialEq)]
enum Unit {
    Number,
    Percent,
    Dimension(String),
}

impl Unit {
    fn name(&self) -> &str {
        match self {
            Unit::Number => "",
            Unit::Percent => "%",
            Unit::Dimension(unit) => unit,
        }
    }

    fn same(&self, other: &Unit) -> bool {
        match (self, other) {
            (Unit::Dimension(a), Unit::Dimension(b)) => a.eq_ignore_ascii_case(b),
            _ => self == other,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Quantity {
    value: f64,
    unit: Unit,
}

impl Quantity {
    fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    fn into_token(self) -> Token {
        match self.unit {
            Unit::Number => Token::number(self.value),
            Unit::Percent => Token::percentage(self.value),
            Unit::Dimension(unit) => Token::dimension(self.value, unit),
        }
    }
}

/// Evaluate a resolved `calc()` argument list to a single numeric token.
///
/// The left operand's unit wins; the right operand is converted to it.
pub(crate) fn evaluate(tokens: &[Token], converter: &dyn UnitConverter) -> CalcResult<Token> {
    let tokens: Vec<&Token> = tokens
        .iter()
        .filter(|t| !t.kind().is_insignificant())
        .collect();
    if tokens.is_empty() {
        return Err(FunctionError::calc("empty expression"));
    }

    let mut calc = Calc {
        tokens,
        pos: 0,
        nesting: 0,
        converter,
    };
    let result = calc.sum()?;
    if let Some(token) = calc.tokens.get(calc.pos) {
        return Err(FunctionError::calc(format!("unexpected '{token}' in expression")));
    }
    if !result.value.is_finite() {
        return Err(FunctionError::calc("result is not a finite number"));
    }
    Ok(result.into_token())
}

struct Calc<'a> {
    tokens: Vec<&'a Token>,
    pos: usize,
    nesting: usize,
    converter: &'a dyn UnitConverter,
}

impl Calc<'_> {
    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind())
    }

    fn sum(&mut self) -> CalcResult<Quantity> {
        let mut left = self.product()?;
        loop {
            let sign = match self.peek() {
                Some(TokenKind::Delim('+')) => 1.0,
                Some(TokenKind::Delim('-')) => -1.0,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.product()?;
            left = self.add(left, right, sign)?;
        }
    }

    fn product(&mut self) -> CalcResult<Quantity> {
        let mut left = self.unary()?;
        loop {
            match self.peek() {
                Some(TokenKind::Delim('*')) => {
                    self.pos += 1;
                    let right = self.unary()?;
                    left = multiply(left, right)?;
                }
                Some(TokenKind::Delim('/')) => {
                    self.pos += 1;
                    let right = self.unary()?;
                    left = self.divide(left, right)?;
                }
                _ => return Ok(left),
            }
        }
    }

    fn unary(&mut self) -> CalcResult<Quantity> {
        if self.nesting >= MAX_NESTING {
            return Err(FunctionError::calc("expression nested too deeply"));
        }
        self.nesting += 1;
        let result = self.operand();
        self.nesting -= 1;
        result
    }

    fn operand(&mut self) -> CalcResult<Quantity> {
        let Some(token) = self.tokens.get(self.pos).copied() else {
            return Err(FunctionError::calc("unexpected end of expression"));
        };
        self.pos += 1;
        let value = token.number_value().unwrap_or_default();
        match token.kind() {
            TokenKind::Number => Ok(Quantity::new(value, Unit::Number)),
            TokenKind::Percentage => Ok(Quantity::new(value, Unit::Percent)),
            TokenKind::Dimension => Ok(Quantity::new(
                value,
                Unit::Dimension(token.string_value().unwrap_or_default().to_string()),
            )),
            TokenKind::LeftParen => {
                let inner = self.sum()?;
                match self.tokens.get(self.pos) {
                    Some(t) if t.kind() == TokenKind::RightParen => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    Some(t) => Err(FunctionError::calc(format!("expected ')' but found '{t}'"))),
                    None => Err(FunctionError::calc("missing ')'")),
                }
            }
            TokenKind::Delim('-') => {
                let mut operand = self.unary()?;
                operand.value = -operand.value;
                Ok(operand)
            }
            TokenKind::Delim('+') => self.unary(),
            _ => Err(FunctionError::calc(format!("unexpected '{token}' in expression"))),
        }
    }

    /// Express `right` in `left`'s unit.
    fn convert(&self, left: &Quantity, right: &Quantity) -> CalcResult<f64> {
        self.converter
            .convert(right.value, right.unit.name(), left.unit.name())
            .ok_or_else(|| {
                FunctionError::calc(format!(
                    "incompatible units '{}' and '{}'",
                    left.unit.name(),
                    right.unit.name()
                ))
            })
    }

    fn add(&self, left: Quantity, right: Quantity, sign: f64) -> CalcResult<Quantity> {
        if left.unit.same(&right.unit) || right.unit == Unit::Number {
            return Ok(Quantity::new(left.value + sign * right.value, left.unit));
        }
        if left.unit == Unit::Number {
            return Ok(Quantity::new(left.value + sign * right.value, right.unit));
        }
        let converted = self.convert(&left, &right)?;
        Ok(Quantity::new(left.value + sign * converted, left.unit))
    }

    fn divide(&self, left: Quantity, right: Quantity) -> CalcResult<Quantity> {
        if right.value == 0.0 {
            return Err(FunctionError::calc("division by zero"));
        }
        if right.unit == Unit::Number {
            return Ok(Quantity::new(left.value / right.value, left.unit));
        }
        if left.unit == Unit::Number {
            return Err(FunctionError::calc(format!(
                "cannot divide a number by '{}'",
                right.unit.name()
            )));
        }
        let divisor = self.convert(&left, &right)?;
        if divisor == 0.0 {
            return Err(FunctionError::calc("division by zero"));
        }
        Ok(Quantity::new(left.value / divisor, Unit::Number))
    }
}

fn multiply(left: Quantity, right: Quantity) -> CalcResult<Quantity> {
    match (&left.unit, &right.unit) {
        (_, Unit::Number) => Ok(Quantity::new(left.value * right.value, left.unit)),
        (Unit::Number, _) => Ok(Quantity::new(left.value * right.value, right.unit)),
        _ => Err(FunctionError::calc(format!(
            "cannot multiply '{}' by '{}'",
            left.unit.name(),
            right.unit.name()
        ))),
    }
}
