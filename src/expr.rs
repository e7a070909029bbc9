//! Arithmetic for amount fields: numbers, `+ - * /`, parentheses and
//! whitespace. Anything else is rejected.
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := ('+' | '-') unary | atom
//! atom   := number | '(' expr ')'
//! ```

use thiserror::Error;

/// Nesting bound for parentheses and unary signs.
const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("expression is empty")]
    Empty,
    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedChar { found: char, position: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("malformed number at position {0}")]
    BadNumber(usize),
    #[error("division by zero")]
    DivisionByZero,
    #[error("expression nests too deeply")]
    TooDeep,
    #[error("result is not a finite number")]
    NotFinite,
}

/// Evaluates `input` to a finite number.
pub fn evaluate(input: &str) -> Result<f64, ExprError> {
    let mut parser = Parser {
        chars: input.char_indices().collect(),
        pos: 0,
        depth: 0,
    };
    parser.skip_whitespace();
    if parser.peek().is_none() {
        return Err(ExprError::Empty);
    }
    let value = parser.expr()?;
    parser.skip_whitespace();
    if let Some((position, found)) = parser.current() {
        return Err(ExprError::UnexpectedChar { found, position });
    }
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ExprError::NotFinite)
    }
}

struct Parser {
    chars: Vec<(usize, char)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn current(&self) -> Option<(usize, char)> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.current().map(|(_, c)| c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn next_operator(&mut self, ops: &[char]) -> Option<char> {
        self.skip_whitespace();
        let c = self.peek().filter(|c| ops.contains(c))?;
        self.pos += 1;
        Some(c)
    }

    fn expr(&mut self) -> Result<f64, ExprError> {
        let mut value = self.term()?;
        while let Some(op) = self.next_operator(&['+', '-']) {
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ExprError> {
        let mut value = self.unary()?;
        while let Some(op) = self.next_operator(&['*', '/']) {
            let rhs = self.unary()?;
            value = if op == '*' {
                value * rhs
            } else {
                if rhs == 0.0 {
                    return Err(ExprError::DivisionByZero);
                }
                value / rhs
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, ExprError> {
        if let Some(op) = self.next_operator(&['+', '-']) {
            let value = self.nested(Self::unary)?;
            return Ok(if op == '-' { -value } else { value });
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<f64, ExprError> {
        self.skip_whitespace();
        match self.current() {
            None => Err(ExprError::UnexpectedEnd),
            Some((_, '(')) => {
                self.pos += 1;
                let value = self.nested(Self::expr)?;
                self.skip_whitespace();
                match self.current() {
                    Some((_, ')')) => {
                        self.pos += 1;
                        Ok(value)
                    }
                    Some((position, found)) => Err(ExprError::UnexpectedChar { found, position }),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            Some((_, c)) if c.is_ascii_digit() || c == '.' => self.number(),
            Some((position, found)) => Err(ExprError::UnexpectedChar { found, position }),
        }
    }

    fn number(&mut self) -> Result<f64, ExprError> {
        let start = self.pos;
        let mut text = String::new();
        while let Some(c) = self.peek().filter(|c| c.is_ascii_digit() || *c == '.') {
            text.push(c);
            self.pos += 1;
        }
        let position = self.chars[start].0;
        if text.matches('.').count() > 1 || text == "." {
            return Err(ExprError::BadNumber(position));
        }
        text.parse::<f64>().map_err(|_| ExprError::BadNumber(position))
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<f64, ExprError>,
    ) -> Result<f64, ExprError> {
        if self.depth >= MAX_DEPTH {
            return Err(ExprError::TooDeep);
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respects_precedence_and_parentheses() {
        assert_eq!(evaluate("15000+1000"), Ok(16_000.0));
        assert_eq!(evaluate("2 + 3 * 4"), Ok(14.0));
        assert_eq!(evaluate("(2 + 3) * 4"), Ok(20.0));
        assert_eq!(evaluate("100 / 4 - 5"), Ok(20.0));
        assert_eq!(evaluate("-(3 - 5)"), Ok(2.0));
        assert_eq!(evaluate(" 1.5 * 2 "), Ok(3.0));
        assert_eq!(evaluate(".5+.5"), Ok(1.0));
    }

    #[test]
    fn rejects_anything_outside_the_grammar() {
        assert_eq!(evaluate(""), Err(ExprError::Empty));
        assert_eq!(evaluate("   "), Err(ExprError::Empty));
        assert_eq!(
            evaluate("alert(1)"),
            Err(ExprError::UnexpectedChar {
                found: 'a',
                position: 0
            })
        );
        assert_eq!(
            evaluate("2 ** 3"),
            Err(ExprError::UnexpectedChar {
                found: '*',
                position: 3
            })
        );
        assert_eq!(evaluate("1.2.3"), Err(ExprError::BadNumber(0)));
        assert_eq!(evaluate("(1 + 2"), Err(ExprError::UnexpectedEnd));
        assert_eq!(evaluate("4 +"), Err(ExprError::UnexpectedEnd));
        assert_eq!(
            evaluate("1 2"),
            Err(ExprError::UnexpectedChar {
                found: '2',
                position: 2
            })
        );
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(evaluate("10 / (5 - 5)"), Err(ExprError::DivisionByZero));
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!("{}1{}", "(".repeat(40), ")".repeat(40));
        assert_eq!(evaluate(&deep), Err(ExprError::TooDeep));
        let ok = format!("{}1{}", "(".repeat(10), ")".repeat(10));
        assert_eq!(evaluate(&ok), Ok(1.0));
        assert_eq!(evaluate(&"-".repeat(100)), Err(ExprError::TooDeep));
    }
}
