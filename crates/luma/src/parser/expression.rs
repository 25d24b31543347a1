//! Expression sub-grammar.
//!
//! Precedence, loosest first: `or`/`||`, `and`/`&&`, comparisons and filter
//! pipes (one left-associative level), `+ -`, `~`, `* / %`, unary
//! `! not -`, then primaries.

use crate::lexer::{Token, TokenKind};
use crate::parser::ast::{BinaryOp, Expr, ExprKind, FilterCall, PathSegment, UnaryOp};
use crate::parser::error::ParseError;
use crate::parser::template::Parser;
use crate::types::Value;

const RESERVED: &[&str] = &["and", "or", "not", "in"];

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr {
        position: left.position,
        kind: ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
    }
}

/// The value of a keyword literal.
fn keyword_literal(name: &str) -> Option<Value> {
    match name {
        "true" | "True" => Some(Value::Bool(true)),
        "false" | "False" => Some(Value::Bool(false)),
        "null" | "none" | "None" => Some(Value::Null),
        _ => None,
    }
}

fn comparison_operator(token: &Token) -> Option<BinaryOp> {
    match token.kind {
        TokenKind::Equal => Some(BinaryOp::Equal),
        TokenKind::NotEqual => Some(BinaryOp::NotEqual),
        TokenKind::Less => Some(BinaryOp::Less),
        TokenKind::LessEqual => Some(BinaryOp::LessEqual),
        TokenKind::Greater => Some(BinaryOp::Greater),
        TokenKind::GreaterEqual => Some(BinaryOp::GreaterEqual),
        _ => None,
    }
}

impl Parser<'_> {
    /// Parse a complete expression, resetting the per-expression operator
    /// budget.
    pub(super) fn parse_root_expression(&mut self) -> Result<Expr, ParseError> {
        self.operators = 0;
        self.parse_expression()
    }

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    /// Consume a logical operator spelled as a symbol or a keyword.
    fn eat_logical(&mut self, symbol: &TokenKind, keyword: &str) -> Result<bool, ParseError> {
        if self.check(symbol) || self.check_keyword(keyword) {
            let position = self.advance().position;
            self.count_operator(position)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.eat_logical(&TokenKind::OrOr, "or")? {
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comparison()?;
        while self.eat_logical(&TokenKind::AndAnd, "and")? {
            let right = self.parse_comparison()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    /// Comparisons and filter pipes share one level, so both
    /// `items | length > 2` and `a == b | string` read left to right.
    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let token = self.peek();
            if token.kind == TokenKind::Pipe {
                self.advance();
                self.count_operator(token.position)?;
                let filter = self.parse_filter_call()?;
                left = Expr {
                    position: left.position,
                    kind: ExprKind::Filter {
                        base: Box::new(left),
                        filter,
                    },
                };
            } else if let Some(op) = comparison_operator(token) {
                self.advance();
                self.count_operator(token.position)?;
                let right = self.parse_additive()?;
                left = binary(op, left, right);
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_concat()?;
        loop {
            let token = self.peek();
            let op = match token.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                _ => return Ok(left),
            };
            self.advance();
            self.count_operator(token.position)?;
            let right = self.parse_concat()?;
            left = binary(op, left, right);
        }
    }

    fn parse_concat(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        while self.check(&TokenKind::Tilde) {
            let position = self.advance().position;
            self.count_operator(position)?;
            let right = self.parse_multiplicative()?;
            left = Expr {
                position: left.position,
                kind: ExprKind::Concat(Box::new(left), Box::new(right)),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let token = self.peek();
            let op = match token.kind {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                TokenKind::Percent => BinaryOp::Modulo,
                _ => return Ok(left),
            };
            self.advance();
            self.count_operator(token.position)?;
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek();
        let op = if token.kind == TokenKind::Bang || self.check_keyword("not") {
            UnaryOp::Not
        } else if token.kind == TokenKind::Minus {
            UnaryOp::Negate
        } else {
            return self.parse_primary();
        };
        self.advance();
        self.count_operator(token.position)?;
        self.enter(token.position)?;
        let operand = self.parse_unary()?;
        self.leave();

        if op == UnaryOp::Negate
            && let ExprKind::Literal(Value::Number(n)) = operand.kind
        {
            return Ok(Expr {
                kind: ExprKind::Literal(Value::Number(-n)),
                position: token.position,
            });
        }
        Ok(Expr {
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            position: token.position,
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek();
        let position = token.position;
        let literal = |value| {
            Ok(Expr {
                kind: ExprKind::Literal(value),
                position,
            })
        };
        match &token.kind {
            TokenKind::Number(n) => {
                self.advance();
                literal(Value::Number(*n))
            }
            TokenKind::String(s) => {
                self.advance();
                literal(Value::String(s.clone()))
            }
            TokenKind::Identifier => {
                if let Some(value) = keyword_literal(&token.lexeme) {
                    self.advance();
                    return literal(value);
                }
                if RESERVED.contains(&token.lexeme.as_str()) {
                    return Err(ParseError::unexpected(token, "an expression"));
                }
                self.parse_path()
            }
            TokenKind::LeftParen => {
                self.advance();
                self.enter(position)?;
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RightParen, "`)`")?;
                self.leave();
                Ok(inner)
            }
            _ => Err(ParseError::unexpected(token, "an expression")),
        }
    }

    /// Parse `name(.field | [index])*`.
    fn parse_path(&mut self) -> Result<Expr, ParseError> {
        let root = self.advance();
        let mut segments = Vec::new();
        loop {
            if self.eat(&TokenKind::Dot) {
                let field = self.expect_identifier("a field name")?;
                segments.push(PathSegment::Field(field.lexeme.clone()));
            } else if self.eat(&TokenKind::LeftBracket) {
                let index = self.advance();
                let segment = match &index.kind {
                    TokenKind::Number(n) if n.fract() == 0.0 && *n >= 0.0 => {
                        PathSegment::Index(*n as usize)
                    }
                    TokenKind::String(key) => PathSegment::Key(key.clone()),
                    _ => {
                        return Err(ParseError::unexpected(
                            index,
                            "a non-negative integer or string index",
                        ));
                    }
                };
                self.expect(&TokenKind::RightBracket, "`]`")?;
                segments.push(segment);
            } else {
                break;
            }
        }
        Ok(Expr {
            kind: ExprKind::Path {
                root: root.lexeme.clone(),
                segments,
            },
            position: root.position,
        })
    }

    /// Parse `name` or `name(literal, ...)` after a pipe.
    fn parse_filter_call(&mut self) -> Result<FilterCall, ParseError> {
        let name = self.expect_identifier("a filter name")?;
        let mut args = Vec::new();
        if self.eat(&TokenKind::LeftParen) && !self.eat(&TokenKind::RightParen) {
            loop {
                args.push(self.parse_filter_argument()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RightParen, "`,` or `)`")?;
        }
        Ok(FilterCall {
            name: name.lexeme.clone(),
            args,
            position: name.position,
        })
    }

    /// Filter arguments are literals: strings, numbers (optionally
    /// negative), booleans and null.
    fn parse_filter_argument(&mut self) -> Result<Value, ParseError> {
        let token = self.advance();
        match &token.kind {
            TokenKind::Number(n) => Ok(Value::Number(*n)),
            TokenKind::String(s) => Ok(Value::String(s.clone())),
            TokenKind::Minus => match self.peek().kind {
                TokenKind::Number(n) => {
                    self.advance();
                    Ok(Value::Number(-n))
                }
                _ => Err(ParseError::unexpected(self.peek(), "a number")),
            },
            TokenKind::Identifier => keyword_literal(&token.lexeme)
                .ok_or_else(|| ParseError::unexpected(token, "a literal filter argument")),
            _ => Err(ParseError::unexpected(token, "a literal filter argument")),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::tokenize;
    use crate::parser::ast::{BinaryOp, ExprKind, Node, PathSegment};
    use crate::parser::parse_tokens;
    use crate::types::Value;

    fn interpolated(source: &str) -> (ExprKind, Vec<String>) {
        let template = parse_tokens(&tokenize(source).unwrap()).unwrap();
        match template.nodes.into_iter().next() {
            Some(Node::Interpolation { expr, filters, .. }) => {
                (expr.kind, filters.into_iter().map(|f| f.name).collect())
            }
            other => panic!("expected interpolation, got {other:?}"),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let (kind, _) = interpolated("${ 1 + 2 * 3 }");
        let ExprKind::Binary { op, right, .. } = kind else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(
            right.kind,
            ExprKind::Binary {
                op: BinaryOp::Multiply,
                ..
            }
        ));
    }

    #[test]
    fn trailing_pipeline_is_split_off() {
        let (kind, filters) = interpolated("${ name | lower | upper }");
        assert!(matches!(kind, ExprKind::Path { .. }));
        assert_eq!(filters, vec!["lower", "upper"]);
    }

    #[test]
    fn pipe_binds_tighter_than_or() {
        let (kind, filters) = interpolated("${ a or b | upper }");
        assert!(filters.is_empty());
        let ExprKind::Binary { op, right, .. } = kind else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Or);
        assert!(matches!(right.kind, ExprKind::Filter { .. }));
    }

    #[test]
    fn paths_mix_fields_and_indices() {
        let (kind, _) = interpolated("${ a.b[0][\"k\"] }");
        assert_eq!(
            kind,
            ExprKind::Path {
                root: "a".into(),
                segments: vec![
                    PathSegment::Field("b".into()),
                    PathSegment::Index(0),
                    PathSegment::Key("k".into()),
                ],
            }
        );
    }

    #[test]
    fn negative_literals_fold() {
        let (kind, _) = interpolated("${ -2 }");
        assert_eq!(kind, ExprKind::Literal(Value::Number(-2.0)));
    }
}
