//! Template parser: turns a token stream into a [`Template`].
//!
//! Block structure is tracked with an explicit stack of open blocks so that
//! unmatched closers and unterminated blocks are reported at the right
//! place, in the vocabulary of the template's dialect.

use crate::lexer::{Dialect, Token, TokenKind, TokenStream};
use crate::parser::ast::{Branch, Expr, ExprKind, FilterCall, Node, Template};
use crate::parser::error::ParseError;
use crate::types::Position;

/// Maximum combined nesting of blocks, parentheses and unary operators.
pub const MAX_NESTING: usize = 128;

/// Maximum number of operators in a single expression.
pub const MAX_OPERATORS: usize = 512;

static EOF: Token = Token {
    kind: TokenKind::Eof,
    lexeme: String::new(),
    position: Position::START,
};

/// Parse a token stream into a template.
pub fn parse_tokens(stream: &TokenStream) -> Result<Template, ParseError> {
    let mut parser = Parser {
        tokens: &stream.tokens,
        index: 0,
        dialect: stream.dialect,
        open_blocks: Vec::new(),
        depth: 0,
        operators: 0,
    };
    parser.parse_template()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    If,
    For,
}

#[derive(Debug, Clone, Copy)]
struct OpenBlock {
    kind: BlockKind,
    position: Position,
}

/// Why a node sequence stopped.
enum Boundary {
    Eof,
    /// A tag that continues or closes the enclosing block; its keyword has
    /// been consumed, its clause has not.
    Tag { keyword: String, position: Position },
}

pub(super) struct Parser<'t> {
    tokens: &'t [Token],
    index: usize,
    dialect: Dialect,
    open_blocks: Vec<OpenBlock>,
    pub(super) depth: usize,
    pub(super) operators: usize,
}

impl<'t> Parser<'t> {
    // -- token access --

    pub(super) fn peek(&self) -> &'t Token {
        self.tokens.get(self.index).unwrap_or(&EOF)
    }

    pub(super) fn peek_at(&self, ahead: usize) -> &'t Token {
        self.tokens.get(self.index + ahead).unwrap_or(&EOF)
    }

    pub(super) fn advance(&mut self) -> &'t Token {
        let token = self.peek();
        if self.index < self.tokens.len() {
            self.index += 1;
        }
        token
    }

    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        self.peek().kind == *kind
    }

    pub(super) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<&'t Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::unexpected(self.peek(), expected))
        }
    }

    pub(super) fn check_keyword(&self, keyword: &str) -> bool {
        let token = self.peek();
        token.kind == TokenKind::Identifier && token.lexeme == keyword
    }

    pub(super) fn expect_identifier(&mut self, expected: &str) -> Result<&'t Token, ParseError> {
        self.expect(&TokenKind::Identifier, expected)
    }

    // -- nesting guard --

    fn check_nesting(&self, position: Position) -> Result<(), ParseError> {
        if self.depth + self.open_blocks.len() >= MAX_NESTING {
            return Err(ParseError::new(
                position,
                format!("at most {MAX_NESTING} nested levels"),
                "deeper nesting",
            ));
        }
        Ok(())
    }

    pub(super) fn enter(&mut self, position: Position) -> Result<(), ParseError> {
        self.check_nesting(position)?;
        self.depth += 1;
        Ok(())
    }

    pub(super) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(super) fn count_operator(&mut self, position: Position) -> Result<(), ParseError> {
        self.operators += 1;
        if self.operators > MAX_OPERATORS {
            return Err(ParseError::new(
                position,
                format!("at most {MAX_OPERATORS} operators in one expression"),
                "more",
            ));
        }
        Ok(())
    }

    // -- dialect vocabulary --

    fn tag_text(&self, keyword: &str) -> String {
        match self.dialect {
            Dialect::Native => format!("`@{keyword}`"),
            Dialect::Jinja => format!("`{{% {keyword} %}}`"),
        }
    }

    fn closer_text(&self, kind: BlockKind) -> String {
        match (self.dialect, kind) {
            (Dialect::Native, _) => self.tag_text("end"),
            (Dialect::Jinja, BlockKind::If) => self.tag_text("endif"),
            (Dialect::Jinja, BlockKind::For) => self.tag_text("endfor"),
        }
    }

    fn block_end_text(&self) -> &'static str {
        match self.dialect {
            Dialect::Native => "end of line",
            Dialect::Jinja => "`%}`",
        }
    }

    fn closes(keyword: &str, kind: BlockKind) -> bool {
        matches!(
            (keyword, kind),
            ("end", _) | ("endif", BlockKind::If) | ("endfor", BlockKind::For)
        )
    }

    // -- template structure --

    fn parse_template(&mut self) -> Result<Template, ParseError> {
        let (nodes, boundary) = self.parse_nodes()?;
        match boundary {
            Boundary::Eof => Ok(Template { nodes }),
            Boundary::Tag { keyword, position } => Err(ParseError::new(
                position,
                format!(
                    "an open {} or {} block",
                    self.tag_text("if"),
                    self.tag_text("for")
                ),
                self.tag_text(&keyword),
            )),
        }
    }

    /// Parse nodes until end of input or a tag belonging to an enclosing
    /// block.
    fn parse_nodes(&mut self) -> Result<(Vec<Node>, Boundary), ParseError> {
        let mut nodes = Vec::new();
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Text => {
                    self.advance();
                    nodes.push(Node::Text(token.lexeme.clone()));
                }
                TokenKind::InterpolationStart => nodes.push(self.parse_interpolation()?),
                TokenKind::BlockStart => {
                    self.advance();
                    let keyword = self.expect_identifier("a block keyword")?;
                    let position = token.position;
                    match (self.dialect, keyword.lexeme.as_str()) {
                        (_, "if") => nodes.push(self.parse_if(position)?),
                        (_, "for") => nodes.push(self.parse_for(position)?),
                        (Dialect::Native, "let") | (Dialect::Jinja, "set") => {
                            nodes.push(self.parse_let(position)?);
                        }
                        (_, "elif" | "else")
                        | (Dialect::Native, "end")
                        | (Dialect::Jinja, "endif" | "endfor") => {
                            let keyword = keyword.lexeme.clone();
                            return Ok((nodes, Boundary::Tag { keyword, position }));
                        }
                        _ => return Err(ParseError::unexpected(keyword, "a block keyword")),
                    }
                }
                TokenKind::Eof => return Ok((nodes, Boundary::Eof)),
                _ => {
                    return Err(ParseError::unexpected(
                        token,
                        "text, an interpolation or a block",
                    ));
                }
            }
        }
    }

    fn parse_interpolation(&mut self) -> Result<Node, ParseError> {
        let start = self.advance();
        let expr = self.parse_root_expression()?;
        let closer = match self.dialect {
            Dialect::Native => "`}`",
            Dialect::Jinja => "`}}`",
        };
        self.expect(&TokenKind::InterpolationEnd, closer)?;
        let (expr, filters) = split_filters(expr);
        Ok(Node::Interpolation {
            expr,
            filters,
            position: start.position,
        })
    }

    /// An expression followed by the end of its tag.
    fn parse_clause(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_root_expression()?;
        self.expect_block_end()?;
        Ok(expr)
    }

    fn expect_block_end(&mut self) -> Result<(), ParseError> {
        self.expect(&TokenKind::BlockEnd, self.block_end_text())?;
        Ok(())
    }

    fn open(&mut self, kind: BlockKind, position: Position) -> Result<(), ParseError> {
        self.check_nesting(position)?;
        self.open_blocks.push(OpenBlock { kind, position });
        Ok(())
    }

    fn close(&mut self) {
        self.open_blocks.pop();
    }

    /// Check that `boundary` is the closer of the innermost open block and
    /// consume the rest of its tag.
    fn expect_closer(&mut self, boundary: Boundary) -> Result<(), ParseError> {
        let Some(open) = self.open_blocks.last().copied() else {
            return Err(ParseError::unexpected(self.peek(), "an open block"));
        };
        match boundary {
            Boundary::Eof => Err(ParseError::new(
                open.position,
                self.closer_text(open.kind),
                "end of input",
            )),
            Boundary::Tag { keyword, .. } if Self::closes(&keyword, open.kind) => {
                self.expect_block_end()
            }
            Boundary::Tag { keyword, position } => Err(ParseError::new(
                position,
                self.closer_text(open.kind),
                self.tag_text(&keyword),
            )),
        }
    }

    /// Parse an `if` block. `elif` branches stay at the block's own level,
    /// so a long chain costs no extra nesting.
    fn parse_if(&mut self, position: Position) -> Result<Node, ParseError> {
        self.open(BlockKind::If, position)?;
        let mut branches = Vec::new();
        let mut branch_position = position;
        let else_body = loop {
            let condition = self.parse_clause()?;
            let (body, boundary) = self.parse_nodes()?;
            branches.push(Branch {
                condition,
                body,
                position: branch_position,
            });
            match boundary {
                Boundary::Tag { keyword, position } if keyword == "elif" => {
                    branch_position = position;
                }
                Boundary::Tag { keyword, .. } if keyword == "else" => {
                    self.expect_block_end()?;
                    let (body, boundary) = self.parse_nodes()?;
                    self.expect_closer(boundary)?;
                    break Some(body);
                }
                boundary => {
                    self.expect_closer(boundary)?;
                    break None;
                }
            }
        };
        self.close();
        Ok(Node::If {
            branches,
            else_body,
            position,
        })
    }

    fn parse_for(&mut self, position: Position) -> Result<Node, ParseError> {
        self.open(BlockKind::For, position)?;

        let first = self.expect_identifier("a loop variable")?.lexeme.clone();
        let (key, item) = if self.eat(&TokenKind::Comma) {
            let second = self.expect_identifier("a second loop variable")?;
            (Some(first), second.lexeme.clone())
        } else {
            (None, first)
        };
        if !self.check_keyword("in") {
            return Err(ParseError::unexpected(self.peek(), "`in`"));
        }
        self.advance();

        let pairs_call =
            self.check_keyword("pairs") && self.peek_at(1).kind == TokenKind::LeftParen;
        let iterable = match (key.is_some(), pairs_call) {
            (true, true) => {
                self.advance();
                self.advance();
                let expr = self.parse_root_expression()?;
                self.expect(&TokenKind::RightParen, "`)`")?;
                expr
            }
            (true, false) => {
                return Err(ParseError::unexpected(
                    self.peek(),
                    "`pairs(...)` for two loop variables",
                ));
            }
            (false, true) => {
                return Err(ParseError::unexpected(
                    self.peek(),
                    "an iterable (`pairs(...)` needs two loop variables)",
                ));
            }
            (false, false) => self.parse_root_expression()?,
        };
        self.expect_block_end()?;

        let (body, boundary) = self.parse_nodes()?;
        let else_body = match boundary {
            Boundary::Tag { keyword, .. } if keyword == "else" => {
                self.expect_block_end()?;
                let (body, boundary) = self.parse_nodes()?;
                self.expect_closer(boundary)?;
                Some(body)
            }
            boundary => {
                self.expect_closer(boundary)?;
                None
            }
        };
        self.close();

        Ok(Node::For {
            item,
            key,
            iterable,
            body,
            else_body,
            position,
        })
    }

    fn parse_let(&mut self, position: Position) -> Result<Node, ParseError> {
        let name = self.expect_identifier("a variable name")?.lexeme.clone();
        self.expect(&TokenKind::Assign, "`=`")?;
        let value = self.parse_clause()?;
        Ok(Node::Let {
            name,
            value,
            position,
        })
    }
}

/// Split the trailing filter pipeline off an interpolated expression.
fn split_filters(mut expr: Expr) -> (Expr, Vec<FilterCall>) {
    let mut filters = Vec::new();
    loop {
        match expr.kind {
            ExprKind::Filter { base, filter } => {
                filters.push(filter);
                expr = *base;
            }
            kind => {
                expr = Expr {
                    kind,
                    position: expr.position,
                };
                break;
            }
        }
    }
    filters.reverse();
    (expr, filters)
}
