//! Token types shared by both dialect scanners.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::types::{Position, format_number};

/// A token produced by the lexer.
///
/// `lexeme` holds the token's source text, except for [`TokenKind::Text`]
/// where it holds the text to emit (escapes resolved, trimming applied).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            position,
        }
    }
}

/// The kind of a token.
///
/// Structural tokens are dialect-neutral: `${`, `{{` and a short `$` all
/// open an interpolation; an `@` directive line and a `{% %}` tag both
/// produce a block.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Literal template text.
    Text,
    /// `${`, `{{`, or the `$` of a short interpolation.
    InterpolationStart,
    /// `}`, `}}`, or the end of a short interpolation.
    InterpolationEnd,
    /// `@` of a directive line, or `{%`.
    BlockStart,
    /// End of a directive line, or `%}`.
    BlockEnd,
    Identifier,
    Number(f64),
    String(String),
    Dot,
    Comma,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    Pipe,
    Tilde,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Assign,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AndAnd,
    OrOr,
    Eof,
}

impl TokenKind {
    /// Source spelling of a punctuation token.
    pub fn symbol(&self) -> Option<&'static str> {
        let symbol = match self {
            TokenKind::Dot => ".",
            TokenKind::Comma => ",",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::Pipe => "|",
            TokenKind::Tilde => "~",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Bang => "!",
            TokenKind::Assign => "=",
            TokenKind::Equal => "==",
            TokenKind::NotEqual => "!=",
            TokenKind::Less => "<",
            TokenKind::LessEqual => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEqual => ">=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            _ => return None,
        };
        Some(symbol)
    }
}

/// Describes a token for "found ..." parts of error messages.
impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if let Some(symbol) = self.kind.symbol() {
            return write!(f, "`{symbol}`");
        }
        match &self.kind {
            TokenKind::Text => f.write_str("text"),
            TokenKind::InterpolationStart => write!(f, "`{}`", self.lexeme),
            TokenKind::InterpolationEnd => f.write_str("end of interpolation"),
            TokenKind::BlockStart => f.write_str("start of directive"),
            TokenKind::BlockEnd => f.write_str("end of directive"),
            TokenKind::Identifier => write!(f, "`{}`", self.lexeme),
            TokenKind::Number(n) => write!(f, "number `{}`", format_number(*n)),
            TokenKind::String(s) => write!(f, "string {s:?}"),
            TokenKind::Eof => f.write_str("end of input"),
            _ => write!(f, "`{}`", self.lexeme),
        }
    }
}
