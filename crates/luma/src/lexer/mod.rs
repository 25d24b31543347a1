//! Template lexer.
//!
//! Classifies a template into one of the two dialects and turns it into a
//! flat token stream. Text between constructs becomes [`TokenKind::Text`]
//! tokens; each construct becomes an opener token, its expression tokens
//! and a closer token.

mod cursor;
mod error;
mod expression;
mod jinja;
mod native;
mod token;
mod trim;

use std::str::FromStr;
use std::{fmt, mem};

pub use error::LexError;
pub use token::{Token, TokenKind};

use crate::types::Position;

/// Keywords recognised as native directives at the start of a line.
pub(crate) const DIRECTIVE_KEYWORDS: &[&str] = &["if", "elif", "else", "for", "end", "let"];

/// The syntax a host asks for: a fixed dialect, or detection from the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Syntax {
    #[default]
    Auto,
    Native,
    Jinja,
}

impl Syntax {
    /// Resolve to a concrete dialect for `source`.
    pub fn resolve(self, source: &str) -> Dialect {
        match self {
            Syntax::Auto => Dialect::detect(source),
            Syntax::Native => Dialect::Native,
            Syntax::Jinja => Dialect::Jinja,
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Syntax::Auto => "auto",
            Syntax::Native => "native",
            Syntax::Jinja => "jinja",
        })
    }
}

impl FromStr for Syntax {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Syntax::Auto),
            "native" | "luma" => Ok(Syntax::Native),
            "jinja" => Ok(Syntax::Jinja),
            other => Err(format!(
                "unknown syntax '{other}', expected auto, native or jinja"
            )),
        }
    }
}

/// The dialect a template is written in. Fixed for the whole template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// `$name`, `${ expr }` and `@directive` lines.
    Native,
    /// `{{ expr }}`, `{% tag %}` and `{# comment #}`.
    Jinja,
}

impl Dialect {
    /// Classify `source`: any `{{` or `{%` makes it a Jinja template.
    pub fn detect(source: &str) -> Dialect {
        if source.contains("{{") || source.contains("{%") {
            Dialect::Jinja
        } else {
            Dialect::Native
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Native => "native",
            Dialect::Jinja => "jinja",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tokens of one template together with the dialect they were scanned in.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenStream {
    pub dialect: Dialect,
    pub tokens: Vec<Token>,
}

/// Tokenize `source`, detecting its dialect.
pub fn tokenize(source: &str) -> Result<TokenStream, LexError> {
    tokenize_with(source, Syntax::Auto)
}

/// Tokenize `source` in the dialect selected by `syntax`.
pub fn tokenize_with(source: &str, syntax: Syntax) -> Result<TokenStream, LexError> {
    let dialect = syntax.resolve(source);
    let tokens = match dialect {
        Dialect::Native => native::tokenize_native(source)?,
        Dialect::Jinja => jinja::tokenize_jinja(source)?,
    };
    Ok(TokenStream { dialect, tokens })
}

/// Accumulates literal text between constructs into a single token.
#[derive(Debug, Default)]
pub(crate) struct TextBuffer {
    text: String,
    start: Option<Position>,
}

impl TextBuffer {
    pub fn push(&mut self, c: char, position: Position) {
        self.start.get_or_insert(position);
        self.text.push(c);
    }

    pub fn push_str(&mut self, s: &str, position: Position) {
        if s.is_empty() {
            return;
        }
        self.start.get_or_insert(position);
        self.text.push_str(s);
    }

    /// Drop the last `len` bytes of buffered text (standalone-tag
    /// indentation).
    pub fn trim_trailing(&mut self, len: usize) {
        let keep = self.text.len().saturating_sub(len);
        self.text.truncate(keep);
    }

    /// Emit the buffered text as a token, if there is any.
    pub fn flush(&mut self, tokens: &mut Vec<Token>) {
        let start = self.start.take();
        if self.text.is_empty() {
            return;
        }
        let text = mem::take(&mut self.text);
        tokens.push(Token::new(
            TokenKind::Text,
            text,
            start.unwrap_or(Position::START),
        ));
    }
}
