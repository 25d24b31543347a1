//! Top-level error type.

use thiserror::Error;

use crate::interpreter::RuntimeError;
use crate::lexer::LexError;
use crate::parser::ParseError;
use crate::types::Position;

/// Any error produced while turning source text into output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl Error {
    /// Where in the template the error was detected, when known.
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::Lex(e) => Some(e.position),
            Error::Parse(e) => Some(e.position),
            Error::Runtime(e) => e.position,
        }
    }

    /// The error message without its position suffix.
    pub fn message(&self) -> String {
        match self {
            Error::Lex(e) => e.message.clone(),
            Error::Parse(e) => format!("expected {}, found {}", e.expected, e.found),
            Error::Runtime(e) => e.kind.to_string(),
        }
    }
}
