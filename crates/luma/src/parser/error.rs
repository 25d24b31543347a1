//! Parse error type.

use thiserror::Error;

use crate::lexer::Token;
use crate::types::Position;

/// A syntax error: what the parser expected and what it found instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, found {found} at {position}")]
pub struct ParseError {
    pub position: Position,
    pub expected: String,
    pub found: String,
}

impl ParseError {
    pub fn new(position: Position, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self {
            position,
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// An error at `token`, described with its display form.
    pub(crate) fn unexpected(token: &Token, expected: impl Into<String>) -> Self {
        Self::new(token.position, expected, token.to_string())
    }
}
