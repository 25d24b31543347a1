//! Lex error type.

use thiserror::Error;

use crate::types::Position;

/// An error raised while tokenizing template source.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at {position}")]
pub struct LexError {
    pub position: Position,
    pub message: String,
}

impl LexError {
    pub fn new(position: Position, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn unterminated(opener: &str, position: Position) -> Self {
        Self::new(position, format!("unterminated `{opener}`"))
    }

    pub(crate) fn foreign_marker(marker: &str, position: Position, dialect: &str) -> Self {
        Self::new(
            position,
            format!("`{marker}` cannot be used in a {dialect} template; dialects cannot be mixed"),
        )
    }
}
