//! Luma template parser.
//!
//! Recursive descent over the lexer's token stream. Both dialects produce
//! the same AST; dialect only affects which block keywords are accepted and
//! how errors name them.

pub mod ast;
pub mod error;
mod expression;
mod template;

pub use ast::*;
pub use error::ParseError;
pub use template::{MAX_NESTING, MAX_OPERATORS, parse_tokens};
