//! Position-tracking cursor over template source, with the small winnow
//! scanners the dialect lexers are built from.

use winnow::ascii::digit1;
use winnow::combinator::opt;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

use crate::types::Position;

/// A cursor over source text that keeps line and column up to date.
///
/// Cursors are `Copy`, so lookahead is done on a copy that is assigned back
/// once the lookahead commits.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    source: &'a str,
    rest: &'a str,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            rest: source,
            line: 1,
            column: 1,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn rest(&self) -> &'a str {
        self.rest
    }

    /// Byte offset of the cursor in the source.
    pub fn offset(&self) -> usize {
        self.source.len() - self.rest.len()
    }

    pub fn position(&self) -> Position {
        Position::new(self.offset(), self.line, self.column)
    }

    pub fn is_eof(&self) -> bool {
        self.rest.is_empty()
    }

    pub fn at_line_start(&self) -> bool {
        self.column == 1
    }

    pub fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    pub fn peek_second(&self) -> Option<char> {
        let mut chars = self.rest.chars();
        chars.next();
        chars.next()
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.rest.starts_with(prefix)
    }

    /// Consume one character.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.advance(c.len_utf8());
        Some(c)
    }

    /// Consume `len` bytes, which must end on a character boundary.
    pub fn advance(&mut self, len: usize) {
        let (consumed, rest) = self.rest.split_at(len);
        for c in consumed.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.rest = rest;
    }

    /// Consume `prefix` if the remaining input starts with it.
    pub fn eat(&mut self, prefix: &str) -> bool {
        if self.starts_with(prefix) {
            self.advance(prefix.len());
            true
        } else {
            false
        }
    }

    /// Run a winnow parser on the remaining input, consuming what it matched
    /// on success and nothing on failure.
    pub fn parse<O, P>(&mut self, mut parser: P) -> Option<O>
    where
        P: Parser<&'a str, O, ErrMode<ContextError>>,
    {
        let mut input = self.rest;
        let output = parser.parse_next(&mut input).ok()?;
        let consumed = self.rest.len() - input.len();
        self.advance(consumed);
        Some(output)
    }
}

/// Check if a character can start an identifier.
pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier.
pub(crate) fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse an identifier.
pub(crate) fn identifier<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (one_of(is_ident_start), take_while(0.., is_ident_continue))
        .take()
        .parse_next(input)
}

/// Parse a decimal number: digits with an optional fraction.
pub(crate) fn number<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (digit1, opt(('.', digit1))).take().parse_next(input)
}

/// Parse an unsigned integer.
pub(crate) fn integer<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    digit1.parse_next(input)
}

/// Parse optional spaces and tabs.
pub(crate) fn blanks<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(0.., [' ', '\t']).parse_next(input)
}

/// Parse a run of plain text up to (not including) any of `stops`.
pub(crate) fn text_run<'i>(input: &mut &'i str, stops: &[char]) -> ModalResult<&'i str> {
    take_till(1.., |c: char| stops.contains(&c)).parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_tracks_lines_and_columns() {
        let mut cursor = Cursor::new("ab\ncd");
        cursor.advance(4);
        assert_eq!(cursor.position(), Position::new(4, 2, 2));
    }

    #[test]
    fn failed_parse_consumes_nothing() {
        let mut cursor = Cursor::new("9abc");
        assert_eq!(cursor.parse(identifier), None);
        assert_eq!(cursor.offset(), 0);
        assert_eq!(cursor.parse(number), Some("9"));
        assert_eq!(cursor.parse(identifier), Some("abc"));
    }

    #[test]
    fn number_fraction_is_optional() {
        let mut cursor = Cursor::new("12.5.x");
        assert_eq!(cursor.parse(number), Some("12.5"));
        let mut cursor = Cursor::new("3.name");
        assert_eq!(cursor.parse(number), Some("3"));
    }
}
