//! Standalone-line detection for block tags and directives.
//!
//! A tag that is the only non-blank content of its line loses its
//! indentation and its trailing newline, so control flow does not leave
//! blank lines in the output.

use crate::lexer::cursor::Cursor;

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Byte length of the indentation before `offset`, if only blanks precede
/// `offset` on its line.
pub(crate) fn blank_prefix_len(source: &str, offset: usize) -> Option<usize> {
    let before = &source[..offset];
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let prefix = &before[line_start..];
    prefix.chars().all(is_blank).then_some(prefix.len())
}

/// Byte length of the blanks and single line ending following the cursor,
/// if nothing else follows on the line.
pub(crate) fn blank_suffix_len(rest: &str) -> Option<usize> {
    let line_end = rest.find('\n');
    let line = line_end.map_or(rest, |i| &rest[..i]);
    if !line.chars().all(|c| is_blank(c) || c == '\r') {
        return None;
    }
    Some(line_end.map_or(line.len(), |i| i + 1))
}

/// Consume the remainder of a directive line: trailing blanks, an optional
/// carriage return, and the newline.
pub(crate) fn consume_line_end(cursor: &mut Cursor<'_>) {
    if let Some(len) = blank_suffix_len(cursor.rest()) {
        cursor.advance(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_requires_only_blanks() {
        assert_eq!(blank_prefix_len("a\n  {%", 4), Some(2));
        assert_eq!(blank_prefix_len("{%", 0), Some(0));
        assert_eq!(blank_prefix_len("x {%", 2), None);
    }

    #[test]
    fn suffix_includes_newline() {
        assert_eq!(blank_suffix_len("  \nnext"), Some(3));
        assert_eq!(blank_suffix_len("\r\nnext"), Some(2));
        assert_eq!(blank_suffix_len(""), Some(0));
        assert_eq!(blank_suffix_len(" text\n"), None);
    }
}
