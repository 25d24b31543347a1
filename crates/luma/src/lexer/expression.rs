//! Expression tokenizer shared by both dialects.
//!
//! Scans the inside of `${ }`, `{{ }}`, `{% %}`, directive lines and filter
//! argument lists into expression tokens, stopping in front of the
//! construct's terminator.

use crate::lexer::cursor::{Cursor, identifier, is_ident_continue, is_ident_start, number};
use crate::lexer::error::LexError;
use crate::lexer::token::{Token, TokenKind};
use crate::types::Position;

/// What ends the expression being scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Terminator {
    /// `}` closing `${`.
    Brace,
    /// `}}` closing `{{`.
    DoubleBrace,
    /// `%}` closing `{%`.
    BlockClose,
    /// End of a native directive line.
    LineEnd,
    /// `)` closing a short interpolation's filter arguments.
    CloseParen,
}

impl Terminator {
    fn at(self, cursor: &Cursor<'_>) -> bool {
        match self {
            Terminator::Brace => cursor.starts_with("}"),
            Terminator::DoubleBrace => cursor.starts_with("}}"),
            Terminator::BlockClose => cursor.starts_with("%}"),
            Terminator::LineEnd => matches!(cursor.peek(), None | Some('\n')),
            Terminator::CloseParen => cursor.starts_with(")"),
        }
    }

    fn spans_lines(self) -> bool {
        !matches!(self, Terminator::LineEnd | Terminator::CloseParen)
    }
}

/// The construct an expression belongs to, for "unterminated" errors.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Opener {
    pub text: &'static str,
    pub position: Position,
}

/// Scan expression tokens into `tokens` until `terminator`.
///
/// The terminator itself is left unconsumed.
pub(crate) fn scan_expression(
    cursor: &mut Cursor<'_>,
    terminator: Terminator,
    opener: Opener,
    tokens: &mut Vec<Token>,
) -> Result<(), LexError> {
    loop {
        skip_whitespace(cursor, terminator.spans_lines());
        if terminator.at(cursor) {
            return Ok(());
        }
        if cursor.is_eof() || cursor.peek() == Some('\n') {
            return Err(LexError::unterminated(opener.text, opener.position));
        }
        tokens.push(scan_token(cursor)?);
    }
}

fn skip_whitespace(cursor: &mut Cursor<'_>, newlines: bool) {
    while let Some(c) = cursor.peek() {
        let skip = match c {
            ' ' | '\t' | '\r' => true,
            '\n' => newlines,
            _ => false,
        };
        if !skip {
            break;
        }
        cursor.bump();
    }
}

/// Scan one expression token.
pub(crate) fn scan_token(cursor: &mut Cursor<'_>) -> Result<Token, LexError> {
    let position = cursor.position();
    let Some(c) = cursor.peek() else {
        return Ok(Token::new(TokenKind::Eof, "", position));
    };

    if is_ident_start(c) {
        let name = cursor.parse(identifier).unwrap_or_default();
        return Ok(Token::new(TokenKind::Identifier, name, position));
    }
    if c.is_ascii_digit() {
        return scan_number(cursor);
    }
    if c == '\'' || c == '"' {
        return scan_string(cursor);
    }

    let two = [
        ("==", TokenKind::Equal),
        ("!=", TokenKind::NotEqual),
        ("<=", TokenKind::LessEqual),
        (">=", TokenKind::GreaterEqual),
        ("&&", TokenKind::AndAnd),
        ("||", TokenKind::OrOr),
    ];
    for (symbol, kind) in two {
        if cursor.eat(symbol) {
            return Ok(Token::new(kind, symbol, position));
        }
    }

    let kind = match c {
        '.' => TokenKind::Dot,
        ',' => TokenKind::Comma,
        '[' => TokenKind::LeftBracket,
        ']' => TokenKind::RightBracket,
        '(' => TokenKind::LeftParen,
        ')' => TokenKind::RightParen,
        '|' => TokenKind::Pipe,
        '~' => TokenKind::Tilde,
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Star,
        '/' => TokenKind::Slash,
        '%' => TokenKind::Percent,
        '!' => TokenKind::Bang,
        '=' => TokenKind::Assign,
        '<' => TokenKind::Less,
        '>' => TokenKind::Greater,
        other => {
            return Err(LexError::new(
                position,
                format!("unexpected character '{other}'"),
            ));
        }
    };
    cursor.bump();
    Ok(Token::new(kind, c.to_string(), position))
}

/// Scan a number literal, rejecting identifiers that start with a digit.
pub(crate) fn scan_number(cursor: &mut Cursor<'_>) -> Result<Token, LexError> {
    let position = cursor.position();
    let start = cursor.offset();
    let text = cursor.parse(number).unwrap_or_default();
    if cursor.peek().is_some_and(is_ident_continue) {
        cursor.parse(identifier);
        let lexeme = &cursor.source()[start..cursor.offset()];
        return Err(LexError::new(
            position,
            format!("invalid identifier `{lexeme}`"),
        ));
    }
    let value: f64 = text
        .parse()
        .map_err(|_| LexError::new(position, format!("invalid number `{text}`")))?;
    Ok(Token::new(TokenKind::Number(value), text, position))
}

/// Scan a single- or double-quoted string literal, resolving escapes.
pub(crate) fn scan_string(cursor: &mut Cursor<'_>) -> Result<Token, LexError> {
    let position = cursor.position();
    let start = cursor.offset();
    let quote = cursor.bump().unwrap_or('"');
    let mut value = String::new();
    loop {
        let escape_position = cursor.position();
        match cursor.bump() {
            None | Some('\n') => {
                return Err(LexError::new(position, "unterminated string literal"));
            }
            Some(c) if c == quote => break,
            Some('\\') => {
                let resolved = match cursor.bump() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('r') => '\r',
                    Some('0') => '\0',
                    Some('\\') => '\\',
                    Some('\'') => '\'',
                    Some('"') => '"',
                    Some(other) => {
                        return Err(LexError::new(
                            escape_position,
                            format!("invalid escape sequence '\\{other}' in string literal"),
                        ));
                    }
                    None => {
                        return Err(LexError::new(position, "unterminated string literal"));
                    }
                };
                value.push(resolved);
            }
            Some(c) => value.push(c),
        }
    }
    let lexeme = &cursor.source()[start..cursor.offset()];
    Ok(Token::new(TokenKind::String(value), lexeme, position))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str, terminator: Terminator) -> Result<Vec<TokenKind>, LexError> {
        let mut cursor = Cursor::new(source);
        let mut tokens = Vec::new();
        let opener = Opener {
            text: "${",
            position: Position::START,
        };
        scan_expression(&mut cursor, terminator, opener, &mut tokens)?;
        Ok(tokens.into_iter().map(|t| t.kind).collect())
    }

    #[test]
    fn scans_operators_longest_first() {
        let kinds = scan("a <= 1 && !b }", Terminator::Brace).unwrap();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::LessEqual,
                TokenKind::Number(1.0),
                TokenKind::AndAnd,
                TokenKind::Bang,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn percent_before_block_close_is_terminator() {
        let kinds = scan("a % 2 %}", Terminator::BlockClose).unwrap();
        assert_eq!(kinds.len(), 3);
        assert_eq!(kinds[1], TokenKind::Percent);
    }

    #[test]
    fn string_escapes_resolve() {
        let kinds = scan(r#"'it\'s' "a\tb" }"#, Terminator::Brace).unwrap();
        assert_eq!(
            kinds,
            vec![
                TokenKind::String("it's".into()),
                TokenKind::String("a\tb".into())
            ]
        );
    }

    #[test]
    fn invalid_escape_is_reported_at_backslash() {
        let err = scan(r"'a\qb' }", Terminator::Brace).unwrap_err();
        assert_eq!(err.position.column, 3);
        assert!(err.message.contains("invalid escape"));
    }

    #[test]
    fn digit_led_identifier_is_rejected() {
        let err = scan("9abc }", Terminator::Brace).unwrap_err();
        assert_eq!(err.message, "invalid identifier `9abc`");
    }

    #[test]
    fn missing_terminator_is_unterminated() {
        let err = scan("a + b", Terminator::Brace).unwrap_err();
        assert_eq!(err.message, "unterminated `${`");
    }

    #[test]
    fn line_end_stops_at_newline() {
        let kinds = scan("show\nVisible", Terminator::LineEnd).unwrap();
        assert_eq!(kinds, vec![TokenKind::Identifier]);
    }
}
