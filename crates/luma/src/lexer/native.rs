//! Scanner for the native dialect: `$name`, `${ expr }` and `@directive`
//! lines.

use crate::lexer::cursor::{Cursor, blanks, identifier, integer, is_ident_start, text_run};
use crate::lexer::error::LexError;
use crate::lexer::expression::{Opener, Terminator, scan_expression, scan_string};
use crate::lexer::token::{Token, TokenKind};
use crate::lexer::trim::consume_line_end;
use crate::lexer::{DIRECTIVE_KEYWORDS, TextBuffer};
use crate::types::Position;

const TEXT_STOPS: &[char] = &['$', '{', '\n'];

/// Tokenize a native-dialect template.
pub(crate) fn tokenize_native(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = NativeLexer {
        cursor: Cursor::new(source),
        tokens: Vec::new(),
        text: TextBuffer::default(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct NativeLexer<'a> {
    cursor: Cursor<'a>,
    tokens: Vec<Token>,
    text: TextBuffer,
}

impl<'a> NativeLexer<'a> {
    fn run(&mut self) -> Result<(), LexError> {
        while !self.cursor.is_eof() {
            if self.cursor.at_line_start() && self.directive()? {
                continue;
            }
            let position = self.cursor.position();
            match self.cursor.peek() {
                Some('$') => self.dollar()?,
                Some('{') if matches!(self.cursor.peek_second(), Some('{' | '%')) => {
                    let marker = &self.cursor.rest()[..2];
                    return Err(LexError::foreign_marker(marker, position, "native"));
                }
                Some('\n' | '{') => {
                    if let Some(c) = self.cursor.bump() {
                        self.text.push(c, position);
                    }
                }
                Some(_) => {
                    let run = self
                        .cursor
                        .parse(|input: &mut &'a str| text_run(input, TEXT_STOPS))
                        .unwrap_or_default();
                    self.text.push_str(run, position);
                }
                None => break,
            }
        }
        self.text.flush(&mut self.tokens);
        self.tokens
            .push(Token::new(TokenKind::Eof, "", self.cursor.position()));
        Ok(())
    }

    /// Recognise a directive line: optional indentation, `@keyword`, then
    /// whitespace or end of line. The indentation and the line ending are
    /// consumed without producing text.
    fn directive(&mut self) -> Result<bool, LexError> {
        let mut probe = self.cursor;
        probe.parse(blanks);
        let position = probe.position();
        if !probe.eat("@") {
            return Ok(false);
        }
        let keyword_position = probe.position();
        let Some(keyword) = probe.parse(identifier) else {
            return Ok(false);
        };
        if !DIRECTIVE_KEYWORDS.contains(&keyword) {
            return Ok(false);
        }
        if !matches!(probe.peek(), None | Some(' ' | '\t' | '\r' | '\n')) {
            return Ok(false);
        }

        self.cursor = probe;
        self.text.flush(&mut self.tokens);
        self.tokens
            .push(Token::new(TokenKind::BlockStart, "@", position));
        self.tokens
            .push(Token::new(TokenKind::Identifier, keyword, keyword_position));
        let opener = Opener {
            text: "@",
            position,
        };
        scan_expression(
            &mut self.cursor,
            Terminator::LineEnd,
            opener,
            &mut self.tokens,
        )?;
        self.tokens
            .push(Token::new(TokenKind::BlockEnd, "", self.cursor.position()));
        consume_line_end(&mut self.cursor);
        Ok(true)
    }

    /// Handle `$$`, `${ expr }`, `$path` and a bare `$`.
    fn dollar(&mut self) -> Result<(), LexError> {
        let position = self.cursor.position();
        match self.cursor.peek_second() {
            Some('$') => {
                self.cursor.advance(2);
                self.text.push('$', position);
            }
            Some('{') => {
                self.text.flush(&mut self.tokens);
                self.tokens
                    .push(Token::new(TokenKind::InterpolationStart, "${", position));
                self.cursor.advance(2);
                let opener = Opener {
                    text: "${",
                    position,
                };
                scan_expression(&mut self.cursor, Terminator::Brace, opener, &mut self.tokens)?;
                self.tokens.push(Token::new(
                    TokenKind::InterpolationEnd,
                    "}",
                    self.cursor.position(),
                ));
                self.cursor.advance(1);
            }
            Some(c) if is_ident_start(c) => {
                self.text.flush(&mut self.tokens);
                self.tokens
                    .push(Token::new(TokenKind::InterpolationStart, "$", position));
                self.cursor.advance(1);
                self.short_path()?;
                self.short_filters()?;
                self.tokens.push(Token::new(
                    TokenKind::InterpolationEnd,
                    "",
                    self.cursor.position(),
                ));
            }
            _ => {
                self.cursor.advance(1);
                self.text.push('$', position);
            }
        }
        Ok(())
    }

    /// Scan `name(.field|[index])*` after a short `$`.
    fn short_path(&mut self) -> Result<(), LexError> {
        let position = self.cursor.position();
        let name = self.cursor.parse(identifier).unwrap_or_default();
        self.tokens
            .push(Token::new(TokenKind::Identifier, name, position));

        loop {
            let mut probe = self.cursor;
            let dot_position = probe.position();
            if probe.peek() == Some('.') && probe.peek_second().is_some_and(is_ident_start) {
                probe.advance(1);
                let field_position = probe.position();
                let field = probe.parse(identifier).unwrap_or_default();
                self.tokens
                    .push(Token::new(TokenKind::Dot, ".", dot_position));
                self.tokens
                    .push(Token::new(TokenKind::Identifier, field, field_position));
                self.cursor = probe;
                continue;
            }
            if probe.peek() == Some('[')
                && let Some((index, close_position)) = short_index(&mut probe)?
            {
                self.tokens
                    .push(Token::new(TokenKind::LeftBracket, "[", dot_position));
                self.tokens.push(index);
                self.tokens
                    .push(Token::new(TokenKind::RightBracket, "]", close_position));
                self.cursor = probe;
                continue;
            }
            return Ok(());
        }
    }

    /// Scan `| name` or `| name(args)` pipelines following a short path.
    fn short_filters(&mut self) -> Result<(), LexError> {
        loop {
            let mut probe = self.cursor;
            probe.parse(blanks);
            let pipe_position = probe.position();
            if !probe.eat("|") || probe.peek() == Some('|') {
                return Ok(());
            }
            probe.parse(blanks);
            let name_position = probe.position();
            let Some(name) = probe.parse(identifier) else {
                return Ok(());
            };
            self.cursor = probe;
            self.tokens
                .push(Token::new(TokenKind::Pipe, "|", pipe_position));
            self.tokens
                .push(Token::new(TokenKind::Identifier, name, name_position));

            if self.cursor.peek() == Some('(') {
                let open_position = self.cursor.position();
                self.tokens
                    .push(Token::new(TokenKind::LeftParen, "(", open_position));
                self.cursor.advance(1);
                let opener = Opener {
                    text: "(",
                    position: open_position,
                };
                scan_expression(
                    &mut self.cursor,
                    Terminator::CloseParen,
                    opener,
                    &mut self.tokens,
                )?;
                self.tokens.push(Token::new(
                    TokenKind::RightParen,
                    ")",
                    self.cursor.position(),
                ));
                self.cursor.advance(1);
            }
        }
    }
}

/// Scan `[digits]` or `["key"]` on a probe cursor positioned at `[`.
///
/// Returns the index token and the position of `]`, or `None`, leaving the
/// `[` to be treated as text, when the bracket does not hold a literal index
/// followed by `]`.
fn short_index(probe: &mut Cursor<'_>) -> Result<Option<(Token, Position)>, LexError> {
    probe.advance(1);
    let position = probe.position();
    let token = match probe.peek() {
        Some(c) if c.is_ascii_digit() => {
            let digits = probe.parse(integer).unwrap_or_default();
            let Ok(value) = digits.parse::<f64>() else {
                return Ok(None);
            };
            Token::new(TokenKind::Number(value), digits, position)
        }
        Some('\'' | '"') => scan_string(probe)?,
        _ => return Ok(None),
    };
    let close_position = probe.position();
    if !probe.eat("]") {
        return Ok(None);
    }
    Ok(Some((token, close_position)))
}
