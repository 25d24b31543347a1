//! Scanner for the Jinja-compatible dialect: `{{ expr }}`, `{% tag %}` and
//! `{# comment #}`.

use crate::lexer::cursor::{Cursor, blanks, identifier, text_run};
use crate::lexer::error::LexError;
use crate::lexer::expression::{Opener, Terminator, scan_expression};
use crate::lexer::token::{Token, TokenKind};
use crate::lexer::trim::{blank_prefix_len, blank_suffix_len};
use crate::lexer::{DIRECTIVE_KEYWORDS, TextBuffer};

const TEXT_STOPS: &[char] = &['{', '$', '\n'];

/// Tokenize a Jinja-dialect template.
pub(crate) fn tokenize_jinja(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = JinjaLexer {
        cursor: Cursor::new(source),
        tokens: Vec::new(),
        text: TextBuffer::default(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct JinjaLexer<'a> {
    cursor: Cursor<'a>,
    tokens: Vec<Token>,
    text: TextBuffer,
}

impl<'a> JinjaLexer<'a> {
    fn run(&mut self) -> Result<(), LexError> {
        while !self.cursor.is_eof() {
            if self.cursor.at_line_start() {
                self.reject_directive_line()?;
            }
            let position = self.cursor.position();
            if self.cursor.starts_with("{{") {
                self.interpolation()?;
                continue;
            }
            if self.cursor.starts_with("{%") {
                self.block_tag()?;
                continue;
            }
            if self.cursor.starts_with("{#") {
                self.comment()?;
                continue;
            }
            if self.cursor.starts_with("${") {
                return Err(LexError::foreign_marker("${", position, "jinja"));
            }
            match self.cursor.peek() {
                Some('{' | '$' | '\n') => {
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

    /// A native directive line cannot appear once the template is Jinja.
    fn reject_directive_line(&self) -> Result<(), LexError> {
        let mut probe = self.cursor;
        probe.parse(blanks);
        let position = probe.position();
        if !probe.eat("@") {
            return Ok(());
        }
        let Some(keyword) = probe.parse(identifier) else {
            return Ok(());
        };
        if DIRECTIVE_KEYWORDS.contains(&keyword)
            && matches!(probe.peek(), None | Some(' ' | '\t' | '\r' | '\n'))
        {
            return Err(LexError::foreign_marker(
                &format!("@{keyword}"),
                position,
                "jinja",
            ));
        }
        Ok(())
    }

    fn interpolation(&mut self) -> Result<(), LexError> {
        let position = self.cursor.position();
        self.text.flush(&mut self.tokens);
        self.tokens
            .push(Token::new(TokenKind::InterpolationStart, "{{", position));
        self.cursor.advance(2);
        let opener = Opener {
            text: "{{",
            position,
        };
        scan_expression(
            &mut self.cursor,
            Terminator::DoubleBrace,
            opener,
            &mut self.tokens,
        )?;
        self.tokens.push(Token::new(
            TokenKind::InterpolationEnd,
            "}}",
            self.cursor.position(),
        ));
        self.cursor.advance(2);
        Ok(())
    }

    /// Scan `{% ... %}`, trimming its line when the tag stands alone.
    fn block_tag(&mut self) -> Result<(), LexError> {
        let position = self.cursor.position();
        let indent = blank_prefix_len(self.cursor.source(), self.cursor.offset());

        let mut probe = self.cursor;
        probe.advance(2);
        let mut inner = vec![Token::new(TokenKind::BlockStart, "{%", position)];
        let opener = Opener {
            text: "{%",
            position,
        };
        scan_expression(&mut probe, Terminator::BlockClose, opener, &mut inner)?;
        inner.push(Token::new(TokenKind::BlockEnd, "%}", probe.position()));
        probe.advance(2);

        self.finish_standalone(probe, indent);
        self.tokens.extend(inner);
        Ok(())
    }

    /// Skip `{# ... #}`, trimming its line when the comment stands alone.
    fn comment(&mut self) -> Result<(), LexError> {
        let position = self.cursor.position();
        let indent = blank_prefix_len(self.cursor.source(), self.cursor.offset());

        let mut probe = self.cursor;
        probe.advance(2);
        let Some(end) = probe.rest().find("#}") else {
            return Err(LexError::unterminated("{#", position));
        };
        probe.advance(end + 2);

        self.finish_standalone(probe, indent);
        Ok(())
    }

    /// Commit the cursor to `after` (just past a tag or comment), removing
    /// the indentation before it and the line ending after it when the tag
    /// is alone on its line. Buffered text is flushed.
    fn finish_standalone(&mut self, mut after: Cursor<'a>, indent: Option<usize>) {
        if let (Some(indent), Some(suffix)) = (indent, blank_suffix_len(after.rest())) {
            self.text.trim_trailing(indent);
            after.advance(suffix);
        }
        self.text.flush(&mut self.tokens);
        self.cursor = after;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(source: &str) -> String {
        tokenize_jinja(source)
            .unwrap()
            .into_iter()
            .filter(|t| t.kind == TokenKind::Text)
            .map(|t| t.lexeme)
            .collect()
    }

    #[test]
    fn standalone_tags_remove_their_line() {
        assert_eq!(text_of("a\n  {% if x %}\nb\n{% endif %}\nc"), "a\nb\nc");
    }

    #[test]
    fn inline_tags_trim_nothing() {
        assert_eq!(text_of("a {% if x %}b{% endif %} c\n"), "a b c\n");
    }

    #[test]
    fn comments_produce_no_text() {
        assert_eq!(text_of("a{# note #}b\n  {# own line #}\nc"), "ab\nc");
    }

    #[test]
    fn dollar_words_are_text() {
        assert_eq!(text_of("echo $HOME {{ x }}"), "echo $HOME ");
    }

    #[test]
    fn foreign_markers_are_rejected() {
        let err = tokenize_jinja("{{ a }} ${ b }").unwrap_err();
        assert!(err.message.contains("`${`"));
        let err = tokenize_jinja("{{ a }}\n  @if b\n").unwrap_err();
        assert!(err.message.contains("`@if`"));
        assert_eq!(err.position.line, 2);
    }

    #[test]
    fn unterminated_comment_is_reported() {
        let err = tokenize_jinja("{{ a }}{# open").unwrap_err();
        assert_eq!(err.message, "unterminated `{#`");
    }
}
