use crate::cursor::Cursor;
use crate::error::CfgError;
use crate::token::{Token, TokenKind};

/// The character-driven tokenizer (TFSM, spec §4.1).
///
/// `read_next_token` advances the cursor and yields exactly one token per
/// call. Whitespace and `#`-to-newline comments are consumed silently and
/// never emitted.
pub(crate) struct Tokenizer<'a> {
    source: &'a str,
    cursor: Cursor<'a>,
}

impl<'a> Tokenizer<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            source,
            cursor: Cursor::new(source),
        }
    }

    /// Read the next token, skipping whitespace and comments first.
    pub(crate) fn read_next_token(&mut self) -> Result<Token<'a>, CfgError> {
        self.skip_trivia();

        let start = self.cursor.offset();
        let Some(c) = self.cursor.first() else {
            return Ok(Token::eof(start));
        };

        match c {
            '{' => Ok(self.single(TokenKind::LBrace)),
            '}' => Ok(self.single(TokenKind::RBrace)),
            '=' => Ok(self.single(TokenKind::Eq)),
            ';' => Ok(self.single(TokenKind::Semi)),
            '"' => self.quoted_literal(),
            _ => Ok(self.bare_literal()),
        }
    }

    fn single(&mut self, kind: TokenKind) -> Token<'a> {
        let start = self.cursor.offset();
        self.cursor.bump();
        let end = self.cursor.offset();
        Token::new(kind, &self.source[start..end], start, end)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.cursor.first() {
                Some(c) if is_space(c) => {
                    self.cursor.bump();
                }
                Some('#') => {
                    while let Some(c) = self.cursor.first() {
                        self.cursor.bump();
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn quoted_literal(&mut self) -> Result<Token<'a>, CfgError> {
        let start = self.cursor.offset();
        self.cursor.bump(); // opening quote, not part of the value

        let value_start = self.cursor.offset();
        loop {
            match self.cursor.first() {
                None => {
                    return Err(CfgError::Syntax {
                        message: "unterminated quoted literal".to_string(),
                        index: start,
                    });
                }
                Some('\\') => {
                    self.cursor.bump();
                    // The escaped character (if any) is retained verbatim;
                    // an escape at EOF is itself an unterminated literal.
                    if self.cursor.bump().is_none() {
                        return Err(CfgError::Syntax {
                            message: "unterminated quoted literal".to_string(),
                            index: start,
                        });
                    }
                }
                Some('"') => {
                    let value_end = self.cursor.offset();
                    self.cursor.bump(); // closing quote
                    let end = self.cursor.offset();
                    return Ok(Token::new(
                        TokenKind::Literal,
                        &self.source[value_start..value_end],
                        start,
                        end,
                    ));
                }
                Some(_) => {
                    self.cursor.bump();
                }
            }
        }
    }

    fn bare_literal(&mut self) -> Token<'a> {
        let start = self.cursor.offset();
        loop {
            match self.cursor.first() {
                None => break,
                Some(c) if is_space(c) || is_special(c) => break,
                Some('\\') => {
                    self.cursor.bump();
                    // The backslash stays in the emitted slice; bump the
                    // escaped character too so it can't be mistaken for a
                    // delimiter on the next iteration.
                    self.cursor.bump();
                }
                Some(_) => {
                    self.cursor.bump();
                }
            }
        }
        let end = self.cursor.offset();
        Token::new(TokenKind::Literal, &self.source[start..end], start, end)
    }
}

fn is_space(c: char) -> bool {
    c.is_whitespace()
}

fn is_special(c: char) -> bool {
    matches!(c, '"' | '#' | '{' | '}' | '=' | ';')
}
