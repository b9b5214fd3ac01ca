use crate::entry::{is_identifier, Entry, MAX_ATTRS, MAX_VALS};
use crate::error::CfgError;
use crate::token::{Token, TokenKind};
use crate::tokenizer::Tokenizer;

/// The token-driven entry parser (PFSM, spec §4.2).
///
/// `parse_entry` consumes tokens from the shared [`Tokenizer`] until one
/// complete directive has been built, leaving the position at the token that
/// terminates it: just after `;`, or at `{` with `has_children` set (the
/// `{` itself is left for the caller — the nested-block handler in
/// `dispatcher` — to consume).
///
/// State is kept as one token of lookahead (`current`) rather than a
/// computed-goto label, per spec §9's guidance that a one-token lookahead
/// buffer is equivalent to the original's "previous token/literal" slots.
pub(crate) struct EntryParser<'a> {
    tokenizer: Tokenizer<'a>,
    current: Option<Token<'a>>,
}

impl<'a> EntryParser<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            tokenizer: Tokenizer::new(source),
            current: None,
        }
    }

    fn peek(&mut self) -> Result<Token<'a>, CfgError> {
        if self.current.is_none() {
            self.current = Some(self.tokenizer.read_next_token()?);
        }
        Ok(self.current.expect("just primed"))
    }

    fn bump(&mut self) -> Result<Token<'a>, CfgError> {
        let tok = self.peek()?;
        self.current = None;
        Ok(tok)
    }

    /// Byte offset of the next unread token; used by the dispatcher to
    /// build error snippets.
    pub(crate) fn position(&mut self) -> usize {
        self.peek().map(|t| t.start).unwrap_or_else(|_| 0)
    }

    /// True if the next token is `}`, without consuming it. Used by the
    /// nested-block handler to find the end of a block's body.
    pub(crate) fn at_rbrace(&mut self) -> Result<bool, CfgError> {
        Ok(self.peek()?.kind == TokenKind::RBrace)
    }

    /// Consume the `{` left behind by a `has_children` entry.
    pub(crate) fn consume_lbrace(&mut self) -> Result<(), CfgError> {
        let tok = self.bump()?;
        debug_assert_eq!(tok.kind, TokenKind::LBrace);
        Ok(())
    }

    /// Consume the `}` that closes a nested block.
    pub(crate) fn expect_rbrace(&mut self) -> Result<(), CfgError> {
        let tok = self.bump()?;
        if tok.kind != TokenKind::RBrace {
            return Err(unexpected(tok, "}"));
        }
        Ok(())
    }

    /// Parse one directive. Returns an `Entry` with an empty `name` on clean
    /// EOF (spec §4.3: "Empty result ⇒ clean EOF").
    pub(crate) fn parse_entry(&mut self) -> Result<Entry, CfgError> {
        // START
        let name_tok = self.peek()?;
        if name_tok.kind == TokenKind::End {
            return Ok(Entry::default());
        }
        if name_tok.kind != TokenKind::Literal {
            return Err(unexpected(name_tok, "a directive name"));
        }
        if !is_identifier(name_tok.text) {
            return Err(CfgError::InvalidIdentifier {
                text: name_tok.text.to_string(),
            });
        }
        self.bump()?;
        let mut entry = Entry::new(name_tok.text.to_string());

        // VAL_OR_ATTR / MAYBE_EQ
        loop {
            let tok = self.peek()?;
            match tok.kind {
                TokenKind::Semi => {
                    self.bump()?;
                    return Ok(entry);
                }
                TokenKind::LBrace => {
                    entry.has_children = true;
                    return Ok(entry);
                }
                TokenKind::Literal => {
                    let literal = tok;
                    self.bump()?;
                    let next = self.peek()?;
                    if next.kind == TokenKind::Eq {
                        self.bump()?; // consume '='
                        let value = self.bump()?;
                        if value.kind != TokenKind::Literal {
                            return Err(unexpected(value, "an attribute value"));
                        }
                        if !is_identifier(literal.text) {
                            return Err(CfgError::InvalidIdentifier {
                                text: literal.text.to_string(),
                            });
                        }
                        if entry.attributes.len() >= MAX_ATTRS {
                            return Err(CfgError::Capacity {
                                name: entry.name.clone(),
                                kind: "attributes",
                                limit: MAX_ATTRS,
                            });
                        }
                        entry
                            .attributes
                            .push((literal.text.to_string(), value.text.to_string()));
                    } else {
                        if entry.values.len() >= MAX_VALS {
                            return Err(CfgError::Capacity {
                                name: entry.name.clone(),
                                kind: "values",
                                limit: MAX_VALS,
                            });
                        }
                        entry.values.push(literal.text.to_string());
                        // `next` is not consumed: the loop re-peeks it.
                    }
                }
                TokenKind::End => {
                    return Err(CfgError::Syntax {
                        message: format!("unexpected end of input while parsing `{}`", entry.name),
                        index: tok.start,
                    });
                }
                _ => return Err(unexpected(tok, "a value, an attribute, `;` or `{`")),
            }
        }
    }
}

fn unexpected(tok: Token<'_>, expected: &str) -> CfgError {
    let found = if tok.kind == TokenKind::End {
        "end of input".to_string()
    } else {
        format!("`{}`", tok.text)
    };
    CfgError::Syntax {
        message: format!("expected {expected}, found {found}"),
        index: tok.start,
    }
}
