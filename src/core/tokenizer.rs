// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Tokenizer for assembly source read from a byte stream.
//!
//! Input is consumed in chunks of at most [`FILE_BUFFER_SIZE`] bytes and the
//! pending token is held in a fixed buffer of [`TOKEN_BUFFER_SIZE`] bytes, so
//! memory use depends on the token count and not on the file size.

use std::io::{self, Read};

use thiserror::Error;
use tracing::trace;

use crate::core::token_kind::{classify, TokenKind};

/// Maximum token length in bytes.
pub const TOKEN_BUFFER_SIZE: usize = 64;

/// Size of one read from the input stream.
pub const FILE_BUFFER_SIZE: usize = 1024;

/// Source location. Lines and columns are 1-based, `col_end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: u32,
    pub col_start: usize,
    pub col_end: usize,
}

impl Span {
    pub fn new(line: u32, col_start: usize, len: usize) -> Self {
        Self {
            line,
            col_start,
            col_end: col_start + len,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    fn eol(line: u32, column: usize) -> Self {
        Self {
            kind: TokenKind::Eol,
            text: "\n".to_string(),
            span: Span::new(line, column, 1),
        }
    }

    fn comma(line: u32, column: usize) -> Self {
        Self {
            kind: TokenKind::Comma,
            text: ",".to_string(),
            span: Span::new(line, column, 1),
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum LexError {
    #[error("token longer than {max} bytes")]
    TokenOverflow { max: usize, span: Span },
    #[error("unknown token '{text}'")]
    UnknownToken { text: String, span: Span },
    #[error("allocation failed while storing tokens")]
    AllocFailed { span: Span },
    #[error("stream error: {0}")]
    Stream(#[from] io::Error),
}

impl LexError {
    pub fn span(&self) -> Option<Span> {
        match self {
            LexError::TokenOverflow { span, .. }
            | LexError::UnknownToken { span, .. }
            | LexError::AllocFailed { span } => Some(*span),
            LexError::Stream(_) => None,
        }
    }
}

/// Incremental tokenizer. Feed it chunks with [`Tokenizer::feed`] and collect
/// the sequence with [`Tokenizer::finish`].
pub struct Tokenizer {
    tokens: Vec<Token>,
    pending: [u8; TOKEN_BUFFER_SIZE],
    pending_len: usize,
    pending_line: u32,
    pending_column: usize,
    line: u32,
    column: usize,
    in_comment: bool,
    in_quote: bool,
    escaped: bool,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_tokens(Vec::new())
    }

    /// Create a tokenizer that appends to an already allocated sequence.
    #[must_use]
    pub fn with_tokens(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pending: [0; TOKEN_BUFFER_SIZE],
            pending_len: 0,
            pending_line: 1,
            pending_column: 1,
            line: 1,
            column: 1,
            in_comment: false,
            in_quote: false,
            escaped: false,
        }
    }

    /// Read `reader` to the end in bounded chunks.
    pub fn read_from<R: Read>(&mut self, mut reader: R) -> Result<(), LexError> {
        let mut chunk = [0u8; FILE_BUFFER_SIZE];
        loop {
            let read = match reader.read(&mut chunk) {
                Ok(0) => return Ok(()),
                Ok(read) => read,
                Err(err) => return Err(LexError::Stream(err)),
            };
            trace!(bytes = read, line = self.line, "tokenizing chunk");
            self.feed(&chunk[..read])?;
        }
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), LexError> {
        for &byte in chunk {
            self.feed_byte(byte)?;
        }
        Ok(())
    }

    /// Flush the last pending token and return the sequence.
    pub fn finish(mut self) -> Result<Vec<Token>, LexError> {
        if self.in_quote {
            return Err(self.unterminated_string());
        }
        self.flush()?;
        Ok(self.tokens)
    }

    fn feed_byte(&mut self, byte: u8) -> Result<(), LexError> {
        if byte == b'\n' {
            if self.in_quote {
                return Err(self.unterminated_string());
            }
            self.flush()?;
            self.push(Token::eol(self.line, self.column))?;
            self.in_comment = false;
            self.line += 1;
            self.column = 1;
            return Ok(());
        }

        if self.in_comment {
            self.column += 1;
            return Ok(());
        }

        if self.in_quote {
            self.append(byte)?;
            if self.escaped {
                self.escaped = false;
            } else if byte == b'\\' {
                self.escaped = true;
            } else if byte == b'"' {
                self.in_quote = false;
            }
            self.column += 1;
            return Ok(());
        }

        match byte {
            b';' => {
                self.flush()?;
                self.in_comment = true;
            }
            b' ' | b'\t' | b'\r' => self.flush()?,
            b',' => {
                self.flush()?;
                self.push(Token::comma(self.line, self.column))?;
            }
            b'"' if self.pending_len == 0 => {
                self.append(byte)?;
                self.in_quote = true;
            }
            _ => self.append(byte)?,
        }
        self.column += 1;
        Ok(())
    }

    fn append(&mut self, byte: u8) -> Result<(), LexError> {
        if self.pending_len == 0 {
            self.pending_line = self.line;
            self.pending_column = self.column;
        }
        if self.pending_len >= TOKEN_BUFFER_SIZE {
            return Err(LexError::TokenOverflow {
                max: TOKEN_BUFFER_SIZE,
                span: Span {
                    line: self.pending_line,
                    col_start: self.pending_column,
                    col_end: self.column + 1,
                },
            });
        }
        self.pending[self.pending_len] = byte;
        self.pending_len += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), LexError> {
        if self.pending_len == 0 {
            return Ok(());
        }
        let span = Span::new(self.pending_line, self.pending_column, self.pending_len);
        let raw = &self.pending[..self.pending_len];
        let kind = std::str::from_utf8(raw).ok().and_then(classify);
        let text = String::from_utf8_lossy(raw).into_owned();
        self.pending_len = 0;

        let Some(kind) = kind else {
            return Err(LexError::UnknownToken { text, span });
        };
        self.push(Token { kind, text, span })
    }

    fn push(&mut self, token: Token) -> Result<(), LexError> {
        self.tokens
            .try_reserve(1)
            .map_err(|_| LexError::AllocFailed { span: token.span })?;
        self.tokens.push(token);
        Ok(())
    }

    fn unterminated_string(&self) -> LexError {
        LexError::UnknownToken {
            text: String::from_utf8_lossy(&self.pending[..self.pending_len]).into_owned(),
            span: Span::new(self.pending_line, self.pending_column, self.pending_len),
        }
    }
}

/// Tokenize a whole stream.
pub fn tokenize<R: Read>(reader: R) -> Result<Vec<Token>, LexError> {
    let mut tokenizer = Tokenizer::new();
    tokenizer.read_from(reader)?;
    tokenizer.finish()
}

/// Tokenize in-memory source text.
pub fn tokenize_str(source: &str) -> Result<Vec<Token>, LexError> {
    tokenize(source.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::{tokenize, tokenize_str, LexError, Span, TokenKind, Tokenizer, TOKEN_BUFFER_SIZE};
    use proptest::prelude::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize_str(source)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn tokenizes_instruction_with_operands() {
        assert_eq!(
            kinds("ldr r1, #0x10\n"),
            vec![
                TokenKind::Instruction,
                TokenKind::Register,
                TokenKind::Comma,
                TokenKind::Immediate,
                TokenKind::Eol
            ]
        );
    }

    #[test]
    fn records_line_and_column() {
        let tokens = tokenize_str("@start:\n  nop\n").unwrap();
        assert_eq!(tokens[0].span, Span::new(1, 1, 7));
        assert_eq!(tokens[1].kind, TokenKind::Eol);
        assert_eq!(tokens[1].span.line, 1);
        assert_eq!(tokens[2].text, "nop");
        assert_eq!(tokens[2].span, Span::new(2, 3, 3));
    }

    #[test]
    fn comments_are_dropped_but_end_the_token() {
        assert_eq!(
            kinds("nop;halt, r1 \"x\nhlt"),
            vec![TokenKind::Instruction, TokenKind::Eol, TokenKind::Instruction]
        );
    }

    #[test]
    fn quoted_strings_keep_separators() {
        let tokens = tokenize_str(".db \"a, b ;c\"\n").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::String);
        assert_eq!(tokens[1].text, "\"a, b ;c\"");
        assert_eq!(tokens[2].kind, TokenKind::Eol);
    }

    #[test]
    fn escaped_quote_does_not_close_string() {
        let tokens = tokenize_str(".db \"a\\\"b\"\n").unwrap();
        assert_eq!(tokens[1].text, "\"a\\\"b\"");
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn unterminated_string_is_unknown_token() {
        let err = tokenize_str(".db \"abc\n").unwrap_err();
        assert!(matches!(err, LexError::UnknownToken { ref text, .. } if text == "\"abc"));
    }

    #[test]
    fn carriage_returns_are_whitespace() {
        assert_eq!(
            kinds("nop\r\nhlt\r\n"),
            vec![
                TokenKind::Instruction,
                TokenKind::Eol,
                TokenKind::Instruction,
                TokenKind::Eol
            ]
        );
    }

    #[test]
    fn unknown_token_names_text_and_position() {
        let err = tokenize_str("nop\n  ldr r1, ?x\n").unwrap_err();
        match err {
            LexError::UnknownToken { text, span } => {
                assert_eq!(text, "?x");
                assert_eq!(span.line, 2);
                assert_eq!(span.col_start, 11);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn token_of_maximum_length_is_accepted() {
        let name = format!(".{}", "a".repeat(TOKEN_BUFFER_SIZE - 1));
        let tokens = tokenize_str(&name).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].len(), TOKEN_BUFFER_SIZE);
    }

    #[test]
    fn token_over_maximum_length_overflows() {
        let source = format!("nop\n   .{}\n", "a".repeat(TOKEN_BUFFER_SIZE));
        let err = tokenize_str(&source).unwrap_err();
        match err {
            LexError::TokenOverflow { max, span } => {
                assert_eq!(max, TOKEN_BUFFER_SIZE);
                assert_eq!(span.line, 2);
                assert_eq!(span.col_start, 4);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn pending_token_is_emitted_at_end_of_stream() {
        assert_eq!(kinds("hlt"), vec![TokenKind::Instruction]);
        assert!(kinds("").is_empty());
    }

    struct InterruptedReader;

    impl std::io::Read for InterruptedReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::Interrupted.into())
        }
    }

    #[test]
    fn read_failures_are_not_retried() {
        let err = tokenize(InterruptedReader).unwrap_err();
        assert!(matches!(
            err,
            LexError::Stream(ref source) if source.kind() == std::io::ErrorKind::Interrupted
        ));
        assert_eq!(err.span(), None);
    }

    proptest! {
        #[test]
        fn chunk_boundaries_do_not_change_tokens(split in 0usize..40) {
            let source = "@loop:\n ldr r1, #0x10 ; load\n jmp @loop\n";
            let split = split.min(source.len());
            let mut tokenizer = Tokenizer::new();
            tokenizer.feed(&source.as_bytes()[..split]).unwrap();
            tokenizer.feed(&source.as_bytes()[split..]).unwrap();
            let chunked = tokenizer.finish().unwrap();
            prop_assert_eq!(chunked, tokenize_str(source).unwrap());
        }
    }
}
