// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Adjacency check over a token sequence.
//!
//! Each token is checked against its predecessor and successor using the
//! category sets of its kind. The sequence is treated as if framed by end of
//! line tokens on both sides.

use crate::core::parser::ParseError;
use crate::core::token_kind::TokenKind;
use crate::core::tokenizer::Token;

/// Validate every token against its neighbours. Stops at the first violation.
pub fn validate_sequence(tokens: &[Token]) -> Result<(), ParseError> {
    for (index, token) in tokens.iter().enumerate() {
        let before = index
            .checked_sub(1)
            .map_or(TokenKind::Eol, |prev| tokens[prev].kind);
        let after = tokens.get(index + 1).map_or(TokenKind::Eol, |next| next.kind);

        if !token.kind.accepts_neighbours(before, after) {
            return Err(ParseError::Sequence {
                index,
                kind: token.kind,
                text: token.text.clone(),
                before,
                after,
                span: token.span,
            });
        }
    }
    Ok(())
}
