// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Token kinds and the coarse adjacency grammar.
//!
//! Every token kind owns a recognizer predicate plus three category sets:
//! the category the kind belongs to, the categories allowed immediately before
//! it and the categories allowed immediately after it. Recognizers are tried in
//! declaration order and the first match wins, so the order of
//! [`TOKEN_KINDS`] is part of the grammar.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Coarse token categories used by the adjacency grammar.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TokenCategory: u8 {
        const LABEL = 1 << 0;
        const ACTION = 1 << 1;
        const VALUE = 1 << 2;
        const COMMA = 1 << 3;
        const STRING = 1 << 4;
        const EOL = 1 << 5;
    }
}

impl TokenCategory {
    /// Check whether a neighbour of category `other` is allowed by this set.
    pub fn allows(self, other: TokenCategory) -> bool {
        self.intersects(other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    LabelDef,
    Directive,
    Instruction,
    Register,
    Immediate,
    Address,
    LabelRef,
    Comma,
    String,
    Eol,
}

/// Per-kind descriptor: recognizer and adjacency rules.
pub struct TokenKindDef {
    pub kind: TokenKind,
    pub recognize: fn(&str) -> bool,
    pub category: TokenCategory,
    pub preceding: TokenCategory,
    pub succeeding: TokenCategory,
}

const VALUE_PRECEDING: TokenCategory = TokenCategory::ACTION.union(TokenCategory::COMMA);
const VALUE_SUCCEEDING: TokenCategory = TokenCategory::COMMA.union(TokenCategory::EOL);

/// Token kinds in recognition precedence order.
pub static TOKEN_KINDS: [TokenKindDef; 10] = [
    TokenKindDef {
        kind: TokenKind::LabelDef,
        recognize: is_label_def,
        category: TokenCategory::LABEL,
        preceding: TokenCategory::EOL,
        succeeding: TokenCategory::EOL,
    },
    TokenKindDef {
        kind: TokenKind::Directive,
        recognize: is_directive,
        category: TokenCategory::ACTION,
        preceding: TokenCategory::EOL,
        succeeding: TokenCategory::VALUE
            .union(TokenCategory::STRING)
            .union(TokenCategory::EOL),
    },
    TokenKindDef {
        kind: TokenKind::Instruction,
        recognize: is_instruction,
        category: TokenCategory::ACTION,
        preceding: TokenCategory::EOL,
        succeeding: TokenCategory::VALUE.union(TokenCategory::EOL),
    },
    TokenKindDef {
        kind: TokenKind::Register,
        recognize: is_register,
        category: TokenCategory::VALUE,
        preceding: VALUE_PRECEDING,
        succeeding: VALUE_SUCCEEDING,
    },
    TokenKindDef {
        kind: TokenKind::Immediate,
        recognize: is_immediate,
        category: TokenCategory::VALUE,
        preceding: VALUE_PRECEDING,
        succeeding: VALUE_SUCCEEDING,
    },
    TokenKindDef {
        kind: TokenKind::Address,
        recognize: is_address,
        category: TokenCategory::VALUE,
        preceding: VALUE_PRECEDING,
        succeeding: VALUE_SUCCEEDING,
    },
    TokenKindDef {
        kind: TokenKind::LabelRef,
        recognize: is_label_ref,
        category: TokenCategory::VALUE,
        preceding: VALUE_PRECEDING,
        succeeding: VALUE_SUCCEEDING,
    },
    TokenKindDef {
        kind: TokenKind::Comma,
        recognize: is_comma,
        category: TokenCategory::COMMA,
        preceding: TokenCategory::VALUE,
        succeeding: TokenCategory::VALUE,
    },
    TokenKindDef {
        kind: TokenKind::String,
        recognize: is_string,
        category: TokenCategory::STRING,
        preceding: TokenCategory::ACTION,
        succeeding: TokenCategory::EOL,
    },
    TokenKindDef {
        kind: TokenKind::Eol,
        recognize: is_eol,
        category: TokenCategory::EOL,
        // Everything but a comma may end a line.
        preceding: TokenCategory::all().difference(TokenCategory::COMMA),
        succeeding: TokenCategory::LABEL
            .union(TokenCategory::ACTION)
            .union(TokenCategory::EOL),
    },
];

/// Classify raw token text. Returns `None` when no recognizer accepts it.
pub fn classify(text: &str) -> Option<TokenKind> {
    if text.is_empty() {
        return None;
    }
    TOKEN_KINDS
        .iter()
        .find(|def| (def.recognize)(text))
        .map(|def| def.kind)
}

impl TokenKind {
    pub fn def(self) -> &'static TokenKindDef {
        let index = match self {
            TokenKind::LabelDef => 0,
            TokenKind::Directive => 1,
            TokenKind::Instruction => 2,
            TokenKind::Register => 3,
            TokenKind::Immediate => 4,
            TokenKind::Address => 5,
            TokenKind::LabelRef => 6,
            TokenKind::Comma => 7,
            TokenKind::String => 8,
            TokenKind::Eol => 9,
        };
        &TOKEN_KINDS[index]
    }

    pub fn category(self) -> TokenCategory {
        self.def().category
    }

    pub fn preceding(self) -> TokenCategory {
        self.def().preceding
    }

    pub fn succeeding(self) -> TokenCategory {
        self.def().succeeding
    }

    /// Check the adjacency rule for this kind against its two neighbours.
    pub fn accepts_neighbours(self, before: TokenKind, after: TokenKind) -> bool {
        self.preceding().allows(before.category()) && self.succeeding().allows(after.category())
    }

    pub fn name(self) -> &'static str {
        match self {
            TokenKind::LabelDef => "label definition",
            TokenKind::Directive => "directive",
            TokenKind::Instruction => "instruction",
            TokenKind::Register => "register",
            TokenKind::Immediate => "immediate",
            TokenKind::Address => "address",
            TokenKind::LabelRef => "label reference",
            TokenKind::Comma => "comma",
            TokenKind::String => "string",
            TokenKind::Eol => "end of line",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Register names that would otherwise read as instructions.
const RESERVED_REGISTERS: [&str; 2] = ["pc", "sp"];

fn is_label_def(text: &str) -> bool {
    text.len() >= 3 && text.starts_with('@') && text.ends_with(':')
}

fn is_directive(text: &str) -> bool {
    text.starts_with('.')
}

fn is_instruction(text: &str) -> bool {
    text.bytes().all(|c| c.is_ascii_alphabetic()) && !RESERVED_REGISTERS.contains(&text)
}

fn is_register(text: &str) -> bool {
    if RESERVED_REGISTERS.contains(&text) {
        return true;
    }
    match text.strip_prefix('r') {
        Some(digits) => is_decimal(digits),
        None => false,
    }
}

fn is_immediate(text: &str) -> bool {
    let Some(body) = text.strip_prefix('#') else {
        return false;
    };
    match strip_hex_prefix(body) {
        Some(digits) => is_hex(digits),
        None => is_decimal(body),
    }
}

fn is_address(text: &str) -> bool {
    if text.len() < 4 {
        return false;
    }
    text.strip_prefix('$')
        .and_then(strip_hex_prefix)
        .is_some_and(is_hex)
}

fn is_label_ref(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('@')
}

fn is_comma(text: &str) -> bool {
    text == ","
}

fn is_string(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('"') && text.ends_with('"')
}

fn is_eol(text: &str) -> bool {
    text == "\n"
}

pub(crate) fn strip_hex_prefix(text: &str) -> Option<&str> {
    text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
}

fn is_decimal(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|c| c.is_ascii_digit())
}

fn is_hex(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::{classify, TokenCategory, TokenKind};
    use proptest::prelude::*;

    #[test]
    fn classifies_each_kind() {
        assert_eq!(classify("@start:"), Some(TokenKind::LabelDef));
        assert_eq!(classify(".org"), Some(TokenKind::Directive));
        assert_eq!(classify("ldr"), Some(TokenKind::Instruction));
        assert_eq!(classify("LDR"), Some(TokenKind::Instruction));
        assert_eq!(classify("r12"), Some(TokenKind::Register));
        assert_eq!(classify("#16"), Some(TokenKind::Immediate));
        assert_eq!(classify("#0x1F"), Some(TokenKind::Immediate));
        assert_eq!(classify("$0x0100"), Some(TokenKind::Address));
        assert_eq!(classify("@start"), Some(TokenKind::LabelRef));
        assert_eq!(classify(","), Some(TokenKind::Comma));
        assert_eq!(classify("\"hi there\""), Some(TokenKind::String));
        assert_eq!(classify("\n"), Some(TokenKind::Eol));
    }

    #[test]
    fn reserved_register_names_are_not_instructions() {
        assert_eq!(classify("pc"), Some(TokenKind::Register));
        assert_eq!(classify("sp"), Some(TokenKind::Register));
        assert_eq!(classify("spx"), Some(TokenKind::Instruction));
    }

    #[test]
    fn rejects_malformed_literals() {
        assert_eq!(classify("#"), None);
        assert_eq!(classify("#0x"), None);
        assert_eq!(classify("#12a"), None);
        assert_eq!(classify("$0x"), None);
        assert_eq!(classify("$12"), None);
        assert_eq!(classify("r"), Some(TokenKind::Instruction));
        assert_eq!(classify("r1a"), None);
        assert_eq!(classify("a1"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn label_definition_wins_over_reference() {
        assert_eq!(classify("@a:"), Some(TokenKind::LabelDef));
        assert_eq!(classify("@:"), Some(TokenKind::LabelRef));
        assert_eq!(classify("@"), None);
    }

    #[test]
    fn eol_may_not_follow_comma() {
        assert!(!TokenKind::Eol.preceding().allows(TokenCategory::COMMA));
        assert!(TokenKind::Eol.preceding().allows(TokenCategory::STRING));
        assert!(TokenKind::Register.accepts_neighbours(TokenKind::Instruction, TokenKind::Comma));
        assert!(!TokenKind::Register.accepts_neighbours(TokenKind::Eol, TokenKind::Comma));
        assert!(!TokenKind::String.accepts_neighbours(TokenKind::Instruction, TokenKind::Comma));
    }

    proptest! {
        #[test]
        fn classification_is_deterministic(text in "[#$@.r0-9a-fA-Fx:,\"]{1,12}") {
            prop_assert_eq!(classify(&text), classify(&text));
        }

        #[test]
        fn hex_immediate_and_address_never_overlap(digits in "[0-9a-fA-F]{1,8}") {
            let immediate = format!("#0x{digits}");
            let address = format!("$0x{digits}");
            prop_assert_eq!(classify(&immediate), Some(TokenKind::Immediate));
            prop_assert_eq!(classify(&address), Some(TokenKind::Address));
        }
    }
}
