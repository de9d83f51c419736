// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Target-neutral argument representation.
//!
//! The parser turns value tokens into [`Argument`]s. Targets describe the
//! operands they accept with [`OperandKind`]; an argument maps onto exactly one
//! operand kind (strings only appear as directive data).

use std::fmt;

use crate::core::tokenizer::Span;

/// Operand kind in a target's opcode signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    Immediate,
    Register,
    Memory,
}

impl OperandKind {
    pub fn name(self) -> &'static str {
        match self {
            OperandKind::Immediate => "imm",
            OperandKind::Register => "reg",
            OperandKind::Memory => "mem",
        }
    }
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Format an operand list as `reg, imm`.
pub fn format_signature(kinds: &[OperandKind]) -> String {
    if kinds.is_empty() {
        return "none".to_string();
    }
    kinds
        .iter()
        .map(|kind| kind.name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentKind {
    /// Immediate constant (`#16`, `#0x10`).
    Immediate(u32),
    /// Register operand with the index assigned by the target.
    Register { name: String, index: u8 },
    /// Literal memory address (`$0x1000`).
    Address(u32),
    /// Label reference. `value` is filled in by label resolution.
    LabelRef { name: String, value: Option<u32> },
    /// Quoted string, `bytes` holds the decoded contents.
    String { raw: String, bytes: Vec<u8> },
}

/// One parsed argument with its encoded width in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub kind: ArgumentKind,
    pub width: u8,
    pub span: Span,
}

impl Argument {
    pub fn new(kind: ArgumentKind, width: u8, span: Span) -> Self {
        Self { kind, width, span }
    }

    /// Operand kind used for signature matching. Strings have none.
    pub fn operand_kind(&self) -> Option<OperandKind> {
        match self.kind {
            ArgumentKind::Immediate(_) => Some(OperandKind::Immediate),
            ArgumentKind::Register { .. } => Some(OperandKind::Register),
            ArgumentKind::Address(_) | ArgumentKind::LabelRef { .. } => Some(OperandKind::Memory),
            ArgumentKind::String { .. } => None,
        }
    }

    /// Numeric value, or `None` for strings and unresolved label references.
    pub fn value(&self) -> Option<u32> {
        match &self.kind {
            ArgumentKind::Immediate(value) | ArgumentKind::Address(value) => Some(*value),
            ArgumentKind::Register { index, .. } => Some(u32::from(*index)),
            ArgumentKind::LabelRef { value, .. } => *value,
            ArgumentKind::String { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self.kind, ArgumentKind::LabelRef { value: None, .. })
    }

    /// Render the argument back to source syntax.
    pub fn render(&self) -> String {
        match &self.kind {
            ArgumentKind::Immediate(value) => {
                format!("#0x{:0width$X}", value, width = usize::from(self.width) * 2)
            }
            ArgumentKind::Register { name, .. } => name.clone(),
            ArgumentKind::Address(value) => {
                format!("$0x{:0width$X}", value, width = usize::from(self.width) * 2)
            }
            ArgumentKind::LabelRef { name, .. } => format!("@{name}"),
            ArgumentKind::String { raw, .. } => raw.clone(),
        }
    }
}

/// Little-endian bytes of `value` truncated to `width` bytes.
pub fn value_bytes(value: u32, width: u8) -> Vec<u8> {
    value.to_le_bytes()[..usize::from(width.min(4))].to_vec()
}

/// Check that `value` fits in `width` bytes.
pub fn fits_width(value: u32, width: u8) -> bool {
    match width {
        0 => value == 0,
        1..=3 => value < (1u32 << (8 * u32::from(width))),
        _ => true,
    }
}

/// Smallest encoding width for an immediate: 1, 2 or 4 bytes.
pub fn minimal_width(value: u32) -> u8 {
    if value <= 0xFF {
        1
    } else if value <= 0xFFFF {
        2
    } else {
        4
    }
}

/// Decode the body of a quoted string token.
///
/// Supports `\n`, `\r`, `\t`, `\0`, `\\` and `\"`; any other escaped byte is
/// kept as-is.
pub fn decode_string(raw: &str) -> Vec<u8> {
    let body = raw
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(raw);
    let mut out = Vec::with_capacity(body.len());
    let mut bytes = body.bytes();
    while let Some(c) = bytes.next() {
        if c != b'\\' {
            out.push(c);
            continue;
        }
        match bytes.next() {
            Some(b'n') => out.push(b'\n'),
            Some(b'r') => out.push(b'\r'),
            Some(b't') => out.push(b'\t'),
            Some(b'0') => out.push(0),
            Some(other) => out.push(other),
            None => out.push(b'\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_width_boundaries() {
        assert_eq!(minimal_width(0), 1);
        assert_eq!(minimal_width(0xFF), 1);
        assert_eq!(minimal_width(0x100), 2);
        assert_eq!(minimal_width(0xFFFF), 2);
        assert_eq!(minimal_width(0x1_0000), 4);
    }

    #[test]
    fn fits_width_checks_byte_count() {
        assert!(fits_width(0xFFFF, 2));
        assert!(!fits_width(0x1_0000, 2));
        assert!(fits_width(u32::MAX, 4));
    }

    #[test]
    fn value_bytes_are_little_endian() {
        assert_eq!(value_bytes(0x1234, 2), vec![0x34, 0x12]);
        assert_eq!(value_bytes(0x10, 1), vec![0x10]);
    }

    #[test]
    fn decodes_escapes() {
        assert_eq!(decode_string("\"a\\n\\\"b\""), b"a\n\"b".to_vec());
        assert_eq!(decode_string("\"\""), Vec::<u8>::new());
    }

    #[test]
    fn renders_source_syntax() {
        let span = Span::default();
        let imm = Argument::new(ArgumentKind::Immediate(0x10), 1, span);
        assert_eq!(imm.render(), "#0x10");
        let addr = Argument::new(ArgumentKind::Address(0x100), 2, span);
        assert_eq!(addr.render(), "$0x0100");
        let label = Argument::new(
            ArgumentKind::LabelRef {
                name: "end".to_string(),
                value: Some(4),
            },
            2,
            span,
        );
        assert_eq!(label.render(), "@end");
        assert_eq!(label.operand_kind(), Some(OperandKind::Memory));
    }
}
