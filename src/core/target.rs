// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Target backend contract.
//!
//! A target supplies a read-only description of its architecture (widths,
//! register count, opcode table) and encodes fully resolved actions. The
//! assembler core never looks inside the encoding; it only matches operand
//! signatures and checks widths generically.

use thiserror::Error;

use crate::core::action::Action;
use crate::core::operand::{format_signature, OperandKind};
use crate::core::tokenizer::Span;

/// Static description of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    pub name: &'static str,
    pub version: &'static str,
    /// Number of opcode slots; not every slot has to be defined.
    pub opcode_count: u16,
    pub immediate_width: u8,
    pub address_width: u8,
    pub register_count: u8,
}

/// One opcode table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeDef {
    pub mnemonic: &'static str,
    pub operands: &'static [OperandKind],
}

impl OpcodeDef {
    pub fn operand_count(&self) -> usize {
        self.operands.len()
    }
}

/// Error returned by instruction encoding.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EncodeError {
    pub message: String,
    pub span: Option<Span>,
}

impl EncodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span: Some(span),
        }
    }
}

pub trait Target: Send + Sync {
    fn info(&self) -> &TargetInfo;

    /// Opcode entry for a slot, `None` for undefined slots.
    fn opcode(&self, index: u16) -> Option<&OpcodeDef>;

    /// Encode one resolved instruction.
    fn encode(&self, action: &Action) -> Result<Vec<u8>, EncodeError>;

    /// Encoded size of one operand.
    fn operand_size(&self, kind: OperandKind) -> u8 {
        match kind {
            OperandKind::Immediate => self.info().immediate_width,
            OperandKind::Register => 1,
            OperandKind::Memory => self.info().address_width,
        }
    }

    /// Map a register name to its encoding. The default accepts `rN` with
    /// `N < register_count`.
    fn register_index(&self, name: &str) -> Option<u8> {
        let index: u8 = name.strip_prefix('r')?.parse().ok()?;
        (index < self.info().register_count).then_some(index)
    }

    /// Size of the opcode itself, before operands.
    fn opcode_size(&self) -> u8 {
        1
    }
}

/// Why an operand list matched no opcode entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureMismatch {
    /// The mnemonic is not in the table at all.
    UnknownMnemonic,
    /// No entry takes this many operands. Holds the declared counts.
    Count(Vec<usize>),
    /// Entries with this count exist, but none with these kinds.
    Kinds(Vec<&'static [OperandKind]>),
}

impl dyn Target + '_ {
    /// Iterate over defined opcode slots.
    pub fn opcodes(&self) -> impl Iterator<Item = (u16, &OpcodeDef)> + '_ {
        (0..self.info().opcode_count).filter_map(move |index| {
            self.opcode(index)
                .filter(|def| !def.mnemonic.is_empty())
                .map(|def| (index, def))
        })
    }

    /// Check whether any opcode uses this mnemonic (exact match).
    pub fn has_mnemonic(&self, mnemonic: &str) -> bool {
        self.opcodes().any(|(_, def)| def.mnemonic == mnemonic)
    }

    /// Find the opcode whose mnemonic and operand kinds match exactly.
    pub fn match_opcode(
        &self,
        mnemonic: &str,
        kinds: &[OperandKind],
    ) -> Result<u16, SignatureMismatch> {
        let mut counts = Vec::new();
        let mut same_count = Vec::new();
        for (index, def) in self.opcodes().filter(|(_, def)| def.mnemonic == mnemonic) {
            if def.operands == kinds {
                return Ok(index);
            }
            if def.operand_count() == kinds.len() {
                same_count.push(def.operands);
            } else if !counts.contains(&def.operand_count()) {
                counts.push(def.operand_count());
            }
        }
        if !same_count.is_empty() {
            return Err(SignatureMismatch::Kinds(same_count));
        }
        if counts.is_empty() {
            return Err(SignatureMismatch::UnknownMnemonic);
        }
        counts.sort_unstable();
        Err(SignatureMismatch::Count(counts))
    }

    /// Encoded length of an instruction using the opcode in `index`.
    pub fn instruction_length(&self, index: u16) -> u32 {
        let operands = self
            .opcode(index)
            .map(|def| def.operands)
            .unwrap_or_default();
        operands
            .iter()
            .fold(u32::from(self.opcode_size()), |len, kind| {
                len + u32::from(self.operand_size(*kind))
            })
    }

    /// One line per defined opcode: `index mnemonic operands`.
    pub fn describe_opcodes(&self) -> Vec<String> {
        self.opcodes()
            .map(|(index, def)| {
                format!(
                    "{:02X} {:<6} {}",
                    index,
                    def.mnemonic,
                    format_signature(def.operands)
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{SignatureMismatch, Target};
    use crate::core::operand::OperandKind;
    use crate::targets::km8::Km8Target;

    #[test]
    fn matches_overloads_by_operand_kinds() {
        let target = Km8Target::new();
        let target: &dyn Target = &target;
        assert_eq!(
            target.match_opcode("ldr", &[OperandKind::Register, OperandKind::Memory]),
            Ok(0x01)
        );
        assert_eq!(
            target.match_opcode("ldr", &[OperandKind::Register, OperandKind::Immediate]),
            Ok(0x02)
        );
    }

    #[test]
    fn reports_count_and_kind_mismatches() {
        let target = Km8Target::new();
        let target: &dyn Target = &target;
        assert_eq!(
            target.match_opcode(
                "add",
                &[
                    OperandKind::Register,
                    OperandKind::Register,
                    OperandKind::Register
                ]
            ),
            Err(SignatureMismatch::Count(vec![2]))
        );
        assert!(matches!(
            target.match_opcode("ldr", &[OperandKind::Memory, OperandKind::Register]),
            Err(SignatureMismatch::Kinds(_))
        ));
        assert_eq!(
            target.match_opcode("bogus", &[]),
            Err(SignatureMismatch::UnknownMnemonic)
        );
    }

    #[test]
    fn instruction_length_sums_operand_sizes() {
        let target = Km8Target::new();
        let target: &dyn Target = &target;
        assert_eq!(target.instruction_length(0x00), 1);
        assert_eq!(target.instruction_length(0x01), 4);
        assert_eq!(target.instruction_length(0x02), 3);
    }

    #[test]
    fn register_index_respects_count() {
        let target = Km8Target::new();
        assert_eq!(target.register_index("r13"), Some(13));
        assert_eq!(target.register_index("r14"), None);
    }
}
