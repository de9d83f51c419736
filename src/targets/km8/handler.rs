// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! km8 target implementation.

use crate::core::action::Action;
use crate::core::operand::{fits_width, value_bytes};
use crate::core::target::{EncodeError, OpcodeDef, Target, TargetInfo};
use crate::targets::km8::table::lookup_opcode;

/// Encoding of the stack pointer register.
pub const SP_INDEX: u8 = 14;
/// Encoding of the program counter register.
pub const PC_INDEX: u8 = 15;

static KM8_INFO: TargetInfo = TargetInfo {
    name: "km8",
    version: "v0.1.0",
    opcode_count: 256,
    immediate_width: 1,
    address_width: 2,
    register_count: 14,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct Km8Target;

impl Km8Target {
    pub fn new() -> Self {
        Self
    }
}

impl Target for Km8Target {
    fn info(&self) -> &TargetInfo {
        &KM8_INFO
    }

    fn opcode(&self, index: u16) -> Option<&OpcodeDef> {
        lookup_opcode(index)
    }

    fn register_index(&self, name: &str) -> Option<u8> {
        match name {
            "sp" => Some(SP_INDEX),
            "pc" => Some(PC_INDEX),
            _ => {
                let index: u8 = name.strip_prefix('r')?.parse().ok()?;
                (index < KM8_INFO.register_count).then_some(index)
            }
        }
    }

    fn encode(&self, action: &Action) -> Result<Vec<u8>, EncodeError> {
        let opcode = action
            .opcode()
            .ok_or_else(|| EncodeError::with_span("not an instruction", action.span))?;
        let def = lookup_opcode(opcode).ok_or_else(|| {
            EncodeError::with_span(format!("undefined opcode {opcode:#04X}"), action.span)
        })?;
        if def.operands.len() != action.arguments.len() {
            return Err(EncodeError::with_span(
                format!(
                    "'{}' takes {} operand(s), found {}",
                    def.mnemonic,
                    def.operands.len(),
                    action.arguments.len()
                ),
                action.span,
            ));
        }

        let mut bytes = Vec::with_capacity(4);
        bytes.push(opcode as u8);
        for (argument, kind) in action.arguments.iter().zip(def.operands) {
            if argument.operand_kind() != Some(*kind) {
                return Err(EncodeError::with_span(
                    format!("expected {kind} operand, found '{}'", argument.render()),
                    argument.span,
                ));
            }
            let value = argument.value().ok_or_else(|| {
                EncodeError::with_span(
                    format!("unresolved operand '{}'", argument.render()),
                    argument.span,
                )
            })?;
            let size = self.operand_size(*kind);
            if !fits_width(value, size) {
                return Err(EncodeError::with_span(
                    format!("operand '{}' does not fit in {size} byte(s)", argument.render()),
                    argument.span,
                ));
            }
            bytes.extend(value_bytes(value, size));
        }
        Ok(bytes)
    }
}
