// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Opcode table for the km8.
//!
//! Entries are sorted by opcode. Slots not listed are undefined. Jumps and
//! `call` take an address in the even slot and a register in the odd slot.

use crate::core::operand::OperandKind::{self, Immediate as Imm, Memory as Mem, Register as Reg};
use crate::core::target::OpcodeDef;

/// A table entry: opcode slot plus its definition.
pub struct Km8OpcodeEntry {
    pub opcode: u8,
    pub def: OpcodeDef,
}

const NONE: &[OperandKind] = &[];
const R: &[OperandKind] = &[Reg];
const M: &[OperandKind] = &[Mem];
const RR: &[OperandKind] = &[Reg, Reg];
const RI: &[OperandKind] = &[Reg, Imm];
const RM: &[OperandKind] = &[Reg, Mem];

const fn entry(opcode: u8, mnemonic: &'static str, operands: &'static [OperandKind]) -> Km8OpcodeEntry {
    Km8OpcodeEntry {
        opcode,
        def: OpcodeDef { mnemonic, operands },
    }
}

pub static KM8_OPCODE_TABLE: &[Km8OpcodeEntry] = &[
    entry(0x00, "nop", NONE),
    // Load/store and register moves
    entry(0x01, "ldr", RM),
    entry(0x02, "ldr", RI),
    entry(0x03, "str", RM),
    entry(0x04, "mov", RR),
    entry(0x05, "swp", RR),
    entry(0x06, "push", R),
    entry(0x07, "pop", R),
    entry(0x08, "clr", R),
    // Arithmetic
    entry(0x10, "add", RR),
    entry(0x11, "add", RI),
    entry(0x12, "adc", RR),
    entry(0x13, "adc", RI),
    entry(0x14, "inc", R),
    entry(0x15, "sub", RR),
    entry(0x16, "sub", RI),
    entry(0x17, "sbc", RR),
    entry(0x18, "sbc", RI),
    entry(0x19, "dec", R),
    entry(0x1A, "cmp", RR),
    entry(0x1B, "cmp", RI),
    // Logic
    entry(0x20, "and", RR),
    entry(0x21, "and", RI),
    entry(0x22, "or", RR),
    entry(0x23, "or", RI),
    entry(0x24, "xor", RR),
    entry(0x25, "xor", RI),
    entry(0x26, "not", RR),
    entry(0x27, "shl", RR),
    entry(0x28, "shr", RR),
    entry(0x29, "rol", RR),
    entry(0x2A, "ror", RR),
    entry(0x2B, "tst", RR),
    entry(0x2C, "tst", RI),
    // Control flow
    entry(0x30, "jmp", M),
    entry(0x31, "jmp", R),
    entry(0x32, "jz", M),
    entry(0x33, "jz", R),
    entry(0x34, "jnz", M),
    entry(0x35, "jnz", R),
    entry(0x36, "jc", M),
    entry(0x37, "jc", R),
    entry(0x38, "jnc", M),
    entry(0x39, "jnc", R),
    entry(0x3A, "jn", M),
    entry(0x3B, "jn", R),
    entry(0x3C, "jnn", M),
    entry(0x3D, "jnn", R),
    entry(0x3E, "jv", M),
    entry(0x3F, "jv", R),
    entry(0x40, "jnv", M),
    entry(0x41, "jnv", R),
    entry(0x42, "call", M),
    entry(0x43, "call", R),
    entry(0x44, "ret", NONE),
    entry(0x45, "hlt", NONE),
];

pub fn lookup_opcode(opcode: u16) -> Option<&'static OpcodeDef> {
    KM8_OPCODE_TABLE
        .binary_search_by_key(&opcode, |entry| u16::from(entry.opcode))
        .ok()
        .map(|index| &KM8_OPCODE_TABLE[index].def)
}
