// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! km8 reference target.
//!
//! A small 8-bit CPU with registers `r0`-`r13` plus `sp` and `pc`, one-byte
//! immediates and two-byte little-endian addresses. Every instruction is an
//! opcode byte followed by its operands in source order.

pub mod handler;
pub mod registry;
pub mod table;

pub use handler::{Km8Target, PC_INDEX, SP_INDEX};
pub use registry::Km8TargetModule;
pub use table::{lookup_opcode, KM8_OPCODE_TABLE};
