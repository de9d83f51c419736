// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Listing file generation.

use std::io::Write;

use crate::core::action::Action;
use crate::core::symbol_table::LabelTable;
use crate::core::target::TargetInfo;

/// Data for a single listing line.
pub struct ListingLine<'a> {
    pub addr: u32,
    pub bank: u16,
    pub bytes: &'a [u8],
    pub line_num: u32,
    pub source: &'a str,
}

impl<'a> ListingLine<'a> {
    pub fn from_action(action: &'a Action, bytes: &'a [u8], source: &'a str) -> Self {
        Self {
            addr: action.offset,
            bank: action.bank,
            bytes,
            line_num: action.span.line,
            source,
        }
    }
}

/// Writer for listing file output.
pub struct ListingWriter<W: Write> {
    out: W,
}

impl<W: Write> ListingWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn header(&mut self, title: &str, target: &TargetInfo) -> std::io::Result<()> {
        writeln!(self.out, "{title}")?;
        writeln!(self.out, "target {} {}", target.name, target.version)?;
        writeln!(self.out, "BANK:ADDR  BYTES                    LINE  SOURCE")?;
        writeln!(self.out, "---------  -----------------------  ----  ------")?;
        Ok(())
    }

    pub fn write_line(&mut self, line: ListingLine<'_>) -> std::io::Result<()> {
        writeln!(
            self.out,
            "{:02X}:{:<6}  {:<23}  {:>4}  {}",
            line.bank,
            format!("{:04X}", line.addr),
            format_bytes(line.bytes),
            line.line_num,
            line.source
        )
    }

    pub fn footer(&mut self, labels: &LabelTable, total_bytes: usize) -> std::io::Result<()> {
        writeln!(self.out, "\nSYMBOL TABLE\n")?;
        labels.dump(&mut self.out)?;
        writeln!(self.out, "\nTotal image is {} bytes", total_bytes)?;
        self.out.flush()
    }
}

/// Format bytes as hex string for listing.
pub fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
