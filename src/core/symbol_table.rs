// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Label table: one definition per name, looked up by exact name.

use std::collections::HashMap;
use std::io::{self, Write};

use crate::core::tokenizer::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub offset: u32,
    pub bank: u16,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum LabelTableResult {
    Ok,
    Duplicate,
    AllocFailed,
}

#[derive(Debug, Default)]
pub struct LabelTable {
    entries: Vec<Label>,
    index: HashMap<String, usize>,
}

impl LabelTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: Label) -> LabelTableResult {
        if self.index.contains_key(&label.name) {
            return LabelTableResult::Duplicate;
        }
        if self.entries.try_reserve(1).is_err() || self.index.try_reserve(1).is_err() {
            return LabelTableResult::AllocFailed;
        }
        self.index.insert(label.name.clone(), self.entries.len());
        self.entries.push(label);
        LabelTableResult::Ok
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<u32> {
        self.entry(name).map(|label| label.offset)
    }

    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&Label> {
        self.index.get(name).map(|&ix| &self.entries[ix])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dump<W: Write>(&self, mut out: W) -> io::Result<()> {
        for label in &self.entries {
            writeln!(
                out,
                "{:<16}: {:02X}:{:04X} ({})",
                label.name, label.bank, label.offset, label.offset
            )?;
        }
        Ok(())
    }
}
