// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Parsed assembly statements and the directive table.

use std::fmt;

use crate::core::operand::Argument;
use crate::core::tokenizer::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// Set the running offset.
    Org,
    /// Select a bank and restart the offset at zero.
    Bank,
    /// Emit literal data.
    Db,
}

pub struct DirectiveDef {
    pub directive: Directive,
    pub name: &'static str,
    pub serialize_arguments: bool,
}

pub static DIRECTIVES: &[DirectiveDef] = &[
    DirectiveDef {
        directive: Directive::Org,
        name: "org",
        serialize_arguments: false,
    },
    DirectiveDef {
        directive: Directive::Bank,
        name: "bank",
        serialize_arguments: false,
    },
    DirectiveDef {
        directive: Directive::Db,
        name: "db",
        serialize_arguments: true,
    },
];

impl Directive {
    /// Look up a directive by name, without the leading dot.
    pub fn lookup(name: &str) -> Option<Directive> {
        DIRECTIVES
            .iter()
            .find(|def| def.name == name)
            .map(|def| def.directive)
    }

    fn def(self) -> &'static DirectiveDef {
        match self {
            Directive::Org => &DIRECTIVES[0],
            Directive::Bank => &DIRECTIVES[1],
            Directive::Db => &DIRECTIVES[2],
        }
    }

    pub fn name(self) -> &'static str {
        self.def().name
    }

    pub fn serializes_arguments(self) -> bool {
        self.def().serialize_arguments
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Directive(Directive),
    Instruction { opcode: u16, mnemonic: String },
}

/// One assembly statement with its place in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub arguments: Vec<Argument>,
    pub span: Span,
    /// Offset of the first byte, after any rebasing by this action.
    pub offset: u32,
    pub bank: u16,
    /// Encoded length in bytes.
    pub length: u32,
}

impl Action {
    pub fn is_directive(&self, directive: Directive) -> bool {
        self.kind == ActionKind::Directive(directive)
    }

    pub fn opcode(&self) -> Option<u16> {
        match self.kind {
            ActionKind::Instruction { opcode, .. } => Some(opcode),
            ActionKind::Directive(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.arguments.iter().all(Argument::is_resolved)
    }

    /// Canonical source text: `mnemonic arg, arg` or `.name arg, arg`.
    pub fn render(&self) -> String {
        let head = match &self.kind {
            ActionKind::Directive(directive) => directive.to_string(),
            ActionKind::Instruction { mnemonic, .. } => mnemonic.clone(),
        };
        if self.arguments.is_empty() {
            return head;
        }
        let args = self
            .arguments
            .iter()
            .map(Argument::render)
            .collect::<Vec<_>>()
            .join(", ");
        format!("{head} {args}")
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::Directive;

    #[test]
    fn directive_lookup_is_exact() {
        assert_eq!(Directive::lookup("org"), Some(Directive::Org));
        assert_eq!(Directive::lookup("db"), Some(Directive::Db));
        assert_eq!(Directive::lookup("ORG"), None);
        assert_eq!(Directive::lookup(".org"), None);
    }

    #[test]
    fn only_db_serializes_arguments() {
        assert!(Directive::Db.serializes_arguments());
        assert!(!Directive::Org.serializes_arguments());
        assert!(!Directive::Bank.serializes_arguments());
    }
}
