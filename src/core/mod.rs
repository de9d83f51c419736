// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Architecture-agnostic assembler core.
//!
//! Source text flows through the stages below; a [`Target`] supplies the
//! opcode table and the final instruction encoding.
//!
//! # Components
//!
//! - [`tokenizer`] - Bounded-buffer tokenizer over a byte stream
//! - [`token_kind`] - Token classification and category adjacency sets
//! - [`grammar`] - Token sequence validation
//! - [`parser`] - Action and label construction
//! - [`resolve`] - Label resolution and image assembly
//! - [`target`] - Target contract
//! - [`registry`] - Target lookup by name
//! - [`build`] - Build stages and the owning [`BuildContext`]
//! - [`imagestore`] - Assembled image with bin/hex output
//! - [`report`] - Source context for diagnostics

pub mod action;
pub mod build;
pub mod grammar;
pub mod imagestore;
pub mod operand;
pub mod parser;
pub mod registry;
pub mod report;
pub mod resolve;
pub mod symbol_table;
pub mod target;
pub mod token_kind;
pub mod tokenizer;

// Re-exports for convenience
pub use action::{Action, ActionKind, Directive};
pub use build::{build, BuildContext, BuildError, BuildResult, BuildStage, BuildState};
pub use imagestore::ImageStore;
pub use operand::{Argument, ArgumentKind, OperandKind};
pub use parser::{ParseError, ParserContext};
pub use registry::{RegistryError, TargetModule, TargetRegistry};
pub use resolve::ResolveError;
pub use symbol_table::{Label, LabelTable};
pub use target::{EncodeError, OpcodeDef, Target, TargetInfo};
pub use token_kind::{TokenCategory, TokenKind};
pub use tokenizer::{tokenize, tokenize_str, LexError, Span, Token, Tokenizer};
