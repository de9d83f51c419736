// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Action builder.
//!
//! Consumes a validated token sequence line by line. Directive and instruction
//! tokens open an action, value tokens append arguments to it and the end of
//! line commits it. Committing matches the operand signature against the
//! target and advances the running offset, so labels are bound to their final
//! offsets during this single pass; only label references stay unresolved.

use thiserror::Error;
use tracing::{debug, trace};

use crate::core::action::{Action, ActionKind, Directive};
use crate::core::grammar::validate_sequence;
use crate::core::operand::{
    decode_string, fits_width, format_signature, minimal_width, Argument, ArgumentKind,
    OperandKind,
};
use crate::core::symbol_table::{Label, LabelTable, LabelTableResult};
use crate::core::target::{SignatureMismatch, Target};
use crate::core::token_kind::{strip_hex_prefix, TokenKind};
use crate::core::tokenizer::{Span, Token};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected {kind} '{}' (after {before}, before {after})", .text.escape_default())]
    Sequence {
        index: usize,
        kind: TokenKind,
        text: String,
        before: TokenKind,
        after: TokenKind,
        span: Span,
    },
    #[error("more than one action on a line at '{text}'")]
    MultipleActions { text: String, span: Span },
    #[error("invalid directive '{name}'")]
    InvalidDirective { name: String, span: Span },
    #[error("invalid instruction '{mnemonic}'")]
    InvalidInstruction { mnemonic: String, span: Span },
    #[error("immediate '{text}' is out of range for {expected}-byte immediates")]
    ImmediateOutOfRange {
        text: String,
        expected: u8,
        span: Span,
    },
    #[error("address '{text}' does not fit in {width} byte(s)")]
    AddressOutOfRange { text: String, width: u8, span: Span },
    #[error("register '{name}' does not exist on this target")]
    RegisterOutOfRange { name: String, span: Span },
    #[error("'{name}' takes {expected} argument(s), found {found}")]
    ArgumentCount {
        name: String,
        expected: String,
        found: usize,
        span: Span,
    },
    #[error("no form of '{mnemonic}' takes ({found}), expected {expected}")]
    OperandMismatch {
        mnemonic: String,
        found: String,
        expected: String,
        span: Span,
    },
    #[error("{directive} does not accept '{text}'")]
    InvalidDirectiveArgument {
        directive: Directive,
        text: String,
        span: Span,
    },
    #[error("argument '{text}' is not part of an action")]
    MissingAction { text: String, span: Span },
    #[error("label '{name}' already defined on line {first_line}")]
    DuplicateLabel {
        name: String,
        first_line: u32,
        span: Span,
    },
    #[error(".org ${address:04X} is below the current offset ${offset:04X}")]
    OrgBackwards {
        address: u32,
        offset: u32,
        span: Span,
    },
    #[error("output offset overflow")]
    OffsetOverflow { span: Span },
    #[error("allocation failed while parsing")]
    AllocFailed { span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::Sequence { span, .. }
            | ParseError::MultipleActions { span, .. }
            | ParseError::InvalidDirective { span, .. }
            | ParseError::InvalidInstruction { span, .. }
            | ParseError::ImmediateOutOfRange { span, .. }
            | ParseError::AddressOutOfRange { span, .. }
            | ParseError::RegisterOutOfRange { span, .. }
            | ParseError::ArgumentCount { span, .. }
            | ParseError::OperandMismatch { span, .. }
            | ParseError::InvalidDirectiveArgument { span, .. }
            | ParseError::MissingAction { span, .. }
            | ParseError::DuplicateLabel { span, .. }
            | ParseError::OrgBackwards { span, .. }
            | ParseError::OffsetOverflow { span }
            | ParseError::AllocFailed { span } => *span,
        }
    }
}

enum OpenKind {
    Directive(Directive),
    Instruction(String),
}

/// The action being accumulated for the current line.
struct OpenAction {
    kind: OpenKind,
    arguments: Vec<Argument>,
    span: Span,
}

/// Parser state for one build.
pub struct ParserContext<'t> {
    target: &'t dyn Target,
    offset: u32,
    bank: u16,
    open: Option<OpenAction>,
    actions: Vec<Action>,
    labels: LabelTable,
}

impl<'t> ParserContext<'t> {
    pub fn new(target: &'t dyn Target) -> Self {
        Self {
            target,
            offset: 0,
            bank: 0,
            open: None,
            actions: Vec::new(),
            labels: LabelTable::new(),
        }
    }

    /// Validate `tokens` and build actions and labels from them.
    pub fn parse(&mut self, tokens: &[Token]) -> Result<(), ParseError> {
        validate_sequence(tokens)?;
        for token in tokens {
            self.parse_token(token)?;
        }
        // The last line may lack a newline.
        self.commit()?;
        debug!(
            actions = self.actions.len(),
            labels = self.labels.len(),
            end_offset = self.offset,
            "parsed token sequence"
        );
        Ok(())
    }

    pub fn into_parts(self) -> (Vec<Action>, LabelTable) {
        (self.actions, self.labels)
    }

    fn parse_token(&mut self, token: &Token) -> Result<(), ParseError> {
        match token.kind {
            TokenKind::LabelDef => self.define_label(token),
            TokenKind::Directive => self.open_directive(token),
            TokenKind::Instruction => self.open_instruction(token),
            TokenKind::Register => {
                let argument = self.parse_register(token)?;
                self.push_argument(argument, token)
            }
            TokenKind::Immediate => {
                let argument = self.parse_immediate(token)?;
                self.push_argument(argument, token)
            }
            TokenKind::Address => {
                let argument = self.parse_address(token)?;
                self.push_argument(argument, token)
            }
            TokenKind::LabelRef => {
                let argument = Argument::new(
                    ArgumentKind::LabelRef {
                        name: token.text[1..].to_string(),
                        value: None,
                    },
                    self.target.info().address_width,
                    token.span,
                );
                self.push_argument(argument, token)
            }
            TokenKind::String => {
                let argument = Argument::new(
                    ArgumentKind::String {
                        raw: token.text.clone(),
                        bytes: decode_string(&token.text),
                    },
                    1,
                    token.span,
                );
                self.push_argument(argument, token)
            }
            TokenKind::Comma => Ok(()),
            TokenKind::Eol => self.commit(),
        }
    }

    fn define_label(&mut self, token: &Token) -> Result<(), ParseError> {
        let name = &token.text[1..token.text.len() - 1];
        let label = Label {
            name: name.to_string(),
            offset: self.offset,
            bank: self.bank,
            span: token.span,
        };
        match self.labels.add(label) {
            LabelTableResult::Ok => {
                debug!(label = name, offset = self.offset, bank = self.bank, "label defined");
                Ok(())
            }
            LabelTableResult::Duplicate => Err(ParseError::DuplicateLabel {
                name: name.to_string(),
                first_line: self
                    .labels
                    .entry(name)
                    .map_or(0, |existing| existing.span.line),
                span: token.span,
            }),
            LabelTableResult::AllocFailed => Err(ParseError::AllocFailed { span: token.span }),
        }
    }

    fn open_directive(&mut self, token: &Token) -> Result<(), ParseError> {
        self.ensure_no_open_action(token)?;
        let directive =
            Directive::lookup(&token.text[1..]).ok_or_else(|| ParseError::InvalidDirective {
                name: token.text.clone(),
                span: token.span,
            })?;
        self.open = Some(OpenAction {
            kind: OpenKind::Directive(directive),
            arguments: Vec::new(),
            span: token.span,
        });
        Ok(())
    }

    fn open_instruction(&mut self, token: &Token) -> Result<(), ParseError> {
        self.ensure_no_open_action(token)?;
        if !self.target.has_mnemonic(&token.text) {
            return Err(ParseError::InvalidInstruction {
                mnemonic: token.text.clone(),
                span: token.span,
            });
        }
        self.open = Some(OpenAction {
            kind: OpenKind::Instruction(token.text.clone()),
            arguments: Vec::new(),
            span: token.span,
        });
        Ok(())
    }

    fn ensure_no_open_action(&self, token: &Token) -> Result<(), ParseError> {
        if self.open.is_some() {
            return Err(ParseError::MultipleActions {
                text: token.text.clone(),
                span: token.span,
            });
        }
        Ok(())
    }

    fn parse_register(&self, token: &Token) -> Result<Argument, ParseError> {
        let index = self
            .target
            .register_index(&token.text)
            .ok_or_else(|| ParseError::RegisterOutOfRange {
                name: token.text.clone(),
                span: token.span,
            })?;
        Ok(Argument::new(
            ArgumentKind::Register {
                name: token.text.clone(),
                index,
            },
            self.target.operand_size(OperandKind::Register),
            token.span,
        ))
    }

    fn parse_immediate(&self, token: &Token) -> Result<Argument, ParseError> {
        let expected = self.target.info().immediate_width;
        let out_of_range = || ParseError::ImmediateOutOfRange {
            text: token.text.clone(),
            expected,
            span: token.span,
        };
        let body = &token.text[1..];
        let value = match strip_hex_prefix(body) {
            Some(digits) => u32::from_str_radix(digits, 16),
            None => body.parse::<u32>(),
        }
        .map_err(|_| out_of_range())?;

        // The literal's own width has to match the target exactly.
        if minimal_width(value) != expected {
            return Err(out_of_range());
        }
        Ok(Argument::new(
            ArgumentKind::Immediate(value),
            expected,
            token.span,
        ))
    }

    fn parse_address(&self, token: &Token) -> Result<Argument, ParseError> {
        let width = self.target.info().address_width;
        let out_of_range = || ParseError::AddressOutOfRange {
            text: token.text.clone(),
            width,
            span: token.span,
        };
        let digits = strip_hex_prefix(&token.text[1..]).ok_or_else(out_of_range)?;
        let value = u32::from_str_radix(digits, 16).map_err(|_| out_of_range())?;
        if !fits_width(value, width) {
            return Err(out_of_range());
        }
        Ok(Argument::new(ArgumentKind::Address(value), width, token.span))
    }

    fn push_argument(&mut self, argument: Argument, token: &Token) -> Result<(), ParseError> {
        let Some(open) = self.open.as_mut() else {
            return Err(ParseError::MissingAction {
                text: token.text.clone(),
                span: token.span,
            });
        };
        open.arguments
            .try_reserve(1)
            .map_err(|_| ParseError::AllocFailed { span: token.span })?;
        open.arguments.push(argument);
        Ok(())
    }

    /// Close the open action, if any, and append it to the action list.
    fn commit(&mut self) -> Result<(), ParseError> {
        let Some(open) = self.open.take() else {
            return Ok(());
        };
        let span = open.span;
        let action = match open.kind {
            OpenKind::Instruction(mnemonic) => {
                self.commit_instruction(mnemonic, open.arguments, span)?
            }
            OpenKind::Directive(directive) => {
                self.commit_directive(directive, open.arguments, span)?
            }
        };
        trace!(
            line = span.line,
            offset = action.offset,
            length = action.length,
            action = %action,
            "action committed"
        );
        self.actions
            .try_reserve(1)
            .map_err(|_| ParseError::AllocFailed { span })?;
        self.actions.push(action);
        Ok(())
    }

    fn commit_instruction(
        &mut self,
        mnemonic: String,
        arguments: Vec<Argument>,
        span: Span,
    ) -> Result<Action, ParseError> {
        let kinds: Vec<OperandKind> = arguments
            .iter()
            .filter_map(Argument::operand_kind)
            .collect();
        let opcode = match self.target.match_opcode(&mnemonic, &kinds) {
            Ok(opcode) if kinds.len() == arguments.len() => opcode,
            Ok(_) => {
                return Err(ParseError::OperandMismatch {
                    found: format_signature(&kinds),
                    expected: "no string operands".to_string(),
                    mnemonic,
                    span,
                })
            }
            Err(SignatureMismatch::Count(counts)) => {
                return Err(ParseError::ArgumentCount {
                    name: mnemonic,
                    expected: join_counts(&counts),
                    found: arguments.len(),
                    span,
                })
            }
            Err(SignatureMismatch::Kinds(signatures)) => {
                return Err(ParseError::OperandMismatch {
                    found: format_signature(&kinds),
                    expected: signatures
                        .iter()
                        .map(|sig| format!("({})", format_signature(sig)))
                        .collect::<Vec<_>>()
                        .join(" or "),
                    mnemonic,
                    span,
                })
            }
            Err(SignatureMismatch::UnknownMnemonic) => {
                return Err(ParseError::InvalidInstruction { mnemonic, span })
            }
        };

        let length = self.target.instruction_length(opcode);
        let offset = self.offset;
        self.advance(length, span)?;
        Ok(Action {
            kind: ActionKind::Instruction { opcode, mnemonic },
            arguments,
            span,
            offset,
            bank: self.bank,
            length,
        })
    }

    fn commit_directive(
        &mut self,
        directive: Directive,
        arguments: Vec<Argument>,
        span: Span,
    ) -> Result<Action, ParseError> {
        let invalid = |argument: &Argument| ParseError::InvalidDirectiveArgument {
            directive,
            text: argument.render(),
            span: argument.span,
        };
        let length = match directive {
            Directive::Org => {
                let argument = single_argument(directive, &arguments, span)?;
                match argument.kind {
                    ArgumentKind::Immediate(value) | ArgumentKind::Address(value) => {
                        // Bytes already emitted in this bank must not be overlapped.
                        if value < self.offset {
                            return Err(ParseError::OrgBackwards {
                                address: value,
                                offset: self.offset,
                                span: argument.span,
                            });
                        }
                        self.offset = value;
                    }
                    _ => return Err(invalid(argument)),
                }
                0
            }
            Directive::Bank => {
                let argument = single_argument(directive, &arguments, span)?;
                let bank = match argument.kind {
                    ArgumentKind::Immediate(value) => {
                        u16::try_from(value).map_err(|_| invalid(argument))?
                    }
                    _ => return Err(invalid(argument)),
                };
                self.bank = bank;
                self.offset = 0;
                0
            }
            Directive::Db => {
                if arguments.is_empty() {
                    return Err(ParseError::ArgumentCount {
                        name: directive.to_string(),
                        expected: "at least 1".to_string(),
                        found: 0,
                        span,
                    });
                }
                let mut length = 0u32;
                for argument in &arguments {
                    length += match &argument.kind {
                        ArgumentKind::String { bytes, .. } => bytes.len() as u32,
                        ArgumentKind::Register { .. } => return Err(invalid(argument)),
                        _ => u32::from(argument.width),
                    };
                }
                length
            }
        };

        let offset = self.offset;
        self.advance(length, span)?;
        Ok(Action {
            kind: ActionKind::Directive(directive),
            arguments,
            span,
            offset,
            bank: self.bank,
            length,
        })
    }

    fn advance(&mut self, length: u32, span: Span) -> Result<(), ParseError> {
        self.offset = self
            .offset
            .checked_add(length)
            .ok_or(ParseError::OffsetOverflow { span })?;
        Ok(())
    }
}

fn single_argument(
    directive: Directive,
    arguments: &[Argument],
    span: Span,
) -> Result<&Argument, ParseError> {
    match arguments {
        [argument] => Ok(argument),
        _ => Err(ParseError::ArgumentCount {
            name: directive.to_string(),
            expected: "1".to_string(),
            found: arguments.len(),
            span,
        }),
    }
}

fn join_counts(counts: &[usize]) -> String {
    counts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Parse a token sequence in one go.
pub fn parse(
    tokens: &[Token],
    target: &dyn Target,
) -> Result<(Vec<Action>, LabelTable), ParseError> {
    let mut context = ParserContext::new(target);
    context.parse(tokens)?;
    Ok(context.into_parts())
}
