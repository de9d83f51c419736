// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Label resolution and image assembly.
//!
//! Offsets are already final when parsing completes. Resolution fills in every
//! label reference from the label table, then assembly hands each action to
//! the target (instructions) or serializes it here (data directives) and
//! stores the bytes at the action's offset.

use thiserror::Error;
use tracing::debug;

use crate::core::action::{Action, ActionKind};
use crate::core::imagestore::ImageStore;
use crate::core::operand::{fits_width, value_bytes, Argument, ArgumentKind};
use crate::core::symbol_table::LabelTable;
use crate::core::target::{EncodeError, Target};
use crate::core::tokenizer::Span;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unresolved label '{name}'")]
    UnresolvedLabel { name: String, span: Span },
    #[error("label '{name}' at {value:#06X} does not fit in {width} byte(s)")]
    AddressOutOfRange {
        name: String,
        value: u32,
        width: u8,
        span: Span,
    },
}

impl ResolveError {
    pub fn span(&self) -> Span {
        match self {
            ResolveError::UnresolvedLabel { span, .. }
            | ResolveError::AddressOutOfRange { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AssembleError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("allocation failed while assembling the image")]
    AllocFailed { span: Span },
}

/// Fill in every label reference. Returns the number of references resolved.
pub fn resolve_labels(actions: &mut [Action], labels: &LabelTable) -> Result<usize, ResolveError> {
    let mut resolved = 0;
    for argument in actions
        .iter_mut()
        .flat_map(|action| action.arguments.iter_mut())
    {
        let ArgumentKind::LabelRef { name, value } = &mut argument.kind else {
            continue;
        };
        let offset = labels
            .lookup(name)
            .ok_or_else(|| ResolveError::UnresolvedLabel {
                name: name.clone(),
                span: argument.span,
            })?;
        if !fits_width(offset, argument.width) {
            return Err(ResolveError::AddressOutOfRange {
                name: name.clone(),
                value: offset,
                width: argument.width,
                span: argument.span,
            });
        }
        *value = Some(offset);
        resolved += 1;
    }
    debug!(references = resolved, "labels resolved");
    Ok(resolved)
}

/// Encode every action and store its bytes at the action's offset.
pub fn assemble_image(actions: &[Action], target: &dyn Target) -> Result<ImageStore, AssembleError> {
    let mut image = ImageStore::new();
    for action in actions {
        let bytes = encode_action(action, target)?;
        if bytes.len() as u64 != u64::from(action.length) {
            return Err(EncodeError::with_span(
                format!(
                    "'{}' encoded to {} byte(s), expected {}",
                    action,
                    bytes.len(),
                    action.length
                ),
                action.span,
            )
            .into());
        }
        image
            .store_slice(action.bank, action.offset, &bytes)
            .map_err(|_| AssembleError::AllocFailed { span: action.span })?;
    }
    debug!(
        bytes = image.len(),
        segments = image.segments().len(),
        "image assembled"
    );
    Ok(image)
}

/// Bytes for one action.
pub fn encode_action(action: &Action, target: &dyn Target) -> Result<Vec<u8>, EncodeError> {
    if let Some(argument) = action.arguments.iter().find(|arg| !arg.is_resolved()) {
        return Err(EncodeError::with_span(
            format!("unresolved argument '{}'", argument.render()),
            argument.span,
        ));
    }
    match &action.kind {
        ActionKind::Instruction { .. } => target.encode(action),
        ActionKind::Directive(directive) if directive.serializes_arguments() => {
            serialize_data(&action.arguments)
        }
        ActionKind::Directive(_) => Ok(Vec::new()),
    }
}

fn serialize_data(arguments: &[Argument]) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    for argument in arguments {
        match &argument.kind {
            ArgumentKind::String { bytes, .. } => out.extend_from_slice(bytes),
            ArgumentKind::Register { name, .. } => {
                return Err(EncodeError::with_span(
                    format!("register '{name}' cannot be emitted as data"),
                    argument.span,
                ))
            }
            _ => {
                let value = argument.value().ok_or_else(|| {
                    EncodeError::with_span("argument has no value", argument.span)
                })?;
                out.extend(value_bytes(value, argument.width));
            }
        }
    }
    Ok(out)
}
