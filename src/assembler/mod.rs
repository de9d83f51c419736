// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line assembler driver.
//!
//! Validates the command line, resolves the target from the registry, runs a
//! build and writes the optional hex and listing outputs.

pub mod cli;
pub mod error;
pub mod listing;

#[cfg(test)]
mod tests;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::core::build::{build, BuildContext};
use crate::core::registry::TargetRegistry;
use crate::core::target::Target;

pub use cli::{validate_cli, BuildConfig, Cli, CliCommand, VERSION};
pub use error::{AsmError, AsmErrorKind, AsmRunError, AsmRunReport, Diagnostic};
use listing::{ListingLine, ListingWriter};

/// Run the command described by `cli`, writing informational output to
/// `out`.
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<AsmRunReport, AsmRunError> {
    let registry = TargetRegistry::with_defaults();
    match validate_cli(cli)? {
        CliCommand::ListTargets => {
            for module in registry.modules() {
                writeln!(out, "{:<8} {}", module.target_id(), module.description())
                    .map_err(io_error)?;
            }
            Ok(AsmRunReport::new(0))
        }
        CliCommand::Opcodes { target } => {
            let target = resolve_target(&registry, &target)?;
            let info = target.info();
            writeln!(out, "{} {}", info.name, info.version).map_err(io_error)?;
            for line in target.describe_opcodes() {
                writeln!(out, "{line}").map_err(io_error)?;
            }
            Ok(AsmRunReport::new(0))
        }
        CliCommand::Assemble(config) => {
            let target = resolve_target(&registry, &config.target)?;
            assemble(&config, target.as_ref())
        }
    }
}

fn resolve_target(registry: &TargetRegistry, name: &str) -> Result<Box<dyn Target>, AsmRunError> {
    registry.resolve(name).map_err(|err| {
        AsmRunError::new(
            AsmError::new(AsmErrorKind::Target, &err.to_string(), None),
            Vec::new(),
            Vec::new(),
        )
    })
}

/// Assemble one file according to `config`.
pub fn assemble(config: &BuildConfig, target: &dyn Target) -> Result<AsmRunReport, AsmRunError> {
    let context = build(&config.input, &config.output, target);
    if let Some(err) = context.error() {
        let file = config.input.to_string_lossy().to_string();
        let diagnostic = Diagnostic::from_build_error(err).with_file(Some(file));
        let result = err.build_result();
        return Err(AsmRunError::new(
            AsmError::from(err),
            vec![diagnostic],
            read_source_lines(&config.input),
        )
        .with_result(result));
    }

    if let Some(hex_path) = &config.hex {
        write_hex(&context, hex_path)?;
    }
    if let Some(list_path) = &config.listing {
        write_listing(&context, &config.input, list_path)?;
    }

    let size = context.image().map_or(0, |image| image.len());
    Ok(AsmRunReport::new(size))
}

fn write_hex(context: &BuildContext<'_>, path: &Path) -> Result<(), AsmRunError> {
    let Some(image) = context.image() else {
        return Ok(());
    };
    let file = File::create(path).map_err(|err| output_error(path, err))?;
    image
        .write_hex_file(BufWriter::new(file))
        .map_err(|err| output_error(path, err))?;
    debug!(path = %path.display(), "hex file written");
    Ok(())
}

fn write_listing(context: &BuildContext<'_>, input: &Path, path: &Path) -> Result<(), AsmRunError> {
    let Some(image) = context.image() else {
        return Ok(());
    };
    let file = File::create(path).map_err(|err| output_error(path, err))?;
    let mut writer = ListingWriter::new(BufWriter::new(file));
    let title = input.to_string_lossy();
    writer
        .header(&title, context.target().info())
        .map_err(|err| output_error(path, err))?;

    // Actions are stored back to back, so each one owns the next
    // `length` bytes of the image.
    let mut bytes = image.bytes();
    for action in context.actions() {
        let (head, rest) = bytes.split_at((action.length as usize).min(bytes.len()));
        bytes = rest;
        let source = action.render();
        writer
            .write_line(ListingLine::from_action(action, head, &source))
            .map_err(|err| output_error(path, err))?;
    }
    writer
        .footer(context.labels(), image.len())
        .map_err(|err| output_error(path, err))?;
    debug!(path = %path.display(), "listing written");
    Ok(())
}

fn read_source_lines(path: &Path) -> Vec<String> {
    fs::read(path)
        .map(|bytes| {
            String::from_utf8_lossy(&bytes)
                .lines()
                .map(|line| line.trim_end_matches('\r').to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn output_error(path: &Path, err: io::Error) -> AsmRunError {
    AsmRunError::new(
        AsmError::new(
            AsmErrorKind::Io,
            "Error writing output",
            Some(&format!("{}: {err}", path.display())),
        ),
        Vec::new(),
        Vec::new(),
    )
}

fn io_error(err: io::Error) -> AsmRunError {
    AsmRunError::new(
        AsmError::new(AsmErrorKind::Io, "Error writing output", Some(&err.to_string())),
        Vec::new(),
        Vec::new(),
    )
}
