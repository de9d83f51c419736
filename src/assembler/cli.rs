// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and argument validation.

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use tracing::Level;

use crate::assembler::error::{AsmError, AsmErrorKind, AsmRunError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const LONG_ABOUT: &str = "Retargetable assembler with pluggable CPU targets.

Assembles one source file for the target selected with -t/--target and writes
the raw binary image. The image is written only when assembly succeeds.
Use -x/--hex and -l/--list to additionally emit Intel HEX and a listing; when
their FILE is omitted the output base is used with a .hex or .lst extension.";

#[derive(Parser, Debug)]
#[command(
    name = "kasm",
    version = VERSION,
    about = "Retargetable assembler with pluggable CPU targets",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        long_help = "Input assembly source file."
    )]
    pub infile: Option<PathBuf>,
    #[arg(
        short = 't',
        long = "target",
        value_name = "NAME",
        long_help = "Target to assemble for. Names are matched ignoring case; see --list-targets."
    )]
    pub target: Option<String>,
    #[arg(
        short = 'o',
        long = "outfile",
        value_name = "FILE",
        long_help = "Raw binary output file. Defaults to the input file with a .bin extension."
    )]
    pub outfile: Option<PathBuf>,
    #[arg(
        short = 'x',
        long = "hex",
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "",
        long_help = "Emit an Intel Hex file. FILE is optional; when omitted, the output base is used and a .hex extension is added."
    )]
    pub hex_name: Option<String>,
    #[arg(
        short = 'l',
        long = "list",
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "",
        long_help = "Emit a listing file. FILE is optional; when omitted, the output base is used and a .lst extension is added."
    )]
    pub list_name: Option<String>,
    #[arg(
        long = "opcodes",
        action = ArgAction::SetTrue,
        long_help = "Print the opcode table of the selected target and exit."
    )]
    pub opcodes: bool,
    #[arg(
        long = "list-targets",
        action = ArgAction::SetTrue,
        long_help = "Print the registered targets and exit."
    )]
    pub list_targets: bool,
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        default_value_t = Level::WARN,
        long_help = "Log level for diagnostics on stderr (error, warn, info, debug, trace). RUST_LOG overrides it."
    )]
    pub log_level: Level,
}

/// Paths and target for one assembly run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub input: PathBuf,
    pub target: String,
    pub output: PathBuf,
    pub hex: Option<PathBuf>,
    pub listing: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    ListTargets,
    Opcodes { target: String },
    Assemble(BuildConfig),
}

fn cli_error(msg: &str, param: Option<&str>) -> AsmRunError {
    AsmRunError::new(AsmError::new(AsmErrorKind::Cli, msg, param), Vec::new(), Vec::new())
}

/// Resolve an optional output name: empty means `<base>.<extension>`, a name
/// without extension gets `extension` added.
pub fn resolve_output_path(base: &Path, name: Option<&str>, extension: &str) -> Option<PathBuf> {
    let name = name?;
    if name.is_empty() {
        return Some(base.with_extension(extension));
    }
    let path = PathBuf::from(name);
    if path.extension().is_none() {
        return Some(path.with_extension(extension));
    }
    Some(path)
}

/// Validate CLI arguments and return the command to run.
pub fn validate_cli(cli: &Cli) -> Result<CliCommand, AsmRunError> {
    if cli.list_targets {
        return Ok(CliCommand::ListTargets);
    }

    let target = match cli.target.as_deref() {
        Some(target) if !target.is_empty() => target.to_string(),
        _ => return Err(cli_error("No target specified. Use -t/--target", None)),
    };
    if cli.opcodes {
        return Ok(CliCommand::Opcodes { target });
    }

    let input = cli
        .infile
        .clone()
        .ok_or_else(|| cli_error("No input file specified. Use -f/--file", None))?;
    if input.file_name().is_none() {
        return Err(cli_error(
            "Invalid input file name",
            Some(&input.to_string_lossy()),
        ));
    }

    let output = cli
        .outfile
        .clone()
        .unwrap_or_else(|| input.with_extension("bin"));
    if output == input {
        return Err(cli_error(
            "Output file would overwrite the input",
            Some(&output.to_string_lossy()),
        ));
    }

    let base = output.with_extension("");
    let hex = resolve_output_path(&base, cli.hex_name.as_deref(), "hex");
    let listing = resolve_output_path(&base, cli.list_name.as_deref(), "lst");
    for path in hex.iter().chain(listing.iter()) {
        if *path == input || *path == output {
            return Err(cli_error(
                "Output files must differ from the input and binary output",
                Some(&path.to_string_lossy()),
            ));
        }
    }

    Ok(CliCommand::Assemble(BuildConfig {
        input,
        target,
        output,
        hex,
        listing,
    }))
}

#[cfg(test)]
mod tests {
    use super::{validate_cli, BuildConfig, Cli, CliCommand};
    use clap::Parser;
    use std::path::PathBuf;
    use tracing::Level;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("kasm").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_output_next_to_input() {
        let cli = parse(&["-f", "prog.asm", "-t", "km8"]);
        assert_eq!(cli.log_level, Level::WARN);
        assert_eq!(
            validate_cli(&cli).unwrap(),
            CliCommand::Assemble(BuildConfig {
                input: PathBuf::from("prog.asm"),
                target: "km8".to_string(),
                output: PathBuf::from("prog.bin"),
                hex: None,
                listing: None,
            })
        );
    }

    #[test]
    fn optional_output_names_use_output_base() {
        let cli = parse(&["-f", "prog.asm", "-t", "km8", "-o", "out/rom.img", "-x", "-l", "rom"]);
        let CliCommand::Assemble(config) = validate_cli(&cli).unwrap() else {
            panic!("expected assemble command");
        };
        assert_eq!(config.hex, Some(PathBuf::from("out/rom.hex")));
        assert_eq!(config.listing, Some(PathBuf::from("rom.lst")));
    }

    #[test]
    fn missing_target_or_input_is_rejected() {
        let err = validate_cli(&parse(&["-f", "prog.asm"])).unwrap_err();
        assert_eq!(err.to_string(), "No target specified. Use -t/--target");
        let err = validate_cli(&parse(&["-t", "km8"])).unwrap_err();
        assert_eq!(err.to_string(), "No input file specified. Use -f/--file");
    }

    #[test]
    fn info_commands_need_less_configuration() {
        assert_eq!(
            validate_cli(&parse(&["--list-targets"])).unwrap(),
            CliCommand::ListTargets
        );
        assert_eq!(
            validate_cli(&parse(&["--opcodes", "-t", "km8"])).unwrap(),
            CliCommand::Opcodes {
                target: "km8".to_string()
            }
        );
    }

    #[test]
    fn output_may_not_overwrite_input() {
        let cli = parse(&["-f", "prog.bin", "-t", "km8"]);
        assert!(validate_cli(&cli).is_err());
    }

    #[test]
    fn log_level_is_parsed() {
        let cli = parse(&["--list-targets", "--log-level", "debug"]);
        assert_eq!(cli.log_level, Level::DEBUG);
    }
}
