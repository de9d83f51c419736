// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::{assemble, run, AsmErrorKind, BuildConfig, Cli};
use crate::core::build::BuildResult;
use crate::targets::km8::Km8Target;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

fn create_temp_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("kasm-test-{label}-{}-{nanos}", process::id()));
    fs::create_dir_all(&dir).expect("Create temp dir");
    dir
}

fn write_file(path: &Path, contents: &str) {
    fs::write(path, contents).expect("Write source file");
}

fn config(dir: &Path, source: &str) -> BuildConfig {
    let input = dir.join("prog.asm");
    write_file(&input, source);
    BuildConfig {
        output: dir.join("prog.bin"),
        hex: Some(dir.join("prog.hex")),
        listing: Some(dir.join("prog.lst")),
        target: "km8".to_string(),
        input,
    }
}

#[test]
fn assemble_writes_bin_hex_and_listing() {
    let dir = create_temp_dir("outputs");
    let config = config(&dir, "@start:\n  ldr r1, #0x10\n  jmp @start\n");
    let report = assemble(&config, &Km8Target::new()).expect("assemble");
    assert_eq!(report.image_size(), 6);

    let bin = fs::read(&config.output).expect("read bin");
    assert_eq!(bin, vec![0x02, 0x01, 0x10, 0x30, 0x00, 0x00]);

    let hex = fs::read_to_string(dir.join("prog.hex")).expect("read hex");
    assert_eq!(hex.lines().next(), Some(":06000000020110300000B7"));
    assert_eq!(hex.lines().last(), Some(":00000001FF"));

    let listing = fs::read_to_string(dir.join("prog.lst")).expect("read listing");
    assert!(listing.contains("00:0000    02 01 10"));
    assert!(listing.contains("ldr r1, #0x10"));
    assert!(listing.contains("jmp @start"));
    assert!(listing.contains("start"));
    assert!(listing.contains("Total image is 6 bytes"));
}

#[test]
fn failed_build_reports_diagnostic_and_writes_nothing() {
    let dir = create_temp_dir("failure");
    let config = config(&dir, "nop\n@start:\n@start:\n");
    let err = assemble(&config, &Km8Target::new()).expect_err("duplicate label");
    assert_eq!(err.result(), Some(BuildResult::SyntaxError));
    assert_eq!(err.error().kind(), AsmErrorKind::Parser);
    assert_eq!(err.diagnostics().len(), 1);
    assert_eq!(err.diagnostics()[0].line(), 3);
    assert_eq!(err.source_lines()[2], "@start:");
    assert!(!config.output.exists());
    assert!(!dir.join("prog.hex").exists());
    assert!(!dir.join("prog.lst").exists());
}

#[test]
fn run_lists_targets_and_opcodes() {
    let cli = Cli::try_parse_from(["kasm", "--list-targets"]).unwrap();
    let mut out = Vec::new();
    run(&cli, &mut out).expect("list targets");
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("km8"));

    let cli = Cli::try_parse_from(["kasm", "--opcodes", "-t", "KM8"]).unwrap();
    let mut out = Vec::new();
    run(&cli, &mut out).expect("opcodes");
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "km8 v0.1.0");
    assert_eq!(lines[1], "00 nop    none");
    assert!(lines.contains(&"02 ldr    reg, imm"));
}

#[test]
fn run_rejects_unknown_target() {
    let cli = Cli::try_parse_from(["kasm", "-f", "prog.asm", "-t", "z80"]).unwrap();
    let mut out = Vec::new();
    let err = run(&cli, &mut out).expect_err("unknown target");
    assert_eq!(err.error().kind(), AsmErrorKind::Target);
    assert!(err.to_string().contains("unknown target 'z80'"));
}
