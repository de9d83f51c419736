// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use std::fs;
use std::path::PathBuf;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use kasm::core::build::{build, BuildContext, BuildError, BuildResult, BuildStage, BuildState};
use kasm::core::parser::ParseError;
use kasm::core::resolve::ResolveError;
use kasm::core::tokenizer::{LexError, TOKEN_BUFFER_SIZE};
use kasm::targets::km8::Km8Target;

fn temp_path(label: &str, ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("kasm-{label}-{}-{nanos}.{ext}", process::id()))
}

fn assemble(source: &str) -> BuildContext<'static> {
    static TARGET: Km8Target = Km8Target;
    BuildContext::new(&TARGET).assemble(source.as_bytes())
}

fn image_bytes(source: &str) -> Vec<u8> {
    let context = assemble(source);
    assert_eq!(
        context.result(),
        Some(BuildResult::Success),
        "build failed: {:?}",
        context.error().map(ToString::to_string)
    );
    context
        .image()
        .map(|image| image.bytes().to_vec())
        .unwrap_or_default()
}

#[test]
fn label_and_nop() {
    let context = assemble("@start:\n  nop\n");
    assert_eq!(context.image().unwrap().bytes(), &[0x00]);
    assert_eq!(context.labels().lookup("start"), Some(0));
}

#[test]
fn register_immediate_load() {
    assert_eq!(image_bytes("ldr r1, #0x10\n"), vec![0x02, 0x01, 0x10]);
}

#[test]
fn forward_reference_resolves() {
    let bytes = image_bytes("jmp @end\nnop\nnop\n@end:\nhlt\n");
    assert_eq!(bytes, vec![0x30, 0x05, 0x00, 0x00, 0x00, 0x45]);
}

#[test]
fn missing_forward_label_names_it() {
    let context = assemble("jmp @end\nnop\n");
    assert_eq!(context.result(), Some(BuildResult::SyntaxError));
    match context.error() {
        Some(BuildError::Resolve(ResolveError::UnresolvedLabel { name, span })) => {
            assert_eq!(name, "end");
            assert_eq!(span.line, 1);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn argument_count_is_not_a_sequence_error() {
    let context = assemble("add r1, r2, r3\n");
    assert!(matches!(
        context.error(),
        Some(BuildError::Parse(ParseError::ArgumentCount { found: 3, .. }))
    ));
}

#[test]
fn duplicate_label_writes_no_output() {
    let input = temp_path("dup", "asm");
    let output = temp_path("dup", "bin");
    fs::write(&input, "@start:\nnop\n@start:\nhlt\n").unwrap();

    let target = Km8Target::new();
    let context = build(&input, &output, &target);
    assert_eq!(context.result(), Some(BuildResult::SyntaxError));
    assert!(matches!(
        context.error(),
        Some(BuildError::Parse(ParseError::DuplicateLabel { .. }))
    ));
    assert!(!output.exists());
    let _ = fs::remove_file(&input);
}

#[test]
fn failed_build_keeps_previous_output() {
    let input = temp_path("keep", "asm");
    let output = temp_path("keep", "bin");
    fs::write(&input, "nop\njmp @missing\n").unwrap();
    fs::write(&output, [0xAAu8, 0xBB]).unwrap();

    let target = Km8Target::new();
    let context = build(&input, &output, &target);
    assert_eq!(context.state(), BuildState::Failed(BuildStage::Finalize));
    assert_eq!(fs::read(&output).unwrap(), vec![0xAA, 0xBB]);
    let _ = fs::remove_file(&input);
    let _ = fs::remove_file(&output);
}

#[test]
fn build_writes_image_file() {
    let input = temp_path("ok", "asm");
    let output = temp_path("ok", "bin");
    fs::write(
        &input,
        "; demo\n.org $0x0100\n@data:\n.db \"ok\"\n.db #0x0A\nldr r2, @data\n",
    )
    .unwrap();

    let target = Km8Target::new();
    let context = build(&input, &output, &target);
    assert_eq!(context.state(), BuildState::Complete);
    assert_eq!(context.labels().lookup("data"), Some(0x0100));
    assert_eq!(
        fs::read(&output).unwrap(),
        vec![b'o', b'k', 0x0A, 0x01, 0x02, 0x00, 0x01]
    );
    let _ = fs::remove_file(&input);
    let _ = fs::remove_file(&output);
}

#[test]
fn assembling_twice_is_byte_identical() {
    let source = "@loop:\n  ldr r1, #0x01\n  add r1, #0x02\n  cmp r1, #0x10\n  jnz @loop\n  hlt\n";
    assert_eq!(image_bytes(source), image_bytes(source));
}

#[test]
fn label_offsets_sum_preceding_lengths() {
    let context = assemble("nop\nldr r1, $0x1000\n@a:\npush r2\n.db \"xyz\"\n@b:\n");
    assert_eq!(context.labels().lookup("a"), Some(5));
    assert_eq!(context.labels().lookup("b"), Some(10));
}

#[test]
fn longest_token_is_accepted_and_one_more_overflows() {
    let name = "a".repeat(TOKEN_BUFFER_SIZE - 2);
    let context = assemble(&format!("@{name}:\njmp @{name}\n"));
    assert_eq!(context.tokens()[0].len(), TOKEN_BUFFER_SIZE);
    assert_eq!(context.labels().lookup(&name), Some(0));
    assert_eq!(context.image().unwrap().bytes(), &[0x30, 0x00, 0x00]);

    let long = format!("jmp @{}\n", "a".repeat(TOKEN_BUFFER_SIZE));
    let context = assemble(&format!("nop\n{long}"));
    assert_eq!(context.result(), Some(BuildResult::BufferOverflow));
    match context.error() {
        Some(BuildError::Lex(LexError::TokenOverflow { span, .. })) => {
            assert_eq!(span.line, 2);
            assert_eq!(span.col_start, 5);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn missing_input_is_file_error() {
    let input = temp_path("missing", "asm");
    let output = temp_path("missing", "bin");
    let target = Km8Target::new();
    let context = build(&input, &output, &target);
    assert_eq!(context.result(), Some(BuildResult::FileError));
    assert!(!output.exists());
}

#[test]
fn org_cannot_overlap_emitted_bytes() {
    let context = assemble("nop\n.org $0x0000\nhlt\n");
    assert_eq!(context.result(), Some(BuildResult::SyntaxError));
    assert!(matches!(
        context.error(),
        Some(BuildError::Parse(ParseError::OrgBackwards { offset: 1, .. }))
    ));
    assert!(context.image().is_none());
}
