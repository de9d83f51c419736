// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types, diagnostics, and reporting for the command-line assembler.

use std::fmt;

use crate::core::build::{BuildError, BuildResult};
use crate::core::report::build_context_lines;

/// Categories of assembler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsmErrorKind {
    Assembler,
    Cli,
    Encode,
    Io,
    Lexer,
    Parser,
    Symbol,
    Target,
}

/// An assembler error with a kind and message.
#[derive(Debug, Clone)]
pub struct AsmError {
    kind: AsmErrorKind,
    message: String,
}

impl AsmError {
    pub fn new(kind: AsmErrorKind, msg: &str, param: Option<&str>) -> Self {
        Self {
            kind,
            message: format_error(msg, param),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> AsmErrorKind {
        self.kind
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AsmError {}

impl From<&BuildError> for AsmError {
    fn from(err: &BuildError) -> Self {
        let kind = match err {
            BuildError::Open { .. } | BuildError::Write { .. } => AsmErrorKind::Io,
            BuildError::Lex(_) => AsmErrorKind::Lexer,
            BuildError::Parse(_) => AsmErrorKind::Parser,
            BuildError::Resolve(_) => AsmErrorKind::Symbol,
            BuildError::Encode(_) => AsmErrorKind::Encode,
            BuildError::AllocFailed { .. } => AsmErrorKind::Assembler,
        };
        AsmError::new(kind, &err.to_string(), None)
    }
}

const ERROR_LABEL: &str = "ERROR";

/// An error diagnostic with location and context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub(crate) line: u32,
    pub(crate) column: Option<usize>,
    pub(crate) error: AsmError,
    pub(crate) file: Option<String>,
}

impl Diagnostic {
    pub fn new(line: u32, error: AsmError) -> Self {
        Self {
            line,
            column: None,
            error,
            file: None,
        }
    }

    /// Error diagnostic for a failed build, located at the error's span.
    pub fn from_build_error(err: &BuildError) -> Self {
        let span = err.span();
        Diagnostic::new(
            span.map_or(0, |span| span.line),
            AsmError::from(err),
        )
        .with_column(span.map(|span| span.col_start))
    }

    pub fn with_column(mut self, column: Option<usize>) -> Self {
        self.column = column;
        self
    }

    pub fn with_file(mut self, file: Option<String>) -> Self {
        self.file = file;
        self
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> Option<usize> {
        self.column
    }

    pub fn error(&self) -> &AsmError {
        &self.error
    }

    pub fn format(&self) -> String {
        format!(
            "{}: {ERROR_LABEL} - {}",
            self.line,
            self.error.message()
        )
    }

    pub fn format_with_context(&self, lines: Option<&[String]>, use_color: bool) -> String {
        let sev = ERROR_LABEL;
        let header = match &self.file {
            Some(file) => format!("{file}:{}: {sev}", self.line),
            None => format!("{}: {sev}", self.line),
        };

        let mut out = String::new();
        out.push_str(&header);
        out.push('\n');
        // Errors without a source location (I/O) get no context line.
        if self.line > 0 {
            for line in build_context_lines(self.line, self.column, lines, use_color) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out.push_str(&format!("{sev}: {}", self.error.message()));
        out
    }
}

/// Report from a successful assembly run.
#[derive(Debug)]
pub struct AsmRunReport {
    image_size: usize,
}

impl AsmRunReport {
    pub fn new(image_size: usize) -> Self {
        Self { image_size }
    }

    pub fn image_size(&self) -> usize {
        self.image_size
    }
}

/// Error from a failed assembly run.
#[derive(Debug)]
pub struct AsmRunError {
    error: AsmError,
    result: Option<BuildResult>,
    diagnostics: Vec<Diagnostic>,
    source_lines: Vec<String>,
}

impl AsmRunError {
    pub fn new(error: AsmError, diagnostics: Vec<Diagnostic>, source_lines: Vec<String>) -> Self {
        Self {
            error,
            result: None,
            diagnostics,
            source_lines,
        }
    }

    pub fn with_result(mut self, result: BuildResult) -> Self {
        self.result = Some(result);
        self
    }

    pub fn error(&self) -> &AsmError {
        &self.error
    }

    /// Coarse build result, when the failure came from a build.
    pub fn result(&self) -> Option<BuildResult> {
        self.result
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn source_lines(&self) -> &[String] {
        &self.source_lines
    }
}

impl fmt::Display for AsmRunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.result {
            Some(result) => write!(f, "Build failed ({result}): {}", self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for AsmRunError {}

/// Format an error message with an optional parameter.
pub fn format_error(msg: &str, param: Option<&str>) -> String {
    match param {
        Some(p) => format!("{msg}: {p}"),
        None => msg.to_string(),
    }
}
