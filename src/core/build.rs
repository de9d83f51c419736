// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Build orchestration.
//!
//! A build runs the stages `LoadFile`, `AllocTokens`, `Tokenize`,
//! `ParseTokens` and `Finalize` in order. The first failing stage ends the
//! build; the context then holds the stage, the coarse [`BuildResult`] and the
//! detailed [`BuildError`]. The image is only kept when every stage passed.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::action::Action;
use crate::core::imagestore::ImageStore;
use crate::core::parser::{ParseError, ParserContext};
use crate::core::resolve::{assemble_image, resolve_labels, AssembleError, ResolveError};
use crate::core::symbol_table::LabelTable;
use crate::core::target::{EncodeError, Target};
use crate::core::tokenizer::{LexError, Span, Token, Tokenizer};

/// Initial capacity of the token sequence.
const INITIAL_TOKEN_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    LoadFile,
    AllocTokens,
    Tokenize,
    ParseTokens,
    Finalize,
}

impl BuildStage {
    pub fn name(self) -> &'static str {
        match self {
            BuildStage::LoadFile => "load file",
            BuildStage::AllocTokens => "allocate tokens",
            BuildStage::Tokenize => "tokenize",
            BuildStage::ParseTokens => "parse tokens",
            BuildStage::Finalize => "finalize",
        }
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    Running(BuildStage),
    Complete,
    Failed(BuildStage),
}

/// Coarse outcome of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildResult {
    Success,
    FileError,
    SyntaxError,
    AllocFailed,
    BufferOverflow,
    UnknownError,
}

impl BuildResult {
    pub fn is_success(self) -> bool {
        self == BuildResult::Success
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BuildResult::Success => "success",
            BuildResult::FileError => "file error",
            BuildResult::SyntaxError => "syntax error",
            BuildResult::AllocFailed => "allocation failed",
            BuildResult::BufferOverflow => "buffer overflow",
            BuildResult::UnknownError => "unknown error",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("cannot open '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("allocation failed")]
    AllocFailed { span: Option<Span> },
    #[error("cannot write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<AssembleError> for BuildError {
    fn from(err: AssembleError) -> Self {
        match err {
            AssembleError::Encode(err) => BuildError::Encode(err),
            AssembleError::AllocFailed { span } => BuildError::AllocFailed { span: Some(span) },
        }
    }
}

impl BuildError {
    /// Map to the coarse result reported to callers.
    pub fn build_result(&self) -> BuildResult {
        match self {
            BuildError::Open { .. } | BuildError::Write { .. } => BuildResult::FileError,
            BuildError::Lex(LexError::TokenOverflow { .. }) => BuildResult::BufferOverflow,
            BuildError::Lex(LexError::UnknownToken { .. }) => BuildResult::SyntaxError,
            BuildError::Lex(LexError::AllocFailed { .. }) => BuildResult::AllocFailed,
            BuildError::Lex(LexError::Stream(_)) => BuildResult::FileError,
            BuildError::Parse(ParseError::AllocFailed { .. }) => BuildResult::AllocFailed,
            BuildError::Parse(_) | BuildError::Resolve(_) => BuildResult::SyntaxError,
            BuildError::AllocFailed { .. } => BuildResult::AllocFailed,
            BuildError::Encode(_) => BuildResult::UnknownError,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            BuildError::Lex(err) => err.span(),
            BuildError::Parse(err) => Some(err.span()),
            BuildError::Resolve(err) => Some(err.span()),
            BuildError::Encode(err) => err.span,
            BuildError::AllocFailed { span } => *span,
            BuildError::Open { .. } | BuildError::Write { .. } => None,
        }
    }
}

/// State owned by one build: token, action and label sequences plus the
/// assembled image.
pub struct BuildContext<'t> {
    target: &'t dyn Target,
    state: BuildState,
    error: Option<BuildError>,
    tokens: Vec<Token>,
    actions: Vec<Action>,
    labels: LabelTable,
    image: Option<ImageStore>,
}

impl<'t> BuildContext<'t> {
    pub fn new(target: &'t dyn Target) -> Self {
        Self {
            target,
            state: BuildState::Idle,
            error: None,
            tokens: Vec::new(),
            actions: Vec::new(),
            labels: LabelTable::new(),
            image: None,
        }
    }

    pub fn target(&self) -> &'t dyn Target {
        self.target
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Coarse result. `None` until the build has finished.
    pub fn result(&self) -> Option<BuildResult> {
        match self.state {
            BuildState::Complete => Some(BuildResult::Success),
            BuildState::Failed(_) => Some(
                self.error
                    .as_ref()
                    .map_or(BuildResult::UnknownError, BuildError::build_result),
            ),
            BuildState::Idle | BuildState::Running(_) => None,
        }
    }

    pub fn error(&self) -> Option<&BuildError> {
        self.error.as_ref()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn image(&self) -> Option<&ImageStore> {
        self.image.as_ref()
    }

    pub fn into_image(self) -> Option<ImageStore> {
        self.image
    }

    /// Open `path` and assemble its contents.
    pub fn assemble_file(mut self, path: &Path) -> Self {
        if self.state != BuildState::Idle {
            return self;
        }
        self.enter(BuildStage::LoadFile);
        match File::open(path) {
            Ok(file) => self.assemble(file),
            Err(source) => {
                self.fail(BuildError::Open {
                    path: path.to_path_buf(),
                    source,
                });
                self
            }
        }
    }

    /// Assemble source read from `reader`. A context builds once; calling
    /// this on a finished context does nothing.
    pub fn assemble<R: Read>(mut self, reader: R) -> Self {
        if matches!(self.state, BuildState::Complete | BuildState::Failed(_)) {
            return self;
        }
        match self.run(reader) {
            Ok(()) => {
                self.state = BuildState::Complete;
                info!(
                    target_name = self.target.info().name,
                    tokens = self.tokens.len(),
                    actions = self.actions.len(),
                    labels = self.labels.len(),
                    bytes = self.image.as_ref().map_or(0, ImageStore::len),
                    "build complete"
                );
            }
            Err(err) => self.fail(err),
        }
        self
    }

    /// Write the raw image to `output`. Only a completed build writes.
    pub fn write_output(mut self, output: &Path) -> Self {
        let written = match self.image.as_ref() {
            Some(image) => image.write_bin_atomic(output).map(|()| image.len()),
            None => return self,
        };
        match written {
            Ok(bytes) => debug!(path = %output.display(), bytes, "image written"),
            Err(source) => {
                self.state = BuildState::Running(BuildStage::Finalize);
                self.fail(BuildError::Write {
                    path: output.to_path_buf(),
                    source,
                });
            }
        }
        self
    }

    fn run<R: Read>(&mut self, reader: R) -> Result<(), BuildError> {
        self.enter(BuildStage::AllocTokens);
        let mut tokens = std::mem::take(&mut self.tokens);
        tokens
            .try_reserve(INITIAL_TOKEN_CAPACITY)
            .map_err(|_| BuildError::AllocFailed { span: None })?;

        self.enter(BuildStage::Tokenize);
        let mut tokenizer = Tokenizer::with_tokens(tokens);
        tokenizer.read_from(reader)?;
        self.tokens = tokenizer.finish()?;
        debug!(tokens = self.tokens.len(), "tokenized");

        self.enter(BuildStage::ParseTokens);
        let mut parser = ParserContext::new(self.target);
        let parsed = parser.parse(&self.tokens);
        (self.actions, self.labels) = parser.into_parts();
        parsed?;

        self.enter(BuildStage::Finalize);
        resolve_labels(&mut self.actions, &self.labels)?;
        self.image = Some(assemble_image(&self.actions, self.target)?);
        Ok(())
    }

    fn enter(&mut self, stage: BuildStage) {
        debug!(%stage, "build stage");
        self.state = BuildState::Running(stage);
    }

    fn fail(&mut self, err: BuildError) {
        let stage = match self.state {
            BuildState::Running(stage) | BuildState::Failed(stage) => stage,
            BuildState::Idle | BuildState::Complete => BuildStage::LoadFile,
        };
        warn!(
            %stage,
            result = %err.build_result(),
            error = %err,
            "build failed"
        );
        self.state = BuildState::Failed(stage);
        self.image = None;
        self.error = Some(err);
    }
}

/// Assemble `input` for `target` and write the raw image to `output`.
///
/// Nothing is written unless every stage succeeded.
pub fn build<'t>(input: &Path, output: &Path, target: &'t dyn Target) -> BuildContext<'t> {
    BuildContext::new(target)
        .assemble_file(input)
        .write_output(output)
}
