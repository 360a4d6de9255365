use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::parser::languages::Language;
use crate::parser::serialize::{PositionMode, SerializeOptions};

// ---------------------------------------------------------------------------
// OutputShape: what a successful run writes to stdout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputShape {
    /// `{"ast_count": N, "ast_json": <tree>}` on one line
    #[default]
    Structured,
    /// The decimal node count alone, no trailing newline
    Count,
}

// ---------------------------------------------------------------------------
// RunConfig: one driver invocation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Source file to serialize
    pub input: PathBuf,
    /// Grammar override; picked from the file extension when unset
    pub language: Option<Language>,
    /// Success payload shape (default: structured)
    pub output: OutputShape,
    /// Position entries per node (default: merge)
    pub positions: PositionMode,
}

impl RunConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            language: None,
            output: OutputShape::default(),
            positions: PositionMode::default(),
        }
    }

    pub fn language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn output(mut self, output: OutputShape) -> Self {
        self.output = output;
        self
    }

    pub fn positions(mut self, positions: PositionMode) -> Self {
        self.positions = positions;
        self
    }

    pub fn resolved_language(&self) -> Language {
        self.language
            .unwrap_or_else(|| Language::from_path(&self.input))
    }

    pub fn serialize_options(&self) -> SerializeOptions {
        SerializeOptions::default().positions(self.positions)
    }
}

// ---------------------------------------------------------------------------
// ErrorKind: failure classification reported on stderr
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The input path could not be opened or read
    IoError,
    /// The grammar rejected the contents (syntax or encoding)
    ParseError,
    /// The tree-sitter runtime cannot load the grammar
    VersionUnsupported,
    /// A tree or value outside the serializer's contract
    InternalError,
}

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

/// Success payload for `OutputShape::Structured`. The tree text is embedded
/// verbatim, duplicate position keys included.
#[derive(Debug, Serialize)]
pub struct StructuredOutput<'a> {
    pub ast_count: usize,
    pub ast_json: &'a RawValue,
}

/// Failure payload, written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(rename = "errType")]
    pub err_type: ErrorKind,
}

impl From<ErrorKind> for ErrorPayload {
    fn from(err_type: ErrorKind) -> Self {
        Self { err_type }
    }
}

// ---------------------------------------------------------------------------
// ExitOutcome: result of `Driver::execute`
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    Failure(ErrorKind),
}

impl ExitOutcome {
    pub fn code(&self) -> u8 {
        match self {
            ExitOutcome::Success => 0,
            ExitOutcome::Failure(_) => 1,
        }
    }
}
