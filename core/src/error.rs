//! Error types for tree building, serialization and the driver.

use std::path::PathBuf;

use indextree::NodeId;
use thiserror::Error;

use crate::types::ErrorKind;

/// Structural violations while building a `SyntaxTree`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    #[error("node {0:?} does not belong to this tree")]
    UnknownNode(NodeId),

    #[error("node {child:?} is already attached to node {parent:?}")]
    AlreadyAttached { child: NodeId, parent: NodeId },

    #[error("node {0:?} is the tree root and cannot be placed in a field")]
    RootAttach(NodeId),

    #[error("attaching node {child:?} under node {owner:?} would create a cycle")]
    Cycle { child: NodeId, owner: NodeId },

    #[error("source text of `{kind}` at line {line} is not valid UTF-8")]
    InvalidText { kind: String, line: u32 },

    #[error("position of `{kind}` (row {row}, column {column}) does not fit in 32 bits")]
    PositionOverflow {
        kind: String,
        row: usize,
        column: usize,
    },
}

/// Failures of the tree walker.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WalkError {
    #[error("tree has no root node")]
    EmptyTree,

    #[error("unsupported value at {path}: {detail}")]
    ContractViolation { path: String, detail: String },
}

impl WalkError {
    pub fn contract(path: impl Into<String>, detail: impl Into<String>) -> Self {
        WalkError::ContractViolation {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8: {source}")]
    Encoding {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("{language} grammar is not supported by this tree-sitter runtime: {source}")]
    VersionUnsupported {
        language: &'static str,
        #[source]
        source: tree_sitter::LanguageError,
    },

    #[error("Parse error in {file}: {message}")]
    Parse { file: PathBuf, message: String },

    #[error("grammar tables unavailable: {0:#}")]
    Grammar(anyhow::Error),

    #[error("Tree construction failed: {0}")]
    Tree(#[from] TreeError),

    #[error("Serialization failed: {0}")]
    Walk(#[from] WalkError),
}

impl DriverError {
    pub fn parse(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        DriverError::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    /// The classification reported to callers on the error stream.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DriverError::Io { .. } => ErrorKind::IoError,
            DriverError::Encoding { .. } | DriverError::Parse { .. } => ErrorKind::ParseError,
            DriverError::VersionUnsupported { .. } => ErrorKind::VersionUnsupported,
            DriverError::Grammar(_) | DriverError::Tree(_) | DriverError::Walk(_) => {
                ErrorKind::InternalError
            }
        }
    }
}
