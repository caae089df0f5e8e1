//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.
//!
//! Only [`InputError`] aborts a run. Everything else the pipeline can recover
//! from is recorded as an [`AnalysisWarning`] and surfaces in the report.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while acquiring the diff text
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Input unavailable ({source_name}): {source}")]
    Unavailable {
        source_name: String,
        #[source]
        source: std::io::Error,
    },
}

impl InputError {
    pub fn unavailable(source_name: impl Into<String>, source: std::io::Error) -> Self {
        InputError::Unavailable {
            source_name: source_name.into(),
            source,
        }
    }
}

/// Errors that can occur while loading a reference-parameter table
#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Failed to read reference table: {0}")]
    ReadFailed(#[from] std::io::Error),

    #[error("Reference table TOML parse error: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error("Invalid reference table: {0}")]
    Invalid(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(PathBuf),
}

/// Non-fatal conditions recorded during analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// The diff contained no hunks under a weights directory
    NoRecognizedHunks,
    /// A hunk could not be parsed and was skipped
    MalformedFormula,
    /// Two hunks disagree on a base value for the same operation
    ExtractionAnomaly,
    /// A flagged variable has no reference value
    UnresolvedParameter,
    /// The reference table could not be loaded
    ReferenceUnavailable,
    /// The JSON report could not be written
    OutputFailed,
    /// The input was not valid UTF-8; offending bytes were replaced
    LossyInput,
    /// Changed weight lines appeared before any operation name in their hunk
    UnattributedLines,
}

impl WarningKind {
    pub fn label(&self) -> &'static str {
        match self {
            WarningKind::NoRecognizedHunks => "no-recognized-hunks",
            WarningKind::MalformedFormula => "malformed-formula",
            WarningKind::ExtractionAnomaly => "extraction-anomaly",
            WarningKind::UnresolvedParameter => "unresolved-parameter",
            WarningKind::ReferenceUnavailable => "reference-unavailable",
            WarningKind::OutputFailed => "output-failed",
            WarningKind::LossyInput => "lossy-input",
            WarningKind::UnattributedLines => "unattributed-lines",
        }
    }
}

/// A recorded non-fatal condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWarning {
    pub kind: WarningKind,

    /// File the condition was found in, when it is tied to one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    pub message: String,
}

impl AnalysisWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            file: None,
            message: message.into(),
        }
    }

    pub fn in_file(kind: WarningKind, file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            file: Some(file.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "[{}] {}: {}", self.kind.label(), file, self.message),
            None => write!(f, "[{}] {}", self.kind.label(), self.message),
        }
    }
}
