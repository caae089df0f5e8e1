//! Unified diff ingestion.
//!
//! Splits raw `git diff` output into per-file hunks and keeps only files that
//! live under a weights directory. Malformed hunks are dropped with a warning;
//! the rest of the diff is still ingested.

use super::schema::Runtime;
use crate::utils::config::WEIGHTS_DIR_SEGMENT;
use crate::utils::error::{AnalysisWarning, WarningKind};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static DIFF_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^diff --git a/(\S+) b/(\S+)").expect("diff header pattern"));

static HUNK_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@@ -\d+(?:,\d+)? \+\d+(?:,\d+)? @@(.*)$").expect("hunk header pattern")
});

/// One line of a hunk body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Context(String),
    Removed(String),
    Added(String),
}

impl DiffLine {
    pub fn text(&self) -> &str {
        match self {
            DiffLine::Context(text) | DiffLine::Removed(text) | DiffLine::Added(text) => text,
        }
    }
}

/// A single `@@` hunk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hunk {
    /// Text after the closing `@@` (git's function context)
    pub header_context: String,
    pub lines: Vec<DiffLine>,
}

/// All hunks of one weight file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: String,
    pub runtime: Option<Runtime>,
    pub pallet: String,
    pub hunks: Vec<Hunk>,
}

/// Result of ingesting a whole diff
#[derive(Debug, Clone, Default)]
pub struct IngestedDiff {
    /// Weight files with at least one well-formed hunk, in diff order
    pub files: Vec<FileDiff>,

    /// Number of file headers seen, weights or not
    pub files_seen: usize,

    pub warnings: Vec<AnalysisWarning>,
}

/// Whether a path has a `weights` directory component
pub fn is_weights_path(path: &str) -> bool {
    path.starts_with(WEIGHTS_DIR_SEGMENT) || path.contains(&format!("/{}", WEIGHTS_DIR_SEGMENT))
}

/// Pallet name derived from the file stem
pub fn pallet_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Per-file ingestion state
struct FileBuilder {
    path: String,
    hunks: Vec<Hunk>,
    current: Option<Hunk>,
}

impl FileBuilder {
    fn new(path: String) -> Self {
        Self {
            path,
            hunks: Vec::new(),
            current: None,
        }
    }

    fn close_hunk(&mut self) {
        if let Some(hunk) = self.current.take() {
            self.hunks.push(hunk);
        }
    }

    fn finish(mut self) -> Option<FileDiff> {
        self.close_hunk();
        if self.hunks.is_empty() {
            return None;
        }

        Some(FileDiff {
            runtime: Runtime::from_path(&self.path),
            pallet: pallet_name(&self.path),
            path: self.path,
            hunks: self.hunks,
        })
    }
}

/// Split raw diff text into weight-file hunks
///
/// # Arguments
/// * `text` - Raw unified diff (as produced by `git diff`)
///
/// # Returns
/// Ingested weight files plus any warnings. Empty or unrelated input yields
/// no files and a `NoRecognizedHunks` warning, never an error.
pub fn ingest_diff(text: &str) -> IngestedDiff {
    let mut ingested = IngestedDiff::default();
    let mut current: Option<FileBuilder> = None;

    for line in text.lines() {
        if line.starts_with("diff --git ") {
            if let Some(file) = current.take().and_then(FileBuilder::finish) {
                ingested.files.push(file);
            }
            ingested.files_seen += 1;

            current = match DIFF_HEADER_RE.captures(line) {
                Some(caps) if is_weights_path(&caps[2]) => {
                    debug!("Ingesting weight file {}", &caps[2]);
                    Some(FileBuilder::new(caps[2].to_string()))
                }
                Some(caps) => {
                    debug!("Skipping non-weight file {}", &caps[2]);
                    None
                }
                None => {
                    debug!("Unrecognized file header: {}", line);
                    None
                }
            };
            continue;
        }

        let Some(file) = current.as_mut() else {
            continue;
        };

        if line.starts_with("@@") {
            file.close_hunk();
            match HUNK_HEADER_RE.captures(line) {
                Some(caps) => {
                    file.current = Some(Hunk {
                        header_context: caps[1].trim().to_string(),
                        lines: Vec::new(),
                    });
                }
                None => {
                    warn!("Malformed hunk header in {}: {}", file.path, line);
                    ingested.warnings.push(AnalysisWarning::in_file(
                        WarningKind::MalformedFormula,
                        &file.path,
                        format!("malformed hunk header `{}`, hunk skipped", line),
                    ));
                }
            }
            continue;
        }

        // Lines outside a hunk are file metadata (index, ---, +++, mode lines)
        let Some(hunk) = file.current.as_mut() else {
            continue;
        };

        match parse_body_line(line) {
            Some(Some(diff_line)) => hunk.lines.push(diff_line),
            Some(None) => {}
            None => {
                warn!("Malformed hunk body in {}: {}", file.path, line);
                ingested.warnings.push(AnalysisWarning::in_file(
                    WarningKind::MalformedFormula,
                    &file.path,
                    format!("unexpected line `{}` inside hunk, hunk skipped", line),
                ));
                file.current = None;
            }
        }
    }

    if let Some(file) = current.take().and_then(FileBuilder::finish) {
        ingested.files.push(file);
    }

    if ingested.files.is_empty() {
        ingested.warnings.push(AnalysisWarning::new(
            WarningKind::NoRecognizedHunks,
            format!(
                "no hunks under a weights directory ({} file(s) in diff)",
                ingested.files_seen
            ),
        ));
    }

    ingested
}

/// Classify a hunk body line.
///
/// `None` means the line is not valid inside a hunk; `Some(None)` means a
/// valid line that carries no content (`\ No newline at end of file`).
fn parse_body_line(line: &str) -> Option<Option<DiffLine>> {
    let mut chars = line.chars();
    match chars.next() {
        None => Some(Some(DiffLine::Context(String::new()))),
        Some(' ') => Some(Some(DiffLine::Context(chars.as_str().to_string()))),
        Some('+') => Some(Some(DiffLine::Added(chars.as_str().to_string()))),
        Some('-') => Some(Some(DiffLine::Removed(chars.as_str().to_string()))),
        Some('\\') => Some(None),
        Some(_) => None,
    }
}
