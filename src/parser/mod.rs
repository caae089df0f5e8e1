//! Weight diff parsing and schema definitions.
//!
//! This module handles:
//! - Splitting raw diff text into weight-file hunks
//! - Matching weight lines against the pattern table
//! - Extracting old/new weight formulas per operation

pub mod diff;
pub mod extractor;
pub mod patterns;
pub mod schema;

// Re-export main types
pub use diff::{ingest_diff, DiffLine, FileDiff, Hunk, IngestedDiff};
pub use extractor::{extract_formulas, ExtractionOutput};
pub use patterns::{classify_line, Term};
pub use schema::{
    runtime_label, BaseField, ComponentRange, DbAccess, ExtractedFormula, Runtime, WeightFormula,
};
