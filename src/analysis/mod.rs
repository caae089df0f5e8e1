//! Weight comparison and threshold classification.
//!
//! This module pairs the old and new formulas of every operation, breaks
//! each pair into per-metric changes and sorts the changes into the report
//! sections.
//!
//! # Example
//! ```ignore
//! use weight_diff_analyzer::analysis::analyze_diff;
//! use weight_diff_analyzer::utils::config::AnalysisConfig;
//!
//! let report = analyze_diff(&diff_text, &AnalysisConfig::with_threshold(30), None);
//! for change in &report.table {
//!     println!("{} {} {}", change.key, change.label(), change.delta);
//! }
//! ```

mod engine;
pub mod normalizer;
pub mod pairing;
pub mod schema;
pub mod threshold;

// Public API exports
pub use engine::analyze_diff;
pub use normalizer::{decompose_pair, decompose_pairs, percent_delta};
pub use pairing::{pair_records, PairingOutcome};
pub use schema::{
    Change, Delta, Direction, ExtrinsicKey, MetricKind, MinExecOverview, NetDirection,
    OneSidedOperation, Presence, Report, RuntimeSummary, Section, WeightRecordPair,
};
pub use threshold::{classify_changes, summarize_runtimes, ClassifiedChanges};
