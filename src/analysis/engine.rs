//! Core analysis engine.
//! Runs the whole pipeline over one diff text and assembles the report.

use log::{debug, info};
use std::collections::BTreeSet;

use super::normalizer::{decompose_pairs, min_exec_overview, min_exec_percents};
use super::pairing::pair_records;
use super::schema::{Change, MetricKind, OneSidedOperation, Presence, Report};
use super::threshold::{classify_changes, summarize_runtimes};
use crate::evaluate::{evaluate_flagged, ReferenceTable};
use crate::parser::{extract_formulas, ingest_diff};
use crate::utils::config::AnalysisConfig;

/// Analyze a diff and build the complete report
///
/// # Arguments
/// * `diff_text` - Raw unified diff
/// * `config` - Threshold configuration
/// * `reference` - Optional reference table; enables mainnet evaluation
///
/// # Returns
/// The report. Recoverable problems are listed in `Report::warnings`.
///
/// # Example
/// ```ignore
/// use weight_diff_analyzer::analysis::analyze_diff;
/// use weight_diff_analyzer::utils::config::AnalysisConfig;
///
/// let diff = std::fs::read_to_string("weights.diff")?;
/// let report = analyze_diff(&diff, &AnalysisConfig::default(), None);
/// ```
pub fn analyze_diff(
    diff_text: &str,
    config: &AnalysisConfig,
    reference: Option<&ReferenceTable>,
) -> Report {
    // Step 1: Split into weight-file hunks
    let ingested = ingest_diff(diff_text);
    let mut warnings = ingested.warnings;
    let runtimes: BTreeSet<_> = ingested.files.iter().map(|f| f.runtime).collect();

    // Step 2: Extract formulas
    let extraction = extract_formulas(&ingested.files);
    warnings.extend(extraction.warnings);

    // Step 3: Pair records by key
    let pairing = pair_records(extraction.formulas);
    warnings.extend(pairing.warnings);
    let pairs = pairing.pairs;

    // Step 4: Decompose and classify
    let changes = decompose_pairs(&pairs);
    debug!("{} metric change(s) across {} pair(s)", changes.len(), pairs.len());

    let classified = classify_changes(&changes, config);
    let table = classified.flagged();
    let runtime_summary = summarize_runtimes(&runtimes, &table, &changes, &pairs);

    let db_access_changes: Vec<Change> = changes
        .iter()
        .filter(|c| matches!(c.kind, MetricKind::Reads | MetricKind::Writes) && c.old != c.new)
        .cloned()
        .collect();

    let min_exec_context: Vec<Change> = changes
        .iter()
        .filter(|c| c.kind == MetricKind::MinExecTime)
        .cloned()
        .collect();

    let one_sided_operations: Vec<OneSidedOperation> = pairs
        .iter()
        .filter(|p| p.presence() != Presence::Both)
        .map(|p| OneSidedOperation {
            key: p.key.clone(),
            presence: p.presence(),
        })
        .collect();

    // Step 5: Evaluate flagged coefficients against mainnet parameters
    let evaluations = match reference {
        Some(table_ref) => {
            let outcome = evaluate_flagged(&table, &pairs, table_ref);
            warnings.extend(outcome.warnings);
            outcome.evaluations
        }
        None => Vec::new(),
    };

    info!(
        "Analyzed {} weight file(s): {} operation(s) changed, {} flagged",
        ingested.files.len(),
        pairs.len(),
        table.len()
    );

    // Step 6: Build the report
    Report {
        threshold_percent: config.threshold_percent,
        files_analyzed: ingested.files.len(),
        operations_changed: pairs.len(),
        min_exec_overview: min_exec_overview(&min_exec_percents(&changes)),
        base_increases: classified.base_increases,
        base_decreases: classified.base_decreases,
        ref_time_coefficients: classified.ref_time_coefficients,
        min_exec_changes: classified.min_exec_changes,
        proof_size_coefficients: classified.proof_size_coefficients,
        runtime_summary,
        table,
        one_sided_operations,
        min_exec_context,
        db_access_changes,
        evaluations,
        warnings,
    }
}
