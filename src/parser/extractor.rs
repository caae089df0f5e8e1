//! Formula extraction from weight-file hunks.
//!
//! Removed lines build the old formula of an operation, added lines the new
//! one. Context lines only move the current operation and declare component
//! ranges.

use super::diff::{DiffLine, FileDiff, Hunk};
use super::patterns::{classify_line, MalformedLine, Term};
use super::schema::{BaseConflict, BaseField, ComponentRange, ExtractedFormula, WeightFormula};
use crate::utils::error::{AnalysisWarning, WarningKind};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static HEADER_FN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bfn\s+(\w+)").expect("header fn pattern"));

/// Which side of the diff a line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Old,
    New,
}

/// Terms collected for one operation within one hunk
#[derive(Debug, Default)]
struct OperationAccumulator {
    old: WeightFormula,
    new: WeightFormula,
    old_seen: bool,
    new_seen: bool,
    component_ranges: BTreeMap<String, ComponentRange>,
}

impl OperationAccumulator {
    fn apply(&mut self, side: Side, term: Term) -> Vec<BaseConflict> {
        let (formula, seen) = match side {
            Side::Old => (&mut self.old, &mut self.old_seen),
            Side::New => (&mut self.new, &mut self.new_seen),
        };

        let results = match term {
            Term::MinExecutionTime(value) => {
                vec![formula.assign_base(BaseField::MinExecutionTime, value)]
            }
            Term::Base {
                ref_time,
                proof_size,
            } => vec![
                formula.assign_base(BaseField::RefTime, ref_time),
                formula.assign_base(BaseField::ProofSize, proof_size),
            ],
            Term::Reads(count) => vec![formula.assign_base(BaseField::Reads, count)],
            Term::Writes(count) => vec![formula.assign_base(BaseField::Writes, count)],
            Term::Coefficient {
                var,
                ref_time,
                proof_size,
            } => {
                if ref_time > 0 {
                    formula.add_ref_time_coefficient(&var, ref_time);
                }
                if proof_size > 0 {
                    formula.add_proof_size_coefficient(&var, proof_size);
                }
                Vec::new()
            }
            Term::ReadsPerVar { var, count } => {
                formula.add_reads_per_var(&var, count);
                Vec::new()
            }
            Term::WritesPerVar { var, count } => {
                formula.add_writes_per_var(&var, count);
                Vec::new()
            }
            Term::Operation(_) | Term::ComponentRange { .. } => return Vec::new(),
        };

        *seen = true;
        results.into_iter().filter_map(Result::err).collect()
    }
}

/// Formulas found in one hunk
#[derive(Debug, Default)]
pub struct HunkExtraction {
    pub formulas: Vec<(String, Option<WeightFormula>, Option<WeightFormula>)>,
    pub component_ranges: BTreeMap<String, BTreeMap<String, ComponentRange>>,
    pub conflicts: Vec<(String, BaseConflict)>,

    /// Changed weight lines seen before any operation name
    pub unattributed: Vec<String>,

    /// Operation in effect at the end of the hunk
    pub last_operation: Option<String>,
}

/// Extract per-operation formulas from a single hunk
///
/// # Arguments
/// * `hunk` - The hunk to scan
/// * `carried_operation` - Operation in effect at the end of the previous hunk
///   of the same file, used when the hunk header names none
///
/// A carried operation is only a guess: when git trims the `fn` line of a
/// later function out of the context, its lines land on the carried one.
/// Such misattribution shows up as `ExtractionAnomaly` conflicts at best.
///
/// Changed weight lines with no operation at all are returned in
/// `unattributed` instead of being assigned anywhere.
///
/// # Errors
/// Returns the first changed line that carries weight data but matches no
/// pattern. The hunk must then be skipped as a whole.
pub fn extract_hunk(
    hunk: &Hunk,
    carried_operation: Option<&str>,
) -> Result<HunkExtraction, MalformedLine> {
    let mut current: Option<String> = HEADER_FN_RE
        .captures(&hunk.header_context)
        .map(|caps| caps[1].to_string())
        .or_else(|| carried_operation.map(str::to_string));

    let mut operations: BTreeMap<String, OperationAccumulator> = BTreeMap::new();
    let mut pending_ranges: Vec<(String, ComponentRange)> = Vec::new();
    let mut conflicts = Vec::new();
    let mut unattributed = Vec::new();

    for line in &hunk.lines {
        let side = match line {
            DiffLine::Context(_) => None,
            DiffLine::Removed(_) => Some(Side::Old),
            DiffLine::Added(_) => Some(Side::New),
        };

        let term = match classify_line(line.text()) {
            Ok(Some(term)) => term,
            Ok(None) => continue,
            // Unchanged lines never contribute terms, so their shape is irrelevant
            Err(_) if side.is_none() => continue,
            Err(malformed) => return Err(malformed),
        };

        match term {
            Term::Operation(name) => {
                let acc = operations.entry(name.clone()).or_default();
                for (var, range) in pending_ranges.drain(..) {
                    acc.component_ranges.entry(var).or_insert(range);
                }
                current = Some(name);
            }
            Term::ComponentRange { var, range } => {
                // Ranges describe the formula that follows; removed ones are stale
                if side != Some(Side::Old) {
                    pending_ranges.push((var, range));
                }
            }
            term => {
                let Some(side) = side else {
                    continue;
                };
                let Some(operation) = current.as_ref() else {
                    unattributed.push(line.text().trim().to_string());
                    continue;
                };
                let acc = operations.entry(operation.clone()).or_default();
                for conflict in acc.apply(side, term) {
                    conflicts.push((operation.clone(), conflict));
                }
            }
        }
    }

    let mut extraction = HunkExtraction {
        last_operation: current,
        conflicts,
        unattributed,
        ..Default::default()
    };

    for (operation, acc) in operations {
        if !acc.old_seen && !acc.new_seen {
            continue;
        }
        if !acc.component_ranges.is_empty() {
            extraction
                .component_ranges
                .insert(operation.clone(), acc.component_ranges);
        }
        extraction.formulas.push((
            operation,
            acc.old_seen.then_some(acc.old),
            acc.new_seen.then_some(acc.new),
        ));
    }

    Ok(extraction)
}

/// Output of extraction over all weight files
#[derive(Debug, Default)]
pub struct ExtractionOutput {
    pub formulas: Vec<ExtractedFormula>,
    pub warnings: Vec<AnalysisWarning>,
}

/// Extract formulas from every hunk of one file
pub fn extract_file(file: &FileDiff) -> ExtractionOutput {
    let mut output = ExtractionOutput::default();
    let mut carried: Option<String> = None;

    for (index, hunk) in file.hunks.iter().enumerate() {
        let extraction = match extract_hunk(hunk, carried.as_deref()) {
            Ok(extraction) => extraction,
            Err(MalformedLine(line)) => {
                warn!(
                    "Skipping hunk {} of {}: unrecognized weight line `{}`",
                    index + 1,
                    file.path,
                    line
                );
                output.warnings.push(AnalysisWarning::in_file(
                    WarningKind::MalformedFormula,
                    &file.path,
                    format!("hunk {} skipped, unrecognized weight line `{}`", index + 1, line),
                ));
                continue;
            }
        };

        for (operation, conflict) in &extraction.conflicts {
            output.warnings.push(conflict_warning(&file.path, operation, conflict));
        }

        if let Some(first) = extraction.unattributed.first() {
            warn!(
                "Hunk {} of {}: {} changed weight line(s) outside any known operation",
                index + 1,
                file.path,
                extraction.unattributed.len()
            );
            output.warnings.push(AnalysisWarning::in_file(
                WarningKind::UnattributedLines,
                &file.path,
                format!(
                    "hunk {}: {} changed weight line(s) not tied to an operation, first `{}`",
                    index + 1,
                    extraction.unattributed.len(),
                    first
                ),
            ));
        }

        let mut ranges = extraction.component_ranges;
        for (operation, old, new) in extraction.formulas {
            output.formulas.push(ExtractedFormula {
                runtime: file.runtime,
                pallet: file.pallet.clone(),
                component_ranges: ranges.remove(&operation).unwrap_or_default(),
                operation,
                old,
                new,
            });
        }

        carried = extraction.last_operation;
    }

    debug!(
        "Extracted {} formula record(s) from {}",
        output.formulas.len(),
        file.path
    );
    output
}

/// Extract formulas from every ingested weight file, in diff order
pub fn extract_formulas(files: &[FileDiff]) -> ExtractionOutput {
    let mut output = ExtractionOutput::default();
    for file in files {
        let file_output = extract_file(file);
        output.formulas.extend(file_output.formulas);
        output.warnings.extend(file_output.warnings);
    }
    output
}

fn conflict_warning(file: &str, operation: &str, conflict: &BaseConflict) -> AnalysisWarning {
    AnalysisWarning::in_file(
        WarningKind::ExtractionAnomaly,
        file,
        format!(
            "{}: conflicting {} ({} kept, {} ignored)",
            operation,
            conflict.field.label(),
            conflict.kept,
            conflict.discarded
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hunk(header: &str, lines: &[&str]) -> Hunk {
        Hunk {
            header_context: header.to_string(),
            lines: lines
                .iter()
                .map(|line| match line.split_at(1) {
                    ("+", rest) => DiffLine::Added(rest.to_string()),
                    ("-", rest) => DiffLine::Removed(rest.to_string()),
                    (_, rest) => DiffLine::Context(rest.to_string()),
                })
                .collect(),
        }
    }

    #[test]
    fn test_modified_operation_has_both_sides() {
        let h = hunk(
            "",
            &[
                " \tfn transfer() -> Weight {",
                "-\t\t// Minimum execution time: 40_000_000 picoseconds.",
                "+\t\t// Minimum execution time: 80_000_000 picoseconds.",
                "-\t\tWeight::from_parts(100, 3581)",
                "+\t\tWeight::from_parts(160, 3581)",
                " \t\t\t.saturating_add(T::DbWeight::get().reads(1_u64))",
            ],
        );

        let extraction = extract_hunk(&h, None).unwrap();
        assert_eq!(extraction.formulas.len(), 1);

        let (operation, old, new) = &extraction.formulas[0];
        assert_eq!(operation, "transfer");
        let old = old.as_ref().unwrap();
        let new = new.as_ref().unwrap();
        assert_eq!(old.base_ref_time, Some(100));
        assert_eq!(new.base_ref_time, Some(160));
        assert_eq!(old.min_execution_time, Some(40_000_000));
        assert_eq!(new.min_execution_time, Some(80_000_000));
        // context lines never contribute terms
        assert_eq!(new.base_reads, None);
    }

    #[test]
    fn test_header_context_names_operation() {
        let h = hunk(
            "fn set_candidate_bond(x: u32, ) -> Weight {",
            &[
                "-\t\t\t.saturating_add(Weight::from_parts(40_000, 0).saturating_mul(x.into()))",
                "+\t\t\t.saturating_add(Weight::from_parts(90_000, 0).saturating_mul(x.into()))",
            ],
        );

        let extraction = extract_hunk(&h, Some("other")).unwrap();
        assert_eq!(extraction.formulas[0].0, "set_candidate_bond");
        assert_eq!(extraction.last_operation.as_deref(), Some("set_candidate_bond"));
    }

    #[test]
    fn test_carried_operation_used_without_header() {
        let h = hunk(
            "impl<T: frame_system::Config> WeightInfo for WeightInfo<T> {",
            &["-\t\tWeight::from_parts(1, 2)", "+\t\tWeight::from_parts(3, 4)"],
        );

        let extraction = extract_hunk(&h, Some("carried")).unwrap();
        assert_eq!(extraction.formulas[0].0, "carried");
    }

    #[test]
    fn test_lines_before_any_operation_are_unattributed() {
        let h = hunk("", &["-\t\tWeight::from_parts(1, 2)", "+\t\tWeight::from_parts(3, 4)"]);
        let extraction = extract_hunk(&h, None).unwrap();
        assert!(extraction.formulas.is_empty());
        assert_eq!(
            extraction.unattributed,
            vec!["Weight::from_parts(1, 2)", "Weight::from_parts(3, 4)"]
        );
    }

    #[test]
    fn test_unchanged_lines_are_never_unattributed() {
        let h = hunk("", &[" \t\tWeight::from_parts(1, 2)", "+\t\t// unrelated"]);
        let extraction = extract_hunk(&h, None).unwrap();
        assert!(extraction.unattributed.is_empty());
    }

    #[test]
    fn test_extract_file_warns_on_unattributed_lines() {
        let file = FileDiff {
            path: "runtime/moonbase/src/weights/pallet_balances.rs".to_string(),
            runtime: None,
            pallet: "pallet_balances".to_string(),
            hunks: vec![hunk(
                "impl<T: frame_system::Config> pallet_balances::WeightInfo for WeightInfo<T> {",
                &[
                    "-\t\t// Minimum execution time: 10_000_000 picoseconds.",
                    "+\t\t// Minimum execution time: 90_000_000 picoseconds.",
                    "-\t\tWeight::from_parts(10_000_000, 3593)",
                    "+\t\tWeight::from_parts(90_000_000, 3593)",
                ],
            )],
        };

        let output = extract_file(&file);
        assert!(output.formulas.is_empty());
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].kind, WarningKind::UnattributedLines);
        assert!(output.warnings[0].message.contains("hunk 1: 4 changed weight line(s)"));
    }

    #[test]
    fn test_repeated_coefficients_are_summed() {
        let h = hunk(
            "",
            &[
                "+\tfn batch(x: u32, ) -> Weight {",
                "+\t\tWeight::from_parts(1_000, 0)",
                "+\t\t\t.saturating_add(Weight::from_parts(20, 0).saturating_mul(x.into()))",
                "+\t\t\t.saturating_add(Weight::from_parts(22, 5).saturating_mul(x.into()))",
            ],
        );

        let extraction = extract_hunk(&h, None).unwrap();
        let (_, old, new) = &extraction.formulas[0];
        assert!(old.is_none());
        let new = new.as_ref().unwrap();
        assert_eq!(new.ref_time_per_var["x"], 42);
        assert_eq!(new.proof_size_per_var["x"], 5);
    }

    #[test]
    fn test_removal_only_hunk() {
        let h = hunk(
            "",
            &[
                "-\tfn gone() -> Weight {",
                "-\t\tWeight::from_parts(500, 0)",
                "-\t}",
            ],
        );
        let extraction = extract_hunk(&h, None).unwrap();
        let (_, old, new) = &extraction.formulas[0];
        assert_eq!(old.as_ref().unwrap().base_ref_time, Some(500));
        assert!(new.is_none());
    }

    #[test]
    fn test_component_ranges_attach_to_next_operation() {
        let h = hunk(
            "",
            &[
                " \t/// The range of component `x` is `[0, 100]`.",
                "-\t/// The range of component `y` is `[0, 5]`.",
                "+\t/// The range of component `y` is `[0, 50]`.",
                " \tfn delegate(x: u32, y: u32, ) -> Weight {",
                "-\t\tWeight::from_parts(1, 0)",
                "+\t\tWeight::from_parts(2, 0)",
            ],
        );
        let extraction = extract_hunk(&h, None).unwrap();
        let ranges = &extraction.component_ranges["delegate"];
        assert_eq!(ranges["x"], ComponentRange { low: 0, high: 100 });
        assert_eq!(ranges["y"], ComponentRange { low: 0, high: 50 });
    }

    #[test]
    fn test_conflicting_base_within_side() {
        let h = hunk(
            "",
            &[
                " \tfn twice() -> Weight {",
                "+\t\tWeight::from_parts(10, 0)",
                "+\t\tWeight::from_parts(20, 0)",
            ],
        );
        let extraction = extract_hunk(&h, None).unwrap();
        assert_eq!(extraction.conflicts.len(), 1);
        assert_eq!(extraction.conflicts[0].1.field, BaseField::RefTime);
    }

    #[test]
    fn test_malformed_changed_line_rejects_hunk() {
        let h = hunk(
            "fn broken() -> Weight {",
            &["+\t\t.saturating_add(Weight::from_parts(1, 0).saturating_mul(x))"],
        );
        assert!(extract_hunk(&h, None).is_err());
    }

    #[test]
    fn test_extract_file_records_warning_and_continues() {
        let file = FileDiff {
            path: "runtime/moonbeam/src/weights/pallet_proxy.rs".to_string(),
            runtime: None,
            pallet: "pallet_proxy".to_string(),
            hunks: vec![
                hunk(
                    "fn proxy(p: u32, ) -> Weight {",
                    &["+\t\tWeight::from_parts(abc, 0)"],
                ),
                hunk(
                    "fn add_proxy(p: u32, ) -> Weight {",
                    &["-\t\tWeight::from_parts(1, 0)", "+\t\tWeight::from_parts(2, 0)"],
                ),
            ],
        };

        let output = extract_file(&file);
        assert_eq!(output.formulas.len(), 1);
        assert_eq!(output.formulas[0].operation, "add_proxy");
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].kind, WarningKind::MalformedFormula);
    }
}
