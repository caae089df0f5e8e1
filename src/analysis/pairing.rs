//! Record pairing across the whole diff.
//!
//! Formulas extracted from different hunks that share an [`ExtrinsicKey`] are
//! the same logical record and are merged additively before comparison.

use super::schema::{ExtrinsicKey, WeightRecordPair};
use crate::parser::schema::{ExtractedFormula, WeightFormula};
use crate::utils::error::{AnalysisWarning, WarningKind};
use log::debug;
use std::collections::BTreeMap;

/// Paired records plus anomalies found while merging
#[derive(Debug, Default)]
pub struct PairingOutcome {
    /// Sorted by key
    pub pairs: Vec<WeightRecordPair>,
    pub warnings: Vec<AnalysisWarning>,
}

fn merge_side(
    target: &mut Option<WeightFormula>,
    incoming: Option<WeightFormula>,
    key: &ExtrinsicKey,
    warnings: &mut Vec<AnalysisWarning>,
) {
    let Some(incoming) = incoming else {
        return;
    };

    match target {
        None => *target = Some(incoming),
        Some(existing) => {
            for conflict in existing.merge(&incoming) {
                warnings.push(AnalysisWarning::new(
                    WarningKind::ExtractionAnomaly,
                    format!(
                        "{}: hunks disagree on {} ({} kept, {} ignored)",
                        key,
                        conflict.field.label(),
                        conflict.kept,
                        conflict.discarded
                    ),
                ));
            }
        }
    }
}

/// Join extracted formulas into one pair per operation
///
/// # Arguments
/// * `formulas` - Extraction output in diff order
///
/// # Returns
/// Pairs sorted by key. Every pair has at least one side.
pub fn pair_records(formulas: Vec<ExtractedFormula>) -> PairingOutcome {
    let mut by_key: BTreeMap<ExtrinsicKey, WeightRecordPair> = BTreeMap::new();
    let mut warnings = Vec::new();

    for formula in formulas {
        let key = ExtrinsicKey::new(formula.runtime, formula.pallet, formula.operation);
        let pair = by_key
            .entry(key.clone())
            .or_insert_with(|| WeightRecordPair {
                key: key.clone(),
                old: None,
                new: None,
                component_ranges: BTreeMap::new(),
            });

        merge_side(&mut pair.old, formula.old, &key, &mut warnings);
        merge_side(&mut pair.new, formula.new, &key, &mut warnings);
        for (var, range) in formula.component_ranges {
            pair.component_ranges.entry(var).or_insert(range);
        }
    }

    let pairs: Vec<WeightRecordPair> = by_key
        .into_values()
        .filter(|pair| pair.old.is_some() || pair.new.is_some())
        .collect();

    debug!("Paired {} operation(s)", pairs.len());

    PairingOutcome { pairs, warnings }
}
