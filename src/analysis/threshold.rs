//! Threshold classification of metric changes.
//!
//! Sorts decomposed changes into the five flagged sections and builds the
//! per-runtime summary and the full ranked table.

use super::normalizer::min_exec_percents;
use super::schema::{
    Change, Delta, Direction, MetricKind, NetDirection, RuntimeSummary, Section, WeightRecordPair,
};
use crate::parser::schema::Runtime;
use crate::utils::config::{AnalysisConfig, PROOF_SIZE_COEFFICIENT_THRESHOLD_PERCENT};
use std::collections::BTreeSet;

/// Changes flagged in sections 1-5, each ranked
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedChanges {
    pub base_increases: Vec<Change>,
    pub base_decreases: Vec<Change>,
    pub ref_time_coefficients: Vec<Change>,
    pub min_exec_changes: Vec<Change>,
    pub proof_size_coefficients: Vec<Change>,
}

impl ClassifiedChanges {
    pub fn section(&self, section: Section) -> &[Change] {
        match section {
            Section::BaseIncrease => &self.base_increases,
            Section::BaseDecrease => &self.base_decreases,
            Section::RefTimeCoefficient => &self.ref_time_coefficients,
            Section::MinExecTime => &self.min_exec_changes,
            Section::ProofSizeCoefficient => &self.proof_size_coefficients,
        }
    }

    /// Union of sections 1-5, deduplicated and ranked (section 7)
    pub fn flagged(&self) -> Vec<Change> {
        let mut seen = BTreeSet::new();
        let mut table: Vec<Change> = Vec::new();

        for section in Section::ALL {
            for change in self.section(section) {
                let identity = (change.key.clone(), change.kind, change.variable.clone());
                if seen.insert(identity) {
                    table.push(change.clone());
                }
            }
        }

        rank_changes(&mut table);
        table
    }
}

/// Sort changes into ranking order: sentinels first, then descending |percent|,
/// ties broken by key, metric kind and variable
pub fn rank_changes(changes: &mut [Change]) {
    changes.sort_by(|a, b| a.rank_cmp(b));
}

/// Whether a delta meets a threshold in absolute terms. Sentinels always do.
pub fn exceeds_absolute(delta: &Delta, threshold: f64) -> bool {
    match delta {
        Delta::Percent(p) => *p != 0.0 && p.abs() >= threshold,
        _ => true,
    }
}

fn is_base_increase(change: &Change, threshold: f64) -> bool {
    change.kind == MetricKind::RefTimeBase
        && match change.delta {
            Delta::NewTerm => true,
            Delta::Percent(p) => p > 0.0 && p >= threshold,
            Delta::RemovedTerm => false,
        }
}

fn is_base_decrease(change: &Change, threshold: f64) -> bool {
    change.kind == MetricKind::RefTimeBase
        && match change.delta {
            Delta::RemovedTerm => true,
            Delta::Percent(p) => p < 0.0 && p <= -threshold,
            Delta::NewTerm => false,
        }
}

/// Apply the section rules to every change
///
/// # Arguments
/// * `changes` - Decomposed changes of all pairs
/// * `config` - Carries the global threshold; section 5 ignores it
///
/// # Returns
/// Ranked section contents
pub fn classify_changes(changes: &[Change], config: &AnalysisConfig) -> ClassifiedChanges {
    let threshold = config.threshold_percent;
    let mut classified = ClassifiedChanges::default();

    for change in changes {
        if is_base_increase(change, threshold) {
            classified.base_increases.push(change.clone());
        }
        if is_base_decrease(change, threshold) {
            classified.base_decreases.push(change.clone());
        }
        match change.kind {
            MetricKind::RefTimeCoefficient if exceeds_absolute(&change.delta, threshold) => {
                classified.ref_time_coefficients.push(change.clone());
            }
            MetricKind::MinExecTime if exceeds_absolute(&change.delta, threshold) => {
                classified.min_exec_changes.push(change.clone());
            }
            MetricKind::ProofSizeCoefficient
                if exceeds_absolute(&change.delta, PROOF_SIZE_COEFFICIENT_THRESHOLD_PERCENT) =>
            {
                classified.proof_size_coefficients.push(change.clone());
            }
            _ => {}
        }
    }

    rank_changes(&mut classified.base_increases);
    rank_changes(&mut classified.base_decreases);
    rank_changes(&mut classified.ref_time_coefficients);
    rank_changes(&mut classified.min_exec_changes);
    rank_changes(&mut classified.proof_size_coefficients);

    classified
}

/// Build section 6: one row per runtime seen in the diff
///
/// # Arguments
/// * `runtimes` - Runtimes of every ingested weight file (`None` = unrecognized path)
/// * `flagged` - Deduplicated section 1-5 changes
/// * `changes` - All decomposed changes, for min-exec averages
/// * `pairs` - All pairs, for operation counts
pub fn summarize_runtimes(
    runtimes: &BTreeSet<Option<Runtime>>,
    flagged: &[Change],
    changes: &[Change],
    pairs: &[WeightRecordPair],
) -> Vec<RuntimeSummary> {
    runtimes
        .iter()
        .map(|runtime| {
            let rt_flagged: Vec<&Change> =
                flagged.iter().filter(|c| c.key.runtime == *runtime).collect();
            let increases = rt_flagged
                .iter()
                .filter(|c| c.delta.direction() == Direction::Increase)
                .count();
            let decreases = rt_flagged
                .iter()
                .filter(|c| c.delta.direction() == Direction::Decrease)
                .count();

            let net = match increases.cmp(&decreases) {
                std::cmp::Ordering::Greater => NetDirection::Increase,
                std::cmp::Ordering::Less => NetDirection::Decrease,
                std::cmp::Ordering::Equal => NetDirection::Balanced,
            };

            let min_exec = min_exec_percents(changes.iter().filter(|c| c.key.runtime == *runtime));
            let avg_min_exec_delta = if min_exec.is_empty() {
                None
            } else {
                Some(min_exec.iter().sum::<f64>() / min_exec.len() as f64)
            };

            RuntimeSummary {
                runtime: *runtime,
                flagged: rt_flagged.len(),
                increases,
                decreases,
                net,
                operations_changed: pairs.iter().filter(|p| p.key.runtime == *runtime).count(),
                avg_min_exec_delta,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::normalizer::percent_delta;
    use crate::analysis::schema::{ExtrinsicKey, Presence};

    fn change(kind: MetricKind, operation: &str, old: u64, new: u64) -> Change {
        Change {
            key: ExtrinsicKey::new(Some(Runtime::Moonbase), "pallet_test", operation),
            kind,
            variable: match kind {
                MetricKind::RefTimeCoefficient | MetricKind::ProofSizeCoefficient => {
                    Some("x".to_string())
                }
                _ => None,
            },
            old,
            new,
            delta: percent_delta(old, new),
            presence: Presence::Both,
        }
    }

    #[test]
    fn test_base_increase_boundary() {
        let changes = vec![change(MetricKind::RefTimeBase, "op", 100, 160)];

        let at_60 = classify_changes(&changes, &AnalysisConfig::with_threshold(60));
        assert_eq!(at_60.base_increases.len(), 1);

        let at_61 = classify_changes(&changes, &AnalysisConfig::with_threshold(61));
        assert!(at_61.base_increases.is_empty());
    }

    #[test]
    fn test_base_decrease() {
        let changes = vec![change(MetricKind::RefTimeBase, "op", 200, 50)];
        let classified = classify_changes(&changes, &AnalysisConfig::default());
        assert!(classified.base_increases.is_empty());
        assert_eq!(classified.base_decreases.len(), 1);
    }

    #[test]
    fn test_coefficient_sections_use_absolute_delta() {
        let changes = vec![
            change(MetricKind::RefTimeCoefficient, "up", 100, 200),
            change(MetricKind::RefTimeCoefficient, "down", 100, 40),
            change(MetricKind::RefTimeCoefficient, "small", 100, 110),
        ];
        let classified = classify_changes(&changes, &AnalysisConfig::default());
        let ops: Vec<&str> = classified
            .ref_time_coefficients
            .iter()
            .map(|c| c.key.operation.as_str())
            .collect();
        assert_eq!(ops, vec!["up", "down"]);
    }

    #[test]
    fn test_proof_size_threshold_is_fixed() {
        let changes = vec![
            change(MetricKind::ProofSizeCoefficient, "big", 1000, 2001),
            change(MetricKind::ProofSizeCoefficient, "medium", 1000, 1900),
        ];

        let strict = classify_changes(&changes, &AnalysisConfig::with_threshold(500));
        assert_eq!(strict.proof_size_coefficients.len(), 1);
        assert_eq!(strict.proof_size_coefficients[0].key.operation, "big");

        let loose = classify_changes(&changes, &AnalysisConfig::with_threshold(10));
        assert_eq!(loose.proof_size_coefficients.len(), 1);
    }

    #[test]
    fn test_unchanged_metrics_never_flagged() {
        let changes = vec![
            change(MetricKind::RefTimeBase, "same", 100, 100),
            change(MetricKind::MinExecTime, "same", 100, 100),
        ];
        let classified = classify_changes(&changes, &AnalysisConfig::with_threshold(0));
        assert!(classified.flagged().is_empty());
    }

    #[test]
    fn test_sentinels_rank_first() {
        let changes = vec![
            change(MetricKind::MinExecTime, "huge", 1, 10_000),
            change(MetricKind::MinExecTime, "inserted", 0, 5),
        ];
        let classified = classify_changes(&changes, &AnalysisConfig::default());
        assert_eq!(classified.min_exec_changes[0].key.operation, "inserted");

        let table = classified.flagged();
        assert_eq!(table[0].delta, Delta::NewTerm);
    }

    #[test]
    fn test_ties_break_by_key() {
        let changes = vec![
            change(MetricKind::MinExecTime, "b_op", 100, 200),
            change(MetricKind::MinExecTime, "a_op", 100, 200),
        ];
        let classified = classify_changes(&changes, &AnalysisConfig::default());
        assert_eq!(classified.min_exec_changes[0].key.operation, "a_op");
    }

    #[test]
    fn test_runtime_summary_counts_match_flagged() {
        let mut other = change(MetricKind::RefTimeBase, "other", 100, 10);
        other.key.runtime = Some(Runtime::Moonbeam);

        let changes = vec![
            change(MetricKind::RefTimeBase, "a", 100, 300),
            change(MetricKind::MinExecTime, "a", 100, 300),
            change(MetricKind::MinExecTime, "b", 100, 10),
            other,
        ];
        let classified = classify_changes(&changes, &AnalysisConfig::default());
        let flagged = classified.flagged();

        let runtimes: BTreeSet<Option<Runtime>> =
            [Some(Runtime::Moonbase), Some(Runtime::Moonbeam), Some(Runtime::Moonriver)]
                .into_iter()
                .collect();
        let summary = summarize_runtimes(&runtimes, &flagged, &changes, &[]);

        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0].flagged, 3);
        assert_eq!(summary[0].increases, 2);
        assert_eq!(summary[0].decreases, 1);
        assert_eq!(summary[0].net, NetDirection::Increase);
        assert_eq!(summary[1].flagged, 1);
        assert_eq!(summary[1].net, NetDirection::Decrease);
        assert_eq!(summary[2].flagged, 0);
        assert_eq!(summary[2].net, NetDirection::Balanced);
    }
}
