//! Delta calculation and metric decomposition.
//!
//! Handles the math for comparing old and new formulas, including the zero
//! baseline case where no percentage is defined.

use super::schema::{Change, Delta, Direction, MetricKind, MinExecOverview, WeightRecordPair};
use crate::parser::schema::{BaseField, WeightFormula};
use std::collections::BTreeSet;

/// Compute the delta between two metric values
///
/// Percent delta = (new - old) / |old| * 100. A zero baseline yields the
/// `NewTerm` sentinel instead of dividing; a vanished term yields `RemovedTerm`.
pub fn percent_delta(old: u64, new: u64) -> Delta {
    if old == 0 {
        return Delta::NewTerm;
    }
    if new == 0 {
        return Delta::RemovedTerm;
    }
    let change = new as f64 - old as f64;
    Delta::Percent(change * 100.0 / old as f64)
}

fn base_kind(field: BaseField) -> MetricKind {
    match field {
        BaseField::RefTime => MetricKind::RefTimeBase,
        BaseField::ProofSize => MetricKind::ProofSizeBase,
        BaseField::Reads => MetricKind::Reads,
        BaseField::Writes => MetricKind::Writes,
        BaseField::MinExecutionTime => MetricKind::MinExecTime,
    }
}

/// Break a pair into one Change per metric.
///
/// Absent values count as zero. Metrics that are zero on both sides are
/// skipped; unchanged metrics are kept and left for the classifier to drop.
pub fn decompose_pair(pair: &WeightRecordPair) -> Vec<Change> {
    let empty = WeightFormula::default();
    let old = pair.old.as_ref().unwrap_or(&empty);
    let new = pair.new.as_ref().unwrap_or(&empty);
    let presence = pair.presence();

    let mut changes = Vec::new();
    let mut push = |kind: MetricKind, variable: Option<&str>, old_value: u64, new_value: u64| {
        if old_value == 0 && new_value == 0 {
            return;
        }
        changes.push(Change {
            key: pair.key.clone(),
            kind,
            variable: variable.map(str::to_string),
            old: old_value,
            new: new_value,
            delta: percent_delta(old_value, new_value),
            presence,
        });
    };

    for field in BaseField::ALL {
        if old.base(field).is_none() && new.base(field).is_none() {
            continue;
        }
        push(
            base_kind(field),
            None,
            old.base(field).unwrap_or(0),
            new.base(field).unwrap_or(0),
        );
    }

    let ref_vars: BTreeSet<&String> = old
        .ref_time_per_var
        .keys()
        .chain(new.ref_time_per_var.keys())
        .collect();
    for var in ref_vars {
        push(
            MetricKind::RefTimeCoefficient,
            Some(var.as_str()),
            old.ref_time_per_var.get(var).copied().unwrap_or(0),
            new.ref_time_per_var.get(var).copied().unwrap_or(0),
        );
    }

    let proof_vars: BTreeSet<&String> = old
        .proof_size_per_var
        .keys()
        .chain(new.proof_size_per_var.keys())
        .collect();
    for var in proof_vars {
        push(
            MetricKind::ProofSizeCoefficient,
            Some(var.as_str()),
            old.proof_size_per_var.get(var).copied().unwrap_or(0),
            new.proof_size_per_var.get(var).copied().unwrap_or(0),
        );
    }

    let db_vars: BTreeSet<&String> = old.db_per_var.keys().chain(new.db_per_var.keys()).collect();
    for var in db_vars {
        let old_access = old.db_per_var.get(var).copied().unwrap_or_default();
        let new_access = new.db_per_var.get(var).copied().unwrap_or_default();
        push(MetricKind::Reads, Some(var.as_str()), old_access.reads, new_access.reads);
        push(MetricKind::Writes, Some(var.as_str()), old_access.writes, new_access.writes);
    }

    changes
}

/// Decompose every pair, preserving key order
pub fn decompose_pairs(pairs: &[WeightRecordPair]) -> Vec<Change> {
    pairs.iter().flat_map(decompose_pair).collect()
}

/// Numeric min-exec-time deltas of a set of changes
pub fn min_exec_percents<'a>(changes: impl IntoIterator<Item = &'a Change>) -> Vec<f64> {
    changes
        .into_iter()
        .filter(|c| c.kind == MetricKind::MinExecTime)
        .filter_map(|c| match c.delta {
            Delta::Percent(p) => Some(p),
            _ => None,
        })
        .collect()
}

/// Summary statistics over min-exec-time percent deltas
pub fn min_exec_overview(percents: &[f64]) -> Option<MinExecOverview> {
    if percents.is_empty() {
        return None;
    }

    let mut sorted = percents.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let count = |direction: Direction| {
        sorted
            .iter()
            .filter(|p| Delta::Percent(**p).direction() == direction)
            .count()
    };

    Some(MinExecOverview {
        increases: count(Direction::Increase),
        decreases: count(Direction::Decrease),
        average: sorted.iter().sum::<f64>() / sorted.len() as f64,
        median: sorted[sorted.len() / 2],
        min: sorted[0],
        max: sorted[sorted.len() - 1],
    })
}
