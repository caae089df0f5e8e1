//! Evaluation of flagged parametric formulas at mainnet reference values.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::reference::{ReferenceTable, RuntimeReference};
use crate::analysis::schema::{Change, ExtrinsicKey, MetricKind, WeightRecordPair};
use crate::parser::schema::{ComponentRange, WeightFormula};
use crate::utils::error::{AnalysisWarning, WarningKind};

/// New formula of one operation evaluated at reference values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub key: ExtrinsicKey,

    /// Flagged variable this evaluation was triggered by
    pub variable: String,
    pub reference_value: u64,

    pub charged_ref_time: u64,
    pub ref_time_limit: u64,
    pub charged_proof_size: u64,
    pub pov_limit: u64,

    pub ref_time_blocker: bool,
    pub proof_size_blocker: bool,

    /// A reference value lies outside the declared component range
    pub extrapolated: bool,

    /// Formula variables with no reference value; they contribute nothing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved_variables: Vec<String>,
}

impl Evaluation {
    pub fn is_blocker(&self) -> bool {
        self.ref_time_blocker || self.proof_size_blocker
    }
}

/// Evaluations plus the warnings raised while producing them
#[derive(Debug, Default)]
pub struct EvaluationOutcome {
    pub evaluations: Vec<Evaluation>,
    pub warnings: Vec<AnalysisWarning>,
}

/// Charged weight of a formula at given variable values
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChargedWeight {
    pub ref_time: u64,
    pub proof_size: u64,
    pub extrapolated: bool,
    pub unresolved: Vec<String>,
}

/// Evaluate `base + Σ coefficient × value` for ref_time and proof_size
///
/// Arithmetic saturates, like the runtime's own weight arithmetic.
pub fn charged_weight(
    formula: &WeightFormula,
    value_of: impl Fn(&str) -> Option<u64>,
    ranges: &BTreeMap<String, ComponentRange>,
) -> ChargedWeight {
    let mut charged = ChargedWeight {
        ref_time: formula.base_ref_time.unwrap_or(0),
        proof_size: formula.base_proof_size.unwrap_or(0),
        ..Default::default()
    };

    for var in formula.variables() {
        let Some(value) = value_of(var) else {
            charged.unresolved.push(var.to_string());
            continue;
        };

        if let Some(range) = ranges.get(var) {
            if !range.contains(value) {
                charged.extrapolated = true;
            }
        }

        if let Some(coefficient) = formula.ref_time_per_var.get(var) {
            charged.ref_time = charged.ref_time.saturating_add(coefficient.saturating_mul(value));
        }
        if let Some(coefficient) = formula.proof_size_per_var.get(var) {
            charged.proof_size = charged.proof_size.saturating_add(coefficient.saturating_mul(value));
        }
    }

    charged
}

fn evaluate_one(
    pair: &WeightRecordPair,
    formula: &WeightFormula,
    variable: &str,
    reference: &RuntimeReference,
) -> Option<Evaluation> {
    let key = &pair.key;
    let reference_value = reference.parameter(&key.pallet, &key.operation, variable)?;

    let charged = charged_weight(
        formula,
        |var| reference.parameter(&key.pallet, &key.operation, var),
        &pair.component_ranges,
    );

    Some(Evaluation {
        key: key.clone(),
        variable: variable.to_string(),
        reference_value,
        charged_ref_time: charged.ref_time,
        ref_time_limit: reference.block_ref_time_limit,
        charged_proof_size: charged.proof_size,
        pov_limit: reference.pov_limit,
        ref_time_blocker: charged.ref_time > reference.block_ref_time_limit,
        proof_size_blocker: charged.proof_size > reference.pov_limit,
        extrapolated: charged.extrapolated,
        unresolved_variables: charged.unresolved,
    })
}

/// Evaluate every flagged coefficient against the reference table
///
/// # Arguments
/// * `flagged` - Flagged changes; only ref_time and proof_size coefficients are used
/// * `pairs` - All pairs, supplying the new formula and component ranges
/// * `table` - Reference limits and parameter values
///
/// # Returns
/// One evaluation per (operation, flagged variable), in key order
pub fn evaluate_flagged(
    flagged: &[Change],
    pairs: &[WeightRecordPair],
    table: &ReferenceTable,
) -> EvaluationOutcome {
    let mut outcome = EvaluationOutcome::default();

    let targets: BTreeSet<(&ExtrinsicKey, &str)> = flagged
        .iter()
        .filter(|c| {
            matches!(
                c.kind,
                MetricKind::RefTimeCoefficient | MetricKind::ProofSizeCoefficient
            )
        })
        .filter_map(|c| c.variable.as_deref().map(|var| (&c.key, var)))
        .collect();

    for (key, variable) in targets {
        let Some(pair) = pairs.iter().find(|p| &p.key == key) else {
            continue;
        };
        let Some(formula) = pair.new.as_ref() else {
            debug!("{} was removed, nothing to evaluate", key);
            continue;
        };
        let Some(reference) = key.runtime.and_then(|rt| table.runtime(rt)) else {
            debug!("No reference entry for the runtime of {}", key);
            continue;
        };

        match evaluate_one(pair, formula, variable, reference) {
            Some(evaluation) => {
                if evaluation.is_blocker() {
                    warn!(
                        "{} exceeds a block limit at {} = {}",
                        key, variable, evaluation.reference_value
                    );
                }
                outcome.evaluations.push(evaluation);
            }
            None => outcome.warnings.push(AnalysisWarning::new(
                WarningKind::UnresolvedParameter,
                format!("{}: no reference value for `{}`", key, variable),
            )),
        }
    }

    outcome
}
