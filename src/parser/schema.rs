//! Schema definitions for parsed weight data.
//!
//! A weight formula is a set of base constants plus linear terms keyed by
//! benchmark component name (`x`, `y`, ...). Base constants are optional so
//! that "not mentioned in this hunk" can be told apart from an explicit zero.

use crate::utils::config::RUNTIME_PATH_RULES;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Deployment target a weight file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
    Moonbase,
    Moonbeam,
    Moonriver,
}

impl Runtime {
    pub const ALL: [Runtime; 3] = [Runtime::Moonbase, Runtime::Moonbeam, Runtime::Moonriver];

    pub fn name(&self) -> &'static str {
        match self {
            Runtime::Moonbase => "moonbase",
            Runtime::Moonbeam => "moonbeam",
            Runtime::Moonriver => "moonriver",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rt| rt.name() == name)
    }

    /// Derive the runtime from a weight file path using the fixed path rules
    pub fn from_path(path: &str) -> Option<Self> {
        RUNTIME_PATH_RULES
            .iter()
            .find(|(fragment, _)| path.contains(fragment))
            .and_then(|(_, name)| Self::from_name(name))
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Display name for an optional runtime
pub fn runtime_label(runtime: Option<Runtime>) -> &'static str {
    runtime.map(|rt| rt.name()).unwrap_or("unknown")
}

/// Base constants of a weight formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BaseField {
    RefTime,
    ProofSize,
    Reads,
    Writes,
    MinExecutionTime,
}

impl BaseField {
    pub const ALL: [BaseField; 5] = [
        BaseField::RefTime,
        BaseField::ProofSize,
        BaseField::Reads,
        BaseField::Writes,
        BaseField::MinExecutionTime,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BaseField::RefTime => "base ref_time",
            BaseField::ProofSize => "base proof_size",
            BaseField::Reads => "base DB reads",
            BaseField::Writes => "base DB writes",
            BaseField::MinExecutionTime => "minimum execution time",
        }
    }
}

/// Per-variable database access counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbAccess {
    pub reads: u64,
    pub writes: u64,
}

/// Declared valid input range of a benchmark component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRange {
    pub low: u64,
    pub high: u64,
}

impl ComponentRange {
    pub fn contains(&self, value: u64) -> bool {
        self.low <= value && value <= self.high
    }
}

/// Two different values seen for the same base constant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseConflict {
    pub field: BaseField,
    pub kept: u64,
    pub discarded: u64,
}

/// A normalized weight formula for one side (old or new) of an operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightFormula {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_ref_time: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_proof_size: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_reads: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_writes: Option<u64>,

    /// Minimum execution time in picoseconds, taken from the benchmark comment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_execution_time: Option<u64>,

    /// ref_time coefficient per component
    #[serde(default)]
    pub ref_time_per_var: BTreeMap<String, u64>,

    /// proof_size coefficient per component
    #[serde(default)]
    pub proof_size_per_var: BTreeMap<String, u64>,

    /// DB reads/writes per component
    #[serde(default)]
    pub db_per_var: BTreeMap<String, DbAccess>,
}

impl WeightFormula {
    pub fn base(&self, field: BaseField) -> Option<u64> {
        match field {
            BaseField::RefTime => self.base_ref_time,
            BaseField::ProofSize => self.base_proof_size,
            BaseField::Reads => self.base_reads,
            BaseField::Writes => self.base_writes,
            BaseField::MinExecutionTime => self.min_execution_time,
        }
    }

    fn base_slot(&mut self, field: BaseField) -> &mut Option<u64> {
        match field {
            BaseField::RefTime => &mut self.base_ref_time,
            BaseField::ProofSize => &mut self.base_proof_size,
            BaseField::Reads => &mut self.base_reads,
            BaseField::Writes => &mut self.base_writes,
            BaseField::MinExecutionTime => &mut self.min_execution_time,
        }
    }

    /// Set a base constant. A different value already present is kept and
    /// reported as a conflict.
    pub fn assign_base(&mut self, field: BaseField, value: u64) -> Result<(), BaseConflict> {
        let slot = self.base_slot(field);
        match *slot {
            None => {
                *slot = Some(value);
                Ok(())
            }
            Some(existing) if existing == value => Ok(()),
            Some(existing) => Err(BaseConflict {
                field,
                kept: existing,
                discarded: value,
            }),
        }
    }

    pub fn add_ref_time_coefficient(&mut self, var: &str, value: u64) {
        *self.ref_time_per_var.entry(var.to_string()).or_insert(0) += value;
    }

    pub fn add_proof_size_coefficient(&mut self, var: &str, value: u64) {
        *self.proof_size_per_var.entry(var.to_string()).or_insert(0) += value;
    }

    pub fn add_reads_per_var(&mut self, var: &str, value: u64) {
        self.db_per_var.entry(var.to_string()).or_default().reads += value;
    }

    pub fn add_writes_per_var(&mut self, var: &str, value: u64) {
        self.db_per_var.entry(var.to_string()).or_default().writes += value;
    }

    /// Fold another partial formula of the same operation into this one.
    ///
    /// Linear terms add; base constants fill gaps and report disagreements.
    pub fn merge(&mut self, other: &WeightFormula) -> Vec<BaseConflict> {
        let mut conflicts = Vec::new();

        for field in BaseField::ALL {
            if let Some(value) = other.base(field) {
                if let Err(conflict) = self.assign_base(field, value) {
                    conflicts.push(conflict);
                }
            }
        }

        for (var, value) in &other.ref_time_per_var {
            self.add_ref_time_coefficient(var, *value);
        }
        for (var, value) in &other.proof_size_per_var {
            self.add_proof_size_coefficient(var, *value);
        }
        for (var, access) in &other.db_per_var {
            self.add_reads_per_var(var, access.reads);
            self.add_writes_per_var(var, access.writes);
        }

        conflicts
    }

    /// Every component name carrying a ref_time or proof_size coefficient
    pub fn variables(&self) -> Vec<&str> {
        let mut vars: Vec<&str> = self
            .ref_time_per_var
            .keys()
            .chain(self.proof_size_per_var.keys())
            .map(String::as_str)
            .collect();
        vars.sort_unstable();
        vars.dedup();
        vars
    }
}

/// Formulas extracted for one operation from one hunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFormula {
    pub runtime: Option<Runtime>,
    pub pallet: String,
    pub operation: String,

    /// Terms recognised on removed lines
    pub old: Option<WeightFormula>,

    /// Terms recognised on added lines
    pub new: Option<WeightFormula>,

    /// Component ranges declared in the doc comment of the operation
    pub component_ranges: BTreeMap<String, ComponentRange>,
}
