//! Schema definitions for weight comparisons and reports.
//!
//! Defines the structures that represent differences between the old and new
//! weight formulas of each operation.

use crate::evaluate::Evaluation;
use crate::parser::schema::{runtime_label, ComponentRange, Runtime, WeightFormula};
use crate::utils::error::AnalysisWarning;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Identifies one weight function: (runtime, pallet, operation)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExtrinsicKey {
    pub runtime: Option<Runtime>,
    pub pallet: String,
    pub operation: String,
}

impl ExtrinsicKey {
    pub fn new(runtime: Option<Runtime>, pallet: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            runtime,
            pallet: pallet.into(),
            operation: operation.into(),
        }
    }
}

impl fmt::Display for ExtrinsicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}::{}",
            runtime_label(self.runtime),
            self.pallet,
            self.operation
        )
    }
}

/// Old and new formula of one operation across the whole diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightRecordPair {
    pub key: ExtrinsicKey,
    pub old: Option<WeightFormula>,
    pub new: Option<WeightFormula>,

    /// Declared component ranges, used to judge evaluation confidence
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub component_ranges: BTreeMap<String, ComponentRange>,
}

impl WeightRecordPair {
    pub fn presence(&self) -> Presence {
        match (&self.old, &self.new) {
            (None, Some(_)) => Presence::Inserted,
            (Some(_), None) => Presence::Removed,
            _ => Presence::Both,
        }
    }
}

/// Whether an operation exists on both sides of the diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Both,
    Inserted,
    Removed,
}

/// Kind of a compared metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    RefTimeBase,
    RefTimeCoefficient,
    ProofSizeBase,
    ProofSizeCoefficient,
    MinExecTime,
    Reads,
    Writes,
}

impl MetricKind {
    /// Human-readable metric name, qualified by variable where relevant
    pub fn label(&self, variable: Option<&str>) -> String {
        match (self, variable) {
            (MetricKind::RefTimeBase, _) => "base ref_time".to_string(),
            (MetricKind::ProofSizeBase, _) => "base proof_size".to_string(),
            (MetricKind::MinExecTime, _) => "min exec time".to_string(),
            (MetricKind::RefTimeCoefficient, Some(var)) => format!("per-{} ref_time", var),
            (MetricKind::ProofSizeCoefficient, Some(var)) => format!("per-{} proof_size", var),
            (MetricKind::RefTimeCoefficient, None) => "ref_time coefficient".to_string(),
            (MetricKind::ProofSizeCoefficient, None) => "proof_size coefficient".to_string(),
            (MetricKind::Reads, Some(var)) => format!("per-{} DB reads", var),
            (MetricKind::Writes, Some(var)) => format!("per-{} DB writes", var),
            (MetricKind::Reads, None) => "DB reads".to_string(),
            (MetricKind::Writes, None) => "DB writes".to_string(),
        }
    }
}

/// Direction of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increase,
    Decrease,
    Unchanged,
}

/// Percent delta, or a sentinel where the old value is zero or the term vanished
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "percent", rename_all = "snake_case")]
pub enum Delta {
    Percent(f64),
    /// old value was zero; no percentage is defined
    NewTerm,
    /// new value is zero
    RemovedTerm,
}

impl Delta {
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Delta::Percent(_))
    }

    /// Absolute percent, `None` for sentinels
    pub fn magnitude(&self) -> Option<f64> {
        match self {
            Delta::Percent(p) => Some(p.abs()),
            _ => None,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Delta::NewTerm => Direction::Increase,
            Delta::RemovedTerm => Direction::Decrease,
            Delta::Percent(p) if *p > 0.0 => Direction::Increase,
            Delta::Percent(p) if *p < 0.0 => Direction::Decrease,
            Delta::Percent(_) => Direction::Unchanged,
        }
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delta::Percent(p) => write!(f, "{:+.1}%", p),
            Delta::NewTerm => f.write_str("NEW"),
            Delta::RemovedTerm => f.write_str("REMOVED"),
        }
    }
}

/// One compared metric of one operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub key: ExtrinsicKey,
    pub kind: MetricKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,

    pub old: u64,
    pub new: u64,
    pub delta: Delta,
    pub presence: Presence,
}

impl Change {
    pub fn label(&self) -> String {
        self.kind.label(self.variable.as_deref())
    }

    /// Identity used for deduplication
    pub fn identity(&self) -> (&ExtrinsicKey, MetricKind, Option<&str>) {
        (&self.key, self.kind, self.variable.as_deref())
    }

    /// Ranking order: sentinels first, then descending |percent|, then identity
    pub fn rank_cmp(&self, other: &Change) -> Ordering {
        let by_magnitude = match (self.delta.magnitude(), other.delta.magnitude()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => b.total_cmp(&a),
        };
        by_magnitude.then_with(|| self.identity().cmp(&other.identity()))
    }
}

/// The five threshold sections of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Section {
    BaseIncrease,
    BaseDecrease,
    RefTimeCoefficient,
    MinExecTime,
    ProofSizeCoefficient,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::BaseIncrease,
        Section::BaseDecrease,
        Section::RefTimeCoefficient,
        Section::MinExecTime,
        Section::ProofSizeCoefficient,
    ];

    pub fn number(&self) -> usize {
        match self {
            Section::BaseIncrease => 1,
            Section::BaseDecrease => 2,
            Section::RefTimeCoefficient => 3,
            Section::MinExecTime => 4,
            Section::ProofSizeCoefficient => 5,
        }
    }
}

/// Overall direction of a runtime's flagged changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetDirection {
    Increase,
    Decrease,
    Balanced,
}

impl fmt::Display for NetDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetDirection::Increase => f.write_str("net increase"),
            NetDirection::Decrease => f.write_str("net decrease"),
            NetDirection::Balanced => f.write_str("balanced"),
        }
    }
}

/// Section 6 row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSummary {
    pub runtime: Option<Runtime>,

    /// Changes in sections 1-5 for this runtime
    pub flagged: usize,
    pub increases: usize,
    pub decreases: usize,
    pub net: NetDirection,

    /// Operations of this runtime with any extracted change
    pub operations_changed: usize,

    /// Mean numeric min-exec-time delta, when any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_min_exec_delta: Option<f64>,
}

/// An operation that exists on only one side of the diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneSidedOperation {
    pub key: ExtrinsicKey,
    pub presence: Presence,
}

/// Statistics over every numeric minimum-execution-time delta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinExecOverview {
    pub increases: usize,
    pub decreases: usize,
    pub average: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Complete analysis report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub threshold_percent: f64,

    /// Weight files with at least one usable hunk
    pub files_analyzed: usize,

    /// Paired operations
    pub operations_changed: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_exec_overview: Option<MinExecOverview>,

    /// Section 1
    pub base_increases: Vec<Change>,
    /// Section 2
    pub base_decreases: Vec<Change>,
    /// Section 3
    pub ref_time_coefficients: Vec<Change>,
    /// Section 4
    pub min_exec_changes: Vec<Change>,
    /// Section 5
    pub proof_size_coefficients: Vec<Change>,
    /// Section 6
    pub runtime_summary: Vec<RuntimeSummary>,
    /// Section 7
    pub table: Vec<Change>,

    /// Inserted and removed operations, listed under section 7 whether or
    /// not any of their metrics reached a section
    #[serde(default)]
    pub one_sided_operations: Vec<OneSidedOperation>,

    /// Every min-exec-time change, shown under section 1 and 2 entries
    #[serde(default)]
    pub min_exec_context: Vec<Change>,

    /// DB read/write changes, shown as context under section 3
    #[serde(default)]
    pub db_access_changes: Vec<Change>,

    #[serde(default)]
    pub evaluations: Vec<Evaluation>,

    #[serde(default)]
    pub warnings: Vec<AnalysisWarning>,
}

impl Report {
    pub fn section(&self, section: Section) -> &[Change] {
        match section {
            Section::BaseIncrease => &self.base_increases,
            Section::BaseDecrease => &self.base_decreases,
            Section::RefTimeCoefficient => &self.ref_time_coefficients,
            Section::MinExecTime => &self.min_exec_changes,
            Section::ProofSizeCoefficient => &self.proof_size_coefficients,
        }
    }

    /// Whether any section 1-5 entry was flagged
    pub fn has_flags(&self) -> bool {
        !self.table.is_empty()
    }

    pub fn blockers(&self) -> impl Iterator<Item = &Evaluation> {
        self.evaluations.iter().filter(|e| e.is_blocker())
    }
}
