//! Configuration and constants for the analyzer.

/// Current JSON report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Default percentage threshold for flagging a metric change
pub const DEFAULT_THRESHOLD_PERCENT: u32 = 50;

/// Fixed threshold for proof_size per-variable coefficients.
/// Independent of the configured global threshold.
pub const PROOF_SIZE_COEFFICIENT_THRESHOLD_PERCENT: f64 = 100.0;

// Block limits used when a reference table omits them.
// 2 seconds of execution expressed in picoseconds.
pub const DEFAULT_BLOCK_REF_TIME_LIMIT: u64 = 2_000_000_000_000;
// 10 MiB PoV
pub const DEFAULT_POV_LIMIT: u64 = 10_485_760;

/// Directory segment identifying generated weight files
pub const WEIGHTS_DIR_SEGMENT: &str = "weights/";

/// Path fragments mapped to runtime names, checked in order
pub const RUNTIME_PATH_RULES: &[(&str, &str)] = &[
    ("runtime/moonbase/", "moonbase"),
    ("runtime/moonbeam/", "moonbeam"),
    ("runtime/moonriver/", "moonriver"),
];

/// Substrings that mark a line as carrying weight data
pub const WEIGHT_LINE_MARKERS: &[&str] = &[
    "Weight::from_parts",
    ".reads(",
    ".writes(",
    "Minimum execution time",
];

/// Environment variable consulted for the threshold when the flag is absent
pub const THRESHOLD_ENV_VAR: &str = "WEIGHT_DIFF_THRESHOLD";

/// Runtime configuration for a single analysis run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    /// Global threshold in percent, applied to every section except proof_size coefficients
    pub threshold_percent: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold_percent: DEFAULT_THRESHOLD_PERCENT as f64,
        }
    }
}

impl AnalysisConfig {
    pub fn with_threshold(threshold_percent: u32) -> Self {
        Self {
            threshold_percent: threshold_percent as f64,
        }
    }
}
