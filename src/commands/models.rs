use crate::utils::config::DEFAULT_THRESHOLD_PERCENT;
use std::path::PathBuf;

/// Arguments for the analyze command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// Diff file to read (None = standard input)
    pub input: Option<PathBuf>,

    /// Global threshold in percent
    pub threshold: u32,

    /// Reference-parameter table enabling mainnet evaluation
    pub reference: Option<PathBuf>,

    /// Output path for the JSON report
    pub output: Option<PathBuf>,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            input: None,
            threshold: DEFAULT_THRESHOLD_PERCENT,
            reference: None,
            output: None,
        }
    }
}
