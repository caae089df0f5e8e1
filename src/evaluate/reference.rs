//! Reference-parameter table.
//!
//! Per runtime block limits and domain parameter values, loaded from TOML:
//!
//! ```toml
//! [runtimes.moonbeam]
//! block_ref_time_limit = 2_000_000_000_000
//! pov_limit = 10_485_760
//!
//! [runtimes.moonbeam.parameters]
//! x = 64
//! "pallet_parachain_staking::execute_leave_candidates::x" = 300
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::parser::schema::Runtime;
use crate::utils::config::{DEFAULT_BLOCK_REF_TIME_LIMIT, DEFAULT_POV_LIMIT};
use crate::utils::error::ReferenceError;

fn default_block_ref_time_limit() -> u64 {
    DEFAULT_BLOCK_REF_TIME_LIMIT
}

fn default_pov_limit() -> u64 {
    DEFAULT_POV_LIMIT
}

/// Complete reference table
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ReferenceTable {
    /// Keyed by runtime name
    #[serde(default)]
    pub runtimes: BTreeMap<String, RuntimeReference>,
}

/// Limits and parameters of one runtime
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RuntimeReference {
    /// Maximum ref_time per block, in picoseconds
    #[serde(default = "default_block_ref_time_limit")]
    pub block_ref_time_limit: u64,

    /// Maximum proof size per block, in bytes
    #[serde(default = "default_pov_limit")]
    pub pov_limit: u64,

    /// Variable values. Keys are `var`, `operation::var` or `pallet::operation::var`
    #[serde(default)]
    pub parameters: BTreeMap<String, u64>,
}

impl Default for RuntimeReference {
    fn default() -> Self {
        Self {
            block_ref_time_limit: DEFAULT_BLOCK_REF_TIME_LIMIT,
            pov_limit: DEFAULT_POV_LIMIT,
            parameters: BTreeMap::new(),
        }
    }
}

impl RuntimeReference {
    /// Look up a variable's reference value, most specific key first
    pub fn parameter(&self, pallet: &str, operation: &str, var: &str) -> Option<u64> {
        [
            format!("{}::{}::{}", pallet, operation, var),
            format!("{}::{}", operation, var),
            var.to_string(),
        ]
        .iter()
        .find_map(|key| self.parameters.get(key).copied())
    }
}

impl ReferenceTable {
    /// Parse and validate a table from TOML text
    ///
    /// # Errors
    /// * `ReferenceError::ParseFailed` - If the TOML is invalid
    /// * `ReferenceError::Invalid` - If a runtime name is unknown or a limit is zero
    pub fn from_toml_str(contents: &str) -> Result<Self, ReferenceError> {
        let table: ReferenceTable = toml::from_str(contents)?;

        for (name, runtime) in &table.runtimes {
            if Runtime::from_name(name).is_none() {
                return Err(ReferenceError::Invalid(format!(
                    "unknown runtime `{}` (expected moonbase, moonbeam or moonriver)",
                    name
                )));
            }
            if runtime.block_ref_time_limit == 0 || runtime.pov_limit == 0 {
                return Err(ReferenceError::Invalid(format!(
                    "runtime `{}` has a zero block limit",
                    name
                )));
            }
        }

        Ok(table)
    }

    pub fn runtime(&self, runtime: Runtime) -> Option<&RuntimeReference> {
        self.runtimes.get(runtime.name())
    }
}

/// Load a reference table from a TOML file
///
/// # Arguments
/// * `path` - Path to the TOML file
///
/// # Errors
/// * `ReferenceError::ReadFailed` - If the file cannot be read
/// * `ReferenceError::ParseFailed` / `ReferenceError::Invalid` - See [`ReferenceTable::from_toml_str`]
///
/// # Example
/// ```ignore
/// let table = load_reference_table("mainnet.toml")?;
/// ```
pub fn load_reference_table(path: impl AsRef<Path>) -> Result<ReferenceTable, ReferenceError> {
    let contents = fs::read_to_string(path)?;
    ReferenceTable::from_toml_str(&contents)
}
