//! Mainnet evaluation of flagged formulas.
//!
//! Evaluates the new formula of every flagged coefficient at reference
//! parameter values and compares the charged weight to the block limits of
//! its runtime.
//!
//! # Example
//! ```ignore
//! use weight_diff_analyzer::evaluate::{evaluate_flagged, load_reference_table};
//!
//! let table = load_reference_table("mainnet.toml")?;
//! let outcome = evaluate_flagged(&flagged, &pairs, &table);
//! ```

pub mod mainnet;
pub mod reference;

pub use mainnet::{charged_weight, evaluate_flagged, ChargedWeight, Evaluation, EvaluationOutcome};
pub use reference::{load_reference_table, ReferenceTable, RuntimeReference};
