//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod analyze;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use analyze::execute_analyze;
pub use models::AnalyzeArgs;
pub use utils::{decode_diff_bytes, display_version, read_diff_input, DiffInput};
