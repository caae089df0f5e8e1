//! Output writers for analysis reports.
//!
//! This module handles presenting reports:
//! - Plain-text rendering for the terminal
//! - JSON files with a versioned envelope

pub mod json;
pub mod text;

// Re-export main functions
pub use json::{read_report, write_report, ReportEnvelope};
pub use text::{render_status, render_text_report};

use crate::utils::error::OutputError;
use std::path::Path;

/// Common path validation for output files
pub fn validate_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() || path.is_dir() {
        return Err(OutputError::InvalidPath(path.to_path_buf()));
    }

    Ok(())
}
