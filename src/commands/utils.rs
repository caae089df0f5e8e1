use crate::utils::config::REPORT_VERSION;
use crate::utils::error::InputError;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Diff text as read from its source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffInput {
    pub text: String,

    /// Invalid UTF-8 sequences were replaced with U+FFFD
    pub lossy: bool,
}

/// Read the whole diff from a file, or from stdin when no path is given
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected, so a
/// stray Latin-1 byte in an unrelated file never hides the weight hunks.
///
/// # Errors
/// * `InputError::Unavailable` - The source cannot be opened or read
pub fn read_diff_input(path: Option<&Path>) -> Result<DiffInput, InputError> {
    let bytes = match path {
        Some(path) => {
            fs::read(path).map_err(|e| InputError::unavailable(path.display().to_string(), e))?
        }
        None => {
            let mut bytes = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut bytes)
                .map_err(|e| InputError::unavailable("stdin", e))?;
            bytes
        }
    };
    Ok(decode_diff_bytes(bytes))
}

/// Decode raw diff bytes, replacing invalid UTF-8
pub fn decode_diff_bytes(bytes: Vec<u8>) -> DiffInput {
    match String::from_utf8(bytes) {
        Ok(text) => DiffInput { text, lossy: false },
        Err(e) => DiffInput {
            text: String::from_utf8_lossy(e.as_bytes()).into_owned(),
            lossy: true,
        },
    }
}

/// Display version information
pub fn display_version() {
    println!("Weight Diff Analyzer v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", REPORT_VERSION);
    println!();
    println!("Flags benchmark weight regressions in a diff of generated runtime weight files.");
}
