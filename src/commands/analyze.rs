//! Analyze command implementation.
//! Reads a diff, runs the analysis and reports flagged weight changes.

use super::models::AnalyzeArgs;
use super::utils::read_diff_input;
use crate::analysis::{analyze_diff, Report};
use crate::evaluate::load_reference_table;
use crate::output::{render_status, render_text_report, write_report};
use crate::utils::config::AnalysisConfig;
use crate::utils::error::{AnalysisWarning, WarningKind};
use anyhow::{Context, Result};
use colored::*;
use log::{info, warn};

/// Execute the analyze command
///
/// Only an unreadable input aborts. Invalid UTF-8, a bad reference table or
/// a failed JSON write is reported as a warning and the text report is still
/// printed.
pub fn execute_analyze(args: AnalyzeArgs) -> Result<Report> {
    // Step 1: Read the diff
    let input = read_diff_input(args.input.as_deref()).context("Failed to read diff input")?;
    info!("Read {} bytes of diff input", input.text.len());

    let mut extra_warnings = Vec::new();
    if input.lossy {
        let source = args
            .input
            .as_ref()
            .map_or_else(|| "stdin".to_string(), |p| p.display().to_string());
        warn!("Input from {} is not valid UTF-8; invalid bytes replaced", source);
        extra_warnings.push(AnalysisWarning::in_file(
            WarningKind::LossyInput,
            source,
            "invalid UTF-8 bytes replaced with U+FFFD",
        ));
    }

    // Step 2: Load the reference table if requested
    let reference = match &args.reference {
        Some(path) => match load_reference_table(path) {
            Ok(table) => Some(table),
            Err(e) => {
                warn!("Mainnet evaluation disabled: {}", e);
                extra_warnings.push(AnalysisWarning::in_file(
                    WarningKind::ReferenceUnavailable,
                    path.display().to_string(),
                    e.to_string(),
                ));
                None
            }
        },
        None => None,
    };

    // Step 3: Analyze
    let config = AnalysisConfig::with_threshold(args.threshold);
    let mut report = analyze_diff(&input.text, &config, reference.as_ref());
    report.warnings.extend(extra_warnings);

    // Step 4: Write JSON output if requested
    if let Some(path) = &args.output {
        match write_report(&report, path) {
            Ok(()) => println!(
                "📊 Weight report written to {}",
                path.display().to_string().cyan()
            ),
            Err(e) => {
                warn!("Failed to write JSON report: {}", e);
                report.warnings.push(AnalysisWarning::in_file(
                    WarningKind::OutputFailed,
                    path.display().to_string(),
                    e.to_string(),
                ));
            }
        }
    }

    // Step 5: Terminal report
    print!("{}", render_text_report(&report));
    println!("\n{}", render_status(&report));

    Ok(report)
}
