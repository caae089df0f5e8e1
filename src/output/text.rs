//! Plain-text rendering of analysis reports.
//!
//! The seven sections are always rendered, in fixed order, with fixed
//! headers. Rendering only formats what the report already holds; ordering
//! is decided by the classifier.

use crate::analysis::schema::{Change, Direction, ExtrinsicKey, Presence, Report, Section};
use crate::evaluate::Evaluation;
use crate::parser::schema::runtime_label;
use crate::utils::config::PROOF_SIZE_COEFFICIENT_THRESHOLD_PERCENT;
use colored::*;
use std::collections::BTreeMap;

const SEPARATOR_WIDTH: usize = 120;

/// Render the full report as plain text
///
/// Output contains no colour codes and no timestamps, so identical reports
/// render to identical text.
pub fn render_text_report(report: &Report) -> String {
    let mut out = String::new();

    out.push_str(&render_header(report));
    out.push_str(&render_overview(report));
    for section in Section::ALL {
        out.push_str(&render_section(report, section));
    }
    out.push_str(&render_runtime_summary(report));
    out.push_str(&render_table(report));
    out.push_str(&render_evaluations(report));
    out.push_str(&render_warnings(report));

    out
}

/// One-line verdict printed after the report
pub fn render_status(report: &Report) -> String {
    let blockers = report.blockers().count();
    let status = if blockers > 0 {
        format!("❌ STATUS: {} MAINNET BLOCKER(S)", blockers)
            .red()
            .bold()
    } else if report.has_flags() {
        format!("⚠️  STATUS: {} CHANGE(S) FLAGGED", report.table.len())
            .yellow()
            .bold()
    } else if !report.one_sided_operations.is_empty() {
        format!(
            "⚠️  STATUS: {} OPERATION(S) INSERTED OR REMOVED",
            report.one_sided_operations.len()
        )
        .yellow()
        .bold()
    } else {
        "✅ STATUS: NO SIGNIFICANT CHANGES".green().bold()
    };

    let mut out = status.to_string();
    if !report.warnings.is_empty() {
        out.push_str(&format!(" ({} warning(s))", report.warnings.len()));
    }
    out
}

fn banner(title: &str) -> String {
    let sep = "=".repeat(SEPARATOR_WIDTH);
    format!("\n{}\n{}\n{}\n", sep, title, sep)
}

fn render_header(report: &Report) -> String {
    let sep = "=".repeat(SEPARATOR_WIDTH);
    format!(
        "{}\nWEIGHT DIFF ANALYSIS (threshold: {:.0}%)\n{}\n",
        sep, report.threshold_percent, sep
    )
}

fn render_overview(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\nWeight files analyzed: {}\nOperations with changes: {}\n",
        report.files_analyzed, report.operations_changed
    ));

    if let Some(overview) = &report.min_exec_overview {
        out.push_str("\n  Minimum execution time summary:\n");
        out.push_str(&format!(
            "    Increases: {}, Decreases: {}\n",
            overview.increases, overview.decreases
        ));
        out.push_str(&format!(
            "    Average: {:+.1}%, Median: {:+.1}%\n",
            overview.average, overview.median
        ));
        out.push_str(&format!(
            "    Range: {:+.1}% to {:+.1}%\n",
            overview.min, overview.max
        ));
    }
    out
}

fn section_title(report: &Report, section: Section) -> String {
    let threshold = report.threshold_percent;
    let title = match section {
        Section::BaseIncrease => format!("BASE ref_time INCREASE >= {:.0}%", threshold),
        Section::BaseDecrease => format!("BASE ref_time DECREASE >= {:.0}%", threshold),
        Section::RefTimeCoefficient => {
            format!("PER-VARIABLE ref_time COEFFICIENT CHANGES >= {:.0}%", threshold)
        }
        Section::MinExecTime => {
            format!("MINIMUM EXECUTION TIME CHANGES >= {:.0}%", threshold)
        }
        Section::ProofSizeCoefficient => format!(
            "proof_size PER-VARIABLE CHANGES >= {:.0}%",
            PROOF_SIZE_COEFFICIENT_THRESHOLD_PERCENT
        ),
    };
    format!("SECTION {}: {}", section.number(), title)
}

fn render_section(report: &Report, section: Section) -> String {
    let mut out = banner(&section_title(report, section));
    let changes = report.section(section);

    if changes.is_empty() {
        out.push_str("  None found.\n");
        return out;
    }

    match section {
        Section::RefTimeCoefficient => out.push_str(&render_grouped(report, changes)),
        Section::MinExecTime => {
            for change in changes {
                let direction = match change.delta.direction() {
                    Direction::Decrease => "DECREASE",
                    _ => "INCREASE",
                };
                out.push_str(&format!("  {}\n", change.key));
                out.push_str(&format!(
                    "    {}: {} -> {} ({})\n",
                    direction,
                    format_weight(change.old),
                    format_weight(change.new),
                    change.delta
                ));
            }
        }
        Section::BaseIncrease | Section::BaseDecrease => {
            for change in changes {
                out.push_str(&format!("  {}\n", change.key));
                out.push_str(&format!(
                    "    {}: {} -> {} ({})\n",
                    change.label(),
                    group_thousands(change.old),
                    group_thousands(change.new),
                    change.delta
                ));
                let min_exec = report
                    .min_exec_context
                    .iter()
                    .find(|c| c.key == change.key);
                if let Some(min_exec) = min_exec {
                    out.push_str(&format!(
                        "    min exec time: {} -> {} ({})\n",
                        group_thousands(min_exec.old),
                        group_thousands(min_exec.new),
                        min_exec.delta
                    ));
                }
            }
        }
        Section::ProofSizeCoefficient => {
            for change in changes {
                out.push_str(&format!("  {}\n", change.key));
                out.push_str(&format!("    {}\n", describe_change(change)));
            }
        }
    }
    out
}

/// Section 3: one block per operation, with its DB access changes as context
fn render_grouped(report: &Report, changes: &[Change]) -> String {
    let mut by_key: BTreeMap<&ExtrinsicKey, Vec<&Change>> = BTreeMap::new();
    for change in changes {
        by_key.entry(&change.key).or_default().push(change);
    }

    let mut out = String::new();
    for (key, entries) in by_key {
        out.push_str(&format!("\n  {}\n", key));
        for change in entries {
            out.push_str(&format!("    {}\n", describe_change(change)));
        }
        for db in report.db_access_changes.iter().filter(|c| &c.key == key) {
            out.push_str(&format!("    {}: {} -> {}\n", db.label(), db.old, db.new));
        }
    }
    out
}

fn describe_change(change: &Change) -> String {
    format!(
        "{}: {} -> {} ({})",
        change.label(),
        format_weight(change.old),
        format_weight(change.new),
        change.delta
    )
}

fn render_runtime_summary(report: &Report) -> String {
    let mut out = banner("SECTION 6: PER-RUNTIME SUMMARY");

    if report.runtime_summary.is_empty() {
        out.push_str("  None found.\n");
        return out;
    }

    for row in &report.runtime_summary {
        out.push_str(&format!(
            "\n  {}: {} operation(s) changed\n",
            runtime_label(row.runtime),
            row.operations_changed
        ));
        out.push_str(&format!(
            "    Flagged: {} ({} increases, {} decreases), {}\n",
            row.flagged, row.increases, row.decreases, row.net
        ));
        if let Some(avg) = row.avg_min_exec_delta {
            out.push_str(&format!("    Min exec time: avg {:+.1}%\n", avg));
        }
    }
    out
}

fn render_table(report: &Report) -> String {
    let mut out = banner("SECTION 7: ALL FLAGGED CHANGES (sorted by |change|)");

    if report.table.is_empty() {
        if report.one_sided_operations.is_empty() {
            out.push_str("  None found.\n");
        }
        out.push_str(&render_one_sided(report));
        return out;
    }

    out.push_str(&format!(
        "{:<12} {:<36} {:<36} {:<22} {:>12} {:>12} {:>9}\n",
        "Runtime", "Pallet", "Function", "Metric", "Old", "New", "Change"
    ));
    out.push_str(&format!(
        "{} {} {} {} {} {} {}\n",
        "-".repeat(12),
        "-".repeat(36),
        "-".repeat(36),
        "-".repeat(22),
        "-".repeat(12),
        "-".repeat(12),
        "-".repeat(9)
    ));

    for change in &report.table {
        out.push_str(&format!(
            "{:<12} {:<36} {:<36} {:<22} {:>12} {:>12} {:>9}\n",
            runtime_label(change.key.runtime),
            change.key.pallet,
            change.key.operation,
            change.label(),
            format_weight(change.old),
            format_weight(change.new),
            change.delta.to_string()
        ));
    }
    out.push_str(&render_one_sided(report));
    out
}

/// Inserted and removed operations, whatever their metrics
fn render_one_sided(report: &Report) -> String {
    let mut out = String::new();
    for (presence, title) in [
        (Presence::Inserted, "Inserted operations"),
        (Presence::Removed, "Removed operations"),
    ] {
        let keys: Vec<&ExtrinsicKey> = report
            .one_sided_operations
            .iter()
            .filter(|op| op.presence == presence)
            .map(|op| &op.key)
            .collect();
        if keys.is_empty() {
            continue;
        }
        out.push_str(&format!("\n  {}:\n", title));
        for key in keys {
            out.push_str(&format!("    {}\n", key));
        }
    }
    out
}

fn verdict(blocker: bool) -> &'static str {
    if blocker {
        "BLOCKER"
    } else {
        "ok"
    }
}

fn render_evaluation(evaluation: &Evaluation) -> String {
    let mut out = format!(
        "  {} at {} = {}\n",
        evaluation.key, evaluation.variable, evaluation.reference_value
    );
    out.push_str(&format!(
        "    ref_time: {} of {} ({})\n",
        format_weight(evaluation.charged_ref_time),
        format_weight(evaluation.ref_time_limit),
        verdict(evaluation.ref_time_blocker)
    ));
    out.push_str(&format!(
        "    proof_size: {} of {} bytes ({})\n",
        group_thousands(evaluation.charged_proof_size),
        group_thousands(evaluation.pov_limit),
        verdict(evaluation.proof_size_blocker)
    ));
    if evaluation.extrapolated {
        out.push_str("    extrapolated: reference value outside the benchmarked range\n");
    }
    if !evaluation.unresolved_variables.is_empty() {
        out.push_str(&format!(
            "    no reference value for: {}\n",
            evaluation.unresolved_variables.join(", ")
        ));
    }
    out
}

fn render_evaluations(report: &Report) -> String {
    if report.evaluations.is_empty() {
        return String::new();
    }

    let mut out = banner("MAINNET EVALUATION");
    for evaluation in &report.evaluations {
        out.push_str(&render_evaluation(evaluation));
    }
    out
}

fn render_warnings(report: &Report) -> String {
    if report.warnings.is_empty() {
        return String::new();
    }

    let mut out = banner("WARNINGS");
    for warning in &report.warnings {
        out.push_str(&format!("  {}\n", warning));
    }
    out
}

/// Compact weight notation: 1.5K, 2.0M, 3.2B
pub fn format_weight(value: u64) -> String {
    match value {
        v if v >= 1_000_000_000 => format!("{:.1}B", v as f64 / 1_000_000_000.0),
        v if v >= 1_000_000 => format!("{:.1}M", v as f64 / 1_000_000.0),
        v if v >= 1_000 => format!("{:.1}K", v as f64 / 1_000.0),
        v => v.to_string(),
    }
}

/// Digits grouped by thousands: 1234567 -> "1,234,567"
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
