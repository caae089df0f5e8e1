use pretty_assertions::assert_eq;
use tempfile::tempdir;
use weight_diff_analyzer::analysis::analyze_diff;
use weight_diff_analyzer::evaluate::ReferenceTable;
use weight_diff_analyzer::output::{read_report, render_status, render_text_report, write_report};
use weight_diff_analyzer::utils::config::{AnalysisConfig, REPORT_VERSION};

const FIXTURE: &str = include_str!("fixtures/weights.diff");

#[test]
fn test_sections_in_fixed_order() {
    let report = analyze_diff(FIXTURE, &AnalysisConfig::default(), None);
    let text = render_text_report(&report);

    let headers = [
        "WEIGHT DIFF ANALYSIS (threshold: 50%)",
        "SECTION 1: BASE ref_time INCREASE >= 50%",
        "SECTION 2: BASE ref_time DECREASE >= 50%",
        "SECTION 3: PER-VARIABLE ref_time COEFFICIENT CHANGES >= 50%",
        "SECTION 4: MINIMUM EXECUTION TIME CHANGES >= 50%",
        "SECTION 5: proof_size PER-VARIABLE CHANGES >= 100%",
        "SECTION 6: PER-RUNTIME SUMMARY",
        "SECTION 7: ALL FLAGGED CHANGES (sorted by |change|)",
    ];

    let mut last = 0;
    for header in headers {
        let position = text.find(header).unwrap_or_else(|| panic!("missing {}", header));
        assert!(position >= last, "{} out of order", header);
        last = position;
    }
}

#[test]
fn test_section_contents() {
    let report = analyze_diff(FIXTURE, &AnalysisConfig::default(), None);
    let text = render_text_report(&report);

    assert!(text.contains("  [moonbase] pallet_balances::burn_allow_death\n    base ref_time: 0 -> 31,000,000 (NEW)\n"));
    assert!(text.contains("    base ref_time: 100,000,000 -> 40,000,000 (-60.0%)\n"));
    assert!(text.contains("    per-x ref_time: 40.0M -> 90.0M (+125.0%)\n    per-x DB reads: 2 -> 3\n"));
    assert!(text.contains("    DECREASE: 100.0M -> 45.0M (-55.0%)\n"));
    assert!(text.contains("    per-x proof_size: 2.5K -> 6.0K (+140.0%)\n"));
    assert!(text.contains("  moonriver: 1 operation(s) changed\n    Flagged: 2 (0 increases, 2 decreases), net decrease\n"));
    assert!(!text.contains("MAINNET EVALUATION"));
    assert!(!text.contains("WARNINGS"));
}

#[test]
fn test_empty_report_renders_every_section() {
    let report = analyze_diff("", &AnalysisConfig::default(), None);
    let text = render_text_report(&report);

    assert_eq!(text.matches("  None found.").count(), 7);
    assert!(text.contains("[no-recognized-hunks]"));
}

#[test]
fn test_evaluation_block() {
    let table = ReferenceTable::from_toml_str("[runtimes.moonbeam.parameters]\nx = 2000\n").unwrap();
    let report = analyze_diff(FIXTURE, &AnalysisConfig::default(), Some(&table));
    let text = render_text_report(&report);

    assert!(text.contains("MAINNET EVALUATION"));
    assert!(text.contains("  [moonbeam] pallet_parachain_staking::execute_leave_candidates at x = 2000\n"));
    assert!(text.contains("    proof_size: 12,006,000 of 10,485,760 bytes (BLOCKER)\n"));
    assert!(text.contains("    extrapolated:"));
}

#[test]
fn test_rendering_is_deterministic() {
    let config = AnalysisConfig::with_threshold(5);
    assert_eq!(
        render_text_report(&analyze_diff(FIXTURE, &config, None)),
        render_text_report(&analyze_diff(FIXTURE, &config, None))
    );
}

#[test]
fn test_json_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("report.json");

    let report = analyze_diff(FIXTURE, &AnalysisConfig::default(), None);
    write_report(&report, &path).unwrap();

    let envelope = read_report(&path).unwrap();
    assert_eq!(envelope.report_version, REPORT_VERSION);
    assert_eq!(envelope.report.table.len(), report.table.len());
    assert_eq!(envelope.report.runtime_summary, report.runtime_summary);
    assert_eq!(envelope.report.base_increases[0].key, report.base_increases[0].key);
}

#[test]
fn test_base_entries_carry_min_exec_time() {
    let report = analyze_diff(FIXTURE, &AnalysisConfig::default(), None);
    let text = render_text_report(&report);

    assert!(text.contains("    base ref_time: 0 -> 31,000,000 (NEW)\n    min exec time: 0 -> 30,000,000 (NEW)\n"));
    assert!(text.contains("    min exec time: 40,000,000 -> 90,000,000 (+125.0%)\n"));
    assert!(text.contains("    base ref_time: 100,000,000 -> 40,000,000 (-60.0%)\n    min exec time: 100,000,000 -> 45,000,000 (-55.0%)\n"));
}

#[test]
fn test_one_sided_operations_listed_under_table() {
    let report = analyze_diff(FIXTURE, &AnalysisConfig::default(), None);
    let text = render_text_report(&report);

    let table = text.find("SECTION 7:").unwrap();
    let inserted = text
        .find("  Inserted operations:\n    [moonbase] pallet_balances::burn_allow_death\n")
        .unwrap();
    assert!(inserted > table);
    assert!(!text.contains("Removed operations:"));
}

#[test]
fn test_removed_operation_alone_is_not_silent() {
    let diff = "\
diff --git a/runtime/moonriver/src/weights/pallet_proxy.rs b/runtime/moonriver/src/weights/pallet_proxy.rs
@@ -30,4 +29,0 @@ impl<T: frame_system::Config> pallet_proxy::WeightInfo for WeightInfo<T> {
-    fn kill_pure() -> Weight {
-        Weight::from_parts(0, 3500)
-            .saturating_add(T::DbWeight::get().writes(1_u64))
-    }
";
    let report = analyze_diff(diff, &AnalysisConfig::default(), None);
    let text = render_text_report(&report);

    assert!(!report.has_flags());
    // sections 1-5 are empty, section 7 lists the removal instead
    assert_eq!(text.matches("  None found.").count(), 5);
    assert!(text.contains("  Removed operations:\n    [moonriver] pallet_proxy::kill_pure\n"));
    assert!(render_status(&report).contains("1 OPERATION(S) INSERTED OR REMOVED"));
}
