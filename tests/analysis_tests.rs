use pretty_assertions::assert_eq;
use weight_diff_analyzer::analysis::{
    analyze_diff, Delta, ExtrinsicKey, MetricKind, NetDirection, OneSidedOperation, Presence,
};
use weight_diff_analyzer::parser::Runtime;
use weight_diff_analyzer::utils::config::AnalysisConfig;
use weight_diff_analyzer::utils::error::WarningKind;

const FIXTURE: &str = include_str!("fixtures/weights.diff");

fn base_diff(old: u64, new: u64) -> String {
    format!(
        "\
diff --git a/runtime/moonbase/src/weights/pallet_foo.rs b/runtime/moonbase/src/weights/pallet_foo.rs
@@ -1,3 +1,3 @@
 fn do_something() -> Weight {{
-    Weight::from_parts({}, 0)
+    Weight::from_parts({}, 0)
 }}
",
        old, new
    )
}

#[test]
fn test_fixture_sections() {
    let report = analyze_diff(FIXTURE, &AnalysisConfig::default(), None);

    assert_eq!(report.files_analyzed, 3);
    assert_eq!(report.operations_changed, 4);
    assert!(report.warnings.is_empty());

    let section1: Vec<&str> = report
        .base_increases
        .iter()
        .map(|c| c.key.operation.as_str())
        .collect();
    assert_eq!(section1, vec!["burn_allow_death", "transfer_allow_death"]);
    assert_eq!(report.base_increases[0].delta, Delta::NewTerm);

    assert_eq!(report.base_decreases.len(), 1);
    assert_eq!(report.base_decreases[0].key.runtime, Some(Runtime::Moonriver));
    assert_eq!(report.base_decreases[0].delta, Delta::Percent(-60.0));

    assert_eq!(report.ref_time_coefficients.len(), 1);
    assert_eq!(report.ref_time_coefficients[0].delta, Delta::Percent(125.0));

    assert_eq!(report.min_exec_changes.len(), 3);
    assert_eq!(report.min_exec_changes[0].presence, Presence::Inserted);

    assert_eq!(report.proof_size_coefficients.len(), 1);
    assert_eq!(report.proof_size_coefficients[0].delta, Delta::Percent(140.0));

    assert_eq!(report.db_access_changes.len(), 1);
    assert_eq!(report.db_access_changes[0].kind, MetricKind::Reads);
}

#[test]
fn test_full_table_ordering() {
    let report = analyze_diff(FIXTURE, &AnalysisConfig::default(), None);

    let rows: Vec<(Option<Runtime>, &str, MetricKind)> = report
        .table
        .iter()
        .map(|c| (c.key.runtime, c.key.operation.as_str(), c.kind))
        .collect();

    assert_eq!(
        rows,
        vec![
            (Some(Runtime::Moonbase), "burn_allow_death", MetricKind::RefTimeBase),
            (Some(Runtime::Moonbase), "burn_allow_death", MetricKind::MinExecTime),
            (Some(Runtime::Moonbase), "transfer_allow_death", MetricKind::RefTimeBase),
            (Some(Runtime::Moonbeam), "execute_leave_candidates", MetricKind::ProofSizeCoefficient),
            (Some(Runtime::Moonbase), "transfer_allow_death", MetricKind::MinExecTime),
            (Some(Runtime::Moonbeam), "execute_leave_candidates", MetricKind::RefTimeCoefficient),
            (Some(Runtime::Moonriver), "transfer_allow_death", MetricKind::RefTimeBase),
            (Some(Runtime::Moonriver), "transfer_allow_death", MetricKind::MinExecTime),
        ]
    );
}

#[test]
fn test_runtime_summary_matches_sections() {
    let report = analyze_diff(FIXTURE, &AnalysisConfig::default(), None);

    assert_eq!(report.runtime_summary.len(), 3);
    for row in &report.runtime_summary {
        let expected = report
            .table
            .iter()
            .filter(|c| c.key.runtime == row.runtime)
            .count();
        assert_eq!(row.flagged, expected);
    }

    let moonriver = &report.runtime_summary[2];
    assert_eq!(moonriver.runtime, Some(Runtime::Moonriver));
    assert_eq!(moonriver.decreases, 2);
    assert_eq!(moonriver.net, NetDirection::Decrease);
}

#[test]
fn test_threshold_boundary() {
    let diff = base_diff(100, 160);

    let at_60 = analyze_diff(&diff, &AnalysisConfig::with_threshold(60), None);
    assert_eq!(at_60.base_increases.len(), 1);
    assert_eq!(at_60.base_increases[0].delta, Delta::Percent(60.0));

    let at_61 = analyze_diff(&diff, &AnalysisConfig::with_threshold(61), None);
    assert!(at_61.base_increases.is_empty());
    assert!(!at_61.has_flags());
}

#[test]
fn test_proof_size_threshold_ignores_global() {
    let diff = "\
diff --git a/runtime/moonbeam/src/weights/pallet_foo.rs b/runtime/moonbeam/src/weights/pallet_foo.rs
@@ -1,4 +1,4 @@
 fn do_something(n: u32, ) -> Weight {
     Weight::from_parts(10_000, 0)
-        .saturating_add(Weight::from_parts(0, 1000).saturating_mul(n.into()))
+        .saturating_add(Weight::from_parts(0, 2001).saturating_mul(n.into()))
";
    let report = analyze_diff(diff, &AnalysisConfig::with_threshold(500), None);
    assert_eq!(report.proof_size_coefficients.len(), 1);
    assert_eq!(report.proof_size_coefficients[0].variable.as_deref(), Some("n"));
}

#[test]
fn test_non_weight_diff_is_empty() {
    let diff = "\
diff --git a/README.md b/README.md
@@ -1 +1 @@
-old
+new
";
    let report = analyze_diff(diff, &AnalysisConfig::default(), None);

    assert!(!report.has_flags());
    assert_eq!(report.files_analyzed, 0);
    assert!(report.runtime_summary.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::NoRecognizedHunks);
}

#[test]
fn test_report_is_deterministic() {
    let config = AnalysisConfig::with_threshold(5);
    let first = analyze_diff(FIXTURE, &config, None);
    let second = analyze_diff(FIXTURE, &config, None);
    assert_eq!(first, second);
}

#[test]
fn test_inserted_operation_without_sectioned_metrics_is_listed() {
    let diff = "\
diff --git a/runtime/moonbeam/src/weights/pallet_xcm.rs b/runtime/moonbeam/src/weights/pallet_xcm.rs
@@ -20,0 +21,5 @@ impl<T: frame_system::Config> pallet_xcm::WeightInfo for WeightInfo<T> {
+    fn claim_assets() -> Weight {
+        Weight::from_parts(0, 1000)
+            .saturating_add(T::DbWeight::get().reads(2_u64))
+    }
+
";
    let report = analyze_diff(diff, &AnalysisConfig::default(), None);

    assert!(report.table.is_empty());
    assert_eq!(
        report.one_sided_operations,
        vec![OneSidedOperation {
            key: ExtrinsicKey::new(Some(Runtime::Moonbeam), "pallet_xcm", "claim_assets"),
            presence: Presence::Inserted,
        }]
    );
    assert!(report.warnings.is_empty());
}

#[test]
fn test_fixture_one_sided_operations() {
    let report = analyze_diff(FIXTURE, &AnalysisConfig::default(), None);

    assert_eq!(report.one_sided_operations.len(), 1);
    assert_eq!(report.one_sided_operations[0].key.operation, "burn_allow_death");
    assert_eq!(report.one_sided_operations[0].presence, Presence::Inserted);
}

#[test]
fn test_changed_lines_far_below_fn_are_reported() {
    let diff = "\
diff --git a/runtime/moonbase/src/weights/pallet_balances.rs b/runtime/moonbase/src/weights/pallet_balances.rs
@@ -44,7 +44,7 @@ impl<T: frame_system::Config> pallet_balances::WeightInfo for WeightInfo<T> {
         // Proof Size summary in bytes:
         //  Measured:  `39`
         //  Estimated: `3593`
-        // Minimum execution time: 10_000_000 picoseconds.
-        Weight::from_parts(10_000_000, 3593)
+        // Minimum execution time: 90_000_000 picoseconds.
+        Weight::from_parts(90_000_000, 3593)
             .saturating_add(T::DbWeight::get().reads(1_u64))
";
    let report = analyze_diff(diff, &AnalysisConfig::default(), None);

    assert_eq!(report.operations_changed, 0);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::UnattributedLines);
    assert_eq!(
        report.warnings[0].file.as_deref(),
        Some("runtime/moonbase/src/weights/pallet_balances.rs")
    );
}
