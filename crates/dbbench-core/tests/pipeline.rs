//! Integration tests for the runner → analyzer → export pipeline.

use std::time::Duration;

use dbbench_core::export::{self, RESULTS_FILE, SUMMARY_FILE};
use dbbench_core::{
    Analyzer, BenchmarkResult, ExportError, OperationError, OperationOutcome, OperationStats,
    Runner, RunnerConfig, Target,
};

fn fixed_durations(ms: &[u64]) -> impl FnMut() -> Result<OperationOutcome, OperationError> + '_ {
    let mut iter = ms.iter();
    move || {
        let ms = iter.next().copied().unwrap_or(0);
        Ok(OperationOutcome::success(Duration::from_millis(ms), 1))
    }
}

#[test]
fn test_end_to_end_insert_single() {
    let runner = Runner::new(RunnerConfig::new(3)).unwrap();
    let target = Target::vendor_only("sqlite");

    let results = runner.run("insert_single", &target, fixed_durations(&[10, 12, 11]));

    assert_eq!(results.len(), 3);
    let durations: Vec<f64> = results.iter().map(BenchmarkResult::duration_ms).collect();
    assert_eq!(durations, vec![10.0, 12.0, 11.0]);

    let tree = Analyzer::new(results).summary_statistics();
    assert_eq!(tree.len(), 1);
    assert_eq!(
        tree.get("insert_single").unwrap().get("sqlite"),
        Some(&OperationStats {
            mean: 11.0,
            median: 11.0,
            std: 1.0,
            min: 10.0,
            max: 12.0,
            count: 3,
        })
    );
}

#[test]
fn test_failures_survive_export_round_trip() {
    let runner = Runner::new(RunnerConfig::new(5)).unwrap();
    let target = Target::new("orders", "sqlite");
    let mut attempt = 0;

    let results = runner.run("update", &target, || {
        attempt += 1;
        if attempt % 2 == 0 {
            Err(OperationError::Query(format!("database is locked ({})", attempt)))
        } else {
            Ok(OperationOutcome::success(Duration::from_micros(1250 * attempt), 1))
        }
    });

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(RESULTS_FILE);
    export::export_csv(&path, &results).unwrap();

    let reloaded = export::import_csv(&path).unwrap();
    assert_eq!(reloaded.len(), 5);
    for (original, parsed) in results.iter().zip(&reloaded) {
        assert_eq!(parsed.operation(), original.operation());
        assert_eq!(parsed.database(), "orders");
        assert_eq!(parsed.vendor(), "sqlite");
        assert_eq!(parsed.success(), original.success());
        assert_eq!(parsed.records_affected(), original.records_affected());
        assert_eq!(parsed.error(), original.error());
        assert_eq!(parsed.duration_ms(), original.duration_ms());
    }

    // Statistics from the re-read export match the in-memory ones.
    assert_eq!(
        Analyzer::new(reloaded).summary_statistics(),
        Analyzer::new(results).summary_statistics()
    );
}

#[test]
fn test_export_all_writes_both_files() {
    let analyzer = Analyzer::new(vec![
        BenchmarkResult::succeeded("select_by_id", "sqlite", "sqlite", 0.5, 0),
        BenchmarkResult::succeeded("select_by_id", "postgresql", "postgresql", 0.75, 0),
        BenchmarkResult::succeeded("insert_single", "sqlite", "sqlite", 2.0, 1),
    ]);
    let dir = tempfile::tempdir().unwrap();

    let paths = export::export_all(dir.path(), &analyzer).unwrap();

    assert_eq!(paths.results, dir.path().join(RESULTS_FILE));
    assert_eq!(paths.summary, dir.path().join(SUMMARY_FILE));

    let summary = export::import_summary(&paths.summary).unwrap();
    assert_eq!(summary, analyzer.summary_statistics());
    assert_eq!(
        summary.keys().collect::<Vec<_>>(),
        vec!["select_by_id", "insert_single"]
    );
    assert_eq!(
        summary.get("select_by_id").unwrap().keys().collect::<Vec<_>>(),
        vec!["sqlite", "postgresql"]
    );

    // No temporary files are left next to the exports.
    let entries = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 2);
}

#[test]
fn test_export_into_missing_directory_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");
    let path = missing.join(RESULTS_FILE);

    let result = export::export_csv(&path, &[]);

    assert!(matches!(result, Err(ExportError::Io { .. })));
    assert!(!path.exists());
    assert!(!missing.exists());
}

#[test]
fn test_failed_export_keeps_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(RESULTS_FILE);
    let first = vec![BenchmarkResult::succeeded("delete", "sqlite", "sqlite", 1.0, 1)];
    export::export_csv(&path, &first).unwrap();

    // A regular file as the parent makes the second write fail.
    let bad = path.join("nested.csv");
    assert!(export::export_csv(&bad, &[]).is_err());

    assert_eq!(export::import_csv(&path).unwrap(), first);
}

#[test]
fn test_import_rejects_truncated_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.csv");
    std::fs::write(&path, "operation,database\ninsert_single,sqlite\n").unwrap();

    match export::import_csv(&path) {
        Err(ExportError::MissingColumn(column)) => assert_eq!(column, "vendor"),
        other => panic!("expected missing column, got {:?}", other),
    }
}
