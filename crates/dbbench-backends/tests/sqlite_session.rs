//! End-to-end sessions against SQLite.

use dbbench_backends::suite::{self, Overrides};
use dbbench_backends::{build_jobs, Catalog, Scale, SqliteBackend, VendorSettings};
use dbbench_core::export::{self, RESULTS_FILE};
use dbbench_core::{DbType, Job, RunnerConfig, Session, SessionConfig, VendorStatus};

fn small_suite() -> Vec<dbbench_core::Workload> {
    Overrides::new()
        .with_global()
        .with_operation(suite::INSERT_BATCH, 2)
        .apply(suite::relational_suite())
}

#[test]
fn test_full_relational_suite_on_sqlite() {
    let config = SessionConfig::new().with_runner(RunnerConfig::new(5));
    let backend = SqliteBackend::in_memory().with_scale(Scale::Tiny);
    let jobs = vec![Job::new(Box::new(backend), small_suite())];

    let report = Session::new(&config).unwrap().run(jobs);

    // 8 operations x 5 repetitions + 2 batch inserts.
    assert_eq!(report.results.len(), 42);
    assert!(report.results.iter().all(|r| r.success()), "{:?}", report.results);
    match &report.vendors[0].status {
        VendorStatus::Completed { attempts, failures } => {
            assert_eq!(*attempts, 42);
            assert!(failures.is_empty());
        }
        other => panic!("expected completed, got {:?}", other),
    }

    let analyzer = report.analyzer();
    let operations = analyzer.operations();
    assert_eq!(operations.first(), Some(&suite::INSERT_SINGLE));
    assert_eq!(operations.last(), Some(&suite::DELETE));
    assert_eq!(analyzer.databases(), vec!["sqlite"]);

    let batch = analyzer.comparison_by_operation(suite::INSERT_BATCH);
    assert_eq!(batch.get("sqlite").unwrap().count, 2);
    assert!(report
        .results
        .iter()
        .filter(|r| r.operation() == suite::INSERT_BATCH)
        .all(|r| r.records_affected() == 50));
}

#[test]
fn test_file_database_persists_between_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.db");
    let settings = VendorSettings {
        path: Some(path.clone()),
        scale: Some(Scale::Tiny),
        ..Default::default()
    };
    let mut catalog = Catalog::default();
    catalog.relational.insert("sqlite", settings);

    let config = SessionConfig::new()
        .with_db_type(DbType::Relational)
        .with_runner(RunnerConfig::new(3));
    let overrides = Overrides::new().with_global();

    let report = Session::new(&config)
        .unwrap()
        .run(build_jobs(&config, &catalog, &overrides));

    assert_eq!(report.skipped().count(), 0);
    assert_eq!(report.results.len(), 27);
    // Cleanup drops the tables but keeps the file.
    assert!(path.exists());
}

#[test]
fn test_no_setup_runs_against_empty_tables() {
    let config = SessionConfig::new()
        .with_runner(RunnerConfig::new(2))
        .without_setup();
    let mut catalog = Catalog::default();
    catalog.relational.insert("sqlite", VendorSettings::default());

    let report = Session::new(&config)
        .unwrap()
        .run(build_jobs(&config, &catalog, &Overrides::new().with_global()));

    // The schema is still created. Lookups find the rows the inserts added.
    let analyzer = report.analyzer();
    assert!(analyzer.comparison_by_operation(suite::INSERT_SINGLE).contains_key("sqlite"));
    assert!(analyzer.failure_counts().is_empty());
    assert_eq!(analyzer.len(), 18);
}

#[test]
fn test_unreachable_vendor_does_not_stop_others() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = Catalog::default();
    catalog.relational.insert(
        "sqlite",
        VendorSettings {
            path: Some(dir.path().join("missing").join("bench.db")),
            ..Default::default()
        },
    );
    catalog.relational.insert("mysql", VendorSettings::default());
    catalog.graph.insert("neo4j", VendorSettings::default());

    let config = SessionConfig::new().with_runner(RunnerConfig::new(1));
    let report = Session::new(&config)
        .unwrap()
        .run(build_jobs(&config, &catalog, &Overrides::new().with_global()));

    assert!(report.results.is_empty());
    assert_eq!(report.skipped().count(), 3);

    let analyzer = report.analyzer();
    assert!(analyzer.summary_statistics().is_empty());

    // An empty session still exports a valid, header-only results file.
    export::export_all(dir.path(), &analyzer).unwrap();
    assert!(export::import_csv(dir.path().join(RESULTS_FILE))
        .unwrap()
        .is_empty());
}
