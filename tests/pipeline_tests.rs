//! End-to-end scan pipeline tests against DuckDB sources and stores

#![cfg(feature = "duckdb-backend")]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use metadata_governance::config::Settings;
use metadata_governance::database::{DuckDBStore, MetadataStore, open_store};
use metadata_governance::demo::bootstrap_duckdb_source;
use metadata_governance::jobs::{JobError, PipelineError, ScanJobRunner};
use metadata_governance::models::{JobStatus, Nullability, ObjectType};
use metadata_governance::scanning::ScanError;
use tempfile::TempDir;

/// Columns in the demo source: customers (3), orders (3), customer_orders view (4)
const DEMO_COLUMNS: usize = 10;

fn demo_source(dir: &TempDir) -> (PathBuf, String) {
    let path = dir.path().join("source_demo.duckdb");
    bootstrap_duckdb_source(&path).unwrap();
    let descriptor = format!("duckdb://{}", path.display());
    (path, descriptor)
}

fn file_store(dir: &TempDir) -> Arc<DuckDBStore> {
    let store = DuckDBStore::new(dir.path().join("meta").join("metadata.duckdb")).unwrap();
    store.initialize().unwrap();
    Arc::new(store)
}

fn alter_source(path: &Path, sql: &str) {
    let connection = duckdb::Connection::open(path).unwrap();
    connection.execute_batch(sql).unwrap();
}

#[test]
fn test_demo_source_scan_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let (_, descriptor) = demo_source(&dir);
    let store = file_store(&dir);
    let runner = ScanJobRunner::with_default_connectors(store.clone(), "local");

    let report = runner.run_job_with_report(&descriptor).unwrap();
    assert_eq!(report.rows_scanned, DEMO_COLUMNS);
    assert_eq!(report.inserted, DEMO_COLUMNS);
    assert_eq!(report.updated, 0);

    let job = store.get_job(&report.job_id).unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Success);
    assert!(job.finished_at.is_some());
    assert!(job.error_message.is_none());

    let rows = store.list_dictionary(100).unwrap();
    assert_eq!(rows.len(), DEMO_COLUMNS);
    assert!(rows.iter().all(|r| r.system_name == "local"));
    assert!(rows.iter().all(|r| r.database_name == "source_demo"));
    assert!(rows.iter().all(|r| r.schema_name == "main"));

    let email = rows
        .iter()
        .find(|r| r.object_name == "customers" && r.column_name == "email")
        .unwrap();
    assert_eq!(email.object_type, ObjectType::Table);
    assert_eq!(email.nullable, Nullability::Nullable);

    let customer_id = rows
        .iter()
        .find(|r| r.object_name == "orders" && r.column_name == "customer_id")
        .unwrap();
    assert_eq!(customer_id.nullable, Nullability::NotNull);

    let view_columns = rows
        .iter()
        .filter(|r| r.object_name == "customer_orders")
        .inspect(|r| assert_eq!(r.object_type, ObjectType::View))
        .count();
    assert_eq!(view_columns, 4);
}

#[test]
fn test_rescan_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let (_, descriptor) = demo_source(&dir);
    let store = file_store(&dir);
    let runner = ScanJobRunner::with_default_connectors(store.clone(), "local");

    let first = runner.run_job_with_report(&descriptor).unwrap();
    let ids_before: Vec<i64> = store.list_dictionary(100).unwrap().iter().map(|r| r.id).collect();

    let second = runner.run_job_with_report(&descriptor).unwrap();
    assert_ne!(first.job_id, second.job_id);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.updated, DEMO_COLUMNS);

    let ids_after: Vec<i64> = store.list_dictionary(100).unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ids_before, ids_after);
    assert_eq!(store.dictionary_row_count().unwrap(), DEMO_COLUMNS);
    assert_eq!(store.list_jobs(10).unwrap().len(), 2);
}

#[test]
fn test_new_object_picked_up_on_rescan() {
    let dir = tempfile::tempdir().unwrap();
    let (path, descriptor) = demo_source(&dir);
    let store = file_store(&dir);
    let runner = ScanJobRunner::with_default_connectors(store.clone(), "local");

    runner.run_job(&descriptor).unwrap();

    alter_source(
        &path,
        "CREATE TABLE refunds (id INTEGER, order_id INTEGER NOT NULL, reason VARCHAR);",
    );

    let report = runner.run_job_with_report(&descriptor).unwrap();
    assert_eq!(report.inserted, 3);
    assert_eq!(report.updated, DEMO_COLUMNS);
    assert_eq!(store.dictionary_row_count().unwrap(), DEMO_COLUMNS + 3);

    let rows = store.list_dictionary(100).unwrap();
    let order_id = rows
        .iter()
        .find(|r| r.object_name == "refunds" && r.column_name == "order_id")
        .unwrap();
    assert_eq!(order_id.data_type, "INTEGER");
    assert_eq!(order_id.nullable, Nullability::NotNull);
}

#[test]
fn test_missing_source_marks_job_failed() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);
    let runner = ScanJobRunner::with_default_connectors(store.clone(), "local");

    let missing = format!("duckdb://{}", dir.path().join("nope.duckdb").display());
    let err = runner.run_job(&missing).unwrap_err();

    assert!(matches!(
        &err,
        JobError::Failed {
            source: PipelineError::Scan(ScanError::ConnectionFailed(_)),
            ..
        }
    ));

    let job = store.get_job(err.job_id().unwrap()).unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error_message.unwrap().contains("does not exist"));
    assert_eq!(store.dictionary_row_count().unwrap(), 0);
}

#[test]
fn test_jobs_persist_across_store_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let (_, descriptor) = demo_source(&dir);
    let meta_path = dir.path().join("meta").join("metadata.duckdb");

    let job_id = {
        let store = DuckDBStore::new(&meta_path).unwrap();
        store.initialize().unwrap();
        let runner = ScanJobRunner::with_default_connectors(Arc::new(store), "warehouse");
        runner.run_job(&descriptor).unwrap()
    };

    let reopened = DuckDBStore::new(&meta_path).unwrap();
    reopened.initialize().unwrap();
    let job = reopened.get_job(&job_id).unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Success);
    assert_eq!(reopened.dictionary_row_count().unwrap(), DEMO_COLUMNS);
    assert!(
        reopened
            .list_dictionary(1)
            .unwrap()
            .iter()
            .all(|r| r.system_name == "warehouse")
    );
}

#[test]
fn test_store_selected_by_config() {
    let dir = tempfile::tempdir().unwrap();
    let (_, descriptor) = demo_source(&dir);

    let mut settings = Settings::parse(
        r#"
[metadata]
backend = "duckdb"
path = "catalog/metadata.duckdb"

[source]
system_name = "crm"
"#,
    )
    .unwrap();
    settings.resolve_paths(dir.path());
    assert_eq!(settings.metadata.path, dir.path().join("catalog/metadata.duckdb"));

    let store = open_store(&settings.metadata).unwrap();
    store.initialize().unwrap();
    assert_eq!(store.backend_type(), "duckdb");

    let runner = ScanJobRunner::with_default_connectors(store.clone(), &settings.source.system_name);
    runner.run_job(&descriptor).unwrap();

    let rows = store.list_dictionary(100).unwrap();
    assert_eq!(rows.len(), DEMO_COLUMNS);
    assert!(rows.iter().all(|r| r.system_name == "crm"));
    assert!(settings.metadata.path.exists());
}
