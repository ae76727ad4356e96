//! Dictionary reconciliation
//!
//! Idempotent insert-or-update of dictionary rows keyed by identity. The unique
//! constraint on `identity_key` arbitrates concurrent writers: a lost insert race
//! is reported as [`ReconcileOutcome::SkippedRace`] and converges on the next pass.

use std::sync::Arc;

use chrono::Utc;

use crate::database::{DatabaseResult, InsertOutcome, MetadataStore};
use crate::models::{DictionaryRecord, DictionaryUpdate};

/// What reconciling one record did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Inserted,
    Updated,
    /// Another writer inserted the same identity key first; nothing was written
    SkippedRace,
}

impl ReconcileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::Inserted => "inserted",
            ReconcileOutcome::Updated => "updated",
            ReconcileOutcome::SkippedRace => "skipped_race",
        }
    }
}

impl std::fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reconciles normalized records against the metadata store, one row per call
pub struct DictionaryReconciler {
    store: Arc<dyn MetadataStore>,
}

impl DictionaryReconciler {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    pub fn reconcile(&self, record: &DictionaryRecord) -> DatabaseResult<ReconcileOutcome> {
        let identity_key = record.identity_key();
        let now = Utc::now();

        if self.store.find_dictionary_row(&identity_key)?.is_some() {
            let update = DictionaryUpdate::from_record(record, now);
            self.store.update_dictionary_row(&identity_key, &update)?;
            tracing::trace!(identity_key = %identity_key, "Dictionary row updated");
            return Ok(ReconcileOutcome::Updated);
        }

        match self.store.insert_dictionary_row(&identity_key, record, now)? {
            InsertOutcome::Inserted => {
                tracing::trace!(identity_key = %identity_key, "Dictionary row inserted");
                Ok(ReconcileOutcome::Inserted)
            }
            InsertOutcome::DuplicateKey => {
                tracing::warn!(
                    identity_key = %identity_key,
                    object = %format!("{}.{}", record.schema_name, record.object_name),
                    column = %record.column_name,
                    "Duplicate identity key on insert, likely a concurrent scan; skipping"
                );
                Ok(ReconcileOutcome::SkippedRace)
            }
        }
    }
}

#[cfg(all(test, feature = "duckdb-backend"))]
pub(crate) mod tests {
    use super::*;
    use crate::database::{DatabaseError, DuckDBStore};
    use crate::models::{DictionaryRow, JobStatus, Nullability, ObjectType, ScanJob};
    use chrono::DateTime;

    /// Store whose lookups never see existing rows, as if another writer
    /// committed between our lookup and our insert
    pub(crate) struct StaleReadStore {
        inner: DuckDBStore,
    }

    impl StaleReadStore {
        pub(crate) fn new() -> Self {
            let inner = DuckDBStore::in_memory().unwrap();
            inner.initialize().unwrap();
            Self { inner }
        }
    }

    impl MetadataStore for StaleReadStore {
        fn initialize(&self) -> DatabaseResult<()> {
            self.inner.initialize()
        }
        fn create_job(&self, job: &ScanJob) -> DatabaseResult<()> {
            self.inner.create_job(job)
        }
        fn finish_job(
            &self,
            job_id: &str,
            status: JobStatus,
            finished_at: DateTime<Utc>,
            error_message: Option<&str>,
        ) -> DatabaseResult<()> {
            self.inner
                .finish_job(job_id, status, finished_at, error_message)
        }
        fn get_job(&self, job_id: &str) -> DatabaseResult<Option<ScanJob>> {
            self.inner.get_job(job_id)
        }
        fn list_jobs(&self, limit: usize) -> DatabaseResult<Vec<ScanJob>> {
            self.inner.list_jobs(limit)
        }
        fn find_dictionary_row(&self, _identity_key: &str) -> DatabaseResult<Option<DictionaryRow>> {
            Ok(None)
        }
        fn insert_dictionary_row(
            &self,
            identity_key: &str,
            record: &DictionaryRecord,
            updated_at: DateTime<Utc>,
        ) -> DatabaseResult<InsertOutcome> {
            self.inner
                .insert_dictionary_row(identity_key, record, updated_at)
        }
        fn update_dictionary_row(
            &self,
            _identity_key: &str,
            _update: &DictionaryUpdate,
        ) -> DatabaseResult<()> {
            Err(DatabaseError::QueryFailed("update not expected".to_string()))
        }
        fn list_dictionary(&self, limit: usize) -> DatabaseResult<Vec<DictionaryRow>> {
            self.inner.list_dictionary(limit)
        }
        fn dictionary_row_count(&self) -> DatabaseResult<usize> {
            self.inner.dictionary_row_count()
        }
        fn health_check(&self) -> DatabaseResult<bool> {
            self.inner.health_check()
        }
        fn backend_type(&self) -> &'static str {
            "stale-read"
        }
    }

    fn record(column: &str, data_type: &str) -> DictionaryRecord {
        DictionaryRecord {
            system_name: "local".to_string(),
            database_name: "shop".to_string(),
            schema_name: "main".to_string(),
            object_name: "customers".to_string(),
            object_type: ObjectType::Table,
            column_name: column.to_string(),
            data_type: data_type.to_string(),
            nullable: Nullability::Nullable,
        }
    }

    fn duckdb_store() -> Arc<dyn MetadataStore> {
        let store = DuckDBStore::in_memory().unwrap();
        store.initialize().unwrap();
        Arc::new(store)
    }

    #[test]
    fn test_insert_then_update() {
        let store = duckdb_store();
        let reconciler = DictionaryReconciler::new(store.clone());

        assert_eq!(
            reconciler.reconcile(&record("email", "VARCHAR")).unwrap(),
            ReconcileOutcome::Inserted
        );
        assert_eq!(
            reconciler.reconcile(&record("email", "TEXT")).unwrap(),
            ReconcileOutcome::Updated
        );

        assert_eq!(store.dictionary_row_count().unwrap(), 1);
        let row = store
            .find_dictionary_row(&record("email", "TEXT").identity_key())
            .unwrap()
            .unwrap();
        assert_eq!(row.data_type, "TEXT");
    }

    #[test]
    fn test_identity_is_case_insensitive() {
        let store = duckdb_store();
        let reconciler = DictionaryReconciler::new(store.clone());

        reconciler.reconcile(&record("email", "VARCHAR")).unwrap();
        let mut shouted = record("EMAIL", "VARCHAR");
        shouted.object_name = "CUSTOMERS".to_string();
        assert_eq!(
            reconciler.reconcile(&shouted).unwrap(),
            ReconcileOutcome::Updated
        );
        assert_eq!(store.dictionary_row_count().unwrap(), 1);
    }

    #[test]
    fn test_distinct_columns_get_distinct_rows() {
        let store = duckdb_store();
        let reconciler = DictionaryReconciler::new(store.clone());

        reconciler.reconcile(&record("name", "VARCHAR")).unwrap();
        reconciler.reconcile(&record("email", "VARCHAR")).unwrap();

        let rows = store.list_dictionary(10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_ne!(rows[0].identity_key, rows[1].identity_key);
    }

    #[test]
    fn test_renamed_column_leaves_old_row() {
        let store = duckdb_store();
        let reconciler = DictionaryReconciler::new(store.clone());

        reconciler.reconcile(&record("email", "VARCHAR")).unwrap();
        reconciler.reconcile(&record("email_address", "VARCHAR")).unwrap();

        assert_eq!(store.dictionary_row_count().unwrap(), 2);
    }

    #[test]
    fn test_lost_insert_race_is_skipped() {
        let store: Arc<dyn MetadataStore> = Arc::new(StaleReadStore::new());
        let reconciler = DictionaryReconciler::new(store.clone());

        assert_eq!(
            reconciler.reconcile(&record("id", "INTEGER")).unwrap(),
            ReconcileOutcome::Inserted
        );
        assert_eq!(
            reconciler.reconcile(&record("id", "BIGINT")).unwrap(),
            ReconcileOutcome::SkippedRace
        );

        // the loser wrote nothing
        assert_eq!(store.dictionary_row_count().unwrap(), 1);
        let rows = store.list_dictionary(1).unwrap();
        assert_eq!(rows[0].data_type, "INTEGER");
    }

    #[test]
    fn test_concurrent_reconcilers_single_row() {
        let store = duckdb_store();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let reconciler = DictionaryReconciler::new(store.clone());
                scope.spawn(move || {
                    for _ in 0..10 {
                        reconciler.reconcile(&record("id", "INTEGER")).unwrap();
                    }
                });
            }
        });

        assert_eq!(store.dictionary_row_count().unwrap(), 1);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(ReconcileOutcome::SkippedRace.to_string(), "skipped_race");
    }
}
