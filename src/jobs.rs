//! Scan job tracking and orchestration
//!
//! [`ScanJobRunner::run_job`] drives one scan -> normalize -> reconcile pipeline:
//!
//! 1. the job row is created in `RUNNING` before the descriptor is parsed or the
//!    source is touched
//! 2. facts are normalized and reconciled one row at a time, each row committed
//!    on its own, so rows written before a failure stay persisted
//! 3. the job ends `SUCCESS` only if the whole pipeline drains; otherwise it is
//!    marked `FAILED` with the first fatal error and that error is returned

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::database::{DatabaseError, DatabaseResult, MetadataStore};
use crate::models::{DictionaryRow, JobStatus, JobSummary, ScanJob};
use crate::reconcile::{DictionaryReconciler, ReconcileOutcome};
use crate::scanning::descriptor::mask_password;
use crate::scanning::{
    ConnectorFactory, DefaultConnectorFactory, ScanError, SchemaScanner, SourceDescriptor,
};
use crate::transform::try_to_dictionary_records;

/// A fatal error raised inside the pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// Error type for job execution
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// The job row could not be created; nothing was scanned
    #[error("Failed to create scan job: {0}")]
    Create(#[source] DatabaseError),

    /// The pipeline failed; the job was marked `FAILED` (best effort)
    #[error("Scan job {job_id} failed: {source}")]
    Failed {
        job_id: String,
        #[source]
        source: PipelineError,
    },
}

impl JobError {
    /// Id of the job the error belongs to, if one was created
    pub fn job_id(&self) -> Option<&str> {
        match self {
            JobError::Create(_) => None,
            JobError::Failed { job_id, .. } => Some(job_id),
        }
    }
}

/// Creates job rows and moves them through their lifecycle
pub struct JobTracker {
    store: Arc<dyn MetadataStore>,
}

impl JobTracker {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Create and persist a `RUNNING` job; credentials in the descriptor are masked
    pub fn open(&self, source_descriptor: &str) -> DatabaseResult<ScanJob> {
        let job = ScanJob::start(mask_password(source_descriptor.trim()));
        self.store.create_job(&job)?;
        tracing::info!(job_id = %job.job_id, source = %job.source_descriptor, "Scan job started");
        Ok(job)
    }

    pub fn mark_success(&self, job: &mut ScanJob) -> DatabaseResult<()> {
        self.finish(job, JobStatus::Success, None)
    }

    pub fn mark_failed(&self, job: &mut ScanJob, error_message: &str) -> DatabaseResult<()> {
        self.finish(job, JobStatus::Failed, Some(error_message))
    }

    fn finish(
        &self,
        job: &mut ScanJob,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> DatabaseResult<()> {
        if !job.status.can_transition_to(status) {
            return Err(DatabaseError::JobAlreadyFinished {
                job_id: job.job_id.clone(),
                status: job.status,
            });
        }

        let finished_at = Utc::now();
        self.store
            .finish_job(&job.job_id, status, finished_at, error_message)?;

        job.status = status;
        job.finished_at = Some(finished_at);
        job.error_message = error_message.map(str::to_string);
        Ok(())
    }
}

/// Per-job counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub job_id: String,
    pub rows_scanned: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Rows another writer inserted first
    pub skipped_race: usize,
}

impl ScanReport {
    fn new(job_id: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            ..Default::default()
        }
    }

    fn record(&mut self, outcome: ReconcileOutcome) {
        self.rows_scanned += 1;
        match outcome {
            ReconcileOutcome::Inserted => self.inserted += 1,
            ReconcileOutcome::Updated => self.updated += 1,
            ReconcileOutcome::SkippedRace => self.skipped_race += 1,
        }
    }
}

/// Runs scan jobs against one metadata store
pub struct ScanJobRunner {
    store: Arc<dyn MetadataStore>,
    tracker: JobTracker,
    scanner: SchemaScanner,
    reconciler: DictionaryReconciler,
    system_name: String,
}

impl ScanJobRunner {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        connectors: Arc<dyn ConnectorFactory>,
        system_name: impl Into<String>,
    ) -> Self {
        Self {
            tracker: JobTracker::new(store.clone()),
            scanner: SchemaScanner::new(connectors),
            reconciler: DictionaryReconciler::new(store.clone()),
            store,
            system_name: system_name.into(),
        }
    }

    /// Runner using the connectors compiled into this build
    pub fn with_default_connectors(
        store: Arc<dyn MetadataStore>,
        system_name: impl Into<String>,
    ) -> Self {
        Self::new(store, Arc::new(DefaultConnectorFactory), system_name)
    }

    pub fn system_name(&self) -> &str {
        &self.system_name
    }

    /// Run one scan job and return its id
    pub fn run_job(&self, source_descriptor: &str) -> Result<String, JobError> {
        self.run_job_with_report(source_descriptor)
            .map(|report| report.job_id)
    }

    /// Run one scan job and return its counters
    pub fn run_job_with_report(&self, source_descriptor: &str) -> Result<ScanReport, JobError> {
        let mut job = self.tracker.open(source_descriptor).map_err(JobError::Create)?;
        let mut report = ScanReport::new(&job.job_id);

        let result = self
            .execute(source_descriptor, &mut report)
            .and_then(|()| self.tracker.mark_success(&mut job).map_err(PipelineError::from));

        match result {
            Ok(()) => {
                tracing::info!(
                    job_id = %job.job_id,
                    rows_scanned = report.rows_scanned,
                    inserted = report.inserted,
                    updated = report.updated,
                    skipped_race = report.skipped_race,
                    "Scan job succeeded"
                );
                Ok(report)
            }
            Err(error) => {
                let message = error.to_string();
                tracing::error!(
                    job_id = %job.job_id,
                    rows_scanned = report.rows_scanned,
                    error = %message,
                    "Scan job failed"
                );
                if let Err(mark_error) = self.tracker.mark_failed(&mut job, &message) {
                    tracing::error!(
                        job_id = %job.job_id,
                        error = %mark_error,
                        "Failed to record scan job failure"
                    );
                }
                Err(JobError::Failed {
                    job_id: job.job_id,
                    source: error,
                })
            }
        }
    }

    fn execute(&self, source_descriptor: &str, report: &mut ScanReport) -> Result<(), PipelineError> {
        let descriptor = SourceDescriptor::parse(source_descriptor)?;
        let mut pass = self.scanner.scan(&descriptor)?;

        for record in try_to_dictionary_records(pass.by_ref(), &self.system_name) {
            let outcome = self.reconciler.reconcile(&record?)?;
            report.record(outcome);
        }

        let stats = pass.stats();
        tracing::debug!(
            job_id = %report.job_id,
            database = %pass.database_name(),
            tables = stats.tables,
            views = stats.views,
            views_skipped = stats.views_skipped,
            unqualified_fallbacks = stats.unqualified_fallbacks,
            "Scan pass drained"
        );
        Ok(())
    }

    /// Most recent jobs first
    pub fn list_jobs(&self, limit: usize) -> DatabaseResult<Vec<JobSummary>> {
        Ok(self
            .store
            .list_jobs(limit)?
            .into_iter()
            .map(JobSummary::from)
            .collect())
    }

    /// Most recently created dictionary rows first
    pub fn list_dictionary(&self, limit: usize) -> DatabaseResult<Vec<DictionaryRow>> {
        self.store.list_dictionary(limit)
    }
}

#[cfg(all(test, feature = "duckdb-backend"))]
mod tests {
    use super::*;
    use crate::database::DuckDBStore;
    use crate::models::{Nullability, ObjectType};
    use crate::reconcile::tests::StaleReadStore;
    use crate::scanning::testing::{FakeFactory, FakeSource};

    const SOURCE: &str = "duckdb://fake.duckdb";

    fn store() -> Arc<dyn MetadataStore> {
        let store = DuckDBStore::in_memory().unwrap();
        store.initialize().unwrap();
        Arc::new(store)
    }

    fn customers() -> FakeSource {
        FakeSource::new("shop").with_namespace("main").with_table(
            "main",
            "customers",
            &[
                ("id", "INTEGER", Some(false)),
                ("name", "VARCHAR", Some(true)),
                ("email", "VARCHAR", None),
            ],
        )
    }

    fn runner(store: &Arc<dyn MetadataStore>, source: FakeSource) -> ScanJobRunner {
        ScanJobRunner::new(store.clone(), FakeFactory::shared(source), "local")
    }

    #[test]
    fn test_customers_scenario() {
        let store = store();
        let runner = runner(&store, customers());

        let report = runner.run_job_with_report(SOURCE).unwrap();
        assert_eq!(report.rows_scanned, 3);
        assert_eq!(report.inserted, 3);

        let job = store.get_job(&report.job_id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Success);
        assert!(job.finished_at.is_some());
        assert!(job.error_message.is_none());

        let rows = runner.list_dictionary(10).unwrap();
        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!(row.system_name, "local");
            assert_eq!(row.object_type, ObjectType::Table);
        }
        let email = rows.iter().find(|r| r.column_name == "email").unwrap();
        assert_eq!(email.nullable, Nullability::Nullable);
        let id = rows.iter().find(|r| r.column_name == "id").unwrap();
        assert_eq!(id.nullable, Nullability::NotNull);
    }

    #[test]
    fn test_rerun_updates_instead_of_duplicating() {
        let store = store();
        let runner = runner(&store, customers());

        runner.run_job(SOURCE).unwrap();
        let second = runner.run_job_with_report(SOURCE).unwrap();

        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 3);
        assert_eq!(store.dictionary_row_count().unwrap(), 3);
        assert_eq!(runner.list_jobs(10).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_source_succeeds() {
        let store = store();
        let runner = runner(&store, FakeSource::new("empty"));

        let job_id = runner.run_job(SOURCE).unwrap();
        let job = store.get_job(&job_id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Success);
        assert_eq!(store.dictionary_row_count().unwrap(), 0);
    }

    #[test]
    fn test_failure_partway_keeps_rows() {
        let store = store();
        let mut source = customers().with_table("main", "orders", &[("id", "INTEGER", Some(false))]);
        source.fail_on_column_call = Some(2);
        let runner = runner(&store, source);

        let err = runner.run_job(SOURCE).unwrap_err();
        let job_id = err.job_id().unwrap().to_string();
        assert!(matches!(
            err,
            JobError::Failed {
                source: PipelineError::Scan(ScanError::IntrospectionFailed(_)),
                ..
            }
        ));

        let job = store.get_job(&job_id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.finished_at.is_some());
        assert!(job.error_message.unwrap().contains("connection reset"));

        // customers was reconciled before orders failed
        assert_eq!(store.dictionary_row_count().unwrap(), 3);
    }

    #[test]
    fn test_connection_failure_marks_job_failed() {
        let store = store();
        let mut source = customers();
        source.refuse_connection = true;
        let runner = runner(&store, source);

        let err = runner.run_job(SOURCE).unwrap_err();
        let jobs = runner.list_jobs(1).unwrap();
        assert_eq!(Some(jobs[0].job_id.as_str()), err.job_id());
        assert_eq!(jobs[0].status, JobStatus::Failed);
        assert_eq!(store.dictionary_row_count().unwrap(), 0);
    }

    #[test]
    fn test_invalid_descriptor_is_recorded() {
        let store = store();
        let runner = runner(&store, customers());

        let err = runner.run_job("oracle://scott:tiger@db/orcl").unwrap_err();
        assert!(matches!(
            err,
            JobError::Failed {
                source: PipelineError::Scan(ScanError::InvalidDescriptor(_)),
                ..
            }
        ));

        let job = runner.list_jobs(1).unwrap().remove(0);
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.source_descriptor, "oracle://scott:****@db/orcl");
    }

    #[test]
    fn test_race_is_not_fatal() {
        let store: Arc<dyn MetadataStore> = Arc::new(StaleReadStore::new());
        let runner = runner(&store, customers());

        runner.run_job(SOURCE).unwrap();
        let second = runner.run_job_with_report(SOURCE).unwrap();
        assert_eq!(second.skipped_race, 3);

        let job = store.get_job(&second.job_id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Success);
        assert_eq!(store.dictionary_row_count().unwrap(), 3);
    }

    #[test]
    fn test_tracker_never_reopens() {
        let store = store();
        let tracker = JobTracker::new(store.clone());

        let mut job = tracker.open(SOURCE).unwrap();
        tracker.mark_success(&mut job).unwrap();
        assert!(matches!(
            tracker.mark_failed(&mut job, "late"),
            Err(DatabaseError::JobAlreadyFinished { .. })
        ));

        let stored = store.get_job(&job.job_id).unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Success);
        assert!(stored.error_message.is_none());
    }
}
