//! Metadata store abstraction
//!
//! This module provides the storage layer for scan jobs and the data dictionary:
//! - DuckDB: embedded metadata store, file-backed or in-memory
//! - PostgreSQL: shared metadata store for server deployments
//!
//! All operations are blocking. Each call is its own autocommitted statement so
//! rows written before a pipeline failure stay persisted.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::{MetadataBackend, MetadataSettings};
use crate::models::{DictionaryRecord, DictionaryRow, DictionaryUpdate, JobStatus, ScanJob};

#[cfg(feature = "duckdb-backend")]
pub mod duckdb;

#[cfg(feature = "postgres-backend")]
pub mod postgres;

pub mod output;
pub mod schema;

mod columns;

#[cfg(feature = "duckdb-backend")]
pub use self::duckdb::DuckDBStore;

#[cfg(feature = "postgres-backend")]
pub use self::postgres::PostgresStore;

pub use output::{OutputFormat, RecordTable, format_records};
pub use schema::DatabaseSchema;

/// Error type for metadata store operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Job not found
    #[error("Scan job not found: {0}")]
    JobNotFound(String),

    /// Job already in a terminal state
    #[error("Scan job {job_id} is already {status}")]
    JobAlreadyFinished { job_id: String, status: JobStatus },

    /// Dictionary row not found
    #[error("Dictionary row not found: {0}")]
    RowNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type for metadata store operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Outcome of a race-tolerant dictionary insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was written
    Inserted,
    /// A row with the same identity key already exists; nothing was written
    DuplicateKey,
}

/// Metadata store trait for job and dictionary persistence
///
/// Implementations must be shareable across threads. Concurrent writers are
/// expected: the unique constraint on `identity_key` is the final arbiter and
/// losing an insert race surfaces as [`InsertOutcome::DuplicateKey`].
pub trait MetadataStore: Send + Sync {
    /// Create tables and indexes if they don't exist
    fn initialize(&self) -> DatabaseResult<()>;

    /// Persist a new job row
    fn create_job(&self, job: &ScanJob) -> DatabaseResult<()>;

    /// Move a `RUNNING` job to a terminal state
    ///
    /// Fails with [`DatabaseError::JobAlreadyFinished`] if the job is no longer running.
    fn finish_job(
        &self,
        job_id: &str,
        status: JobStatus,
        finished_at: DateTime<Utc>,
        error_message: Option<&str>,
    ) -> DatabaseResult<()>;

    /// Fetch a job by id
    fn get_job(&self, job_id: &str) -> DatabaseResult<Option<ScanJob>>;

    /// Most recent jobs first
    fn list_jobs(&self, limit: usize) -> DatabaseResult<Vec<ScanJob>>;

    /// Look up a dictionary row by identity key
    fn find_dictionary_row(&self, identity_key: &str) -> DatabaseResult<Option<DictionaryRow>>;

    /// Insert a new dictionary row unless the identity key already exists
    fn insert_dictionary_row(
        &self,
        identity_key: &str,
        record: &DictionaryRecord,
        updated_at: DateTime<Utc>,
    ) -> DatabaseResult<InsertOutcome>;

    /// Overwrite the mutable fields of an existing row
    fn update_dictionary_row(
        &self,
        identity_key: &str,
        update: &DictionaryUpdate,
    ) -> DatabaseResult<()>;

    /// Most recently created rows first
    fn list_dictionary(&self, limit: usize) -> DatabaseResult<Vec<DictionaryRow>>;

    /// Total number of dictionary rows
    fn dictionary_row_count(&self) -> DatabaseResult<usize>;

    /// Check that the store answers queries
    fn health_check(&self) -> DatabaseResult<bool>;

    /// Backend name (`duckdb` or `postgres`)
    fn backend_type(&self) -> &'static str;
}

/// Open the metadata store selected by configuration
///
/// The store is not initialized; call [`MetadataStore::initialize`] before use.
pub fn open_store(settings: &MetadataSettings) -> DatabaseResult<Arc<dyn MetadataStore>> {
    match settings.backend {
        #[cfg(feature = "duckdb-backend")]
        MetadataBackend::DuckDB => {
            let store = DuckDBStore::new(&settings.path)?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "duckdb-backend"))]
        MetadataBackend::DuckDB => Err(DatabaseError::ConfigError(
            "DuckDB metadata store requires the 'duckdb-backend' feature".to_string(),
        )),
        #[cfg(feature = "postgres-backend")]
        MetadataBackend::Postgres => {
            let url = settings.postgres.url.as_deref().ok_or_else(|| {
                DatabaseError::ConfigError(
                    "PostgreSQL metadata store requires metadata.postgres.url".to_string(),
                )
            })?;
            let store = PostgresStore::new(url, settings.postgres.pool_size)?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres-backend"))]
        MetadataBackend::Postgres => Err(DatabaseError::ConfigError(
            "PostgreSQL metadata store requires the 'postgres-backend' feature".to_string(),
        )),
    }
}

/// Clamp a listing limit to the range accepted by SQL `LIMIT`
pub(crate) fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
