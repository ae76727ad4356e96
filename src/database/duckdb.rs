//! DuckDB metadata store
//!
//! Embedded store for jobs and the data dictionary. Supports both file-based
//! persistence and in-memory mode.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use duckdb::params;

use super::columns::{DictionaryColumns, JobColumns, format_timestamp};
use super::schema::{DICTIONARY_COLUMNS, DatabaseSchema, JOB_COLUMNS, SCHEMA_VERSION};
use super::{DatabaseError, DatabaseResult, InsertOutcome, MetadataStore, sql_limit};
use crate::models::{DictionaryRecord, DictionaryRow, DictionaryUpdate, JobStatus, ScanJob};

/// DuckDB metadata store
pub struct DuckDBStore {
    /// Path to the database file (None for in-memory)
    db_path: Option<PathBuf>,
    /// DuckDB connection (wrapped in Mutex for thread safety)
    connection: Mutex<duckdb::Connection>,
}

impl DuckDBStore {
    /// Open (or create) a file-based store, creating parent directories as needed
    pub fn new(db_path: impl AsRef<Path>) -> DatabaseResult<Self> {
        let path = db_path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::IoError(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let connection = duckdb::Connection::open(&path).map_err(|e| {
            DatabaseError::ConnectionFailed(format!("Failed to open DuckDB: {}", e))
        })?;

        Ok(Self {
            db_path: Some(path),
            connection: Mutex::new(connection),
        })
    }

    /// Create an in-memory store
    pub fn in_memory() -> DatabaseResult<Self> {
        let connection = duckdb::Connection::open_in_memory().map_err(|e| {
            DatabaseError::ConnectionFailed(format!("Failed to create in-memory DuckDB: {}", e))
        })?;

        Ok(Self {
            db_path: None,
            connection: Mutex::new(connection),
        })
    }

    /// Get the database file path (None for in-memory)
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn is_in_memory(&self) -> bool {
        self.db_path.is_none()
    }

    fn lock(&self) -> DatabaseResult<MutexGuard<'_, duckdb::Connection>> {
        self.connection
            .lock()
            .map_err(|e| DatabaseError::ConnectionFailed(format!("Lock error: {}", e)))
    }

    fn job_status(conn: &duckdb::Connection, job_id: &str) -> DatabaseResult<Option<JobStatus>> {
        let mut stmt = conn
            .prepare("SELECT status FROM scan_job WHERE job_id = ?")
            .map_err(|e| DatabaseError::QueryFailed(format!("Prepare failed: {}", e)))?;
        let mut rows = stmt
            .query(params![job_id])
            .map_err(|e| DatabaseError::QueryFailed(format!("Query failed: {}", e)))?;

        match rows
            .next()
            .map_err(|e| DatabaseError::QueryFailed(format!("Row fetch error: {}", e)))?
        {
            Some(row) => {
                let raw: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::QueryFailed(format!("Row read error: {}", e)))?;
                let status = raw.parse().map_err(DatabaseError::SerializationError)?;
                Ok(Some(status))
            }
            None => Ok(None),
        }
    }

    fn read_job(row: &duckdb::Row<'_>) -> duckdb::Result<JobColumns> {
        Ok(JobColumns {
            job_id: row.get(0)?,
            source_descriptor: row.get(1)?,
            status: row.get(2)?,
            started_at: row.get(3)?,
            finished_at: row.get(4)?,
            error_message: row.get(5)?,
        })
    }

    fn read_dictionary_row(row: &duckdb::Row<'_>) -> duckdb::Result<DictionaryColumns> {
        Ok(DictionaryColumns {
            id: row.get(0)?,
            identity_key: row.get(1)?,
            system_name: row.get(2)?,
            database_name: row.get(3)?,
            schema_name: row.get(4)?,
            object_name: row.get(5)?,
            object_type: row.get(6)?,
            column_name: row.get(7)?,
            data_type: row.get(8)?,
            nullable: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

impl MetadataStore for DuckDBStore {
    fn initialize(&self) -> DatabaseResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(DatabaseSchema::create_tables_sql())
            .map_err(|e| DatabaseError::MigrationFailed(format!("Failed to create tables: {}", e)))?;

        conn.execute_batch(DatabaseSchema::create_indexes_sql())
            .map_err(|e| {
                DatabaseError::MigrationFailed(format!("Failed to create indexes: {}", e))
            })?;

        conn.execute(
            DatabaseSchema::record_schema_version_sql(),
            params![SCHEMA_VERSION],
        )
        .map_err(|e| {
            DatabaseError::MigrationFailed(format!("Failed to record schema version: {}", e))
        })?;

        tracing::debug!(path = ?self.db_path, "DuckDB metadata store initialized");
        Ok(())
    }

    fn create_job(&self, job: &ScanJob) -> DatabaseResult<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO scan_job (job_id, source_descriptor, status, started_at, finished_at, error_message)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                job.job_id,
                job.source_descriptor,
                job.status.as_str(),
                format_timestamp(&job.started_at),
                job.finished_at.as_ref().map(format_timestamp),
                job.error_message,
            ],
        )
        .map_err(|e| DatabaseError::QueryFailed(format!("Failed to create job: {}", e)))?;
        Ok(())
    }

    fn finish_job(
        &self,
        job_id: &str,
        status: JobStatus,
        finished_at: DateTime<Utc>,
        error_message: Option<&str>,
    ) -> DatabaseResult<()> {
        let conn = self.lock()?;
        let affected = conn
            .execute(
                r#"
                UPDATE scan_job
                SET status = ?, finished_at = ?, error_message = ?
                WHERE job_id = ? AND status = 'RUNNING'
                "#,
                params![
                    status.as_str(),
                    format_timestamp(&finished_at),
                    error_message,
                    job_id
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(format!("Failed to finish job: {}", e)))?;

        if affected > 0 {
            return Ok(());
        }
        match Self::job_status(&conn, job_id)? {
            Some(current) => Err(DatabaseError::JobAlreadyFinished {
                job_id: job_id.to_string(),
                status: current,
            }),
            None => Err(DatabaseError::JobNotFound(job_id.to_string())),
        }
    }

    fn get_job(&self, job_id: &str) -> DatabaseResult<Option<ScanJob>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM scan_job WHERE job_id = ?", JOB_COLUMNS);
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DatabaseError::QueryFailed(format!("Prepare failed: {}", e)))?;
        let mut rows = stmt
            .query(params![job_id])
            .map_err(|e| DatabaseError::QueryFailed(format!("Query failed: {}", e)))?;

        match rows
            .next()
            .map_err(|e| DatabaseError::QueryFailed(format!("Row fetch error: {}", e)))?
        {
            Some(row) => {
                let columns = Self::read_job(row)
                    .map_err(|e| DatabaseError::QueryFailed(format!("Row read error: {}", e)))?;
                Ok(Some(columns.into_job()?))
            }
            None => Ok(None),
        }
    }

    fn list_jobs(&self, limit: usize) -> DatabaseResult<Vec<ScanJob>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM scan_job ORDER BY id DESC LIMIT ?",
            JOB_COLUMNS
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DatabaseError::QueryFailed(format!("Prepare failed: {}", e)))?;
        let rows = stmt
            .query_map(params![sql_limit(limit)], Self::read_job)
            .map_err(|e| DatabaseError::QueryFailed(format!("Failed to list jobs: {}", e)))?;

        let mut jobs = Vec::new();
        for row in rows {
            let columns =
                row.map_err(|e| DatabaseError::QueryFailed(format!("Row fetch error: {}", e)))?;
            jobs.push(columns.into_job()?);
        }
        Ok(jobs)
    }

    fn find_dictionary_row(&self, identity_key: &str) -> DatabaseResult<Option<DictionaryRow>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM data_dictionary WHERE identity_key = ?",
            DICTIONARY_COLUMNS
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DatabaseError::QueryFailed(format!("Prepare failed: {}", e)))?;
        let mut rows = stmt
            .query(params![identity_key])
            .map_err(|e| DatabaseError::QueryFailed(format!("Query failed: {}", e)))?;

        match rows
            .next()
            .map_err(|e| DatabaseError::QueryFailed(format!("Row fetch error: {}", e)))?
        {
            Some(row) => {
                let columns = Self::read_dictionary_row(row)
                    .map_err(|e| DatabaseError::QueryFailed(format!("Row read error: {}", e)))?;
                Ok(Some(columns.into_row()?))
            }
            None => Ok(None),
        }
    }

    fn insert_dictionary_row(
        &self,
        identity_key: &str,
        record: &DictionaryRecord,
        updated_at: DateTime<Utc>,
    ) -> DatabaseResult<InsertOutcome> {
        let conn = self.lock()?;
        let inserted = conn
            .execute(
                r#"
                INSERT INTO data_dictionary (
                    identity_key, system_name, database_name, schema_name, object_name,
                    object_type, column_name, data_type, nullable, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (identity_key) DO NOTHING
                "#,
                params![
                    identity_key,
                    record.system_name,
                    record.database_name,
                    record.schema_name,
                    record.object_name,
                    record.object_type.as_str(),
                    record.column_name,
                    record.data_type,
                    record.nullable.as_str(),
                    format_timestamp(&updated_at),
                ],
            )
            .map_err(|e| {
                DatabaseError::QueryFailed(format!("Failed to insert dictionary row: {}", e))
            })?;

        Ok(if inserted == 0 {
            InsertOutcome::DuplicateKey
        } else {
            InsertOutcome::Inserted
        })
    }

    fn update_dictionary_row(
        &self,
        identity_key: &str,
        update: &DictionaryUpdate,
    ) -> DatabaseResult<()> {
        let conn = self.lock()?;
        let affected = conn
            .execute(
                r#"
                UPDATE data_dictionary
                SET object_type = ?, data_type = ?, nullable = ?, updated_at = ?
                WHERE identity_key = ?
                "#,
                params![
                    update.object_type.as_str(),
                    update.data_type,
                    update.nullable.as_str(),
                    format_timestamp(&update.updated_at),
                    identity_key,
                ],
            )
            .map_err(|e| {
                DatabaseError::QueryFailed(format!("Failed to update dictionary row: {}", e))
            })?;

        if affected == 0 {
            return Err(DatabaseError::RowNotFound(identity_key.to_string()));
        }
        Ok(())
    }

    fn list_dictionary(&self, limit: usize) -> DatabaseResult<Vec<DictionaryRow>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM data_dictionary ORDER BY id DESC LIMIT ?",
            DICTIONARY_COLUMNS
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DatabaseError::QueryFailed(format!("Prepare failed: {}", e)))?;
        let rows = stmt
            .query_map(params![sql_limit(limit)], Self::read_dictionary_row)
            .map_err(|e| {
                DatabaseError::QueryFailed(format!("Failed to list dictionary: {}", e))
            })?;

        let mut result = Vec::new();
        for row in rows {
            let columns =
                row.map_err(|e| DatabaseError::QueryFailed(format!("Row fetch error: {}", e)))?;
            result.push(columns.into_row()?);
        }
        Ok(result)
    }

    fn dictionary_row_count(&self) -> DatabaseResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM data_dictionary", [], |row| row.get(0))
            .map_err(|e| DatabaseError::QueryFailed(format!("Failed to count rows: {}", e)))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn health_check(&self) -> DatabaseResult<bool> {
        let conn = self.lock()?;
        let one: i32 = conn
            .query_row("SELECT 1", [], |row| row.get(0))
            .map_err(|e| DatabaseError::QueryFailed(format!("Health check failed: {}", e)))?;
        Ok(one == 1)
    }

    fn backend_type(&self) -> &'static str {
        "duckdb"
    }
}
