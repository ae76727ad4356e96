//! PostgreSQL metadata store
//!
//! Shared store for server deployments. Uses connection pooling via
//! deadpool-postgres, driven from a private runtime so the store stays blocking.

use chrono::{DateTime, Utc};
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

use super::columns::{DictionaryColumns, JobColumns, format_timestamp};
use super::schema::{DICTIONARY_COLUMNS, DatabaseSchema, JOB_COLUMNS, SCHEMA_VERSION};
use super::{DatabaseError, DatabaseResult, InsertOutcome, MetadataStore, sql_limit};
use crate::models::{DictionaryRecord, DictionaryRow, DictionaryUpdate, JobStatus, ScanJob};
use crate::scanning::descriptor::mask_password;

/// PostgreSQL metadata store
pub struct PostgresStore {
    /// Connection string (kept for masked display)
    connection_string: String,
    runtime: tokio::runtime::Runtime,
    pool: Pool,
}

impl PostgresStore {
    /// Create a pooled store; connections are opened lazily
    pub fn new(connection_string: &str, pool_size: usize) -> DatabaseResult<Self> {
        let pg_config: tokio_postgres::Config = connection_string.parse().map_err(|e| {
            DatabaseError::ConfigError(format!(
                "Invalid PostgreSQL connection string {}: {}",
                mask_password(connection_string),
                e
            ))
        })?;

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager)
            .max_size(pool_size.max(1))
            .build()
            .map_err(|e| DatabaseError::ConfigError(format!("Failed to build pool: {}", e)))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DatabaseError::ConnectionFailed(format!("Failed to create runtime: {}", e)))?;

        Ok(Self {
            connection_string: connection_string.to_string(),
            runtime,
            pool,
        })
    }

    /// Get the connection string (masked for security)
    pub fn connection_string_masked(&self) -> String {
        mask_password(&self.connection_string)
    }

    async fn client(&self) -> DatabaseResult<Object> {
        self.pool.get().await.map_err(|e| {
            DatabaseError::ConnectionFailed(format!(
                "Failed to connect to PostgreSQL {}: {}",
                self.connection_string_masked(),
                e
            ))
        })
    }

    fn read_job(row: &tokio_postgres::Row) -> JobColumns {
        JobColumns {
            job_id: row.get(0),
            source_descriptor: row.get(1),
            status: row.get(2),
            started_at: row.get(3),
            finished_at: row.get(4),
            error_message: row.get(5),
        }
    }

    fn read_dictionary_row(row: &tokio_postgres::Row) -> DictionaryColumns {
        DictionaryColumns {
            id: row.get(0),
            identity_key: row.get(1),
            system_name: row.get(2),
            database_name: row.get(3),
            schema_name: row.get(4),
            object_name: row.get(5),
            object_type: row.get(6),
            column_name: row.get(7),
            data_type: row.get(8),
            nullable: row.get(9),
            updated_at: row.get(10),
        }
    }
}

fn query_failed(what: &str) -> impl Fn(tokio_postgres::Error) -> DatabaseError + '_ {
    move |e| DatabaseError::QueryFailed(format!("{}: {}", what, e))
}

impl MetadataStore for PostgresStore {
    fn initialize(&self) -> DatabaseResult<()> {
        self.runtime.block_on(async {
            let client = self.client().await?;

            client
                .batch_execute(DatabaseSchema::create_tables_sql())
                .await
                .map_err(|e| {
                    DatabaseError::MigrationFailed(format!("Failed to create tables: {}", e))
                })?;

            client
                .batch_execute(DatabaseSchema::create_indexes_sql())
                .await
                .map_err(|e| {
                    DatabaseError::MigrationFailed(format!("Failed to create indexes: {}", e))
                })?;

            client
                .execute(DatabaseSchema::record_schema_version_sql(), &[&SCHEMA_VERSION])
                .await
                .map_err(|e| {
                    DatabaseError::MigrationFailed(format!(
                        "Failed to record schema version: {}",
                        e
                    ))
                })?;

            tracing::debug!(
                url = %self.connection_string_masked(),
                "PostgreSQL metadata store initialized"
            );
            Ok(())
        })
    }

    fn create_job(&self, job: &ScanJob) -> DatabaseResult<()> {
        self.runtime.block_on(async {
            let client = self.client().await?;
            client
                .execute(
                    r#"
                    INSERT INTO scan_job (job_id, source_descriptor, status, started_at, finished_at, error_message)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                    &[
                        &job.job_id,
                        &job.source_descriptor,
                        &job.status.as_str(),
                        &format_timestamp(&job.started_at),
                        &job.finished_at.as_ref().map(format_timestamp),
                        &job.error_message,
                    ],
                )
                .await
                .map_err(query_failed("Failed to create job"))?;
            Ok(())
        })
    }

    fn finish_job(
        &self,
        job_id: &str,
        status: JobStatus,
        finished_at: DateTime<Utc>,
        error_message: Option<&str>,
    ) -> DatabaseResult<()> {
        self.runtime.block_on(async {
            let client = self.client().await?;
            let affected = client
                .execute(
                    r#"
                    UPDATE scan_job
                    SET status = $1, finished_at = $2, error_message = $3
                    WHERE job_id = $4 AND status = 'RUNNING'
                    "#,
                    &[
                        &status.as_str(),
                        &format_timestamp(&finished_at),
                        &error_message,
                        &job_id,
                    ],
                )
                .await
                .map_err(query_failed("Failed to finish job"))?;

            if affected > 0 {
                return Ok(());
            }

            let current = client
                .query_opt("SELECT status FROM scan_job WHERE job_id = $1", &[&job_id])
                .await
                .map_err(query_failed("Failed to read job status"))?;
            match current {
                Some(row) => {
                    let raw: String = row.get(0);
                    Err(DatabaseError::JobAlreadyFinished {
                        job_id: job_id.to_string(),
                        status: raw.parse().map_err(DatabaseError::SerializationError)?,
                    })
                }
                None => Err(DatabaseError::JobNotFound(job_id.to_string())),
            }
        })
    }

    fn get_job(&self, job_id: &str) -> DatabaseResult<Option<ScanJob>> {
        self.runtime.block_on(async {
            let client = self.client().await?;
            let sql = format!("SELECT {} FROM scan_job WHERE job_id = $1", JOB_COLUMNS);
            let row = client
                .query_opt(sql.as_str(), &[&job_id])
                .await
                .map_err(query_failed("Failed to read job"))?;
            row.map(|r| Self::read_job(&r).into_job()).transpose()
        })
    }

    fn list_jobs(&self, limit: usize) -> DatabaseResult<Vec<ScanJob>> {
        self.runtime.block_on(async {
            let client = self.client().await?;
            let sql = format!(
                "SELECT {} FROM scan_job ORDER BY id DESC LIMIT $1",
                JOB_COLUMNS
            );
            let rows = client
                .query(sql.as_str(), &[&sql_limit(limit)])
                .await
                .map_err(query_failed("Failed to list jobs"))?;
            rows.iter().map(|r| Self::read_job(r).into_job()).collect()
        })
    }

    fn find_dictionary_row(&self, identity_key: &str) -> DatabaseResult<Option<DictionaryRow>> {
        self.runtime.block_on(async {
            let client = self.client().await?;
            let sql = format!(
                "SELECT {} FROM data_dictionary WHERE identity_key = $1",
                DICTIONARY_COLUMNS
            );
            let row = client
                .query_opt(sql.as_str(), &[&identity_key])
                .await
                .map_err(query_failed("Failed to read dictionary row"))?;
            row.map(|r| Self::read_dictionary_row(&r).into_row())
                .transpose()
        })
    }

    fn insert_dictionary_row(
        &self,
        identity_key: &str,
        record: &DictionaryRecord,
        updated_at: DateTime<Utc>,
    ) -> DatabaseResult<InsertOutcome> {
        self.runtime.block_on(async {
            let client = self.client().await?;
            let inserted = client
                .execute(
                    r#"
                    INSERT INTO data_dictionary (
                        identity_key, system_name, database_name, schema_name, object_name,
                        object_type, column_name, data_type, nullable, updated_at
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                    ON CONFLICT (identity_key) DO NOTHING
                    "#,
                    &[
                        &identity_key,
                        &record.system_name,
                        &record.database_name,
                        &record.schema_name,
                        &record.object_name,
                        &record.object_type.as_str(),
                        &record.column_name,
                        &record.data_type,
                        &record.nullable.as_str(),
                        &format_timestamp(&updated_at),
                    ],
                )
                .await
                .map_err(query_failed("Failed to insert dictionary row"))?;

            Ok(if inserted == 0 {
                InsertOutcome::DuplicateKey
            } else {
                InsertOutcome::Inserted
            })
        })
    }

    fn update_dictionary_row(
        &self,
        identity_key: &str,
        update: &DictionaryUpdate,
    ) -> DatabaseResult<()> {
        self.runtime.block_on(async {
            let client = self.client().await?;
            let affected = client
                .execute(
                    r#"
                    UPDATE data_dictionary
                    SET object_type = $1, data_type = $2, nullable = $3, updated_at = $4
                    WHERE identity_key = $5
                    "#,
                    &[
                        &update.object_type.as_str(),
                        &update.data_type,
                        &update.nullable.as_str(),
                        &format_timestamp(&update.updated_at),
                        &identity_key,
                    ],
                )
                .await
                .map_err(query_failed("Failed to update dictionary row"))?;

            if affected == 0 {
                return Err(DatabaseError::RowNotFound(identity_key.to_string()));
            }
            Ok(())
        })
    }

    fn list_dictionary(&self, limit: usize) -> DatabaseResult<Vec<DictionaryRow>> {
        self.runtime.block_on(async {
            let client = self.client().await?;
            let sql = format!(
                "SELECT {} FROM data_dictionary ORDER BY id DESC LIMIT $1",
                DICTIONARY_COLUMNS
            );
            let rows = client
                .query(sql.as_str(), &[&sql_limit(limit)])
                .await
                .map_err(query_failed("Failed to list dictionary"))?;
            rows.iter()
                .map(|r| Self::read_dictionary_row(r).into_row())
                .collect()
        })
    }

    fn dictionary_row_count(&self) -> DatabaseResult<usize> {
        self.runtime.block_on(async {
            let client = self.client().await?;
            let row = client
                .query_one("SELECT COUNT(*) FROM data_dictionary", &[])
                .await
                .map_err(query_failed("Failed to count rows"))?;
            let count: i64 = row.get(0);
            Ok(usize::try_from(count).unwrap_or_default())
        })
    }

    fn health_check(&self) -> DatabaseResult<bool> {
        self.runtime.block_on(async {
            let client = self.client().await?;
            let row = client
                .query_one("SELECT 1::INT4", &[])
                .await
                .map_err(query_failed("Health check failed"))?;
            Ok(row.get::<_, i32>(0) == 1)
        })
    }

    fn backend_type(&self) -> &'static str {
        "postgres"
    }
}
