//! Metadata store schema definitions
//!
//! The DDL is shared by the DuckDB and PostgreSQL stores. Both dialects accept
//! `CREATE SEQUENCE IF NOT EXISTS` and `nextval('...')` column defaults.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Column list used when reading scan jobs
pub const JOB_COLUMNS: &str =
    "job_id, source_descriptor, status, started_at, finished_at, error_message";

/// Column list used when reading dictionary rows
pub const DICTIONARY_COLUMNS: &str = "id, identity_key, system_name, database_name, schema_name, \
     object_name, object_type, column_name, data_type, nullable, updated_at";

/// Metadata store schema
pub struct DatabaseSchema;

impl DatabaseSchema {
    /// Get the SQL for creating all tables
    pub fn create_tables_sql() -> &'static str {
        r#"
-- Scan job bookkeeping
CREATE SEQUENCE IF NOT EXISTS scan_job_id_seq;
CREATE TABLE IF NOT EXISTS scan_job (
    id BIGINT PRIMARY KEY DEFAULT nextval('scan_job_id_seq'),
    job_id VARCHAR(64) NOT NULL UNIQUE,
    source_descriptor TEXT NOT NULL,
    status VARCHAR(16) NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    error_message TEXT
);

-- One row per observed column, keyed by identity hash
CREATE SEQUENCE IF NOT EXISTS data_dictionary_id_seq;
CREATE TABLE IF NOT EXISTS data_dictionary (
    id BIGINT PRIMARY KEY DEFAULT nextval('data_dictionary_id_seq'),
    identity_key VARCHAR(64) NOT NULL UNIQUE,
    system_name TEXT NOT NULL,
    database_name TEXT NOT NULL,
    schema_name TEXT NOT NULL,
    object_name TEXT NOT NULL,
    object_type VARCHAR(16) NOT NULL,
    column_name TEXT NOT NULL,
    data_type TEXT NOT NULL,
    nullable VARCHAR(1) NOT NULL,
    updated_at TEXT NOT NULL
);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#
    }

    /// Get index creation SQL
    ///
    /// Only immutable columns are indexed so reconciliation updates never touch an index.
    pub fn create_indexes_sql() -> &'static str {
        r#"
CREATE INDEX IF NOT EXISTS idx_data_dictionary_object
    ON data_dictionary(system_name, database_name, schema_name, object_name);
CREATE INDEX IF NOT EXISTS idx_scan_job_started ON scan_job(started_at);
"#
    }

    /// Get SQL for recording the schema version
    pub fn record_schema_version_sql() -> &'static str {
        "INSERT INTO schema_version (version) VALUES ($1) ON CONFLICT (version) DO NOTHING"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_sql_not_empty() {
        assert!(!DatabaseSchema::create_tables_sql().is_empty());
        assert!(!DatabaseSchema::create_indexes_sql().is_empty());
    }

    #[test]
    fn test_schema_declares_unique_keys() {
        let sql = DatabaseSchema::create_tables_sql();
        assert!(sql.contains("job_id VARCHAR(64) NOT NULL UNIQUE"));
        assert!(sql.contains("identity_key VARCHAR(64) NOT NULL UNIQUE"));
    }

    #[test]
    fn test_column_lists_match_models() {
        assert_eq!(JOB_COLUMNS.split(", ").count(), 6);
        assert_eq!(DICTIONARY_COLUMNS.split(", ").count(), 11);
    }

    #[test]
    fn test_schema_version() {
        assert_eq!(SCHEMA_VERSION, 1);
    }
}
