//! Raw column values read back from the metadata tables
//!
//! Both stores read plain text columns and convert them here so status, enum and
//! timestamp parsing behaves the same on every backend.

use chrono::{DateTime, Utc};

use super::{DatabaseError, DatabaseResult};
use crate::models::{DictionaryRow, ScanJob};

pub(crate) struct JobColumns {
    pub job_id: String,
    pub source_descriptor: String,
    pub status: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub error_message: Option<String>,
}

impl JobColumns {
    pub fn into_job(self) -> DatabaseResult<ScanJob> {
        Ok(ScanJob {
            status: self.status.parse().map_err(DatabaseError::SerializationError)?,
            started_at: parse_timestamp(&self.started_at)?,
            finished_at: self.finished_at.as_deref().map(parse_timestamp).transpose()?,
            job_id: self.job_id,
            source_descriptor: self.source_descriptor,
            error_message: self.error_message,
        })
    }
}

pub(crate) struct DictionaryColumns {
    pub id: i64,
    pub identity_key: String,
    pub system_name: String,
    pub database_name: String,
    pub schema_name: String,
    pub object_name: String,
    pub object_type: String,
    pub column_name: String,
    pub data_type: String,
    pub nullable: String,
    pub updated_at: String,
}

impl DictionaryColumns {
    pub fn into_row(self) -> DatabaseResult<DictionaryRow> {
        Ok(DictionaryRow {
            object_type: self
                .object_type
                .parse()
                .map_err(DatabaseError::SerializationError)?,
            nullable: self
                .nullable
                .parse()
                .map_err(DatabaseError::SerializationError)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            id: self.id,
            identity_key: self.identity_key,
            system_name: self.system_name,
            database_name: self.database_name,
            schema_name: self.schema_name,
            object_name: self.object_name,
            column_name: self.column_name,
            data_type: self.data_type,
        })
    }
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

pub(crate) fn parse_timestamp(raw: &str) -> DatabaseResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DatabaseError::SerializationError(format!("Invalid timestamp '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobStatus, Nullability, ObjectType};

    #[test]
    fn test_timestamp_round_trip() {
        let now = Utc::now();
        assert_eq!(parse_timestamp(&format_timestamp(&now)).unwrap(), now);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_job_columns() {
        let job = JobColumns {
            job_id: "0123456789abcdef".to_string(),
            source_descriptor: "duckdb://shop.duckdb".to_string(),
            status: "FAILED".to_string(),
            started_at: "2024-05-01T10:00:00+00:00".to_string(),
            finished_at: Some("2024-05-01T10:00:05+00:00".to_string()),
            error_message: Some("boom".to_string()),
        }
        .into_job()
        .unwrap();

        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.finished_at.unwrap() > job.started_at);
    }

    #[test]
    fn test_dictionary_columns_reject_bad_flags() {
        let columns = || DictionaryColumns {
            id: 1,
            identity_key: "k".to_string(),
            system_name: "local".to_string(),
            database_name: "shop".to_string(),
            schema_name: "main".to_string(),
            object_name: "customers".to_string(),
            object_type: "TABLE".to_string(),
            column_name: "id".to_string(),
            data_type: "INTEGER".to_string(),
            nullable: "N".to_string(),
            updated_at: "2024-05-01T10:00:00Z".to_string(),
        };

        let row = columns().into_row().unwrap();
        assert_eq!(row.object_type, ObjectType::Table);
        assert_eq!(row.nullable, Nullability::NotNull);

        let mut bad = columns();
        bad.nullable = "maybe".to_string();
        assert!(matches!(
            bad.into_row(),
            Err(DatabaseError::SerializationError(_))
        ));
    }
}
