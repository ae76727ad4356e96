//! DuckDB source connector
//!
//! Introspects a DuckDB database through `information_schema`. File sources are
//! opened read-only and must already exist.

use std::path::Path;

use super::{Probe, ScanError, ScanResult, SourceColumn, SourceConnector, SourceDescriptor};

/// Error message fragments DuckDB uses for call shapes it cannot answer
const UNSUPPORTED_MARKERS: [&str; 3] = ["Catalog Error", "Binder Error", "Not implemented"];

/// DuckDB source connector
pub struct DuckDBSource {
    connection: duckdb::Connection,
}

impl DuckDBSource {
    /// Open the source described by a `duckdb://` descriptor
    pub fn connect(descriptor: &SourceDescriptor) -> ScanResult<Self> {
        if descriptor.is_in_memory() {
            let connection = duckdb::Connection::open_in_memory().map_err(|e| {
                ScanError::ConnectionFailed(format!("Failed to create in-memory DuckDB: {}", e))
            })?;
            return Ok(Self { connection });
        }

        let path = Path::new(descriptor.location());
        if !path.exists() {
            return Err(ScanError::ConnectionFailed(format!(
                "Source database {} does not exist",
                path.display()
            )));
        }

        let config = duckdb::Config::default()
            .access_mode(duckdb::AccessMode::ReadOnly)
            .map_err(|e| ScanError::ConnectionFailed(format!("Invalid DuckDB config: {}", e)))?;
        let connection = duckdb::Connection::open_with_flags(path, config).map_err(|e| {
            ScanError::ConnectionFailed(format!("Failed to open DuckDB {}: {}", path.display(), e))
        })?;

        Ok(Self { connection })
    }

    /// Wrap an already open connection
    pub fn from_connection(connection: duckdb::Connection) -> Self {
        Self { connection }
    }

    fn query_names(
        &self,
        sql: &str,
        qualifier: Option<&str>,
    ) -> Result<Vec<String>, duckdb::Error> {
        let mut stmt = self.connection.prepare(sql)?;
        let rows = stmt.query_map(duckdb::params![qualifier], |row| row.get::<_, String>(0))?;
        rows.collect()
    }

    fn query_columns(
        &self,
        qualifier: Option<&str>,
        object: &str,
    ) -> Result<Vec<SourceColumn>, duckdb::Error> {
        let mut stmt = self.connection.prepare(
            r#"
            SELECT column_name, data_type, is_nullable
            FROM information_schema.columns
            WHERE table_catalog = current_database()
              AND table_schema = COALESCE(?, current_schema())
              AND table_name = ?
            ORDER BY ordinal_position
            "#,
        )?;
        let rows = stmt.query_map(duckdb::params![qualifier, object], |row| {
            Ok(SourceColumn {
                name: row.get::<_, String>(0)?,
                data_type: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                nullable: parse_is_nullable(row.get::<_, Option<String>>(2)?),
            })
        })?;
        rows.collect()
    }

    fn list_objects(&self, qualifier: Option<&str>, table_type: &str) -> ScanResult<Probe<Vec<String>>> {
        let sql = format!(
            r#"
            SELECT table_name
            FROM information_schema.tables
            WHERE table_catalog = current_database()
              AND table_schema = COALESCE(?, current_schema())
              AND table_type = '{}'
            ORDER BY table_name
            "#,
            table_type
        );
        classify(self.query_names(&sql, qualifier), "list objects")
    }
}

/// Split DuckDB errors into unsupported call shapes and real failures
fn classify<T>(result: Result<T, duckdb::Error>, what: &str) -> ScanResult<Probe<T>> {
    match result {
        Ok(value) => Ok(Probe::Supported(value)),
        Err(e) => {
            let message = e.to_string();
            if UNSUPPORTED_MARKERS.iter().any(|m| message.contains(m)) {
                Ok(Probe::Unsupported(message))
            } else {
                Err(ScanError::IntrospectionFailed(format!("Failed to {}: {}", what, message)))
            }
        }
    }
}

fn parse_is_nullable(flag: Option<String>) -> Option<bool> {
    match flag?.trim().to_uppercase().as_str() {
        "YES" | "Y" | "TRUE" => Some(true),
        "NO" | "N" | "FALSE" => Some(false),
        _ => None,
    }
}

impl SourceConnector for DuckDBSource {
    fn source_type(&self) -> &'static str {
        "duckdb"
    }

    fn database_name(&self) -> ScanResult<String> {
        self.connection
            .query_row("SELECT current_database()", [], |row| row.get::<_, String>(0))
            .map_err(|e| ScanError::IntrospectionFailed(format!("Failed to read database name: {}", e)))
    }

    fn list_namespaces(&self) -> ScanResult<Vec<String>> {
        let mut stmt = self
            .connection
            .prepare(
                r#"
                SELECT schema_name
                FROM information_schema.schemata
                WHERE catalog_name = current_database()
                  AND schema_name NOT IN ('information_schema', 'pg_catalog')
                ORDER BY schema_name
                "#,
            )
            .map_err(|e| ScanError::IntrospectionFailed(format!("Prepare failed: {}", e)))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| ScanError::IntrospectionFailed(format!("Failed to list schemas: {}", e)))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| ScanError::IntrospectionFailed(format!("Row fetch error: {}", e)))
    }

    fn list_tables(&self, qualifier: Option<&str>) -> ScanResult<Probe<Vec<String>>> {
        self.list_objects(qualifier, "BASE TABLE")
    }

    fn list_views(&self, qualifier: Option<&str>) -> ScanResult<Probe<Vec<String>>> {
        self.list_objects(qualifier, "VIEW")
    }

    fn list_columns(
        &self,
        qualifier: Option<&str>,
        object: &str,
    ) -> ScanResult<Probe<Vec<SourceColumn>>> {
        let result = self.query_columns(qualifier, object);

        classify(result, &format!("list columns of {}", object))
    }
}
