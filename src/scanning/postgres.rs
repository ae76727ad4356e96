//! PostgreSQL source connector
//!
//! Uses `tokio-postgres` on a private current-thread runtime so the connector
//! contract stays blocking.

use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls};

use super::{Probe, ScanError, ScanResult, SourceColumn, SourceConnector, SourceDescriptor};

/// PostgreSQL source connector
pub struct PostgresSource {
    runtime: tokio::runtime::Runtime,
    client: Client,
}

impl PostgresSource {
    pub fn connect(descriptor: &SourceDescriptor) -> ScanResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ScanError::ConnectionFailed(format!("Failed to create runtime: {}", e)))?;

        let (client, connection) = runtime
            .block_on(tokio_postgres::connect(descriptor.as_str(), NoTls))
            .map_err(|e| {
                ScanError::ConnectionFailed(format!(
                    "Failed to connect to PostgreSQL {}: {}",
                    descriptor.masked(),
                    e
                ))
            })?;

        // Driven whenever the runtime is blocked on a query
        runtime.spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "PostgreSQL source connection error");
            }
        });

        Ok(Self { runtime, client })
    }

    fn query_names(&self, sql: &str, qualifier: Option<&str>) -> ScanResult<Probe<Vec<String>>> {
        let result = self.runtime.block_on(self.client.query(sql, &[&qualifier]));
        classify(
            result.map(|rows| rows.iter().map(|r| r.get::<_, String>(0)).collect()),
            "list objects",
        )
    }
}

/// Split PostgreSQL errors into unsupported call shapes and real failures
fn classify<T>(result: Result<T, tokio_postgres::Error>, what: &str) -> ScanResult<Probe<T>> {
    match result {
        Ok(value) => Ok(Probe::Supported(value)),
        Err(e) => match e.code() {
            Some(code)
                if *code == SqlState::FEATURE_NOT_SUPPORTED
                    || *code == SqlState::UNDEFINED_TABLE
                    || *code == SqlState::INSUFFICIENT_PRIVILEGE =>
            {
                Ok(Probe::Unsupported(e.to_string()))
            }
            _ => Err(ScanError::IntrospectionFailed(format!("Failed to {}: {}", what, e))),
        },
    }
}

impl SourceConnector for PostgresSource {
    fn source_type(&self) -> &'static str {
        "postgres"
    }

    fn database_name(&self) -> ScanResult<String> {
        let row = self
            .runtime
            .block_on(self.client.query_one("SELECT current_database()::text", &[]))
            .map_err(|e| ScanError::IntrospectionFailed(format!("Failed to read database name: {}", e)))?;
        Ok(row.get(0))
    }

    fn list_namespaces(&self) -> ScanResult<Vec<String>> {
        let rows = self
            .runtime
            .block_on(self.client.query(
                r#"
                SELECT schema_name::text
                FROM information_schema.schemata
                WHERE schema_name NOT IN ('information_schema', 'pg_catalog')
                  AND schema_name NOT LIKE 'pg_toast%'
                  AND schema_name NOT LIKE 'pg_temp%'
                ORDER BY schema_name
                "#,
                &[],
            ))
            .map_err(|e| ScanError::IntrospectionFailed(format!("Failed to list schemas: {}", e)))?;
        Ok(rows.iter().map(|r| r.get(0)).collect())
    }

    fn list_tables(&self, qualifier: Option<&str>) -> ScanResult<Probe<Vec<String>>> {
        self.query_names(
            r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema::text = COALESCE($1::text, current_schema()::text)
              AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
            qualifier,
        )
    }

    fn list_views(&self, qualifier: Option<&str>) -> ScanResult<Probe<Vec<String>>> {
        self.query_names(
            r#"
            SELECT table_name::text
            FROM information_schema.views
            WHERE table_schema::text = COALESCE($1::text, current_schema()::text)
            ORDER BY table_name
            "#,
            qualifier,
        )
    }

    fn list_columns(
        &self,
        qualifier: Option<&str>,
        object: &str,
    ) -> ScanResult<Probe<Vec<SourceColumn>>> {
        let result = self.runtime.block_on(self.client.query(
            r#"
            SELECT column_name::text, data_type::text, is_nullable::text
            FROM information_schema.columns
            WHERE table_schema::text = COALESCE($1::text, current_schema()::text)
              AND table_name::text = $2::text
            ORDER BY ordinal_position
            "#,
            &[&qualifier, &object],
        ));

        classify(
            result.map(|rows| {
                rows.iter()
                    .map(|r| {
                        let flag: Option<String> = r.get(2);
                        SourceColumn {
                            name: r.get(0),
                            data_type: r.get::<_, Option<String>>(1).unwrap_or_default(),
                            nullable: flag.map(|f| f.eq_ignore_ascii_case("YES")),
                        }
                    })
                    .collect()
            }),
            &format!("list columns of {}", object),
        )
    }
}
