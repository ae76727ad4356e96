//! Demo source bootstrap
//!
//! Creates a small DuckDB source so a fresh checkout has something to scan.

use std::path::Path;

use crate::database::{DatabaseError, DatabaseResult};

const DEMO_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS customers (
    id INTEGER PRIMARY KEY,
    name VARCHAR,
    email VARCHAR
);

CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY,
    customer_id INTEGER NOT NULL,
    amount DECIMAL(12, 2)
);

CREATE VIEW IF NOT EXISTS customer_orders AS
SELECT c.id AS customer_id, c.name, o.id AS order_id, o.amount
FROM customers c
JOIN orders o ON o.customer_id = c.id;
"#;

/// Create the demo tables and view in a DuckDB file if they are absent
pub fn bootstrap_duckdb_source(path: &Path) -> DatabaseResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            DatabaseError::IoError(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }

    let connection = duckdb::Connection::open(path).map_err(|e| {
        DatabaseError::ConnectionFailed(format!("Failed to open {}: {}", path.display(), e))
    })?;
    connection
        .execute_batch(DEMO_SCHEMA)
        .map_err(|e| DatabaseError::QueryFailed(format!("Failed to create demo schema: {}", e)))?;

    tracing::info!(path = %path.display(), "Demo source ready");
    Ok(())
}
