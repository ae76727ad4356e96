//! Metadata governance - catalog relational sources into a data dictionary
//!
//! Provides:
//! - Schema scanning of DuckDB and PostgreSQL sources with explicit capability checks
//! - Normalization of column facts into dictionary records
//! - Idempotent, race-tolerant reconciliation keyed by a stable identity hash
//! - Job tracking for every scan run
//! - DuckDB and PostgreSQL metadata stores
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use metadata_governance::{DuckDBStore, MetadataStore, ScanJobRunner};
//!
//! let store = DuckDBStore::new(".metadb/metadata.duckdb").unwrap();
//! store.initialize().unwrap();
//!
//! let runner = ScanJobRunner::with_default_connectors(Arc::new(store), "local");
//! let job_id = runner.run_job("duckdb://.metadb/source_demo.duckdb").unwrap();
//! println!("{}", job_id);
//! ```

pub mod config;
pub mod database;
pub mod hashing;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod ops;
pub mod reconcile;
pub mod scanning;
pub mod transform;

#[cfg(feature = "duckdb-backend")]
pub mod demo;

#[cfg(feature = "cli")]
pub mod cli;

pub use config::{ConfigError, MetadataBackend, Settings};
#[cfg(feature = "duckdb-backend")]
pub use database::DuckDBStore;
#[cfg(feature = "postgres-backend")]
pub use database::PostgresStore;
pub use database::{DatabaseError, DatabaseResult, InsertOutcome, MetadataStore, open_store};
pub use hashing::stable_hash;
pub use jobs::{JobError, JobTracker, PipelineError, ScanJobRunner, ScanReport};
pub use models::enums::*;
pub use models::{ColumnFact, DictionaryRecord, DictionaryRow, JobSummary, ScanJob};
pub use reconcile::{DictionaryReconciler, ReconcileOutcome};
pub use scanning::{
    ConnectorFactory, DefaultConnectorFactory, Probe, ScanError, SchemaScanner, SourceConnector,
    SourceDescriptor,
};
