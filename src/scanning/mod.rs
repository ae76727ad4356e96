//! Schema scanning
//!
//! Enumerates namespaces, tables, views and columns of a relational source and yields
//! [`ColumnFact`]s lazily, one object at a time.
//!
//! Connectors report dialect limitations through [`Probe::Unsupported`] instead of
//! errors. The scanner reacts to those explicitly:
//! - object listing that is unsupported with a namespace qualifier is retried once
//!   without it, then treated as empty
//! - view column listing that is unsupported skips the view
//! - table column listing that is unsupported fails the scan
//!
//! Real failures (`Err`) always propagate and end the pass.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::models::{ColumnFact, Nullability, ObjectType};

#[cfg(feature = "duckdb-backend")]
pub mod duckdb;
#[cfg(feature = "postgres-backend")]
pub mod postgres;

pub mod descriptor;

#[cfg(feature = "duckdb-backend")]
pub use self::duckdb::DuckDBSource;
#[cfg(feature = "postgres-backend")]
pub use self::postgres::PostgresSource;

pub use descriptor::{SourceDescriptor, SourceKind};

/// Namespace label used when a source reports no schemas
pub const SYNTHETIC_NAMESPACE: &str = "main";

/// Error type for scan operations
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The descriptor could not be parsed
    #[error("Invalid source descriptor: {0}")]
    InvalidDescriptor(String),

    /// The descriptor names a source kind this build cannot open
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// Source unreachable, missing or rejected the credentials
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// An introspection query failed
    #[error("Introspection failed: {0}")]
    IntrospectionFailed(String),

    /// Column enumeration for a table is not supported by the source
    #[error("Cannot enumerate columns of {object}: {reason}")]
    ColumnsUnsupported { object: String, reason: String },
}

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Answer from a source for one kind of catalog call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// The call shape is supported and produced a value
    Supported(T),
    /// The source cannot answer this call shape
    Unsupported(String),
}

impl<T> Probe<T> {
    pub fn supported(self) -> Option<T> {
        match self {
            Probe::Supported(value) => Some(value),
            Probe::Unsupported(_) => None,
        }
    }
}

/// A column as reported by a connector, before it is tagged with its object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceColumn {
    pub name: String,
    /// Free-text type, as the source renders it
    pub data_type: String,
    /// `None` when the source does not report nullability
    pub nullable: Option<bool>,
}

impl SourceColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: Option<bool>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
        }
    }
}

/// An open connection to a relational source
///
/// `qualifier` is the namespace to enumerate in; `None` means the connection's
/// default namespace.
pub trait SourceConnector: Send {
    /// Source type identifier ("duckdb", "postgres")
    fn source_type(&self) -> &'static str;

    /// Name of the database the connection is attached to
    fn database_name(&self) -> ScanResult<String>;

    /// Schema namespaces, excluding system catalogs
    fn list_namespaces(&self) -> ScanResult<Vec<String>>;

    /// Base tables in a namespace
    fn list_tables(&self, qualifier: Option<&str>) -> ScanResult<Probe<Vec<String>>>;

    /// Views in a namespace
    fn list_views(&self, qualifier: Option<&str>) -> ScanResult<Probe<Vec<String>>>;

    /// Columns of one table or view, in ordinal order
    fn list_columns(
        &self,
        qualifier: Option<&str>,
        object: &str,
    ) -> ScanResult<Probe<Vec<SourceColumn>>>;
}

/// Opens connectors from descriptors
pub trait ConnectorFactory: Send + Sync {
    fn connect(&self, descriptor: &SourceDescriptor) -> ScanResult<Box<dyn SourceConnector>>;
}

/// Factory dispatching on the descriptor scheme to the connectors compiled in
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConnectorFactory;

impl ConnectorFactory for DefaultConnectorFactory {
    fn connect(&self, descriptor: &SourceDescriptor) -> ScanResult<Box<dyn SourceConnector>> {
        match descriptor.kind() {
            SourceKind::DuckDB => {
                #[cfg(feature = "duckdb-backend")]
                {
                    Ok(Box::new(DuckDBSource::connect(descriptor)?))
                }
                #[cfg(not(feature = "duckdb-backend"))]
                {
                    Err(ScanError::UnsupportedSource(
                        "DuckDB support not enabled. Build with --features duckdb-backend"
                            .to_string(),
                    ))
                }
            }
            SourceKind::Postgres => {
                #[cfg(feature = "postgres-backend")]
                {
                    Ok(Box::new(PostgresSource::connect(descriptor)?))
                }
                #[cfg(not(feature = "postgres-backend"))]
                {
                    Err(ScanError::UnsupportedSource(
                        "PostgreSQL support not enabled. Build with --features postgres-backend"
                            .to_string(),
                    ))
                }
            }
        }
    }
}

/// A namespace to scan and the qualifier used to address it
#[derive(Debug, Clone, PartialEq, Eq)]
struct Namespace {
    label: String,
    qualifier: Option<String>,
}

#[derive(Debug, Clone)]
struct PendingObject {
    schema_name: String,
    qualifier: Option<String>,
    name: String,
    object_type: ObjectType,
}

/// Counters collected during a scan pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub namespaces: usize,
    pub tables: usize,
    pub views: usize,
    /// Views skipped because their columns could not be enumerated
    pub views_skipped: usize,
    /// Listings retried without a namespace qualifier
    pub unqualified_fallbacks: usize,
    pub columns: usize,
}

/// Schema scanner
pub struct SchemaScanner {
    connectors: Arc<dyn ConnectorFactory>,
}

impl SchemaScanner {
    pub fn new(connectors: Arc<dyn ConnectorFactory>) -> Self {
        Self { connectors }
    }

    /// Connect to a source and start a scan pass
    ///
    /// Connection and namespace enumeration happen here and are fatal on failure.
    /// Everything below the namespace level is enumerated lazily as the pass is
    /// iterated.
    pub fn scan(&self, descriptor: &SourceDescriptor) -> ScanResult<ScanPass> {
        let connector = self.connectors.connect(descriptor)?;
        let database_name = connector.database_name()?;

        let reported = connector.list_namespaces()?;
        let namespaces: VecDeque<Namespace> = if reported.is_empty() {
            debug!(
                source = %descriptor,
                "Source reports no schemas, using synthetic namespace '{}'",
                SYNTHETIC_NAMESPACE
            );
            VecDeque::from([Namespace {
                label: SYNTHETIC_NAMESPACE.to_string(),
                qualifier: None,
            }])
        } else {
            reported
                .into_iter()
                .map(|name| Namespace {
                    label: name.clone(),
                    qualifier: Some(name),
                })
                .collect()
        };

        info!(
            source = %descriptor,
            source_type = connector.source_type(),
            database = %database_name,
            namespaces = namespaces.len(),
            "Starting schema scan"
        );

        Ok(ScanPass {
            connector,
            database_name,
            stats: ScanStats {
                namespaces: namespaces.len(),
                ..Default::default()
            },
            namespaces,
            pending_objects: VecDeque::new(),
            buffered: VecDeque::new(),
            done: false,
        })
    }
}

/// A single, non-restartable pass over a source's columns
///
/// Yields `Ok(ColumnFact)` per column. After the first `Err` the pass is finished.
pub struct ScanPass {
    connector: Box<dyn SourceConnector>,
    database_name: String,
    namespaces: VecDeque<Namespace>,
    pending_objects: VecDeque<PendingObject>,
    buffered: VecDeque<ColumnFact>,
    stats: ScanStats,
    done: bool,
}

impl ScanPass {
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    fn expand_namespace(&mut self, namespace: Namespace) -> ScanResult<()> {
        for object_type in [ObjectType::Table, ObjectType::View] {
            let (names, qualifier) = self.enumerate_objects(&namespace, object_type)?;
            match object_type {
                ObjectType::Table => self.stats.tables += names.len(),
                ObjectType::View => self.stats.views += names.len(),
            }
            self.pending_objects
                .extend(names.into_iter().map(|name| PendingObject {
                    schema_name: namespace.label.clone(),
                    qualifier: qualifier.clone(),
                    name,
                    object_type,
                }));
        }
        Ok(())
    }

    /// List objects of one kind, retrying once without the qualifier
    fn enumerate_objects(
        &mut self,
        namespace: &Namespace,
        object_type: ObjectType,
    ) -> ScanResult<(Vec<String>, Option<String>)> {
        let list = |qualifier: Option<&str>| match object_type {
            ObjectType::Table => self.connector.list_tables(qualifier),
            ObjectType::View => self.connector.list_views(qualifier),
        };

        let reason = match list(namespace.qualifier.as_deref())? {
            Probe::Supported(names) => return Ok((names, namespace.qualifier.clone())),
            Probe::Unsupported(reason) => reason,
        };

        if namespace.qualifier.is_none() {
            warn!(
                schema = %namespace.label,
                kind = %object_type,
                reason = %reason,
                "Object listing unsupported, treating namespace as empty"
            );
            return Ok((Vec::new(), None));
        }

        debug!(
            schema = %namespace.label,
            kind = %object_type,
            reason = %reason,
            "Qualified object listing unsupported, retrying without qualifier"
        );
        let retried = list(None)?;
        self.stats.unqualified_fallbacks += 1;

        match retried {
            Probe::Supported(names) => Ok((names, None)),
            Probe::Unsupported(reason) => {
                warn!(
                    schema = %namespace.label,
                    kind = %object_type,
                    reason = %reason,
                    "Unqualified object listing unsupported, treating namespace as empty"
                );
                Ok((Vec::new(), None))
            }
        }
    }

    fn expand_object(&mut self, object: PendingObject) -> ScanResult<()> {
        let listed = self
            .connector
            .list_columns(object.qualifier.as_deref(), &object.name)?;

        let columns = match (listed, object.object_type) {
            (Probe::Supported(columns), _) => columns,
            (Probe::Unsupported(reason), ObjectType::View) => {
                debug!(
                    schema = %object.schema_name,
                    view = %object.name,
                    reason = %reason,
                    "Skipping view without column introspection"
                );
                self.stats.views_skipped += 1;
                return Ok(());
            }
            (Probe::Unsupported(reason), ObjectType::Table) => {
                return Err(ScanError::ColumnsUnsupported {
                    object: format!("{}.{}", object.schema_name, object.name),
                    reason,
                });
            }
        };

        self.buffered.extend(columns.into_iter().map(|column| ColumnFact {
            database_name: self.database_name.clone(),
            schema_name: object.schema_name.clone(),
            object_name: object.name.clone(),
            object_type: object.object_type,
            column_name: column.name,
            data_type: column.data_type,
            nullable: Nullability::from_reported(column.nullable),
        }));
        Ok(())
    }
}

impl Iterator for ScanPass {
    type Item = ScanResult<ColumnFact>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if let Some(fact) = self.buffered.pop_front() {
                self.stats.columns += 1;
                return Some(Ok(fact));
            }

            let step = if let Some(object) = self.pending_objects.pop_front() {
                self.expand_object(object)
            } else if let Some(namespace) = self.namespaces.pop_front() {
                self.expand_namespace(namespace)
            } else {
                self.done = true;
                debug!(
                    database = %self.database_name,
                    columns = self.stats.columns,
                    views_skipped = self.stats.views_skipped,
                    "Schema scan drained"
                );
                return None;
            };

            if let Err(e) = step {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

impl std::iter::FusedIterator for ScanPass {}
