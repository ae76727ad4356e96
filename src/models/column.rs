//! Column facts produced by a scan pass

use serde::{Deserialize, Serialize};

use super::enums::{Nullability, ObjectType};

/// One column of one schema object, as reported by a source
///
/// Immutable value that only lives for the duration of a scan pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFact {
    /// Database the object lives in
    pub database_name: String,
    /// Schema namespace (`main` for sources without schemas)
    pub schema_name: String,
    /// Table or view name
    pub object_name: String,
    /// Whether the object is a table or a view
    pub object_type: ObjectType,
    /// Column name
    pub column_name: String,
    /// Free-text type as reported by the source
    pub data_type: String,
    /// Reported nullability
    pub nullable: Nullability,
}
