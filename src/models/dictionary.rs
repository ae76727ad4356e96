//! Data dictionary rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{Nullability, ObjectType};
use crate::hashing::stable_hash;

/// Logical system name applied when none is configured
pub const DEFAULT_SYSTEM_NAME: &str = "local";

/// A normalized column record ready for reconciliation
///
/// Shared between the normalizer and the reconciler. The five naming fields
/// contribute to the identity key; the rest are mutable on reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryRecord {
    pub system_name: String,
    pub database_name: String,
    pub schema_name: String,
    pub object_name: String,
    pub object_type: ObjectType,
    pub column_name: String,
    pub data_type: String,
    pub nullable: Nullability,
}

impl DictionaryRecord {
    /// Naming fields in identity order
    pub fn identity_parts(&self) -> [&str; 5] {
        [
            self.system_name.as_str(),
            self.database_name.as_str(),
            self.schema_name.as_str(),
            self.object_name.as_str(),
            self.column_name.as_str(),
        ]
    }

    /// Identity key derived from the naming fields
    pub fn identity_key(&self) -> String {
        stable_hash(self.identity_parts())
    }
}

/// A persisted data dictionary row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryRow {
    /// Storage-assigned surrogate id
    pub id: i64,
    /// Reconciliation key, unique across all rows
    pub identity_key: String,
    pub system_name: String,
    pub database_name: String,
    pub schema_name: String,
    pub object_name: String,
    pub object_type: ObjectType,
    pub column_name: String,
    pub data_type: String,
    pub nullable: Nullability,
    pub updated_at: DateTime<Utc>,
}

/// Mutable fields written when an existing row is reconciled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryUpdate {
    pub object_type: ObjectType,
    pub data_type: String,
    pub nullable: Nullability,
    pub updated_at: DateTime<Utc>,
}

impl DictionaryUpdate {
    pub fn from_record(record: &DictionaryRecord, updated_at: DateTime<Utc>) -> Self {
        Self {
            object_type: record.object_type,
            data_type: record.data_type.clone(),
            nullable: record.nullable,
            updated_at,
        }
    }
}
