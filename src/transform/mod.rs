//! Row normalization
//!
//! Maps column facts into dictionary records tagged with a logical system name.
//! One record per fact, in order, nothing filtered.

use crate::models::{ColumnFact, DictionaryRecord};

/// Tag a single fact with its system name
pub fn to_dictionary_record(fact: ColumnFact, system_name: &str) -> DictionaryRecord {
    DictionaryRecord {
        system_name: system_name.to_string(),
        database_name: fact.database_name,
        schema_name: fact.schema_name,
        object_name: fact.object_name,
        object_type: fact.object_type,
        column_name: fact.column_name,
        data_type: fact.data_type,
        nullable: fact.nullable,
    }
}

/// Lazily normalize a sequence of facts
pub fn to_dictionary_records<'a, I>(
    facts: I,
    system_name: &'a str,
) -> impl Iterator<Item = DictionaryRecord> + 'a
where
    I: IntoIterator<Item = ColumnFact>,
    I::IntoIter: 'a,
{
    facts
        .into_iter()
        .map(move |fact| to_dictionary_record(fact, system_name))
}

/// Normalize a fallible fact stream, passing errors through unchanged
pub fn try_to_dictionary_records<'a, I, E>(
    facts: I,
    system_name: &'a str,
) -> impl Iterator<Item = Result<DictionaryRecord, E>> + 'a
where
    I: IntoIterator<Item = Result<ColumnFact, E>>,
    I::IntoIter: 'a,
    E: 'a,
{
    facts
        .into_iter()
        .map(move |fact| fact.map(|fact| to_dictionary_record(fact, system_name)))
}
