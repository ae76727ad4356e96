//! Models module
//!
//! Strongly-typed records that cross component boundaries: column facts from the
//! scanner, dictionary records and rows, and scan jobs.

pub mod column;
pub mod dictionary;
pub mod enums;
pub mod job;

pub use column::ColumnFact;
pub use dictionary::{DEFAULT_SYSTEM_NAME, DictionaryRecord, DictionaryRow, DictionaryUpdate};
pub use enums::*;
pub use job::{JobSummary, ScanJob, generate_job_id};
