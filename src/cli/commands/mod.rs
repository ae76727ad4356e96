//! CLI command implementations

pub mod dictionary;
pub mod init;
pub mod jobs;
pub mod ops;
pub mod scan;
