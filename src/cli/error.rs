//! CLI-specific error types

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::database::DatabaseError;
use crate::jobs::JobError;

/// CLI-specific error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    Job(#[from] JobError),

    #[error("Failed to write file {0}: {1}")]
    FileWriteError(PathBuf, String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    IoError(String),
}
