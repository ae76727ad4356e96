//! Enums for catalog records
//!
//! All enums serialize as `SCREAMING_SNAKE_CASE` strings because those strings are
//! persisted verbatim in the metadata store (`TABLE`, `Y`, `RUNNING`, ...).

use serde::{Deserialize, Serialize};

/// Kind of schema object a column belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    Table,
    View,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Table => "TABLE",
            ObjectType::View => "VIEW",
        }
    }
}

impl std::str::FromStr for ObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TABLE" => Ok(ObjectType::Table),
            "VIEW" => Ok(ObjectType::View),
            _ => Err(format!("Unknown object type: {}", s)),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column nullability flag (`Y`/`N`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Nullability {
    /// Nullable, also used when the source does not say
    #[default]
    #[serde(rename = "Y")]
    Nullable,
    #[serde(rename = "N")]
    NotNull,
}

impl Nullability {
    /// Map a source-reported flag, defaulting to nullable when the source is silent
    pub fn from_reported(reported: Option<bool>) -> Self {
        match reported {
            Some(false) => Nullability::NotNull,
            Some(true) | None => Nullability::Nullable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Nullability::Nullable => "Y",
            Nullability::NotNull => "N",
        }
    }
}

impl std::str::FromStr for Nullability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "Y" | "YES" => Ok(Nullability::Nullable),
            "N" | "NO" => Ok(Nullability::NotNull),
            _ => Err(format!("Unknown nullability flag: {}", s)),
        }
    }
}

impl std::fmt::Display for Nullability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a scan job
///
/// `Running` is the only non-terminal state. A job moves out of it exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Running,
    Success,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "RUNNING",
            JobStatus::Success => "SUCCESS",
            JobStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }

    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Running, JobStatus::Success) | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "RUNNING" => Ok(JobStatus::Running),
            "SUCCESS" => Ok(JobStatus::Success),
            "FAILED" => Ok(JobStatus::Failed),
            _ => Err(format!("Unknown job status: {}", s)),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
