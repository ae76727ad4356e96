//! Jobs command
//!
//! Lists recent scan jobs, newest first.

use crate::cli::error::CliError;
use crate::config::Settings;
use crate::database::{OutputFormat, RecordTable, format_records, open_store};
use crate::jobs::ScanJobRunner;

/// Columns shown for each job, in display order
pub const JOB_LISTING_COLUMNS: [&str; 6] = [
    "job_id",
    "status",
    "source_descriptor",
    "started_at",
    "finished_at",
    "error_message",
];

/// Jobs command arguments
#[derive(Debug, Clone)]
pub struct JobsArgs {
    /// Maximum number of jobs to show
    pub limit: usize,
    /// Output format
    pub format: String,
}

/// List recent scan jobs
pub fn handle_jobs(args: &JobsArgs, settings: &Settings) -> Result<(), CliError> {
    let output_format: OutputFormat = args
        .format
        .parse()
        .map_err(|e: String| CliError::InvalidArgument(e))?;

    let store = open_store(&settings.metadata)?;
    store.initialize()?;

    let runner = ScanJobRunner::with_default_connectors(store, &settings.source.system_name);
    let jobs = runner.list_jobs(args.limit)?;
    let table = RecordTable::from_records(&JOB_LISTING_COLUMNS, &jobs)?;

    println!("{}", format_records(&table, output_format));
    if output_format == OutputFormat::Table {
        eprintln!("\n{} job(s)", table.row_count());
    }
    Ok(())
}
