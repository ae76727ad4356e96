//! Scan command
//!
//! Runs one scan job against a source and prints the job id, then checks disk
//! usage and prunes old logs.

use std::path::Path;

use crate::cli::commands::ops::run_housekeeping;
use crate::cli::error::CliError;
use crate::config::Settings;
use crate::database::open_store;
use crate::demo::bootstrap_duckdb_source;
use crate::jobs::ScanJobRunner;
use crate::scanning::{SourceDescriptor, SourceKind};

/// Scan command arguments
#[derive(Debug, Clone, Default)]
pub struct ScanArgs {
    /// Source connection string (defaults to `source.url`)
    pub source: Option<String>,
    /// System name recorded on dictionary rows (defaults to `source.system_name`)
    pub system_name: Option<String>,
    /// Create the demo tables in a DuckDB file source before scanning
    pub bootstrap_demo: bool,
}

/// Run a scan job
pub fn handle_scan(args: &ScanArgs, settings: &Settings) -> Result<(), CliError> {
    let source = args.source.as_deref().unwrap_or(&settings.source.url);
    let system_name = args
        .system_name
        .as_deref()
        .unwrap_or(&settings.source.system_name);

    if args.bootstrap_demo {
        bootstrap_demo_source(source)?;
    }

    let store = open_store(&settings.metadata)?;
    store.initialize()?;

    let runner = ScanJobRunner::with_default_connectors(store, system_name);
    let report = runner.run_job_with_report(source)?;

    println!("{}", report.job_id);
    eprintln!(
        "Scanned {} columns: {} inserted, {} updated, {} skipped",
        report.rows_scanned, report.inserted, report.updated, report.skipped_race
    );

    run_housekeeping(settings);
    Ok(())
}

fn bootstrap_demo_source(source: &str) -> Result<(), CliError> {
    let descriptor = SourceDescriptor::parse(source)
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?;

    if descriptor.kind() != SourceKind::DuckDB || descriptor.is_in_memory() {
        return Err(CliError::InvalidArgument(
            "--bootstrap-demo requires a duckdb:// file source".to_string(),
        ));
    }

    let path = Path::new(descriptor.location());
    bootstrap_duckdb_source(path)?;
    tracing::info!(path = %path.display(), "Demo source ready");
    Ok(())
}
