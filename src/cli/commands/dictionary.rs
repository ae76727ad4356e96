//! Dictionary command

use crate::cli::error::CliError;
use crate::config::Settings;
use crate::database::{OutputFormat, RecordTable, format_records, open_store};
use crate::jobs::ScanJobRunner;

/// Columns shown for each dictionary row, in display order
pub const DICTIONARY_LISTING_COLUMNS: [&str; 10] = [
    "id",
    "system_name",
    "database_name",
    "schema_name",
    "object_name",
    "object_type",
    "column_name",
    "data_type",
    "nullable",
    "updated_at",
];

/// Dictionary command arguments
#[derive(Debug, Clone)]
pub struct DictionaryArgs {
    /// Maximum number of rows to show
    pub limit: usize,
    /// Output format
    pub format: String,
}

/// List dictionary rows, most recently inserted first
pub fn handle_dictionary(args: &DictionaryArgs, settings: &Settings) -> Result<(), CliError> {
    let output_format: OutputFormat = args
        .format
        .parse()
        .map_err(|e: String| CliError::InvalidArgument(e))?;

    let store = open_store(&settings.metadata)?;
    store.initialize()?;

    let runner =
        ScanJobRunner::with_default_connectors(store.clone(), &settings.source.system_name);
    let rows = runner.list_dictionary(args.limit)?;
    let table = RecordTable::from_records(&DICTIONARY_LISTING_COLUMNS, &rows)?;

    println!("{}", format_records(&table, output_format));
    if output_format == OutputFormat::Table {
        let total = store.dictionary_row_count()?;
        eprintln!("\n{} of {} row(s)", table.row_count(), total);
    }
    Ok(())
}
