//! Tests for `mgt jobs` and `mgt dictionary`

use metadata_governance::cli::commands::dictionary::{DictionaryArgs, handle_dictionary};
use metadata_governance::cli::commands::jobs::{JobsArgs, handle_jobs};
use metadata_governance::cli::commands::scan::{ScanArgs, handle_scan};
use metadata_governance::cli::error::CliError;

use super::settings_in;

#[test]
fn test_jobs_rejects_unknown_format() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let args = JobsArgs {
        limit: 10,
        format: "yaml".to_string(),
    };

    let result = handle_jobs(&args, &settings);
    assert!(matches!(result, Err(CliError::InvalidArgument(_))));
}

#[test]
fn test_dictionary_rejects_unknown_format() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let args = DictionaryArgs {
        limit: 10,
        format: "yaml".to_string(),
    };

    let result = handle_dictionary(&args, &settings);
    assert!(matches!(result, Err(CliError::InvalidArgument(_))));
}

#[test]
fn test_listings_after_scan() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let scan = ScanArgs {
        bootstrap_demo: true,
        ..Default::default()
    };
    handle_scan(&scan, &settings).unwrap();

    for format in ["table", "json", "csv"] {
        let jobs = JobsArgs {
            limit: 5,
            format: format.to_string(),
        };
        handle_jobs(&jobs, &settings).unwrap();

        let dictionary = DictionaryArgs {
            limit: 5,
            format: format.to_string(),
        };
        handle_dictionary(&dictionary, &settings).unwrap();
    }
}

#[test]
fn test_listings_on_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());

    let jobs = JobsArgs {
        limit: 5,
        format: "table".to_string(),
    };
    handle_jobs(&jobs, &settings).unwrap();

    let dictionary = DictionaryArgs {
        limit: 5,
        format: "json".to_string(),
    };
    handle_dictionary(&dictionary, &settings).unwrap();
}
