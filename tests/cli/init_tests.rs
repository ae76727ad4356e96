//! Tests for `mgt init`

use metadata_governance::cli::commands::init::{InitArgs, handle_init};
use metadata_governance::config::{CONFIG_FILENAME, Settings, sample_config};

use super::settings_in;

#[test]
fn test_init_writes_sample_config() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let args = InitArgs {
        dir: dir.path().to_path_buf(),
    };

    handle_init(&args, &settings).unwrap();

    let written = std::fs::read_to_string(dir.path().join(CONFIG_FILENAME)).unwrap();
    assert_eq!(written, sample_config());
    Settings::parse(&written).unwrap();
    assert!(settings.metadata.path.exists());
}

#[test]
fn test_init_keeps_existing_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join(CONFIG_FILENAME);
    let existing = "[source]\nsystem_name = \"warehouse\"\n";
    std::fs::write(&config_path, existing).unwrap();

    let settings = settings_in(dir.path());
    let args = InitArgs {
        dir: dir.path().to_path_buf(),
    };
    handle_init(&args, &settings).unwrap();

    assert_eq!(std::fs::read_to_string(&config_path).unwrap(), existing);
}

#[test]
fn test_init_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let args = InitArgs {
        dir: dir.path().to_path_buf(),
    };

    handle_init(&args, &settings).unwrap();
    handle_init(&args, &settings).unwrap();
}
