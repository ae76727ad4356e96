//! Init command
//!
//! Writes a sample `.mgt.toml` when the directory has none, then creates the
//! metadata tables.

use std::path::PathBuf;

use crate::cli::error::CliError;
use crate::config::{CONFIG_FILENAME, Settings, sample_config};
use crate::database::open_store;

/// Init command arguments
#[derive(Debug, Clone)]
pub struct InitArgs {
    /// Project directory
    pub dir: PathBuf,
}

/// Initialize configuration and the metadata store
pub fn handle_init(args: &InitArgs, settings: &Settings) -> Result<(), CliError> {
    if Settings::exists(&args.dir) {
        println!("Using existing {}", args.dir.join(CONFIG_FILENAME).display());
    } else {
        let path = args.dir.join(CONFIG_FILENAME);
        std::fs::write(&path, sample_config())
            .map_err(|e| CliError::FileWriteError(path.clone(), e.to_string()))?;
        println!("Wrote {}", path.display());
    }

    let store = open_store(&settings.metadata)?;
    store.initialize()?;

    println!("Initialized {} metadata store", store.backend_type());
    Ok(())
}
