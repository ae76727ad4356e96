//! CLI tests module

#[cfg(feature = "cli")]
pub mod init_tests;
#[cfg(feature = "cli")]
pub mod listing_tests;
#[cfg(feature = "cli")]
pub mod ops_tests;
#[cfg(feature = "cli")]
pub mod scan_tests;

#[cfg(feature = "cli")]
use metadata_governance::config::Settings;
#[cfg(feature = "cli")]
use std::path::Path;

/// Default settings with every relative path resolved under `dir`
#[cfg(feature = "cli")]
pub fn settings_in(dir: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.resolve_paths(dir);
    settings
}
