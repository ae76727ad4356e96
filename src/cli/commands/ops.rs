//! Housekeeping commands

use crate::cli::error::CliError;
use crate::config::Settings;
use crate::ops::{check_disk_usage, cleanup_logs};

/// Delete log files older than `logging.retention_days`
pub fn handle_cleanup_logs(settings: &Settings) -> Result<(), CliError> {
    let dir = &settings.logging.dir;
    let retention_days = settings.logging.retention_days;

    let deleted = cleanup_logs(dir, retention_days).map_err(|e| {
        CliError::IoError(format!("Failed to clean up {}: {}", dir.display(), e))
    })?;

    println!(
        "Deleted {} log file(s) older than {} day(s) from {}",
        deleted,
        retention_days,
        dir.display()
    );
    Ok(())
}

/// Report usage of the disk holding the log directory, warning at or above
/// `ops.disk_alert_threshold`
pub fn handle_check_disk(settings: &Settings) -> Result<(), CliError> {
    let dir = &settings.logging.dir;
    let threshold = settings.ops.disk_alert_threshold;

    let usage = check_disk_usage(dir, threshold).map_err(|e| {
        CliError::IoError(format!("Failed to read disk usage for {}: {}", dir.display(), e))
    })?;

    println!(
        "{}: {:.1}% used ({} of {} bytes free), alert at {:.1}%",
        usage.mount_point.display(),
        usage.used_ratio() * 100.0,
        usage.available_bytes,
        usage.total_bytes,
        threshold * 100.0
    );
    Ok(())
}

/// Post-scan housekeeping. Failures are logged and never fail the scan.
pub fn run_housekeeping(settings: &Settings) {
    let dir = &settings.logging.dir;

    if let Err(e) = check_disk_usage(dir, settings.ops.disk_alert_threshold) {
        tracing::warn!(dir = %dir.display(), error = %e, "Disk usage check failed");
    }
    if let Err(e) = cleanup_logs(dir, settings.logging.retention_days) {
        tracing::warn!(dir = %dir.display(), error = %e, "Log cleanup failed");
    }
}
