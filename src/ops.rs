//! Operational housekeeping: log retention and disk-usage alerting

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use sysinfo::Disks;

const SECONDS_PER_DAY: u64 = 86_400;

/// Space on the filesystem that holds a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskUsage {
    /// Directory the usage was requested for
    pub path: PathBuf,
    pub mount_point: PathBuf,
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl DiskUsage {
    /// Fraction of the filesystem in use, `0.0..=1.0`
    pub fn used_ratio(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        let used = self.total_bytes.saturating_sub(self.available_bytes);
        used as f64 / self.total_bytes as f64
    }

    pub fn exceeds(&self, threshold: f64) -> bool {
        self.used_ratio() >= threshold
    }
}

/// Measure the filesystem holding `dir`
///
/// A missing `dir` is measured at its nearest existing ancestor. The disk is the
/// mounted filesystem with the longest mount point containing the path.
pub fn disk_usage(dir: &Path) -> std::io::Result<DiskUsage> {
    let existing = dir
        .ancestors()
        .find(|p| !p.as_os_str().is_empty() && p.exists())
        .unwrap_or(Path::new("."));
    let path = existing.canonicalize()?;

    let disks = Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .filter(|disk| path.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len())
        .map(|disk| DiskUsage {
            path: dir.to_path_buf(),
            mount_point: disk.mount_point().to_path_buf(),
            total_bytes: disk.total_space(),
            available_bytes: disk.available_space(),
        })
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("No mounted filesystem holds {}", path.display()),
            )
        })
}

/// Log disk usage for `dir` and warn when it is at or above `threshold`
///
/// `threshold` is a fraction (`0.75` alerts at 75% used).
pub fn check_disk_usage(dir: &Path, threshold: f64) -> std::io::Result<DiskUsage> {
    let usage = disk_usage(dir)?;
    report_disk_usage(&usage, threshold);
    Ok(usage)
}

/// Returns whether an alert was raised
fn report_disk_usage(usage: &DiskUsage, threshold: f64) -> bool {
    let percent = usage.used_ratio() * 100.0;
    tracing::info!(
        path = %usage.path.display(),
        mount_point = %usage.mount_point.display(),
        used_percent = %format!("{:.2}", percent),
        "Disk usage"
    );

    if !usage.exceeds(threshold) {
        return false;
    }
    tracing::warn!(
        path = %usage.path.display(),
        mount_point = %usage.mount_point.display(),
        used_percent = %format!("{:.2}", percent),
        threshold_percent = %format!("{:.2}", threshold * 100.0),
        "Disk usage at or above alert threshold"
    );
    true
}

/// Delete `*.log*` files in `dir` last modified more than `retention_days` ago
///
/// A missing directory counts as nothing to clean. Files that cannot be
/// inspected or removed are logged and skipped. Returns the number deleted.
pub fn cleanup_logs(dir: &Path, retention_days: u32) -> std::io::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let retention = Duration::from_secs(u64::from(retention_days) * SECONDS_PER_DAY);
    let cutoff = SystemTime::now()
        .checked_sub(retention)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut deleted = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Failed to read log directory entry");
                continue;
            }
        };

        let is_log = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.contains(".log"));
        if !is_log {
            continue;
        }

        let expired = std::fs::metadata(&path).and_then(|meta| {
            Ok(meta.is_file() && meta.modified()? < cutoff)
        });
        match expired {
            Ok(true) => match std::fs::remove_file(&path) {
                Ok(()) => deleted += 1,
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Failed to delete log file")
                }
            },
            Ok(false) => {}
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to inspect log file")
            }
        }
    }

    if deleted > 0 {
        tracing::info!(
            deleted,
            retention_days,
            "Log cleanup removed file(s) older than the retention window"
        );
    }
    Ok(deleted)
}
