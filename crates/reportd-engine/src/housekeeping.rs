//! Housekeeping: storage bootstrap and temp artifact sweep.
//!
//! Neither operation schedules itself. The sweep is a single idempotent
//! pass meant to be triggered from outside (cron, the cleanup endpoint).

use reportd_core::{ReportConfig, ReportError, Result};
use serde::Serialize;
use std::fs::{DirBuilder, DirEntry};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Create the reports, temp and resources directories if missing.
///
/// Returns the directories that had to be created.
pub fn ensure_directories(config: &ReportConfig) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    for dir in [&config.reports_dir, &config.temp_dir, &config.resources_dir] {
        if dir.exists() {
            continue;
        }
        dir_builder()
            .create(dir)
            .map_err(|e| ReportError::io(dir, e))?;
        info!(directory = %dir.display(), "created directory");
        created.push(dir.clone());
    }
    Ok(created)
}

fn dir_builder() -> DirBuilder {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder
}

/// Outcome of one temp sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub deleted: usize,
    pub retained: usize,
    pub freed_bytes: u64,
}

/// Delete regular files in `dir` whose age is at least `retention`.
pub fn sweep_temp(dir: &Path, retention: Duration) -> Result<SweepReport> {
    sweep_temp_at(dir, retention, SystemTime::now())
}

/// [`sweep_temp`] against an explicit clock.
///
/// Non-recursive. Subdirectories and symlinks are never touched. Files
/// with a modification time in the future count as fresh.
pub fn sweep_temp_at(dir: &Path, retention: Duration, now: SystemTime) -> Result<SweepReport> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "temp directory absent, nothing to sweep");
            return Ok(SweepReport::default());
        }
        Err(e) => return Err(ReportError::io(dir, e)),
    };

    sweep_entries(dir, entries, retention, now)
}

fn sweep_entries<I>(
    dir: &Path,
    entries: I,
    retention: Duration,
    now: SystemTime,
) -> Result<SweepReport>
where
    I: IntoIterator<Item = io::Result<DirEntry>>,
{
    let mut report = SweepReport::default();
    for entry in entries {
        let entry = entry.map_err(|e| ReportError::io(dir, e))?;
        let path = entry.path();

        let (len, modified) = match file_stat(&entry) {
            Ok(Some(stat)) => stat,
            Ok(None) => continue,
            // Removed since the directory was listed.
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(ReportError::io(&path, e)),
        };
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);

        if age < retention {
            report.retained += 1;
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                report.deleted += 1;
                report.freed_bytes += len;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(file = %path.display(), error = %e, "failed to delete temp file");
                report.retained += 1;
            }
        }
    }

    info!(
        deleted = report.deleted,
        retained = report.retained,
        freed_bytes = report.freed_bytes,
        "cleaned up {} temporary report files",
        report.deleted
    );
    Ok(report)
}

/// Size and mtime of a regular file; `None` for anything else.
fn file_stat(entry: &DirEntry) -> io::Result<Option<(u64, SystemTime)>> {
    if !entry.file_type()?.is_file() {
        return Ok(None);
    }
    let metadata = entry.metadata()?;
    Ok(Some((metadata.len(), metadata.modified()?)))
}
