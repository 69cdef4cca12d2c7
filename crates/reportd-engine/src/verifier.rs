//! Artifact verification.

use reportd_core::{GeneratedArtifact, OutputFormat, ReportError, ReportName, Result};
use std::io::ErrorKind;
use std::path::Path;

/// Confirm the engine actually produced a non-empty file at `path`.
///
/// No retry: a missing file after a clean engine exit is reported as is.
pub fn verify(
    path: &Path,
    report: &ReportName,
    format: OutputFormat,
) -> Result<GeneratedArtifact> {
    let missing = |reason: String| ReportError::ArtifactMissing {
        path: path.to_path_buf(),
        reason,
    };

    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(missing("file does not exist".to_string()))
        }
        Err(e) => return Err(missing(e.to_string())),
    };
    if !metadata.is_file() {
        return Err(missing("not a regular file".to_string()));
    }
    if metadata.len() == 0 {
        return Err(missing("file is empty".to_string()));
    }

    Ok(GeneratedArtifact {
        report: report.clone(),
        format,
        path: path.to_path_buf(),
        size_bytes: metadata.len(),
    })
}
