//! Connection descriptor assembly and JDBC driver discovery.
//!
//! The driver check runs on every call. Nothing here is cached.

use regex::Regex;
use reportd_core::{ConnectionDescriptor, DriverConfig, ReportConfig, ReportError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Build a fresh descriptor from `config`, failing if no driver is installed.
pub fn build_connection(config: &ReportConfig) -> Result<ConnectionDescriptor> {
    let driver = &config.driver;
    let db = &config.database;
    let located = locate_driver(driver)?;
    debug!(driver = %located.display(), "using JDBC driver");

    Ok(ConnectionDescriptor::new(
        driver.kind.clone(),
        &driver.url_scheme,
        db.host.clone(),
        db.port,
        db.database.clone(),
        db.username.clone(),
        db.password.clone(),
        driver.class_name.clone(),
        driver.dir.clone(),
    ))
}

/// Find the driver artifact: the expected file if present, otherwise any
/// file of the same family (the last one by name wins).
pub fn locate_driver(driver: &DriverConfig) -> Result<PathBuf> {
    let expected = driver.dir.join(&driver.expected_file);
    if expected.is_file() {
        return Ok(expected);
    }

    let not_found = || ReportError::DriverNotFound {
        dir: driver.dir.clone(),
        pattern: family_glob(driver),
        download_url: driver.download_url.clone(),
    };

    let entries = match std::fs::read_dir(&driver.dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %driver.dir.display(), error = %e, "driver directory unreadable");
            return Err(not_found());
        }
    };

    let Ok(family) = family_pattern(driver) else {
        return Err(not_found());
    };
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && matches_family(&family, path))
        .collect();
    candidates.sort();

    match candidates.pop() {
        Some(found) => {
            debug!(
                expected = %expected.display(),
                found = %found.display(),
                "expected driver missing, using family match"
            );
            Ok(found)
        }
        None => Err(not_found()),
    }
}

fn family_pattern(driver: &DriverConfig) -> std::result::Result<Regex, regex::Error> {
    let pattern = format!(
        "^{}.+\\.{}$",
        regex::escape(&driver.family_prefix),
        regex::escape(&driver.extension)
    );
    Regex::new(&pattern)
}

fn family_glob(driver: &DriverConfig) -> String {
    format!("{}*.{}", driver.family_prefix, driver.extension)
}

fn matches_family(family: &Regex, path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| family.is_match(n))
}
