//! Template resolution and listing.
//!
//! Templates live flat in `reports_dir` as `<name>.<template_extension>`.
//! Both operations only read the filesystem.

use chrono::{DateTime, Utc};
use reportd_core::{ReportConfig, ReportError, ReportName, ReportTemplate, Result};
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

/// Template file path for `name`, whether or not it exists.
pub fn template_path(config: &ReportConfig, name: &ReportName) -> PathBuf {
    config
        .reports_dir
        .join(format!("{}.{}", name, config.template_extension))
}

/// Resolve `name` to an existing template file.
pub fn resolve(config: &ReportConfig, name: &ReportName) -> Result<ReportTemplate> {
    let path = template_path(config, name);
    if !path.is_file() {
        return Err(ReportError::TemplateNotFound {
            name: format!("{}.{}", name, config.template_extension),
            path,
        });
    }
    Ok(ReportTemplate {
        name: name.clone(),
        path,
    })
}

/// One entry of the template listing.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateSummary {
    pub name: String,
    pub path: PathBuf,
    #[serde(serialize_with = "serialize_modified")]
    pub modified: DateTime<Utc>,
}

fn serialize_modified<S: Serializer>(
    value: &DateTime<Utc>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(&value.format("%Y-%m-%d %H:%M:%S"))
}

/// List every template in `reports_dir`, sorted by name.
pub fn list_templates(config: &ReportConfig) -> Result<Vec<TemplateSummary>> {
    let dir = &config.reports_dir;
    let entries = std::fs::read_dir(dir).map_err(|e| ReportError::io(dir, e))?;

    let mut templates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ReportError::io(dir, e))?;
        let path = entry.path();
        if !has_extension(&path, &config.template_extension) {
            continue;
        }
        let metadata = entry.metadata().map_err(|e| ReportError::io(&path, e))?;
        if !metadata.is_file() {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if ReportName::new(stem).is_err() {
            tracing::debug!(path = %path.display(), "skipping template with unusable name");
            continue;
        }
        let modified = metadata.modified().map_err(|e| ReportError::io(&path, e))?;
        templates.push(TemplateSummary {
            name: stem.to_string(),
            modified: DateTime::<Utc>::from(modified),
            path,
        });
    }

    templates.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(templates)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config_in(dir: &Path) -> ReportConfig {
        ReportConfig::with_storage_root(dir)
    }

    #[test]
    fn resolves_existing_template() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("gross_with_vat.jrxml"), "<jasperReport/>").unwrap();
        let config = config_in(dir.path());

        let name = ReportName::new("gross_with_vat").unwrap();
        let template = resolve(&config, &name).unwrap();
        assert!(template.path.exists());
        assert_eq!(template.path, dir.path().join("gross_with_vat.jrxml"));
    }

    #[test]
    fn missing_template_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let err = resolve(&config, &ReportName::new("nope").unwrap()).unwrap_err();
        match err {
            ReportError::TemplateNotFound { name, path } => {
                assert_eq!(name, "nope.jrxml");
                assert_eq!(path, dir.path().join("nope.jrxml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn directory_with_template_name_is_not_a_template() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("odd.jrxml")).unwrap();
        let config = config_in(dir.path());
        assert!(resolve(&config, &ReportName::new("odd").unwrap()).is_err());
    }

    #[test]
    fn listing_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b_report.jrxml"), "x").unwrap();
        fs::write(dir.path().join("a_report.jrxml"), "x").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::write(dir.path().join("compiled.jasper"), "x").unwrap();
        fs::create_dir(dir.path().join("temp")).unwrap();
        let config = config_in(dir.path());

        let listing = list_templates(&config).unwrap();
        let names: Vec<_> = listing.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a_report", "b_report"]);

        let json = serde_json::to_value(&listing[0]).unwrap();
        let modified = json["modified"].as_str().unwrap();
        assert_eq!(modified.len(), "2024-01-01 00:00:00".len());
    }
}
