//! Invocation option assembly.

use reportd_core::{InvocationOptions, OutputFormat, ReportConfig, ReportParameters, Result};
use tracing::debug;

use crate::connection::build_connection;

/// Combine format, locale, parameters, the optional support resource and a
/// freshly built connection descriptor.
pub fn build_options(
    config: &ReportConfig,
    format: OutputFormat,
    params: ReportParameters,
) -> Result<InvocationOptions> {
    let resource = config.support_resource_path();
    let resources = if resource.is_file() {
        Some(resource)
    } else {
        debug!(resource = %resource.display(), "support resource absent, omitting");
        None
    };

    let connection = build_connection(config)?;
    Ok(InvocationOptions::new(
        format,
        config.locale.clone(),
        params,
        resources,
        connection,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportd_core::ReportError;
    use std::fs;
    use std::path::Path;

    fn config_in(root: &Path) -> ReportConfig {
        let mut config = ReportConfig::with_storage_root(root);
        config.driver.dir = root.join("jdbc");
        fs::create_dir_all(&config.driver.dir).unwrap();
        fs::create_dir_all(&config.resources_dir).unwrap();
        fs::write(config.driver.dir.join(&config.driver.expected_file), "jar").unwrap();
        config
    }

    #[test]
    fn resource_attached_only_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let without = build_options(&config, OutputFormat::Pdf, ReportParameters::new()).unwrap();
        assert!(without.resources().is_none());

        fs::write(config.support_resource_path(), "jar").unwrap();
        let with = build_options(&config, OutputFormat::Pdf, ReportParameters::new()).unwrap();
        assert_eq!(with.resources(), Some(config.support_resource_path().as_path()));
    }

    #[test]
    fn options_carry_singleton_format_and_locale() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.locale = "fr".to_string();
        let params = ReportParameters::new().with("xcus", "ACME");

        let options = build_options(&config, OutputFormat::Xlsx, params.clone()).unwrap();
        assert_eq!(options.formats(), &[OutputFormat::Xlsx]);
        assert_eq!(options.locale(), "fr");
        assert_eq!(options.params(), &params);
        assert_eq!(options.connection().database(), "aalerpdb");
    }

    #[test]
    fn driver_is_rechecked_on_every_build() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        assert!(build_options(&config, OutputFormat::Pdf, ReportParameters::new()).is_ok());

        fs::remove_file(config.driver.dir.join(&config.driver.expected_file)).unwrap();
        let err = build_options(&config, OutputFormat::Pdf, ReportParameters::new()).unwrap_err();
        assert!(matches!(err, ReportError::DriverNotFound { .. }));
    }
}
