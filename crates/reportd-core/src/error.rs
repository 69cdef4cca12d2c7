//! Unified Error Model
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the report pipeline and its housekeeping operations.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("NAME/INVALID: '{0}' is not a valid report name")]
    InvalidReportName(String),

    #[error("TEMPLATE/NOT_FOUND: report template not found: {name} ({})", .path.display())]
    TemplateNotFound { name: String, path: PathBuf },

    #[error(
        "DRIVER/NOT_FOUND: JDBC driver matching '{pattern}' not found in: {}\nPlease download from: {download_url}",
        .dir.display()
    )]
    DriverNotFound {
        dir: PathBuf,
        pattern: String,
        download_url: String,
    },

    #[error("RENDER/FAILED: {}: {source}", .template.display())]
    RenderFailed {
        template: PathBuf,
        #[source]
        source: EngineError,
    },

    #[error("ARTIFACT/MISSING: report file was not generated: {} ({reason})", .path.display())]
    ArtifactMissing { path: PathBuf, reason: String },

    #[error("IO/{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    /// Stable machine-readable code for the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidReportName(_) => "invalid_report_name",
            Self::TemplateNotFound { .. } => "template_not_found",
            Self::DriverNotFound { .. } => "driver_not_found",
            Self::RenderFailed { .. } => "render_failed",
            Self::ArtifactMissing { .. } => "artifact_missing",
            Self::Io { .. } => "io",
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Faults raised by a rendering engine invocation.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to start engine '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine exited with status {}: {output}", exit_label(.code))]
    Exited { code: Option<i32>, output: String },

    #[error("engine error: {0}")]
    Engine(String),
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

/// Configuration loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("CONFIG/IO: failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CONFIG/PARSE: invalid YAML in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("CONFIG/ENV: {var}='{value}' is invalid: {reason}")]
    InvalidEnv {
        var: String,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, ReportError>;
