//! Render invocation.
//!
//! The engine is an opaque capability: given a template, an output stem and
//! the invocation options it writes `<stem>.<format>` and returns whatever
//! status text it produced. [`ProcessEngine`] drives a jasperstarter-style
//! command line; tests substitute their own [`RenderEngine`].

use reportd_core::{
    EngineConfig, EngineError, InvocationOptions, OutputFormat, ReportError, ReportTemplate, Result,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Contract of an external rendering engine.
pub trait RenderEngine: Send + Sync {
    /// Engine name used in logs.
    fn name(&self) -> &str;

    /// Render `template` into `<output_stem>.<format>`. Blocks until done.
    fn process(
        &self,
        template: &Path,
        output_stem: &Path,
        options: &InvocationOptions,
    ) -> std::result::Result<String, EngineError>;
}

/// Final artifact path for a stem. Appends, so dots in the stem survive.
pub fn artifact_path(output_stem: &Path, format: OutputFormat) -> PathBuf {
    let mut path = OsString::from(output_stem.as_os_str());
    path.push(".");
    path.push(format.extension());
    PathBuf::from(path)
}

/// Run `engine` and return the path the artifact is expected at.
///
/// Status text is advisory and only logged. Whether the artifact really
/// exists is decided by the verifier.
pub fn invoke(
    engine: &dyn RenderEngine,
    template: &ReportTemplate,
    output_stem: &Path,
    options: &InvocationOptions,
) -> Result<PathBuf> {
    debug!(
        engine = engine.name(),
        template = %template.path.display(),
        stem = %output_stem.display(),
        format = %options.format(),
        "invoking rendering engine"
    );

    let status = engine
        .process(&template.path, output_stem, options)
        .map_err(|source| ReportError::RenderFailed {
            template: template.path.clone(),
            source,
        })?;

    let status = status.trim();
    if !status.is_empty() {
        warn!(engine = engine.name(), output = status, "rendering engine execution output");
    }

    Ok(artifact_path(output_stem, options.format()))
}

// ============================================================================
// Process-backed engine
// ============================================================================

/// Runs an external jasperstarter-compatible executable.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: String,
    extra_args: Vec<String>,
}

impl ProcessEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            program: config.program.clone(),
            extra_args: config.extra_args.clone(),
        }
    }

    /// Full argument list for one invocation.
    pub fn command_args(
        &self,
        template: &Path,
        output_stem: &Path,
        options: &InvocationOptions,
    ) -> Vec<OsString> {
        let conn = options.connection();
        let mut args: Vec<OsString> = self.extra_args.iter().map(OsString::from).collect();

        args.push("process".into());
        args.push(template.into());
        args.push("-o".into());
        args.push(output_stem.into());
        args.push("-f".into());
        args.extend(options.formats().iter().map(|f| OsString::from(f.extension())));

        args.push("-t".into());
        args.push(conn.driver_kind().into());
        args.push("-H".into());
        args.push(conn.host().into());
        args.push("--db-port".into());
        args.push(conn.port().to_string().into());
        args.push("-n".into());
        args.push(conn.database().into());
        args.push("-u".into());
        args.push(conn.username().into());
        if !conn.password().is_empty() {
            args.push("-p".into());
            args.push(conn.password().into());
        }
        args.push("--db-driver".into());
        args.push(conn.driver_class().into());
        args.push("--db-url".into());
        args.push(conn.connection_url().into());
        args.push("--jdbc-dir".into());
        args.push(conn.driver_dir().into());

        if let Some(resources) = options.resources() {
            args.push("-r".into());
            args.push(resources.into());
        }
        args.push("--locale".into());
        args.push(options.locale().into());

        // -P takes every remaining argument, so it goes last.
        if !options.params().is_empty() {
            args.push("-P".into());
            args.extend(
                options
                    .params()
                    .iter()
                    .map(|(key, value)| OsString::from(format!("{}={}", key, value))),
            );
        }

        args
    }
}

impl RenderEngine for ProcessEngine {
    fn name(&self) -> &str {
        &self.program
    }

    fn process(
        &self,
        template: &Path,
        output_stem: &Path,
        options: &InvocationOptions,
    ) -> std::result::Result<String, EngineError> {
        if let Some(key) = options.params().invalid_key() {
            return Err(EngineError::Engine(format!("invalid parameter name '{}'", key)));
        }
        let output = Command::new(&self.program)
            .args(self.command_args(template, output_stem, options))
            .output()
            .map_err(|source| EngineError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stderr);
        }

        if !output.status.success() {
            return Err(EngineError::Exited {
                code: output.status.code(),
                output: text.trim().to_string(),
            });
        }
        Ok(text)
    }
}
