//! Shared fixtures for the pipeline integration tests.
#![allow(dead_code)]

use reportd_core::{
    EngineError, GeneratedArtifact, InvocationOptions, RenderContext, ReportConfig,
};
use reportd_engine::{
    artifact_path, ensure_directories, generate_report, RenderEngine, ReportRequest,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Storage root with bootstrapped directories and an installed driver.
pub struct Fixture {
    pub dir: TempDir,
    pub config: ReportConfig,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ReportConfig::with_storage_root(dir.path().join("reports"));
        config.driver.dir = dir.path().join("jdbc");
        ensure_directories(&config).unwrap();
        std::fs::create_dir_all(&config.driver.dir).unwrap();
        std::fs::write(config.driver.dir.join(&config.driver.expected_file), b"jar").unwrap();
        Self { dir, config }
    }

    pub fn with_template(self, name: &str) -> Self {
        let path = self
            .config
            .reports_dir
            .join(format!("{}.{}", name, self.config.template_extension));
        std::fs::write(path, "<jasperReport/>").unwrap();
        self
    }

    /// Run the pipeline with a fresh context.
    pub fn generate(
        &self,
        engine: &dyn RenderEngine,
        request: &ReportRequest,
    ) -> reportd_core::Result<GeneratedArtifact> {
        generate_report(&self.config, engine, request, &RenderContext::new("test"))
    }

    pub fn temp_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.config.temp_dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        files.sort();
        files
    }
}

/// What the fake engine does when invoked.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Write the artifact and return this status text.
    Write(&'static str),
    /// Return this status text without writing anything.
    Silent(&'static str),
    /// Fail as an unreachable or broken engine would.
    Fail,
}

pub struct FakeEngine {
    behavior: Behavior,
    pub calls: Mutex<Vec<Call>>,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub template: PathBuf,
    pub stem: PathBuf,
    pub options: InvocationOptions,
}

impl FakeEngine {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Call {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

impl RenderEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn process(
        &self,
        template: &Path,
        output_stem: &Path,
        options: &InvocationOptions,
    ) -> Result<String, EngineError> {
        self.calls.lock().unwrap().push(Call {
            template: template.to_path_buf(),
            stem: output_stem.to_path_buf(),
            options: options.clone(),
        });
        match &self.behavior {
            Behavior::Write(status) => {
                let path = artifact_path(output_stem, options.format());
                std::fs::write(path, b"%PDF-1.7 report").unwrap();
                Ok(status.to_string())
            }
            Behavior::Silent(status) => Ok(status.to_string()),
            Behavior::Fail => Err(EngineError::Engine("cannot connect to database".to_string())),
        }
    }
}
