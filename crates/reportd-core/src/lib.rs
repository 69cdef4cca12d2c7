//! reportd core: data model, error taxonomy and configuration
//!
//! Shared by the rendering pipeline and the HTTP boundary. Every value here
//! is built fresh per request; nothing is cached across invocations.

pub mod config;
pub mod context;
pub mod data_model;
pub mod error;

pub use config::{DatabaseConfig, DriverConfig, EngineConfig, ReportConfig, ServerConfig};
pub use context::RenderContext;
pub use data_model::{
    ConnectionDescriptor, GeneratedArtifact, InvocationOptions, OutputFormat, ParamValue,
    ReportName, ReportParameters, ReportTemplate,
};
pub use error::{ConfigError, EngineError, ReportError, Result};

/// Service version reported by the health endpoint.
pub const REPORTD_VERSION: &str = env!("CARGO_PKG_VERSION");
