//! reportd engine: template-driven report generation
//!
//! Resolves a named template, assembles the invocation options (format,
//! locale, parameters, optional support resource, database connection),
//! drives an external rendering engine and verifies the artifact it wrote.
//!
//! # Example
//!
//! ```no_run
//! use reportd_core::{OutputFormat, RenderContext, ReportConfig, ReportName, ReportParameters};
//! use reportd_engine::{generate_report, ProcessEngine, ReportRequest};
//!
//! let config = ReportConfig::from_env().unwrap();
//! let engine = ProcessEngine::from_config(&config.engine);
//! let request = ReportRequest::new(
//!     ReportName::new("gross_with_vat").unwrap(),
//!     ReportParameters::new()
//!         .with("from", "2024-01-01")
//!         .with("to", "2024-01-31")
//!         .with("xcus", "ACME"),
//!     OutputFormat::Pdf,
//! );
//!
//! let artifact = generate_report(&config, &engine, &request, &RenderContext::new("cli")).unwrap();
//! println!("{}", artifact.path.display());
//! ```

pub mod connection;
pub mod housekeeping;
pub mod options;
pub mod pipeline;
pub mod probe;
pub mod renderer;
pub mod templates;
pub mod verifier;

pub use connection::{build_connection, locate_driver};
pub use housekeeping::{ensure_directories, sweep_temp, sweep_temp_at, SweepReport};
pub use options::build_options;
pub use pipeline::{generate_report, output_stem, ReportRequest};
pub use probe::{test_connection, ConnectionReport};
pub use renderer::{artifact_path, invoke, ProcessEngine, RenderEngine};
pub use templates::{list_templates, resolve, TemplateSummary};
pub use verifier::verify;
