//! Report generation pipeline.
//!
//! ```text
//! name ─→ resolve template ─┐
//!                           ├─→ invoke engine ─→ verify artifact ─→ GeneratedArtifact
//! format, params ─→ options ┘
//! ```
//!
//! Every step fails fast. Partial output left by a failed run is not
//! removed here; the temp sweep collects it.

use reportd_core::{
    GeneratedArtifact, OutputFormat, RenderContext, ReportConfig, ReportName, ReportParameters,
    Result,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::options::build_options;
use crate::renderer::{invoke, RenderEngine};
use crate::templates::resolve;
use crate::verifier::verify;

/// One report to generate.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
    pub name: ReportName,
    #[serde(default)]
    pub params: ReportParameters,
    #[serde(default)]
    pub format: OutputFormat,
}

impl ReportRequest {
    pub fn new(name: ReportName, params: ReportParameters, format: OutputFormat) -> Self {
        Self {
            name,
            params,
            format,
        }
    }
}

/// Output stem `<temp_dir>/<name>_<YYYYmmddHHMMSS>_<suffix>`.
///
/// The random suffix keeps two same-second runs of one report apart.
pub fn output_stem(temp_dir: &Path, name: &ReportName, ctx: &RenderContext) -> PathBuf {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    temp_dir.join(format!("{}_{}_{}", name, ctx.stamp(), &suffix[..8]))
}

/// Generate a report and return the verified artifact.
///
/// Blocks for as long as the engine runs. The caller owns the returned
/// file and may delete it once served.
pub fn generate_report(
    config: &ReportConfig,
    engine: &dyn RenderEngine,
    request: &ReportRequest,
    ctx: &RenderContext,
) -> Result<GeneratedArtifact> {
    let _span = ctx.span().entered();

    let template = resolve(config, &request.name)?;
    let options = build_options(config, request.format, request.params.clone())?;
    let stem = output_stem(&config.temp_dir, &request.name, ctx);

    let expected = invoke(engine, &template, &stem, &options)?;
    let artifact = verify(&expected, &request.name, request.format)?;

    info!(
        report = %request.name,
        path = %artifact.path.display(),
        size_bytes = artifact.size_bytes,
        "report generated successfully"
    );
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_differ_within_one_second() {
        let ctx = RenderContext::new("test");
        let name = ReportName::new("gross_with_vat").unwrap();
        let a = output_stem(Path::new("/tmp"), &name, &ctx);
        let b = output_stem(Path::new("/tmp"), &name, &ctx);
        assert_ne!(a, b);

        let file = a.file_name().unwrap().to_str().unwrap().to_string();
        assert!(file.starts_with(&format!("gross_with_vat_{}_", ctx.stamp())));
        assert_eq!(file.len(), "gross_with_vat_".len() + 14 + 1 + 8);
    }

    #[test]
    fn request_defaults_to_pdf() {
        let request: ReportRequest = serde_json::from_str(r#"{"name": "sales"}"#).unwrap();
        assert_eq!(request.format, OutputFormat::Pdf);
        assert!(request.params.is_empty());
    }
}
