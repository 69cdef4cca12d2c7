//! Data-source connection probe.
//!
//! Renders a throwaway template whose only query is `SELECT 1` against the
//! configured connection, then removes both the template and its output.

use handlebars::Handlebars;
use reportd_core::{
    EngineError, InvocationOptions, OutputFormat, RenderContext, ReportConfig, ReportError,
    ReportName, ReportParameters, ReportTemplate, Result,
};
use serde::Serialize;
use serde_json::json;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

use crate::connection::build_connection;
use crate::pipeline::output_stem;
use crate::renderer::{artifact_path, invoke, RenderEngine};
use crate::verifier::verify;

const PROBE_NAME: &str = "connection_test";
const PROBE_QUERY: &str = "SELECT 1 as test";

const PROBE_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<jasperReport xmlns="http://jasperreports.sourceforge.net/jasperreports"
              xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
              xsi:schemaLocation="http://jasperreports.sourceforge.net/jasperreports http://jasperreports.sourceforge.net/xsd/jasperreport.xsd"
              name="{{name}}" pageWidth="595" pageHeight="842"
              columnWidth="555" leftMargin="20" rightMargin="20"
              topMargin="20" bottomMargin="20">
    <queryString>
        <![CDATA[{{{query}}}]]>
    </queryString>
    <field name="test" class="java.lang.Integer"/>
    <title>
        <band height="50">
            <staticText>
                <reportElement x="0" y="0" width="200" height="30"/>
                <text><![CDATA[{{title}}]]></text>
            </staticText>
        </band>
    </title>
</jasperReport>
"#;

/// Where the probe connected.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionReport {
    pub host: String,
    pub port: u16,
    pub database: String,
}

/// Probe template source.
pub fn probe_template() -> std::result::Result<String, EngineError> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars
        .register_template_string(PROBE_NAME, PROBE_TEMPLATE)
        .map_err(|e| EngineError::Engine(format!("probe template: {}", e)))?;
    handlebars
        .render(
            PROBE_NAME,
            &json!({
                "name": PROBE_NAME,
                "query": PROBE_QUERY,
                "title": "Connection Test Report",
            }),
        )
        .map_err(|e| EngineError::Engine(format!("probe template: {}", e)))
}

/// Check that the engine can reach the database with the current config.
pub fn test_connection(
    config: &ReportConfig,
    engine: &dyn RenderEngine,
    ctx: &RenderContext,
) -> Result<ConnectionReport> {
    let _span = ctx.span().entered();

    let connection = build_connection(config)?;
    let report = ConnectionReport {
        host: connection.host().to_string(),
        port: connection.port(),
        database: connection.database().to_string(),
    };

    let name = ReportName::new(PROBE_NAME)?;
    let stem = output_stem(&config.temp_dir, &name, ctx);
    let template = ReportTemplate {
        name: name.clone(),
        path: stem.with_extension(&config.template_extension),
    };

    let source = probe_template().map_err(|source| ReportError::RenderFailed {
        template: template.path.clone(),
        source,
    })?;
    std::fs::write(&template.path, source).map_err(|e| ReportError::io(&template.path, e))?;

    let options = InvocationOptions::new(
        OutputFormat::Pdf,
        config.locale.clone(),
        ReportParameters::new(),
        None,
        connection,
    );
    let outcome = invoke(engine, &template, &stem, &options)
        .and_then(|path| verify(&path, &name, OutputFormat::Pdf));

    remove_quietly(&template.path);
    remove_quietly(&artifact_path(&stem, OutputFormat::Pdf));

    outcome?;
    info!(host = %report.host, database = %report.database, "database connection successful");
    Ok(report)
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => debug!(file = %path.display(), error = %e, "probe cleanup failed"),
    }
}
