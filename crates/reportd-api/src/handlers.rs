//! API Handlers
//!
//! Each handler validates its payload, runs one blocking pipeline call on
//! the blocking pool and shapes the result into a file or JSON response.
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use reportd_core::{
    GeneratedArtifact, OutputFormat, ParamValue, RenderContext, ReportError, ReportName,
    ReportParameters, REPORTD_VERSION,
};
use reportd_engine::{generate_report, list_templates, sweep_temp, test_connection, ReportRequest};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{error, warn};

use crate::error::ApiError;
use crate::AppState;

const GROSS_WITH_VAT: &str = "gross_with_vat";

// ============================================================================
// Request payloads
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GrossWithVatRequest {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub customer_id: String,
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Deserialize)]
pub struct ViewRequest {
    pub report_name: ReportName,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    #[serde(default)]
    pub customer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CustomRequest {
    pub report_name: ReportName,
    #[serde(default)]
    pub format: Option<OutputFormat>,
    /// Null values are dropped before the engine sees them.
    #[serde(default)]
    pub params: Option<BTreeMap<String, Option<ParamValue>>>,
}

impl CustomRequest {
    fn parameters(&mut self) -> Result<ReportParameters, ApiError> {
        let params: ReportParameters = self
            .params
            .take()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect();
        if let Some(key) = params.invalid_key() {
            return Err(ApiError::validation(format!(
                "The parameter name '{}' must match [A-Za-z_][A-Za-z0-9_]*",
                key
            )));
        }
        Ok(params)
    }
}

fn check_date_range(from: NaiveDate, to: NaiveDate) -> Result<(), ApiError> {
    if to <= from {
        return Err(ApiError::validation("The to_date must be a date after from_date"));
    }
    Ok(())
}

fn date_range_params(from: NaiveDate, to: NaiveDate, customer: Option<String>) -> ReportParameters {
    let mut params = ReportParameters::new().with("from", from).with("to", to);
    if let Some(customer) = customer {
        params.insert("xcus", customer);
    }
    params
}

// ============================================================================
// Report endpoints
// ============================================================================

pub async fn gross_with_vat(
    State(state): State<AppState>,
    payload: Result<Json<GrossWithVatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    check_date_range(payload.from_date, payload.to_date)?;
    if payload.customer_id.trim().is_empty() {
        return Err(ApiError::validation("The customer_id field is required"));
    }

    let name = ReportName::new(GROSS_WITH_VAT)
        .map_err(|e| failure(&state, "Failed to generate report", e))?;
    let request = ReportRequest::new(
        name,
        date_range_params(payload.from_date, payload.to_date, Some(payload.customer_id)),
        payload.format.unwrap_or_default(),
    );
    let artifact = render(&state, request, GROSS_WITH_VAT, "Failed to generate report").await?;
    download(&state, artifact).await
}

pub async fn view(
    State(state): State<AppState>,
    payload: Result<Json<ViewRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    check_date_range(payload.from_date, payload.to_date)?;

    let customer = payload.customer_id.filter(|c| !c.trim().is_empty());
    let request = ReportRequest::new(
        payload.report_name,
        date_range_params(payload.from_date, payload.to_date, customer),
        OutputFormat::Pdf,
    );
    let artifact = render(&state, request, "view", "Failed to view report").await?;
    inline(&state, artifact).await
}

pub async fn custom(
    State(state): State<AppState>,
    payload: Result<Json<CustomRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(mut payload) = payload?;

    let params = payload.parameters()?;
    let request = ReportRequest::new(
        payload.report_name,
        params,
        payload.format.unwrap_or_default(),
    );
    let artifact = render(&state, request, "custom", "Failed to generate custom report").await?;
    download(&state, artifact).await
}

// ============================================================================
// Housekeeping endpoints
// ============================================================================

pub async fn list_reports(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let config = state.config.clone();
    let listing = blocking(&state, move || list_templates(&config)).await?;

    match listing {
        Ok(reports) => Ok(Json(json!({ "success": true, "reports": reports }))),
        Err(e) => Err(failure(&state, "Failed to retrieve reports list", e)),
    }
}

pub async fn cleanup(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let config = state.config.clone();
    let swept = blocking(&state, move || sweep_temp(&config.temp_dir, config.retention())).await?;

    match swept {
        Ok(report) => {
            state.metrics.files_swept(report.deleted);
            Ok(Json(json!({
                "success": true,
                "message": format!("Cleaned up {} temporary files", report.deleted),
                "deleted": report.deleted,
                "retained": report.retained,
                "freed_bytes": report.freed_bytes,
            })))
        }
        Err(e) => Err(failure(&state, "Cleanup failed", e)),
    }
}

pub async fn connection_test(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let config = state.config.clone();
    let engine = state.engine.clone();
    let ctx = RenderContext::new("connection_test");
    let probed = blocking(&state, move || test_connection(&config, engine.as_ref(), &ctx)).await?;

    match probed {
        Ok(report) => Ok(Json(json!({
            "success": true,
            "message": "Database connection successful",
            "config": {
                "host": report.host,
                "port": report.port,
                "database": report.database,
            },
        }))),
        Err(e) => Err(failure(&state, "Database connection failed", e)),
    }
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok", "version": REPORTD_VERSION })))
}

pub async fn metrics(State(state): State<AppState>) -> Result<String, ApiError> {
    state
        .metrics
        .encode()
        .map_err(|e| {
            ApiError::internal("Failed to encode metrics", e.to_string(), state.config.server.debug)
        })
}

// ============================================================================
// Helpers
// ============================================================================

async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!(error = %e, "blocking report task failed");
        ApiError::internal("Worker task failed", e.to_string(), state.config.server.debug)
    })
}

fn failure(state: &AppState, message: &str, err: ReportError) -> ApiError {
    error!(code = err.code(), error = %err, "{}", message);
    state.metrics.report_failed(err.code());
    ApiError::report(message, &err, state.config.server.debug)
}

async fn render(
    state: &AppState,
    request: ReportRequest,
    origin: &'static str,
    message: &str,
) -> Result<GeneratedArtifact, ApiError> {
    let config = state.config.clone();
    let engine = state.engine.clone();
    let ctx = RenderContext::new(origin);

    let generated =
        blocking(state, move || generate_report(&config, engine.as_ref(), &request, &ctx)).await?;
    match generated {
        Ok(artifact) => {
            state
                .metrics
                .report_generated(artifact.report.as_str(), artifact.format.extension());
            Ok(artifact)
        }
        Err(e) => Err(failure(state, message, e)),
    }
}

async fn read_artifact(
    state: &AppState,
    artifact: &GeneratedArtifact,
) -> Result<Vec<u8>, ApiError> {
    tokio::fs::read(&artifact.path).await.map_err(|e| {
        let err = ReportError::io(&artifact.path, e);
        failure(state, "Failed to read generated report", err)
    })
}

/// Attachment response; the file is deleted once read.
async fn download(state: &AppState, artifact: GeneratedArtifact) -> Result<Response, ApiError> {
    let bytes = read_artifact(state, &artifact).await?;
    if let Err(e) = tokio::fs::remove_file(&artifact.path).await {
        warn!(file = %artifact.path.display(), error = %e, "failed to delete served report");
    }
    Ok(file_response(&artifact, bytes, "attachment"))
}

/// Inline response; the file is left for the temp sweep.
async fn inline(state: &AppState, artifact: GeneratedArtifact) -> Result<Response, ApiError> {
    let bytes = read_artifact(state, &artifact).await?;
    Ok(file_response(&artifact, bytes, "inline"))
}

fn file_response(artifact: &GeneratedArtifact, bytes: Vec<u8>, disposition: &str) -> Response {
    let disposition = format!("{}; filename=\"{}\"", disposition, artifact.file_name());
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, artifact.format.mime_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(bytes),
    )
        .into_response()
}
