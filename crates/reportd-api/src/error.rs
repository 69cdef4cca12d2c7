//! JSON error envelope returned by every failing endpoint.
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reportd_core::ReportError;
use serde_json::json;

const HIDDEN_DETAIL: &str = "An error occurred";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub error: String,
}

impl ApiError {
    /// Request failed validation before reaching the pipeline.
    pub fn validation(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "The given data was invalid".to_string(),
            error: detail.into(),
        }
    }

    /// Pipeline failure; details are exposed only in debug mode.
    pub fn report(message: &str, err: &ReportError, debug: bool) -> Self {
        let status = match err {
            ReportError::InvalidReportName(_) => StatusCode::BAD_REQUEST,
            ReportError::TemplateNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: message.to_string(),
            error: if debug { err.to_string() } else { HIDDEN_DETAIL.to_string() },
        }
    }

    pub fn internal(message: &str, detail: impl Into<String>, debug: bool) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
            error: if debug { detail.into() } else { HIDDEN_DETAIL.to_string() },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "success": false,
                "message": self.message,
                "error": self.error,
            })),
        )
            .into_response()
    }
}
