//! Request Context: correlation data carried through one report invocation
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct RenderContext {
    pub trace_id: String,
    pub started_at: DateTime<Utc>,
    /// Entry point that requested the render (e.g. "download", "view").
    pub origin: String,
}

impl RenderContext {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            origin: origin.into(),
        }
    }

    /// Tracing span tagging everything logged for this invocation.
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!("report", trace_id = %self.trace_id, origin = %self.origin)
    }

    /// Start time at second granularity, as used in output file stems.
    pub fn stamp(&self) -> String {
        self.started_at.format("%Y%m%d%H%M%S").to_string()
    }
}
