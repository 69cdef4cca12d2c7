//! Prometheus counters for report generation, exposed at `/metrics`.
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub struct ReportMetrics {
    registry: Registry,
    generated: IntCounterVec,
    failures: IntCounterVec,
    swept: IntCounter,
}

impl ReportMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let generated = IntCounterVec::new(
            Opts::new("reportd_reports_generated_total", "Reports generated and verified"),
            &["report", "format"],
        )?;
        let failures = IntCounterVec::new(
            Opts::new(
                "reportd_report_failures_total",
                "Report operations that failed, by error code",
            ),
            &["code"],
        )?;
        let swept = IntCounter::new(
            "reportd_temp_files_swept_total",
            "Expired temp artifacts deleted",
        )?;

        registry.register(Box::new(generated.clone()))?;
        registry.register(Box::new(failures.clone()))?;
        registry.register(Box::new(swept.clone()))?;

        Ok(Self {
            registry,
            generated,
            failures,
            swept,
        })
    }

    pub fn report_generated(&self, report: &str, format: &str) {
        self.generated.with_label_values(&[report, format]).inc();
    }

    pub fn report_failed(&self, code: &str) {
        self.failures.with_label_values(&[code]).inc();
    }

    pub fn files_swept(&self, count: usize) {
        self.swept.inc_by(count as u64);
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
