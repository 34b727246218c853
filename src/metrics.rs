use axum::{routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::analyze::PipelineError;
use crate::sentiment::{AnalysisResult, SentimentLabel};

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder (once per process) and publish static gauges.
    pub fn init(per_page: u32) -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| PrometheusBuilder::new().install_recorder())
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?
            .clone();

        gauge!("history_page_size").set(per_page as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// Outcome label for one `analyze` call.
pub fn outcome_label(res: &Result<AnalysisResult, PipelineError>) -> &'static str {
    match res {
        Ok(r) => match r.sentiment {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Invalid => "invalid",
        },
        Err(PipelineError::InvalidInput(_)) => "rejected",
        Err(PipelineError::InternalFailure { .. }) => "failed",
    }
}

pub fn record_analysis(outcome: &'static str, elapsed_ms: f64) {
    counter!("sentiment_analyze_total", "outcome" => outcome).increment(1);
    histogram!("sentiment_analyze_duration_ms").record(elapsed_ms);
}

pub fn record_insert(ok: bool) {
    let status = if ok { "ok" } else { "error" };
    counter!("history_insert_total", "status" => status).increment(1);
}
