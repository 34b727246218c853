//! Thin HTTP adapter over the pipeline and the history store.
//!
//! Routes:
//! - `GET  /health`
//! - `POST /analyze`  `{ "text": "..." }`
//! - `GET  /history?page=&per_page=`
//! - `GET  /metrics`  (only when a [`Metrics`] handle is attached)
//!
//! Persistence policy: a result is stored only when the pipeline reached
//! `Done` and the label is not INVALID, unless `persist_invalid` is set.
//! Rejected and failed requests are never stored.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

use crate::analyze::{PipelineError, SentimentPipeline, COULD_NOT_PROCESS};
use crate::config::HistoryConfig;
use crate::history::{HistoryRecord, HistoryStore, StorageError};
use crate::metrics::{self, Metrics};
use crate::pagination::{PageNav, PageQuery};
use crate::sentiment::{AnalysisResult, SentimentLabel};

pub const HISTORY_UNAVAILABLE: &str = "Chưa có lịch sử phân tích nào.";
pub const SAVE_FAILED: &str = "Không lưu được kết quả, thử lại sau.";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: &'static SentimentPipeline,
    pub store: Arc<HistoryStore>,
    pub history: HistoryConfig,
}

impl AppState {
    pub fn new(
        pipeline: &'static SentimentPipeline,
        store: Arc<HistoryStore>,
        history: HistoryConfig,
    ) -> Self {
        Self {
            pipeline,
            store,
            history,
        }
    }

    /// Whether a finished analysis should be written to history.
    pub fn should_persist(&self, res: &AnalysisResult) -> bool {
        !res.sentiment.is_invalid() || self.history.persist_invalid
    }
}

pub fn router(state: AppState, metrics: Option<&Metrics>) -> Router {
    let mut app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/analyze", post(analyze))
        .route("/history", get(history))
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    if let Some(m) = metrics {
        app = app.merge(m.router());
    }
    app
}

#[derive(Deserialize)]
struct AnalyzeReq {
    text: String,
}

#[derive(Serialize)]
struct AnalyzeResp {
    text: String,
    sentiment: SentimentLabel,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    record_id: Option<i64>,
}

#[derive(Serialize)]
struct ErrorResp {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

fn error_response(status: StatusCode, error: &'static str, reason: Option<String>) -> Response {
    (status, Json(ErrorResp { error, reason })).into_response()
}

async fn analyze(State(state): State<AppState>, Json(body): Json<AnalyzeReq>) -> Response {
    let started = Instant::now();
    let pipeline = state.pipeline;
    let outcome = tokio::task::spawn_blocking(move || pipeline.analyze(&body.text))
        .await
        .unwrap_or_else(|e| {
            Err(PipelineError::InternalFailure {
                stage: crate::analyze::Stage::Received,
                cause: format!("analysis task aborted: {e}"),
            })
        });
    metrics::record_analysis(
        metrics::outcome_label(&outcome),
        started.elapsed().as_secs_f64() * 1000.0,
    );

    let res = match outcome {
        Ok(res) => res,
        Err(PipelineError::InvalidInput(r)) => {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                r.user_message(),
                Some(r.to_string()),
            );
        }
        // cause already logged by the pipeline; never echoed to the user
        Err(PipelineError::InternalFailure { .. }) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, COULD_NOT_PROCESS, None);
        }
    };

    let message = res.sentiment.is_invalid().then_some(COULD_NOT_PROCESS);

    let mut record_id = None;
    if state.should_persist(&res) {
        match persist(&state, &res).await {
            Ok(id) => record_id = Some(id),
            Err(e) => {
                error!(error = %e, "history write failed");
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, SAVE_FAILED, None);
            }
        }
    }

    Json(AnalyzeResp {
        saved: record_id.is_some(),
        text: res.text,
        sentiment: res.sentiment,
        message,
        record_id,
    })
    .into_response()
}

async fn persist(state: &AppState, res: &AnalysisResult) -> Result<i64, StorageError> {
    let store = state.store.clone();
    let text = res.text.clone();
    let label = res.sentiment;
    let out = tokio::task::spawn_blocking(move || store.insert(&text, label))
        .await
        .unwrap_or_else(|e| Err(StorageError::Unavailable(format!("insert task aborted: {e}"))));
    metrics::record_insert(out.is_ok());
    out
}

#[derive(Deserialize)]
struct HistoryParams {
    page: Option<u32>,
    per_page: Option<u32>,
}

#[derive(Serialize)]
struct HistoryResp {
    available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    rows: Vec<HistoryRecord>,
    page: u32,
    per_page: u32,
    total_pages: u32,
    total_count: u64,
    nav: PageNav,
}

async fn history(State(state): State<AppState>, Query(q): Query<HistoryParams>) -> Json<HistoryResp> {
    let query = PageQuery::new(
        q.page.unwrap_or(1),
        q.per_page.unwrap_or(state.history.per_page),
    );
    let store = state.store.clone();
    let result = tokio::task::spawn_blocking(move || store.page(query))
        .await
        .unwrap_or_else(|e| Err(StorageError::Unavailable(format!("read task aborted: {e}"))));

    match result {
        Ok(p) => Json(HistoryResp {
            available: true,
            message: p.rows.is_empty().then_some(HISTORY_UNAVAILABLE),
            rows: p.rows,
            page: p.page,
            per_page: p.per_page,
            total_pages: p.total_pages,
            total_count: p.total_count,
            nav: p.nav,
        }),
        // read path degrades instead of failing the whole interface
        Err(e) => {
            warn!(error = %e, "history read failed");
            Json(HistoryResp {
                available: false,
                message: Some(HISTORY_UNAVAILABLE),
                rows: Vec::new(),
                page: 1,
                per_page: query.per_page,
                total_pages: 1,
                total_count: 0,
                nav: PageNav::new(1, 1),
            })
        }
    }
}
