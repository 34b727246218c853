// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod api;
pub mod config;
pub mod history;
pub mod logging;
pub mod metrics;
pub mod pagination;
pub mod sentiment;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{PipelineError, SentimentPipeline};
pub use crate::api::{router, AppState};
pub use crate::history::{HistoryRecord, HistoryStore, StorageError};
pub use crate::sentiment::{AnalysisResult, SentimentLabel};

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tracing::{info, warn};

use crate::config::AppConfig;

/// Wire the full application from an explicit config: process-wide pipeline,
/// history store, optional `/metrics`.
pub fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let pipeline = SentimentPipeline::install(cfg.pipeline.clone());
    let store = HistoryStore::open(&cfg.store.database_path).with_context(|| {
        format!(
            "opening history store at {}",
            cfg.store.database_path.display()
        )
    })?;

    let metrics = if cfg.metrics.enabled {
        match crate::metrics::Metrics::init(cfg.history.per_page) {
            Ok(m) => Some(m),
            Err(e) => {
                warn!(error = %e, "metrics disabled");
                None
            }
        }
    } else {
        None
    };

    let state = AppState::new(pipeline, Arc::new(store), cfg.history.clone());
    info!(
        db = %cfg.store.database_path.display(),
        per_page = cfg.history.per_page,
        persist_invalid = cfg.history.persist_invalid,
        "application wired"
    );
    Ok(router(state, metrics.as_ref()))
}

/// Same as [`build_app`] with config from `$SENTIMENT_CONFIG_PATH` /
/// `config/app.toml` / defaults, plus env overrides.
pub fn app() -> anyhow::Result<Router> {
    let cfg = AppConfig::load_default()?;
    build_app(&cfg)
}
