//! Vietnamese Sentiment Service — Binary Entrypoint
//! Boots the Axum HTTP server with the shared pipeline and history store.

use shuttle_axum::ShuttleAxum;
use vi_sentiment_assistant::{build_app, config::AppConfig, logging};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    logging::init_tracing();

    let cfg = AppConfig::load_default()?;
    let router = build_app(&cfg)?;

    Ok(router.into())
}
