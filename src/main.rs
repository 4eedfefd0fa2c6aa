//! Kisan Mitra tool service. Binary entrypoint.
//! Boots the Axum HTTP server with prices, schemes and voice routes.
//!
//! See `README.md` for configuration.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use tracing::info;

use kisan_mitra::{app, init_tracing, AppConfig};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = AppConfig::load_default().context("loading configuration")?;
    info!(
        profile = %cfg.profile_path.display(),
        threshold = cfg.speech.confidence_threshold,
        speech_configured = !cfg.speech.api_key.is_empty(),
        tts_configured = !cfg.tts.api_key.is_empty(),
        "configuration loaded"
    );

    let router = app(&cfg)?;
    Ok(router.into())
}
