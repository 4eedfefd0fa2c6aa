// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod metrics;
pub mod prices;
pub mod profile;
pub mod resolve;
pub mod schemes;
pub mod voice;

use axum::Router;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;

pub const ENV_LOG_JSON: &str = "KISAN_LOG_JSON";

/// Install the global subscriber. `RUST_LOG` wins over the built-in filter;
/// `KISAN_LOG_JSON=1` switches to JSON lines. Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("kisan_mitra=info,resolve=info,warn"));

    let json = std::env::var(ENV_LOG_JSON).is_ok_and(|v| v == "1");
    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

/// Full application: tool routes plus `/metrics`.
pub fn app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let metrics = metrics::Metrics::init(cfg.speech.confidence_threshold)?;
    let state = AppState::from_config(cfg)?;
    Ok(router(state).merge(metrics.router()))
}
