use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::config::AppConfig;
use crate::prices::{CommodityReport, PriceError, PriceReport, PriceService};
use crate::profile::{
    self, ContextProvider, ContextSummary, FarmerContext, FileContextProvider, ProfileError,
    SeasonalReport,
};
use crate::resolve::{AttemptError, Provenance, ResolveError};
use crate::schemes::{
    self, CatalogListing, EligibilityRegistry, Scheme, SchemeError, SchemeReport,
};
use crate::voice::{
    language_code, voice_status, SynthesisError, Transcriber, VoiceStatus, VoiceSynthesizer,
};

#[derive(Clone)]
pub struct AppState {
    pub prices: Arc<PriceService>,
    pub transcriber: Arc<Transcriber>,
    pub synthesizer: Arc<VoiceSynthesizer>,
    pub context: Arc<dyn ContextProvider>,
    pub registry: Arc<EligibilityRegistry>,
    pub schemes_path: PathBuf,
}

impl AppState {
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            prices: Arc::new(PriceService::from_config(&cfg.prices)?),
            transcriber: Arc::new(Transcriber::from_config(&cfg.speech)?),
            synthesizer: Arc::new(VoiceSynthesizer::from_config(&cfg.tts)?),
            context: Arc::new(FileContextProvider::new(cfg.profile_path.clone())),
            registry: Arc::new(EligibilityRegistry::default()),
            schemes_path: cfg.schemes_path.clone(),
        })
    }

    fn farmer(&self) -> Result<FarmerContext, ApiError> {
        Ok(self.context.farmer_context()?)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/prices", get(farmer_prices))
        .route("/prices/date/{date}", get(prices_for_date))
        .route("/prices/commodity/{name}", get(commodity_price))
        .route("/farmer/summary", get(farmer_summary))
        .route("/farmer/seasonal", get(seasonal))
        .route("/schemes", get(recommended_schemes))
        .route("/schemes/all", get(all_schemes))
        .route("/schemes/{name}", get(scheme_details))
        .route("/voice/transcribe", post(transcribe))
        .route("/voice/synthesize", post(synthesize))
        .route("/voice/status", get(status))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Tool-facing failure. Rendered as `{ "status": "error", "error_message": ... }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Price(#[from] PriceError),

    #[error(transparent)]
    Scheme(#[from] SchemeError),

    #[error(transparent)]
    Transcription(#[from] ResolveError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
}

fn resolve_status(e: &ResolveError) -> StatusCode {
    match e {
        ResolveError::NoResult { .. } | ResolveError::NoTranscript { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ResolveError::Attempt(AttemptError::EmptyPayload | AttemptError::Invalid(_)) => {
            StatusCode::BAD_REQUEST
        }
        ResolveError::Attempt(_) => StatusCode::BAD_GATEWAY,
        ResolveError::Configuration(_) | ResolveError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Profile(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Price(PriceError::InvalidDate(_) | PriceError::UnknownCommodity(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Price(PriceError::Resolve(e)) => resolve_status(e),
            ApiError::Scheme(SchemeError::UnknownScheme(_)) => StatusCode::NOT_FOUND,
            ApiError::Scheme(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Transcription(e) => resolve_status(e),
            ApiError::Synthesis(SynthesisError::EmptyText) => StatusCode::BAD_REQUEST,
            ApiError::Synthesis(SynthesisError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Synthesis(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!(error = %self, %status, "request failed");
        }
        let body = json!({ "status": "error", "error_message": self.to_string() });
        (status, Json(body)).into_response()
    }
}

async fn farmer_prices(State(state): State<AppState>) -> Result<Json<PriceReport>, ApiError> {
    let farmer = state.farmer()?;
    let today = Local::now().date_naive();
    Ok(Json(state.prices.farmer_prices(&farmer, today).await?))
}

async fn prices_for_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<PriceReport>, ApiError> {
    let farmer = state.farmer()?;
    Ok(Json(state.prices.prices_for_date(&farmer, &date).await?))
}

async fn commodity_price(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CommodityReport>, ApiError> {
    let farmer = state.farmer()?;
    let today = Local::now().date_naive();
    Ok(Json(state.prices.commodity_price(&farmer, &name, today).await?))
}

async fn farmer_summary(State(state): State<AppState>) -> Result<Json<ContextSummary>, ApiError> {
    Ok(Json(profile::context_summary(&state.farmer()?)))
}

#[derive(Deserialize)]
struct SeasonalParams {
    month: Option<u32>,
}

/// Current month unless `?month=1..12` is given.
async fn seasonal(
    State(state): State<AppState>,
    Query(params): Query<SeasonalParams>,
) -> Result<Json<SeasonalReport>, ApiError> {
    let month = match params.month {
        Some(m @ 1..=12) => m,
        Some(m) => return Err(ApiError::BadRequest(format!("month must be 1-12, got {m}"))),
        None => Local::now().month(),
    };
    let farmer = state.farmer()?;
    Ok(Json(profile::seasonal_recommendations(&farmer, month)))
}

async fn all_schemes(State(state): State<AppState>) -> Result<Json<CatalogListing>, ApiError> {
    let catalog = schemes::load_catalog(&state.schemes_path)?;
    Ok(Json(schemes::list_catalog(&catalog)))
}

async fn recommended_schemes(State(state): State<AppState>) -> Result<Json<SchemeReport>, ApiError> {
    let farmer = state.farmer()?;
    let catalog = schemes::load_catalog(&state.schemes_path)?;
    Ok(Json(schemes::recommend(&farmer, &catalog, &state.registry)))
}

#[derive(Serialize)]
struct SchemeDetails {
    status: &'static str,
    scheme_details: Scheme,
}

async fn scheme_details(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SchemeDetails>, ApiError> {
    let catalog = schemes::load_catalog(&state.schemes_path)?;
    let found = schemes::find_scheme(&catalog, &name)?.clone();
    Ok(Json(SchemeDetails {
        status: "success",
        scheme_details: found,
    }))
}

#[derive(Deserialize)]
struct MediaAuth {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct TranscribeReq {
    #[serde(default)]
    audio_base64: Option<String>,
    #[serde(default)]
    media_url: Option<String>,
    #[serde(default)]
    auth: Option<MediaAuth>,
    #[serde(default)]
    farmer_language: Option<String>,
}

#[derive(Serialize)]
struct TranscribeResp {
    status: &'static str,
    transcript: String,
    confidence: f32,
    config: String,
    provenance: Provenance,
    language_code: &'static str,
}

/// Explicit request language, else the farmer's profile language, else Hindi.
fn request_language(state: &AppState, explicit: Option<String>) -> String {
    explicit
        .filter(|l| !l.trim().is_empty())
        .or_else(|| state.context.farmer_context().ok().map(|c| c.language))
        .unwrap_or_else(|| profile::DEFAULT_LANGUAGE.to_string())
}

async fn transcribe(
    State(state): State<AppState>,
    Json(body): Json<TranscribeReq>,
) -> Result<Json<TranscribeResp>, ApiError> {
    let language = request_language(&state, body.farmer_language);
    let answer = match (body.audio_base64, body.media_url) {
        (Some(b64), _) => state.transcriber.transcribe_base64(&b64, &language).await?,
        (None, Some(url)) => {
            let auth = body
                .auth
                .as_ref()
                .map(|a| (a.username.as_str(), a.password.as_str()));
            state.transcriber.transcribe_url(&url, auth, &language).await?
        }
        (None, None) => {
            return Err(ApiError::BadRequest(
                "either audio_base64 or media_url is required".to_string(),
            ))
        }
    };
    Ok(Json(TranscribeResp {
        status: "success",
        transcript: answer.payload.text,
        confidence: answer.payload.confidence,
        config: answer.payload.config,
        provenance: answer.provenance,
        language_code: language_code(&language),
    }))
}

#[derive(Deserialize)]
struct SynthesizeReq {
    text: String,
    #[serde(default)]
    farmer_language: Option<String>,
}

#[derive(Serialize)]
struct SynthesizeResp {
    status: &'static str,
    audio_base64: String,
    language: String,
    voice_id: String,
    format: &'static str,
}

async fn synthesize(
    State(state): State<AppState>,
    Json(body): Json<SynthesizeReq>,
) -> Result<Json<SynthesizeResp>, ApiError> {
    let language = request_language(&state, body.farmer_language);
    let speech = state
        .synthesizer
        .synthesize(&body.text, language_code(&language))
        .await?;
    Ok(Json(SynthesizeResp {
        status: "success",
        audio_base64: speech.audio_base64,
        language: speech.language_code,
        voice_id: speech.voice_id,
        format: speech.format,
    }))
}

async fn status(State(state): State<AppState>) -> Json<VoiceStatus> {
    Json(voice_status(&state.transcriber, &state.synthesizer))
}
