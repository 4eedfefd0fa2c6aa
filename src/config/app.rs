// src/config/app.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};
use tracing::warn;

use crate::prices::model::SpreadBands;
use crate::resolve::DEFAULT_CONFIDENCE_THRESHOLD;

pub const ENV_CONFIG_PATH: &str = "KISAN_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/kisan.toml";

pub const ENV_SPEECH_API_KEY: &str = "GOOGLE_SPEECH_API_KEY";
pub const ENV_TTS_API_KEY: &str = "ELEVENLABS_API_KEY";

fn default_profile_path() -> PathBuf {
    PathBuf::from("context/farmer_profile.json")
}
fn default_schemes_path() -> PathBuf {
    PathBuf::from("context/agriculture_schemes.json")
}
fn default_scrape_url() -> String {
    "https://agmarknet.gov.in".to_string()
}
fn default_scrape_timeout_ms() -> u64 {
    3_000
}
fn default_api_timeout_ms() -> u64 {
    2_000
}
fn default_speech_endpoint() -> String {
    "https://speech.googleapis.com/v1/speech:recognize".to_string()
}
fn default_speech_model() -> String {
    "latest_short".to_string()
}
fn default_threshold() -> f32 {
    DEFAULT_CONFIDENCE_THRESHOLD
}
fn default_attempt_timeout_ms() -> u64 {
    8_000
}
fn default_download_timeout_ms() -> u64 {
    30_000
}
fn default_tts_base_url() -> String {
    "https://api.elevenlabs.io/v1".to_string()
}
fn default_tts_model() -> String {
    "eleven_turbo_v2_5".to_string()
}
fn default_tts_timeout_ms() -> u64 {
    30_000
}
fn env_marker() -> String {
    "ENV".to_string()
}

/// Process-wide configuration, built once at start-up and passed by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_profile_path")]
    pub profile_path: PathBuf,
    #[serde(default = "default_schemes_path")]
    pub schemes_path: PathBuf,
    #[serde(default)]
    pub prices: PriceConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub tts: TtsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceConfig {
    /// Market site probed by the scrape tier.
    #[serde(default = "default_scrape_url")]
    pub scrape_url: String,
    #[serde(default = "default_scrape_timeout_ms")]
    pub scrape_timeout_ms: u64,
    #[serde(default = "default_api_timeout_ms")]
    pub api_timeout_ms: u64,
    #[serde(default)]
    pub spread: SpreadBands,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// "ENV" means: read from GOOGLE_SPEECH_API_KEY.
    #[serde(default = "env_marker")]
    pub api_key: String,
    #[serde(default = "default_speech_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_speech_model")]
    pub model: String,
    /// Strict lower bound a transcript's confidence must exceed.
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f32,
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
    #[serde(default = "default_download_timeout_ms")]
    pub download_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// "ENV" means: read from ELEVENLABS_API_KEY.
    #[serde(default = "env_marker")]
    pub api_key: String,
    #[serde(default = "default_tts_base_url")]
    pub base_url: String,
    #[serde(default = "default_tts_model")]
    pub model_id: String,
    #[serde(default = "default_tts_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile_path: default_profile_path(),
            schemes_path: default_schemes_path(),
            prices: PriceConfig::default(),
            speech: SpeechConfig::default(),
            tts: TtsConfig::default(),
        }
    }
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            scrape_url: default_scrape_url(),
            scrape_timeout_ms: default_scrape_timeout_ms(),
            api_timeout_ms: default_api_timeout_ms(),
            spread: SpreadBands::default(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: env_marker(),
            endpoint: default_speech_endpoint(),
            model: default_speech_model(),
            confidence_threshold: default_threshold(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            download_timeout_ms: default_download_timeout_ms(),
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            api_key: env_marker(),
            base_url: default_tts_base_url(),
            model_id: default_tts_model(),
            timeout_ms: default_tts_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Load from an explicit TOML file, then resolve "ENV" keys and sanitize.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: AppConfig =
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        Ok(cfg.finalize())
    }

    /// Load using env var + fallbacks:
    /// 1) $KISAN_CONFIG_PATH (must exist)
    /// 2) config/kisan.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from_file(&default_p);
        }
        Ok(Self::default().finalize())
    }

    /// Resolve secrets and clamp out-of-range values back to defaults.
    pub fn finalize(mut self) -> Self {
        self.speech.api_key = resolve_key(&self.speech.api_key, ENV_SPEECH_API_KEY);
        self.tts.api_key = resolve_key(&self.tts.api_key, ENV_TTS_API_KEY);

        let t = self.speech.confidence_threshold;
        if t.is_nan() || !(0.0..=1.0).contains(&t) {
            warn!(threshold = t, "speech.confidence_threshold out of range; using default");
            self.speech.confidence_threshold = default_threshold();
        }
        if self.speech.attempt_timeout_ms == 0 {
            self.speech.attempt_timeout_ms = default_attempt_timeout_ms();
        }
        if self.speech.download_timeout_ms == 0 {
            self.speech.download_timeout_ms = default_download_timeout_ms();
        }
        if self.prices.scrape_timeout_ms == 0 {
            self.prices.scrape_timeout_ms = default_scrape_timeout_ms();
        }
        if self.prices.api_timeout_ms == 0 {
            self.prices.api_timeout_ms = default_api_timeout_ms();
        }
        if self.tts.timeout_ms == 0 {
            self.tts.timeout_ms = default_tts_timeout_ms();
        }
        if !self.prices.spread.is_valid() {
            warn!(spread = ?self.prices.spread, "prices.spread inconsistent; using default bands");
            self.prices.spread = SpreadBands::default();
        }
        self
    }
}

/// "ENV" (any case) reads the named variable; a missing variable yields an
/// empty key, which disables the dependent service rather than failing start-up.
fn resolve_key(raw: &str, var: &str) -> String {
    if raw.trim().eq_ignore_ascii_case("env") {
        env::var(var).unwrap_or_default()
    } else {
        raw.trim().to_string()
    }
}
