// src/voice/synthesis.rs
//! Text-to-speech replies via ElevenLabs, returned as base64 MP3.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

use super::language::voice_id;
use crate::config::TtsConfig;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("text-to-speech is not configured (missing API key)")]
    NotConfigured,

    #[error("nothing to synthesize")]
    EmptyText,

    #[error("text-to-speech returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("text-to-speech transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct SynthesizedSpeech {
    pub audio_base64: String,
    pub language_code: String,
    pub voice_id: String,
    pub format: &'static str,
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

#[derive(Serialize)]
struct TtsBody<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

pub struct VoiceSynthesizer {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model_id: String,
}

impl VoiceSynthesizer {
    pub fn from_config(cfg: &TtsConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            model_id: cfg.model_id.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub async fn synthesize(
        &self,
        text: &str,
        language_code: &str,
    ) -> Result<SynthesizedSpeech, SynthesisError> {
        if !self.is_configured() {
            return Err(SynthesisError::NotConfigured);
        }
        if text.trim().is_empty() {
            return Err(SynthesisError::EmptyText);
        }

        let voice = voice_id(language_code);
        let url = format!("{}/text-to-speech/{}", self.base_url, voice);
        let body = TtsBody {
            text,
            model_id: &self.model_id,
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
                style: 0.5,
                use_speaker_boost: true,
            },
        };

        let resp = self
            .http
            .post(&url)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(status = status.as_u16(), language = language_code, "text-to-speech failed");
            return Err(SynthesisError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let audio = resp.bytes().await?;
        let audio_base64 = BASE64.encode(&audio);
        info!(language = language_code, chars = audio_base64.len(), "speech synthesized");
        Ok(SynthesizedSpeech {
            audio_base64,
            language_code: language_code.to_string(),
            voice_id: voice.to_string(),
            format: "mp3",
        })
    }
}
