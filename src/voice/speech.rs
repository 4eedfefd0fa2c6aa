// src/voice/speech.rs
//! Speech recognition backend.
//!
//! The transcriber only sees `SpeechRecognizer`; the Google REST client is the
//! production implementation. Audio is sent inline as base64, which caps clips at
//! roughly one minute (fine for WhatsApp voice notes).

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::codec::DecodeConfig;
use crate::config::SpeechConfig;
use crate::resolve::AttemptError;

#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionConfig {
    pub decode: DecodeConfig,
    pub language_code: String,
    pub alternates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TranscriptAlternative {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub confidence: f32,
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Best alternative of each recognized segment; empty when nothing was heard.
    async fn recognize(
        &self,
        audio: &[u8],
        config: &RecognitionConfig,
    ) -> Result<Vec<TranscriptAlternative>, AttemptError>;

    fn is_configured(&self) -> bool {
        true
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeBody<'a> {
    config: WireConfig<'a>,
    audio: WireAudio,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireConfig<'a> {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    alternative_language_codes: &'a [String],
    enable_automatic_punctuation: bool,
    model: &'a str,
    use_enhanced: bool,
}

#[derive(Serialize)]
struct WireAudio {
    content: String,
}

#[derive(Deserialize, Default)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<WireResult>,
}

#[derive(Deserialize)]
struct WireResult {
    #[serde(default)]
    alternatives: Vec<TranscriptAlternative>,
}

pub struct GoogleSpeechClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GoogleSpeechClient {
    pub fn from_config(cfg: &SpeechConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.attempt_timeout_ms))
            .build()?;
        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        })
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleSpeechClient {
    async fn recognize(
        &self,
        audio: &[u8],
        config: &RecognitionConfig,
    ) -> Result<Vec<TranscriptAlternative>, AttemptError> {
        let body = RecognizeBody {
            config: WireConfig {
                encoding: config.decode.encoding.as_str(),
                sample_rate_hertz: config.decode.sample_rate_hz,
                language_code: &config.language_code,
                alternative_language_codes: &config.alternates,
                enable_automatic_punctuation: true,
                model: &self.model,
                use_enhanced: true,
            },
            audio: WireAudio {
                content: BASE64.encode(audio),
            },
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AttemptError::Status {
                status: status.as_u16(),
            });
        }

        let parsed: RecognizeResponse = resp
            .json()
            .await
            .map_err(|e| AttemptError::Invalid(e.to_string()))?;

        Ok(parsed
            .results
            .into_iter()
            .filter_map(|r| r.alternatives.into_iter().next())
            .collect())
    }

    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}
