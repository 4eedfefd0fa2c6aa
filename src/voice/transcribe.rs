// src/voice/transcribe.rs
//! Transcription: one source attempt per decode configuration, gated on confidence.
//!
//! Audio arrives without a reliable content type, so each configuration is a
//! tier. A config that raises, hears nothing, or scores at or below the
//! threshold hands over to the next one. There is no synthetic fallback.

use chrono::Local;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{info, warn};

use super::codec::{DecodeConfig, DEFAULT_DECODE_CONFIGS, WEB_RECORDER_CONFIG};
use super::language::language_code;
use super::speech::{GoogleSpeechClient, RecognitionConfig, SpeechRecognizer};
use super::{LanguageHint, Transcript, TranscriptionLookup};
use crate::config::SpeechConfig;
use crate::resolve::{
    AttemptError, AttemptResult, ConfidenceAbove, ResolveError, ResolveRequest, ResolvedAnswer,
    Resolver, SourceAttempt,
};

pub const DOWNLOAD_USER_AGENT: &str = "Mozilla/5.0 (compatible; KisanMitra/1.0)";

pub struct DecodeAttempt {
    recognizer: Arc<dyn SpeechRecognizer>,
    config: DecodeConfig,
    name: String,
    priority: u32,
    timeout: Duration,
}

impl DecodeAttempt {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        config: DecodeConfig,
        priority: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            recognizer,
            name: config.name(),
            config,
            priority,
            timeout,
        }
    }
}

#[async_trait]
impl SourceAttempt<TranscriptionLookup> for DecodeAttempt {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(
        &self,
        audio: &Vec<u8>,
        hint: &LanguageHint,
    ) -> Result<AttemptResult<Transcript>, AttemptError> {
        let request = RecognitionConfig {
            decode: self.config,
            language_code: hint.code.clone(),
            alternates: hint.alternates.clone(),
        };
        let alternatives = self.recognizer.recognize(audio, &request).await?;

        match alternatives.into_iter().next() {
            Some(best) if !best.transcript.trim().is_empty() => Ok(AttemptResult::scored(
                Transcript {
                    text: best.transcript,
                    confidence: best.confidence,
                    config: self.name.clone(),
                },
                best.confidence,
            )),
            _ => Ok(AttemptResult::declined("no speech recognized")),
        }
    }
}

fn build_resolver(
    recognizer: &Arc<dyn SpeechRecognizer>,
    configs: &[DecodeConfig],
    threshold: f32,
    attempt_timeout: Duration,
) -> Result<Resolver<TranscriptionLookup>, ResolveError> {
    configs
        .iter()
        .enumerate()
        .fold(Resolver::builder(), |b, (i, cfg)| {
            b.attempt(DecodeAttempt::new(
                Arc::clone(recognizer),
                *cfg,
                i as u32,
                attempt_timeout,
            ))
        })
        .policy(ConfidenceAbove::new(threshold))
        .build()
}

pub struct Transcriber {
    recognizer: Arc<dyn SpeechRecognizer>,
    media: Resolver<TranscriptionLookup>,
    web: Resolver<TranscriptionLookup>,
    http: reqwest::Client,
}

impl Transcriber {
    pub fn from_config(cfg: &SpeechConfig) -> anyhow::Result<Self> {
        let recognizer: Arc<dyn SpeechRecognizer> = Arc::new(GoogleSpeechClient::from_config(cfg)?);
        Self::with_recognizer(recognizer, cfg)
    }

    pub fn with_recognizer(
        recognizer: Arc<dyn SpeechRecognizer>,
        cfg: &SpeechConfig,
    ) -> anyhow::Result<Self> {
        Self::with_configs(recognizer, cfg, &DEFAULT_DECODE_CONFIGS)
    }

    /// Custom decode order for media downloads; web audio always uses
    /// the single browser-recorder config.
    pub fn with_configs(
        recognizer: Arc<dyn SpeechRecognizer>,
        cfg: &SpeechConfig,
        configs: &[DecodeConfig],
    ) -> anyhow::Result<Self> {
        let attempt_timeout = Duration::from_millis(cfg.attempt_timeout_ms);
        let media = build_resolver(&recognizer, configs, cfg.confidence_threshold, attempt_timeout)?;
        let web = build_resolver(
            &recognizer,
            &[WEB_RECORDER_CONFIG],
            cfg.confidence_threshold,
            attempt_timeout,
        )?;
        let http = reqwest::Client::builder()
            .user_agent(DOWNLOAD_USER_AGENT)
            .timeout(Duration::from_millis(cfg.download_timeout_ms))
            .build()?;
        Ok(Self {
            recognizer,
            media,
            web,
            http,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.recognizer.is_configured()
    }

    /// Decode order used for downloaded media.
    pub fn config_names(&self) -> Vec<&str> {
        self.media.attempt_names()
    }

    pub async fn transcribe_bytes(
        &self,
        audio: Vec<u8>,
        language_code: &str,
    ) -> Result<ResolvedAnswer<Transcript>, ResolveError> {
        self.run(&self.media, audio, language_code).await
    }

    /// Downloads a media URL (optionally with basic auth) and transcribes it.
    pub async fn transcribe_url(
        &self,
        url: &str,
        auth: Option<(&str, &str)>,
        farmer_language: &str,
    ) -> Result<ResolvedAnswer<Transcript>, ResolveError> {
        // Nothing to decode with, so skip the download.
        self.ensure_configured()?;
        let audio = self.download(url, auth).await?;
        self.transcribe_bytes(audio, language_code(farmer_language))
            .await
    }

    /// Browser-recorded audio posted as base64.
    pub async fn transcribe_base64(
        &self,
        audio_base64: &str,
        farmer_language: &str,
    ) -> Result<ResolvedAnswer<Transcript>, ResolveError> {
        let audio = BASE64
            .decode(audio_base64.trim())
            .map_err(|e| AttemptError::Invalid(format!("audio is not valid base64: {e}")))?;
        self.run(&self.web, audio, language_code(farmer_language))
            .await
    }

    fn ensure_configured(&self) -> Result<(), ResolveError> {
        if self.recognizer.is_configured() {
            Ok(())
        } else {
            Err(ResolveError::Configuration(
                "speech recognizer has no API key".to_string(),
            ))
        }
    }

    async fn download(&self, url: &str, auth: Option<(&str, &str)>) -> Result<Vec<u8>, ResolveError> {
        let mut req = self.http.get(url).header(reqwest::header::ACCEPT, "audio/*,*/*");
        if let Some((user, pass)) = auth {
            req = req.basic_auth(user, Some(pass));
        }
        let resp = req.send().await.map_err(AttemptError::from)?;
        let status = resp.status();
        if !status.is_success() {
            warn!(target: "resolve", status = status.as_u16(), "audio download failed");
            return Err(AttemptError::Status {
                status: status.as_u16(),
            }
            .into());
        }
        let bytes = resp.bytes().await.map_err(AttemptError::from)?;
        info!(target: "resolve", bytes = bytes.len(), "audio downloaded");
        Ok(bytes.to_vec())
    }

    async fn run(
        &self,
        resolver: &Resolver<TranscriptionLookup>,
        audio: Vec<u8>,
        language_code: &str,
    ) -> Result<ResolvedAnswer<Transcript>, ResolveError> {
        if audio.is_empty() {
            return Err(AttemptError::EmptyPayload.into());
        }
        self.ensure_configured()?;

        let request = ResolveRequest::<TranscriptionLookup>::new(
            audio,
            LanguageHint::for_code(language_code),
            Local::now().date_naive(),
        );
        match resolver.resolve(&request).await {
            Ok(answer) => {
                info!(
                    target: "resolve",
                    attempt = %answer.provenance,
                    confidence = answer.payload.confidence,
                    preview = %answer.payload.preview(),
                    "speech recognized"
                );
                Ok(answer)
            }
            Err(ResolveError::NoResult { tried }) => {
                warn!(target: "resolve", tried, language = language_code, "no decode configuration produced a usable transcript");
                Err(ResolveError::NoTranscript { tried })
            }
            Err(e) => Err(e),
        }
    }
}
