// src/voice/mod.rs
//! Voice: speech transcription through the resolution engine, plus synthesis.

pub mod codec;
pub mod language;
pub mod speech;
pub mod status;
pub mod synthesis;
pub mod transcribe;

use serde::Serialize;

use crate::resolve::{Lookup, PayloadContent};

pub use codec::{AudioEncoding, DecodeConfig, DEFAULT_DECODE_CONFIGS, WEB_RECORDER_CONFIG};
pub use language::{alternate_codes, language_code, voice_id, DEFAULT_LANGUAGE_CODE};
pub use speech::{GoogleSpeechClient, RecognitionConfig, SpeechRecognizer, TranscriptAlternative};
pub use status::{voice_status, VoiceStatus};
pub use synthesis::{SynthesisError, SynthesizedSpeech, VoiceSynthesizer};
pub use transcribe::{DecodeAttempt, Transcriber};

/// Marker for the transcription instantiation of the resolver.
/// Query is the raw audio; there is no fallback.
pub struct TranscriptionLookup;

impl Lookup for TranscriptionLookup {
    type Query = Vec<u8>;
    type Context = LanguageHint;
    type Payload = Transcript;
    const LABEL: &'static str = "transcription";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageHint {
    pub code: String,
    pub alternates: Vec<String>,
}

impl LanguageHint {
    pub fn for_code(code: impl Into<String>) -> Self {
        let code = code.into();
        let alternates = alternate_codes(&code);
        Self { code, alternates }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcript {
    pub text: String,
    pub confidence: f32,
    /// Decode configuration that produced the text, e.g. `OGG_OPUS_16kHz`.
    pub config: String,
}

impl Transcript {
    /// First 50 characters, for logs.
    pub fn preview(&self) -> String {
        self.text.chars().take(50).collect()
    }
}

impl PayloadContent for Transcript {
    fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
