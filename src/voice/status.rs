// src/voice/status.rs
//! Availability report for the voice endpoints.

use serde::Serialize;

use super::language::{language_names, VOICE_LANGUAGES};
use super::synthesis::VoiceSynthesizer;
use super::transcribe::Transcriber;

#[derive(Debug, Clone, Serialize)]
pub struct SpeechToTextStatus {
    pub provider: &'static str,
    pub status: &'static str,
    pub languages: Vec<&'static str>,
    pub configurations: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextToSpeechStatus {
    pub provider: &'static str,
    pub status: &'static str,
    pub model: String,
    pub languages: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceStatus {
    pub speech_to_text: SpeechToTextStatus,
    pub text_to_speech: TextToSpeechStatus,
}

fn availability(ok: bool) -> &'static str {
    if ok {
        "available"
    } else {
        "unavailable"
    }
}

pub fn voice_status(transcriber: &Transcriber, synthesizer: &VoiceSynthesizer) -> VoiceStatus {
    VoiceStatus {
        speech_to_text: SpeechToTextStatus {
            provider: "Google Cloud Speech",
            status: availability(transcriber.is_configured()),
            languages: language_names(),
            configurations: transcriber.config_names().len(),
        },
        text_to_speech: TextToSpeechStatus {
            provider: "ElevenLabs",
            status: availability(synthesizer.is_configured()),
            model: synthesizer.model_id().to_string(),
            languages: VOICE_LANGUAGES.to_vec(),
        },
    }
}
