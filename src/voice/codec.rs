// src/voice/codec.rs
//! Decode configurations tried, in order, against audio of unknown format.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    OggOpus,
    WebmOpus,
    Mp3,
    Linear16,
}

impl AudioEncoding {
    /// Name used by the recognition API.
    pub fn as_str(self) -> &'static str {
        match self {
            AudioEncoding::OggOpus => "OGG_OPUS",
            AudioEncoding::WebmOpus => "WEBM_OPUS",
            AudioEncoding::Mp3 => "MP3",
            AudioEncoding::Linear16 => "LINEAR16",
        }
    }
}

impl fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeConfig {
    pub encoding: AudioEncoding,
    pub sample_rate_hz: u32,
}

impl DecodeConfig {
    pub const fn new(encoding: AudioEncoding, sample_rate_hz: u32) -> Self {
        Self {
            encoding,
            sample_rate_hz,
        }
    }

    /// e.g. `OGG_OPUS_16kHz`
    pub fn name(&self) -> String {
        format!("{}_{}kHz", self.encoding, self.sample_rate_hz / 1000)
    }
}

/// WhatsApp voice notes are OGG/Opus, so those go first; web recorders produce
/// WebM; MP3 and raw PCM cover the rest.
pub const DEFAULT_DECODE_CONFIGS: [DecodeConfig; 6] = [
    DecodeConfig::new(AudioEncoding::OggOpus, 16_000),
    DecodeConfig::new(AudioEncoding::OggOpus, 8_000),
    DecodeConfig::new(AudioEncoding::WebmOpus, 16_000),
    DecodeConfig::new(AudioEncoding::WebmOpus, 48_000),
    DecodeConfig::new(AudioEncoding::Mp3, 16_000),
    DecodeConfig::new(AudioEncoding::Linear16, 16_000),
];

/// Browser recordings: one fixed WebM/Opus config.
pub const WEB_RECORDER_CONFIG: DecodeConfig = DecodeConfig::new(AudioEncoding::WebmOpus, 48_000);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_encoding_and_rate() {
        let names: Vec<String> = DEFAULT_DECODE_CONFIGS.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "OGG_OPUS_16kHz",
                "OGG_OPUS_8kHz",
                "WEBM_OPUS_16kHz",
                "WEBM_OPUS_48kHz",
                "MP3_16kHz",
                "LINEAR16_16kHz",
            ]
        );
    }

    #[test]
    fn encoding_serializes_as_api_name() {
        let j = serde_json::to_string(&AudioEncoding::WebmOpus).unwrap();
        assert_eq!(j, "\"WEBM_OPUS\"");
        let j = serde_json::to_string(&AudioEncoding::Linear16).unwrap();
        assert_eq!(j, "\"LINEAR16\"");
    }
}
