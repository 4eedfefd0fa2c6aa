// src/voice/language.rs
//! Farmer language names to BCP-47 codes, recognition alternates and TTS voices.

pub const DEFAULT_LANGUAGE_CODE: &str = "hi-IN";

/// Language names the speech side understands, in display order.
pub const LANGUAGE_CODES: [(&str, &str); 13] = [
    ("hindi", "hi-IN"),
    ("english", "en-IN"),
    ("punjabi", "pa-IN"),
    ("bengali", "bn-IN"),
    ("tamil", "ta-IN"),
    ("telugu", "te-IN"),
    ("marathi", "mr-IN"),
    ("gujarati", "gu-IN"),
    ("kannada", "kn-IN"),
    ("malayalam", "ml-IN"),
    ("odia", "or-IN"),
    ("assamese", "as-IN"),
    ("urdu", "ur-IN"),
];

const MULTILINGUAL_VOICE: &str = "pNInz6obpgDQGcFmaJgB";
const INDIAN_ENGLISH_VOICE: &str = "EXAVITQu4vr4xnSDxMaL";

/// Language codes with a dedicated synthesis voice.
pub const VOICE_LANGUAGES: [&str; 10] = [
    "hi-IN", "en-IN", "pa-IN", "bn-IN", "ta-IN", "te-IN", "mr-IN", "gu-IN", "kn-IN", "ml-IN",
];

/// Unknown names map to Hindi.
pub fn language_code(farmer_language: &str) -> &'static str {
    let key = farmer_language.trim().to_ascii_lowercase();
    LANGUAGE_CODES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, code)| *code)
        .unwrap_or(DEFAULT_LANGUAGE_CODE)
}

/// Extra codes the recognizer may pick from. Hindi and English speakers get
/// none; everyone else gets both, since code-switching is common.
pub fn alternate_codes(code: &str) -> Vec<String> {
    if code == "en-IN" || code == "hi-IN" {
        Vec::new()
    } else {
        vec!["en-IN".to_string(), "hi-IN".to_string()]
    }
}

pub fn voice_id(code: &str) -> &'static str {
    match code {
        "en-IN" => INDIAN_ENGLISH_VOICE,
        _ => MULTILINGUAL_VOICE,
    }
}

pub fn language_names() -> Vec<&'static str> {
    LANGUAGE_CODES.iter().map(|(name, _)| *name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_names_case_insensitively() {
        assert_eq!(language_code("Punjabi"), "pa-IN");
        assert_eq!(language_code(" URDU "), "ur-IN");
        assert_eq!(language_code("klingon"), "hi-IN");
    }

    #[test]
    fn alternates_only_for_regional_languages() {
        assert!(alternate_codes("hi-IN").is_empty());
        assert!(alternate_codes("en-IN").is_empty());
        assert_eq!(alternate_codes("ta-IN"), vec!["en-IN", "hi-IN"]);
    }

    #[test]
    fn voices_default_to_multilingual() {
        assert_eq!(voice_id("en-IN"), "EXAVITQu4vr4xnSDxMaL");
        assert_eq!(voice_id("hi-IN"), "pNInz6obpgDQGcFmaJgB");
        assert_eq!(voice_id("or-IN"), voice_id("hi-IN"));
    }
}
