pub mod app;

pub use app::{AppConfig, PriceConfig, SpeechConfig, TtsConfig};
