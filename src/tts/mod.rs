pub mod config;
pub mod elevenlabs;
pub mod interface;
pub mod synthesizer;

pub use config::TtsConfig;
pub use elevenlabs::ElevenLabsClient;
pub use interface::{SpeechBackend, SpeechRequest, TtsError, VoiceRecord, VoiceSettings};
pub use synthesizer::{SpeechSynthesizer, SynthesisOptions};
