pub mod interface;
pub mod scorer;
pub mod selector;
pub mod tables;
pub mod tone;

pub use interface::{Gender, ScoredVoice, ToneCategory, VoiceSelectionCriteria};
pub use scorer::{score_voice, voice_text};
pub use selector::{filter_voices, rank_voices, select_best_voice};
pub use tables::{TablesError, VoiceTables};
pub use tone::classify_tone;
