pub mod config;
pub mod decode;
pub mod decoded;
pub mod ffmpeg;
pub mod interface;
pub mod mixer;
pub mod music;
pub mod numeric;
pub mod pcm;
pub mod raw;

pub use config::{AudioConfig, StrategyKind};
pub use interface::{MixError, MixOutcome, MixStrategy, MUSIC_GAIN, SPEECH_GAIN};
pub use mixer::AudioMixer;
pub use music::{MusicLibrary, MusicSource};
