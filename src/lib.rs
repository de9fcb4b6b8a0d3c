//! Audio advertisement generation: write a script, match a voice to the
//! requested tone, synthesize it and lay background music underneath.

pub mod audio;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod server;
pub mod tts;
pub mod utils;
pub mod voice;
