//! Keyword tables for tone, gender and language matching.
//!
//! The built-in table lives in `data/voice_tables.json` and is embedded at
//! compile time. An alternative file can be supplied through config. Tables
//! are loaded once at startup and shared read-only behind an `Arc`.

use super::interface::{Gender, ToneCategory};
use crate::tts::interface::VoiceSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const BUILTIN_TABLES: &str = include_str!("../../data/voice_tables.json");

fn lowercase_all(words: &mut [String]) {
    for word in words {
        *word = word.to_lowercase();
    }
}

#[derive(Debug, Error)]
pub enum TablesError {
    #[error("voice tables are not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("voice tables are missing the '{0}' entry")]
    MissingEntry(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToneEntry {
    pub name: ToneCategory,
    pub keywords: Vec<String>,
    /// Secondary "semantic association" words, worth less than keywords.
    #[serde(default)]
    pub associations: Vec<String>,
    pub settings: VoiceSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenderEntry {
    pub name: Gender,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub first_names: Vec<String>,
    /// Core gender words that, together with `first_names`, pass the hard filter.
    #[serde(default)]
    pub indicators: Vec<String>,
    /// Words suggesting the other gender; each occurrence is penalized.
    #[serde(default)]
    pub opposite_keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub native_spellings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicStyleEntry {
    pub style: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceTables {
    tones: Vec<ToneEntry>,
    genders: Vec<GenderEntry>,
    languages: Vec<LanguageEntry>,
    #[serde(default)]
    music_styles: Vec<MusicStyleEntry>,
}

impl VoiceTables {
    /// Parse the compiled-in table.
    pub fn builtin() -> Result<Self, TablesError> {
        Self::from_json(BUILTIN_TABLES)
    }

    /// Parse and validate a table. Tones and genders are re-ordered to
    /// declaration order so lookups can index directly, and every word list
    /// is lowercased to match the lowercased voice text.
    pub fn from_json(json: &str) -> Result<Self, TablesError> {
        let mut tables: VoiceTables = serde_json::from_str(json)?;

        let mut tones = Vec::with_capacity(ToneCategory::ALL.len());
        for tone in ToneCategory::ALL {
            let entry = tables
                .tones
                .iter()
                .find(|t| t.name == tone)
                .cloned()
                .ok_or(TablesError::MissingEntry(tone.as_str()))?;
            tones.push(entry);
        }
        tables.tones = tones;

        let mut genders = Vec::with_capacity(Gender::ALL.len());
        for gender in Gender::ALL {
            let entry = tables
                .genders
                .iter()
                .find(|g| g.name == gender)
                .cloned()
                .ok_or(TablesError::MissingEntry(gender.as_str()))?;
            genders.push(entry);
        }
        tables.genders = genders;

        for tone in &mut tables.tones {
            lowercase_all(&mut tone.keywords);
            lowercase_all(&mut tone.associations);
        }
        for gender in &mut tables.genders {
            lowercase_all(&mut gender.keywords);
            lowercase_all(&mut gender.first_names);
            lowercase_all(&mut gender.indicators);
            lowercase_all(&mut gender.opposite_keywords);
        }
        for lang in &mut tables.languages {
            lang.name = lang.name.to_lowercase();
            lang.code = lang.code.to_lowercase();
            lowercase_all(&mut lang.native_spellings);
        }
        for music in &mut tables.music_styles {
            music.style = music.style.to_lowercase();
        }

        Ok(tables)
    }

    /// Load tables from `path` if given, falling back to the built-in table
    /// when the file is missing or invalid.
    pub fn load(path: Option<&Path>) -> Result<Arc<Self>, TablesError> {
        if let Some(path) = path {
            match std::fs::read_to_string(path) {
                Ok(content) => match Self::from_json(&content) {
                    Ok(tables) => {
                        tracing::info!(
                            "[Voice] Loaded keyword tables from {}",
                            path.display()
                        );
                        return Ok(Arc::new(tables));
                    }
                    Err(e) => tracing::warn!(
                        "[Voice] Invalid keyword tables {}: {}, using built-in tables",
                        path.display(),
                        e
                    ),
                },
                Err(e) => tracing::warn!(
                    "[Voice] Cannot read keyword tables {}: {}, using built-in tables",
                    path.display(),
                    e
                ),
            }
        }
        Ok(Arc::new(Self::builtin()?))
    }

    pub fn tone(&self, tone: ToneCategory) -> &ToneEntry {
        &self.tones[tone.index()]
    }

    pub fn tones(&self) -> &[ToneEntry] {
        &self.tones
    }

    pub fn gender(&self, gender: Gender) -> &GenderEntry {
        &self.genders[gender.index()]
    }

    /// Look up a language by name, case-insensitively.
    pub fn language(&self, name: &str) -> Option<&LanguageEntry> {
        let name = name.trim().to_lowercase();
        self.languages.iter().find(|l| l.name == name)
    }

    pub fn languages(&self) -> &[LanguageEntry] {
        &self.languages
    }

    pub fn music_styles(&self) -> &[MusicStyleEntry] {
        &self.music_styles
    }
}
