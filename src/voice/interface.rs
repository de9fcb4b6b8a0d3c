use crate::tts::interface::VoiceRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Tone Categories ────────────────────────────────────

/// Canonical mood labels. Declaration order is the tie-break order
/// used by the tone classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneCategory {
    Friendly,
    Professional,
    Casual,
    Dramatic,
    Calm,
}

impl ToneCategory {
    pub const ALL: [ToneCategory; 5] = [
        ToneCategory::Friendly,
        ToneCategory::Professional,
        ToneCategory::Casual,
        ToneCategory::Dramatic,
        ToneCategory::Calm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToneCategory::Friendly => "friendly",
            ToneCategory::Professional => "professional",
            ToneCategory::Casual => "casual",
            ToneCategory::Dramatic => "dramatic",
            ToneCategory::Calm => "calm",
        }
    }

    /// Exact (case-insensitive) match on a canonical name.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ToneCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Gender ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Neutral,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Neutral => "neutral",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|g| g.as_str() == name)
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Selection Criteria ─────────────────────────────────

/// Independent, optional constraints. `None` means "no constraint".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceSelectionCriteria {
    pub tone: Option<ToneCategory>,
    pub gender: Option<Gender>,
    /// Language name as requested (e.g. "spanish"); compared lowercase.
    pub language: Option<String>,
}

impl VoiceSelectionCriteria {
    pub fn language_lower(&self) -> Option<String> {
        self.language
            .as_deref()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
    }
}

/// A candidate voice paired with its desirability score. Only lives during ranking.
#[derive(Debug, Clone, Copy)]
pub struct ScoredVoice<'a> {
    pub voice: &'a VoiceRecord,
    pub score: i32,
}
