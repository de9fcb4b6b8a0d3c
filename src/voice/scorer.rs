//! Additive desirability score of one voice against selection criteria.
//!
//! The weights are hand-tuned and kept as-is; they are not derived from any
//! model and are candidates for calibration.

use super::interface::VoiceSelectionCriteria;
use super::tables::VoiceTables;
use crate::tts::interface::VoiceRecord;

const TONE_KEYWORD: i32 = 3;
const TONE_IN_NAME: i32 = 5;
const GENDER_KEYWORD: i32 = 5;
const GENDER_IN_NAME: i32 = 10;
const GENDER_FIRST_NAME: i32 = 8;
const OPPOSITE_GENDER_PENALTY: i32 = 5;
const LANGUAGE_CODE: i32 = 5;
const LANGUAGE_NAME: i32 = 8;
const LANGUAGE_NATIVE: i32 = 6;
const QUALITY_CATEGORY: i32 = 2;
const DESCRIPTIVE: i32 = 1;
const QUALITY_CATEGORIES: [&str; 3] = ["premade", "cloned", "professional"];
const DESCRIPTIVE_MIN_CHARS: usize = 20;

/// Lowercase `name description {labels}` blob all text matching runs against.
pub fn voice_text(voice: &VoiceRecord) -> String {
    format!(
        "{} {} {}",
        voice.name,
        voice.description,
        voice.labels_text()
    )
    .to_lowercase()
}

/// Score `voice` against `criteria`. Pure and total: missing fields are empty
/// strings and the result may be negative.
pub fn score_voice(
    tables: &VoiceTables,
    voice: &VoiceRecord,
    criteria: &VoiceSelectionCriteria,
) -> i32 {
    let text = voice_text(voice);
    let name = voice.name.to_lowercase();
    let mut score = 0;

    if let Some(tone) = criteria.tone {
        let entry = tables.tone(tone);
        score += TONE_KEYWORD * count_present(&entry.keywords, &text);
        if name.contains(tone.as_str()) {
            score += TONE_IN_NAME;
        }
    }

    if let Some(gender) = criteria.gender {
        let entry = tables.gender(gender);
        score += GENDER_KEYWORD * count_present(&entry.keywords, &text);
        if name.contains(gender.as_str()) {
            score += GENDER_IN_NAME;
        }
        if entry.first_names.iter().any(|n| name.contains(n.as_str())) {
            score += GENDER_FIRST_NAME;
        }
        score -= OPPOSITE_GENDER_PENALTY * count_present(&entry.opposite_keywords, &text);
    }

    if let Some(language) = criteria.language_lower() {
        if let Some(entry) = tables.language(&language) {
            if text.contains(entry.code.as_str()) {
                score += LANGUAGE_CODE;
            }
            if entry
                .native_spellings
                .iter()
                .any(|s| text.contains(s.as_str()))
            {
                score += LANGUAGE_NATIVE;
            }
        }
        if text.contains(language.as_str()) {
            score += LANGUAGE_NAME;
        }
    }

    if QUALITY_CATEGORIES.contains(&voice.category.to_lowercase().as_str()) {
        score += QUALITY_CATEGORY;
    }
    if voice.description.chars().count() > DESCRIPTIVE_MIN_CHARS {
        score += DESCRIPTIVE;
    }

    score
}

fn count_present(words: &[String], text: &str) -> i32 {
    words.iter().filter(|w| text.contains(w.as_str())).count() as i32
}
