//! Free-text tone description → canonical tone category.

use super::interface::ToneCategory;
use super::tables::VoiceTables;

const EXACT_WORD: i32 = 3;
const SUBSTRING: i32 = 2;
const ASSOCIATION: i32 = 1;

/// Score every tone category against `description`, in declaration order.
pub fn tone_scores(tables: &VoiceTables, description: &str) -> Vec<(ToneCategory, i32)> {
    let description = description.trim().to_lowercase();
    let words: Vec<&str> = description.split_whitespace().collect();

    ToneCategory::ALL
        .into_iter()
        .map(|tone| {
            let entry = tables.tone(tone);
            let mut score = 0;

            for word in &words {
                if entry.keywords.iter().any(|k| k == word) {
                    score += EXACT_WORD;
                }
            }

            for keyword in &entry.keywords {
                if description.contains(keyword.as_str()) || keyword.contains(description.as_str())
                {
                    score += SUBSTRING;
                }
            }

            for word in &words {
                if entry.associations.iter().any(|a| a == word) {
                    score += ASSOCIATION;
                }
            }

            (tone, score)
        })
        .collect()
}

/// Map a tone description to the best-matching category.
///
/// Canonical names match directly. Otherwise the highest-scoring category wins,
/// ties going to the earliest in [`ToneCategory::ALL`]. Returns `None` when nothing
/// scores, leaving the caller to fall back to default settings.
pub fn classify_tone(tables: &VoiceTables, description: &str) -> Option<ToneCategory> {
    let normalized = description.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    if let Some(tone) = ToneCategory::parse(&normalized) {
        return Some(tone);
    }

    let mut best: Option<(ToneCategory, i32)> = None;
    for (tone, score) in tone_scores(tables, &normalized) {
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((tone, score)),
        }
    }

    match best {
        Some((tone, score)) if score > 0 => {
            tracing::info!(
                "[Voice] Analyzed tone '{}' -> '{}' (confidence: {})",
                normalized,
                tone,
                score
            );
            Some(tone)
        }
        _ => {
            tracing::warn!(
                "[Voice] Could not analyze tone '{}', using default tone settings",
                normalized
            );
            None
        }
    }
}
