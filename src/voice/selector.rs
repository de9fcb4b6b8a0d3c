//! Rank candidate voices and pick the best one.

use super::interface::{Gender, ScoredVoice, VoiceSelectionCriteria};
use super::scorer::{score_voice, voice_text};
use super::tables::VoiceTables;
use crate::tts::interface::VoiceRecord;

/// Score every voice and sort descending. Ties keep input order.
pub fn rank_voices<'a>(
    tables: &VoiceTables,
    voices: &'a [VoiceRecord],
    criteria: &VoiceSelectionCriteria,
) -> Vec<ScoredVoice<'a>> {
    let mut ranked: Vec<ScoredVoice<'a>> = voices
        .iter()
        .map(|voice| ScoredVoice {
            voice,
            score: score_voice(tables, voice, criteria),
        })
        .collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

/// Hard gender/language constraint applied after ranking.
pub fn matches_hard_filter(
    tables: &VoiceTables,
    voice: &VoiceRecord,
    criteria: &VoiceSelectionCriteria,
) -> bool {
    let text = voice_text(voice);

    let gender_ok = match criteria.gender {
        None | Some(Gender::Neutral) => true,
        Some(gender) => {
            let entry = tables.gender(gender);
            entry
                .first_names
                .iter()
                .chain(entry.indicators.iter())
                .any(|w| text.contains(w.as_str()))
        }
    };

    let language_ok = match criteria.language_lower() {
        None => true,
        Some(language) => {
            if text.contains(language.as_str()) {
                true
            } else if let Some(entry) = tables.language(&language) {
                text.contains(entry.code.as_str())
                    || entry
                        .native_spellings
                        .iter()
                        .any(|s| text.contains(s.as_str()))
            } else {
                false
            }
        }
    };

    gender_ok && language_ok
}

/// Pick the best voice for `criteria`.
///
/// Candidates passing the hard filter are preferred; if none pass, the full
/// ranking is used instead. Returns `None` only for an empty candidate list.
pub fn select_best_voice<'a>(
    tables: &VoiceTables,
    voices: &'a [VoiceRecord],
    criteria: &VoiceSelectionCriteria,
) -> Option<ScoredVoice<'a>> {
    if voices.is_empty() {
        return None;
    }

    let ranked = rank_voices(tables, voices, criteria);
    tracing::info!("[Voice] Evaluating {} voices", ranked.len());
    for (i, candidate) in ranked.iter().take(3).enumerate() {
        tracing::info!(
            "[Voice]   {}. {} - score {} - {}",
            i + 1,
            candidate.voice.name,
            candidate.score,
            candidate
                .voice
                .description
                .chars()
                .take(50)
                .collect::<String>()
        );
    }
    for candidate in &ranked {
        tracing::debug!(
            "[Voice] candidate {} ({}) score {}",
            candidate.voice.name,
            candidate.voice.voice_id,
            candidate.score
        );
    }

    let filtered: Vec<ScoredVoice<'a>> = ranked
        .iter()
        .filter(|c| matches_hard_filter(tables, c.voice, criteria))
        .copied()
        .collect();

    let best = if filtered.is_empty() {
        if criteria.gender.is_some() || criteria.language.is_some() {
            tracing::warn!(
                "[Voice] No voice passes the gender/language filter, using best overall"
            );
        }
        ranked.first().copied()
    } else {
        tracing::info!("[Voice] Filtered to {} matching voices", filtered.len());
        filtered.first().copied()
    };

    if let Some(best) = &best {
        tracing::info!(
            "[Voice] Selected voice: {} (ID: {}, score {})",
            best.voice.name,
            best.voice.voice_id,
            best.score
        );
    }
    best
}

/// Keyword listing filter, independent of scoring. Criteria combine with AND;
/// an unrecognized language imposes no constraint.
pub fn filter_voices(
    tables: &VoiceTables,
    voices: &[VoiceRecord],
    criteria: &VoiceSelectionCriteria,
) -> Vec<VoiceRecord> {
    let mentions = |voice: &VoiceRecord, keywords: &[String]| {
        let description = voice.description.to_lowercase();
        let name = voice.name.to_lowercase();
        let labels: Vec<String> = voice.labels.values().map(|v| v.to_lowercase()).collect();
        keywords.iter().any(|k| {
            let k = k.to_lowercase();
            description.contains(&k) || name.contains(&k) || labels.iter().any(|l| l.contains(&k))
        })
    };

    let language = criteria
        .language_lower()
        .and_then(|l| tables.language(&l).cloned());

    voices
        .iter()
        .filter(|v| match criteria.tone {
            Some(tone) => mentions(v, &tables.tone(tone).keywords),
            None => true,
        })
        .filter(|v| match criteria.gender {
            Some(gender) => mentions(v, &tables.gender(gender).keywords),
            None => true,
        })
        .filter(|v| match &language {
            Some(entry) => {
                let label = v
                    .labels
                    .get("language")
                    .map(|l| l.to_lowercase())
                    .unwrap_or_default();
                label.contains(entry.code.as_str())
                    || v.description.to_lowercase().contains(entry.name.as_str())
                    || v.name.to_lowercase().contains(entry.name.as_str())
            }
            None => true,
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::interface::ToneCategory;
    use std::collections::BTreeMap;

    fn tables() -> VoiceTables {
        VoiceTables::builtin().unwrap()
    }

    fn voice(id: &str, name: &str, description: &str) -> VoiceRecord {
        VoiceRecord {
            voice_id: id.to_string(),
            name: name.to_string(),
            category: "premade".to_string(),
            description: description.to_string(),
            labels: BTreeMap::new(),
        }
    }

    #[test]
    fn empty_list_selects_nothing() {
        let criteria = VoiceSelectionCriteria {
            tone: Some(ToneCategory::Dramatic),
            gender: Some(Gender::Female),
            language: Some("french".into()),
        };
        assert!(select_best_voice(&tables(), &[], &criteria).is_none());
    }

    #[test]
    fn ranking_is_stable_on_ties() {
        let voices = vec![voice("a", "Zork", "x"), voice("b", "Qux", "y"), voice("c", "Blip", "z")];
        let ranked = rank_voices(&tables(), &voices, &VoiceSelectionCriteria::default());
        let ids: Vec<&str> = ranked.iter().map(|c| c.voice.voice_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn picks_highest_scoring_voice() {
        let voices = vec![
            voice("plain", "Zork", "narrator"),
            voice("calm", "Cora", "soothing and serene"),
        ];
        let criteria = VoiceSelectionCriteria {
            tone: Some(ToneCategory::Calm),
            ..Default::default()
        };
        let best = select_best_voice(&tables(), &voices, &criteria).unwrap();
        assert_eq!(best.voice.voice_id, "calm");
    }

    #[test]
    fn hard_filter_beats_higher_score() {
        // "Calm" scores higher on tone, but only "Adam" passes the male filter.
        let voices = vec![voice("calm", "Calm Zork", "soothing serene"), voice("adam", "Adam", "")];
        let criteria = VoiceSelectionCriteria {
            tone: Some(ToneCategory::Calm),
            gender: Some(Gender::Male),
            ..Default::default()
        };
        let best = select_best_voice(&tables(), &voices, &criteria).unwrap();
        assert_eq!(best.voice.voice_id, "adam");
    }

    #[test]
    fn falls_back_to_full_ranking_when_filter_is_empty() {
        let voices = vec![
            voice("x", "Zork", "robotic"),
            voice("y", "Qux", "robotic narrator voice"),
        ];
        let criteria = VoiceSelectionCriteria {
            language: Some("japanese".into()),
            ..Default::default()
        };
        let best = select_best_voice(&tables(), &voices, &criteria).unwrap();
        // "y" wins on the description-length bonus
        assert_eq!(best.voice.voice_id, "y");
    }

    #[test]
    fn neutral_gender_always_passes() {
        let criteria = VoiceSelectionCriteria {
            gender: Some(Gender::Neutral),
            ..Default::default()
        };
        assert!(matches_hard_filter(&tables(), &voice("x", "Zork", ""), &criteria));
    }

    #[test]
    fn language_hard_filter_uses_code_and_native_spelling() {
        let tables = tables();
        let criteria = VoiceSelectionCriteria {
            language: Some("german".into()),
            ..Default::default()
        };
        assert!(matches_hard_filter(&tables, &voice("x", "Klaus", "deutsche stimme"), &criteria));
        let mut labelled = voice("y", "Klaus", "");
        labelled.labels.insert("language".into(), "de".into());
        assert!(matches_hard_filter(&tables, &labelled, &criteria));
        assert!(!matches_hard_filter(&tables, &voice("z", "Zork", "robot"), &criteria));
    }

    #[test]
    fn listing_filter_combines_criteria() {
        let tables = tables();
        let mut spanish = voice("es", "Lucia", "warm female narrator");
        spanish.labels.insert("language".into(), "es".into());
        let voices = vec![
            spanish,
            voice("en", "Emma", "warm female narrator"),
            voice("m", "Adam", "deep male voice"),
        ];

        let female = VoiceSelectionCriteria {
            gender: Some(Gender::Female),
            ..Default::default()
        };
        let ids: Vec<String> = filter_voices(&tables, &voices, &female)
            .into_iter()
            .map(|v| v.voice_id)
            .collect();
        assert_eq!(ids, vec!["es", "en"]);

        let spanish_female = VoiceSelectionCriteria {
            gender: Some(Gender::Female),
            language: Some("Spanish".into()),
            ..Default::default()
        };
        let ids: Vec<String> = filter_voices(&tables, &voices, &spanish_female)
            .into_iter()
            .map(|v| v.voice_id)
            .collect();
        assert_eq!(ids, vec!["es"]);
    }

    #[test]
    fn listing_filter_ignores_unknown_language() {
        let voices = vec![voice("a", "Zork", "robot")];
        let criteria = VoiceSelectionCriteria {
            language: Some("klingon".into()),
            ..Default::default()
        };
        assert_eq!(filter_voices(&tables(), &voices, &criteria).len(), 1);
    }
}
