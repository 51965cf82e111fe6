//! Relationship extraction ensemble (§4.5): runs the enabled extractors
//! over a paper's mentions, merges evidence for duplicate triples, and
//! drops anything below the configured confidence floor.

use std::collections::HashSet;

use sbkg_common::{Mention, Paper, RelationshipCandidate};
use sbkg_config::ReConfig;

use crate::cooccurrence;
use crate::dedup::merge;
use crate::{surface_pattern, trigger_pattern};

/// Extracts relationship candidates for one paper given its NER mentions.
/// `mentions` need not be pre-sorted; they are grouped by sentence here.
pub fn process_paper(paper: &Paper, mentions: &[Mention], config: &ReConfig) -> Vec<RelationshipCandidate> {
    let Some(sentences) = paper.sentences.as_ref() else {
        return Vec::new();
    };

    let mut by_sentence: Vec<(usize, Vec<Mention>)> = sentences
        .iter()
        .map(|s| (s.index, mentions.iter().filter(|m| m.sentence_index == s.index).cloned().collect::<Vec<_>>()))
        .collect();
    by_sentence.sort_by_key(|(idx, _)| *idx);

    let mut candidates = Vec::new();
    let mut strong_pairs: HashSet<(String, String)> = HashSet::new();

    for (sentence, (sentence_index, sentence_mentions)) in sentences.iter().zip(by_sentence.iter()) {
        if sentence_mentions.len() < 2 {
            continue;
        }

        if config.dependency_enabled {
            let found = trigger_pattern::extract_sentence(&paper.literature_id, *sentence_index, &sentence.text, sentence_mentions);
            record_strong_pairs(&found, &mut strong_pairs);
            candidates.extend(found);
        }
        if config.patterns_enabled {
            let found = surface_pattern::extract_sentence(&paper.literature_id, *sentence_index, &sentence.text, sentence_mentions);
            record_strong_pairs(&found, &mut strong_pairs);
            candidates.extend(found);
        }
    }

    if config.cooccurrence_enabled {
        candidates.extend(cooccurrence::extract_paper(&paper.literature_id, &by_sentence, config.cooccurrence_window_sentences, &strong_pairs));
    }

    merge(candidates).into_iter().filter(|c| c.headline_confidence() >= config.min_confidence).collect()
}

fn record_strong_pairs(found: &[RelationshipCandidate], pairs: &mut HashSet<(String, String)>) {
    for c in found {
        let (a, b) = (c.subject_key.clone(), c.object_key.clone());
        pairs.insert(if a < b { (a, b) } else { (b, a) });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbkg_common::{EntityType, Sentence};

    fn mention(surface: &str, entity_type: EntityType, sentence_index: usize, start: usize, end: usize) -> Mention {
        Mention {
            paper_id: "p1".into(),
            sentence_index,
            start,
            end,
            surface: surface.into(),
            normalized_key: surface.to_lowercase(),
            entity_type,
            confidence: 0.9,
            extractor_tag: "patterns_space_biology".into(),
        }
    }

    #[test]
    fn paper_with_no_sentences_yields_nothing() {
        let mut paper = Paper::new("p1", "title", "nasa_osdr");
        paper.sentences = None;
        let out = process_paper(&paper, &[], &ReConfig::default());
        assert!(out.is_empty());
    }

    #[test]
    fn cooccurrence_fills_in_when_pattern_stages_are_disabled() {
        let mut paper = Paper::new("p1", "title", "nasa_osdr");
        paper.sentences = Some(vec![Sentence { index: 0, text: "Microgravity affects osteoblasts nearby.".into(), tokens: Vec::new() }]);
        let mentions = vec![
            mention("Microgravity", EntityType::Stressor, 0, 0, 12),
            mention("osteoblasts", EntityType::CellType, 0, 22, 33),
        ];
        let mut config = ReConfig::default();
        config.dependency_enabled = false;
        config.patterns_enabled = false;
        let out = process_paper(&paper, &mentions, &config);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].predicate, sbkg_common::Predicate::AssociatedWith);
    }
}
