//! Dependency-pattern extractor (§4.5 extractor 1).
//!
//! There is no pure-Rust dependency parser in this pipeline, so "shortest
//! dependency path contains a trigger lemma" is approximated by scanning
//! the raw text strictly between two compatible mentions in the same
//! sentence for a trigger surface form. Direction defaults to
//! earlier-mention-is-subject (active voice); a passive auxiliary ("was/
//! were/is/are ... by") between the mentions flips subject and object and
//! costs one passive-hop penalty per occurrence.

use regex::Regex;
use sbkg_common::{Evidence, Mention, Predicate, RelationshipCandidate};
use std::sync::OnceLock;

use crate::compat::compatible;
use crate::keys::mention_key;
use crate::trigger_lexicon::{triggerable_predicates, triggers_for};

const EXTRACTOR_TAG: &str = "dependency_pattern";
const BASE_CONFIDENCE: f64 = 0.9;
const PASSIVE_PENALTY: f64 = 0.1;
const CONFIDENCE_FLOOR: f64 = 0.5;

fn passive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:was|were|is|are|been)\b[^.]*?\bby\b").unwrap())
}

/// Runs the heuristic over every mention pair within one sentence.
pub fn extract_sentence(paper_id: &str, sentence_index: usize, sentence_text: &str, mentions: &[Mention]) -> Vec<RelationshipCandidate> {
    let mut candidates = Vec::new();

    for i in 0..mentions.len() {
        for j in 0..mentions.len() {
            if i == j {
                continue;
            }
            let (earlier, later) = if mentions[i].start <= mentions[j].start { (&mentions[i], &mentions[j]) } else { continue };
            if earlier.end > later.start {
                continue; // overlapping mentions, not a valid pair
            }
            let between = &sentence_text[earlier.end.min(sentence_text.len())..later.start.min(sentence_text.len())];
            let passive_hops = passive_regex().find_iter(between).count();

            for predicate in triggerable_predicates() {
                let has_trigger = triggers_for(predicate).iter().any(|t| between.to_lowercase().contains(t));
                if !has_trigger {
                    continue;
                }

                let (subject, object) = if passive_hops > 0 { (later, earlier) } else { (earlier, later) };
                if !compatible(subject.entity_type, predicate, object.entity_type) {
                    continue;
                }

                let confidence = (BASE_CONFIDENCE - PASSIVE_PENALTY * passive_hops as f64).max(CONFIDENCE_FLOOR);
                candidates.push(RelationshipCandidate {
                    subject_type: subject.entity_type,
                    subject_key: mention_key(subject),
                    predicate,
                    object_type: object.entity_type,
                    object_key: mention_key(object),
                    evidence: vec![Evidence {
                        paper_id: paper_id.to_string(),
                        sentence_index,
                        confidence,
                        extractor_tag: EXTRACTOR_TAG.to_string(),
                    }],
                });
            }
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbkg_common::EntityType;

    fn mention(start: usize, end: usize, entity_type: EntityType, surface: &str) -> Mention {
        Mention {
            paper_id: "p1".into(),
            sentence_index: 0,
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
    fn active_voice_trigger_yields_forward_relationship() {
        let text = "Microgravity induces bone loss in rodents.";
        let stressor = mention(0, 12, EntityType::Stressor, "Microgravity");
        let phenotype = mention(21, 30, EntityType::Phenotype, "bone loss");
        let candidates = extract_sentence("p1", 0, text, &[stressor, phenotype]);
        assert!(candidates.iter().any(|c| c.predicate == Predicate::Upregulates
            && c.subject_type == EntityType::Stressor
            && c.object_type == EntityType::Phenotype));
    }

    #[test]
    fn passive_voice_swaps_subject_and_object_with_penalty() {
        let text = "Bone loss was induced by microgravity exposure.";
        let phenotype = mention(0, 9, EntityType::Phenotype, "Bone loss");
        let stressor = mention(26, 38, EntityType::Stressor, "microgravity");
        let candidates = extract_sentence("p1", 0, text, &[phenotype, stressor]);
        let rel = candidates.iter().find(|c| c.predicate == Predicate::Upregulates).unwrap();
        assert_eq!(rel.subject_type, EntityType::Stressor);
        assert_eq!(rel.object_type, EntityType::Phenotype);
        assert!((rel.evidence[0].confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn incompatible_type_pair_is_skipped() {
        let text = "Bone loss induces the chemical.";
        let phenotype = mention(0, 9, EntityType::Phenotype, "Bone loss");
        let chemical = mention(23, 31, EntityType::Chemical, "chemical");
        let candidates = extract_sentence("p1", 0, text, &[phenotype, chemical]);
        assert!(candidates.is_empty());
    }
}
