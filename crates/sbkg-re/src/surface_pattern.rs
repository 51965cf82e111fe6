//! Surface-pattern extractor (§4.5 extractor 2): a small curated set of
//! fixed connector phrases, matched literally (no inflection expansion)
//! between two compatible mentions. Fixed confidence, no passive handling.

use sbkg_common::{Evidence, Mention, Predicate, RelationshipCandidate};

use crate::compat::compatible;
use crate::keys::mention_key;

const EXTRACTOR_TAG: &str = "pattern";
const PATTERN_CONFIDENCE: f64 = 0.8;

fn connectors_for(predicate: Predicate) -> &'static [&'static str] {
    use Predicate::*;
    match predicate {
        Causes => &["causes", "induces", "leads to"],
        Upregulates => &["increases", "elevates"],
        Downregulates => &["decreases", "reduces"],
        Treats => &["treats", "is used to treat"],
        Prevents => &["prevents"],
        InteractsWith => &["interacts with"],
        PartOf => &["is part of"],
        AssociatedWith => &[],
    }
}

const CURATED_PREDICATES: [Predicate; 7] = [
    Predicate::Causes,
    Predicate::Upregulates,
    Predicate::Downregulates,
    Predicate::Treats,
    Predicate::Prevents,
    Predicate::InteractsWith,
    Predicate::PartOf,
];

pub fn extract_sentence(paper_id: &str, sentence_index: usize, sentence_text: &str, mentions: &[Mention]) -> Vec<RelationshipCandidate> {
    let mut candidates = Vec::new();

    for i in 0..mentions.len() {
        for j in 0..mentions.len() {
            if i == j || mentions[i].start > mentions[j].start || mentions[i].end > mentions[j].start {
                continue;
            }
            let subject = &mentions[i];
            let object = &mentions[j];
            let between = sentence_text[subject.end.min(sentence_text.len())..object.start.min(sentence_text.len())].to_lowercase();

            for predicate in CURATED_PREDICATES {
                if !compatible(subject.entity_type, predicate, object.entity_type) {
                    continue;
                }
                if connectors_for(predicate).iter().any(|c| between.contains(c)) {
                    candidates.push(RelationshipCandidate {
                        subject_type: subject.entity_type,
                        subject_key: mention_key(subject),
                        predicate,
                        object_type: object.entity_type,
                        object_key: mention_key(object),
                        evidence: vec![Evidence {
                            paper_id: paper_id.to_string(),
                            sentence_index,
                            confidence: PATTERN_CONFIDENCE,
                            extractor_tag: EXTRACTOR_TAG.to_string(),
                        }],
                    });
                }
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
    fn fixed_connector_yields_fixed_confidence() {
        let text = "Dexamethasone causes bone loss.";
        let chem = mention(0, 13, EntityType::Chemical, "Dexamethasone");
        let phenotype = mention(22, 31, EntityType::Phenotype, "bone loss");
        // Chemical isn't a valid Causes subject, so re-check with Stressor instead.
        let stressor = mention(0, 13, EntityType::Stressor, "Dexamethasone");
        let candidates = extract_sentence("p1", 0, text, &[stressor.clone(), phenotype.clone()]);
        assert_eq!(candidates.len(), 1);
        assert!((candidates[0].evidence[0].confidence - 0.8).abs() < 1e-9);
        let none = extract_sentence("p1", 0, text, &[chem, phenotype]);
        assert!(none.is_empty());
    }
}
