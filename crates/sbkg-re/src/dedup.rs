//! Evidence accumulation (§4.5): candidates sharing the same
//! (subject_key, predicate, object_key) are merged into one relationship
//! with a combined evidence list. UPREGULATES and DOWNREGULATES for the
//! same subject/object pair are never merged into each other — they key
//! separately because `predicate` is part of the dedup key.

use std::collections::HashMap;

use sbkg_common::RelationshipCandidate;

pub fn merge(candidates: Vec<RelationshipCandidate>) -> Vec<RelationshipCandidate> {
    let mut merged: HashMap<(String, sbkg_common::Predicate, String), RelationshipCandidate> = HashMap::new();

    for candidate in candidates {
        let key = (candidate.subject_key.clone(), candidate.predicate, candidate.object_key.clone());
        merged
            .entry(key)
            .and_modify(|existing| existing.evidence.extend(candidate.evidence.clone()))
            .or_insert(candidate);
    }

    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbkg_common::{EntityType, Evidence, Predicate};

    fn candidate(predicate: Predicate, confidence: f64, tag: &str) -> RelationshipCandidate {
        RelationshipCandidate {
            subject_type: EntityType::Stressor,
            subject_key: "STRESSOR::microgravity".into(),
            predicate,
            object_type: EntityType::Phenotype,
            object_key: "PHENOTYPE::bone loss".into(),
            evidence: vec![Evidence { paper_id: "p1".into(), sentence_index: 0, confidence, extractor_tag: tag.into() }],
        }
    }

    #[test]
    fn same_triple_merges_evidence() {
        let out = merge(vec![candidate(Predicate::Upregulates, 0.8, "pattern"), candidate(Predicate::Upregulates, 0.9, "dependency_pattern")]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].evidence.len(), 2);
        assert!((out[0].headline_confidence() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn distinct_predicates_never_merge() {
        let out = merge(vec![candidate(Predicate::Upregulates, 0.8, "pattern"), candidate(Predicate::Downregulates, 0.8, "pattern")]);
        assert_eq!(out.len(), 2);
    }
}
