//! Co-occurrence fallback extractor (§4.5 extractor 3): ASSOCIATED_WITH at
//! confidence `min(0.5, 0.1 * cooccurrence_count)` for any mention pair that
//! appears together within `window_sentences` sentences and carries no
//! stronger claim from the other extractors.

use ahash::AHashMap;

use sbkg_common::{Evidence, Mention, Predicate, RelationshipCandidate};

use crate::keys::mention_key;

const EXTRACTOR_TAG: &str = "cooccurrence";
const MAX_CONFIDENCE: f64 = 0.5;
const PER_OCCURRENCE: f64 = 0.1;

/// `mentions_by_sentence` must be indexed by sentence position within the
/// paper. `stronger_pairs` holds (subject_key, object_key) pairs — in
/// either order — already claimed by the dependency or surface extractors,
/// which the fallback must not duplicate.
pub fn extract_paper(
    paper_id: &str,
    mentions_by_sentence: &[(usize, Vec<Mention>)],
    window_sentences: usize,
    stronger_pairs: &std::collections::HashSet<(String, String)>,
) -> Vec<RelationshipCandidate> {
    let mut counts: AHashMap<(String, String), (usize, usize, usize)> = AHashMap::new();

    for (center_idx, (sentence_index, mentions)) in mentions_by_sentence.iter().enumerate() {
        let window_end = (center_idx + window_sentences + 1).min(mentions_by_sentence.len());
        let mut in_window: Vec<&Mention> = mentions.iter().collect();
        for (_, later_mentions) in &mentions_by_sentence[center_idx + 1..window_end] {
            in_window.extend(later_mentions.iter());
        }

        for i in 0..mentions.len() {
            for m2 in &in_window {
                let m1 = &mentions[i];
                let k1 = mention_key(m1);
                let k2 = mention_key(*m2);
                if k1 == k2 {
                    continue;
                }
                let pair_key = if k1 < k2 { (k1.clone(), k2.clone()) } else { (k2.clone(), k1.clone()) };
                if stronger_pairs.contains(&pair_key) {
                    continue;
                }
                let entry = counts.entry(pair_key).or_insert((0, 0, *sentence_index));
                entry.0 += 1;
                let _ = &entry.1;
            }
        }
    }

    // Re-derive ordered subject/object + paper-first-seen sentence from the smaller key.
    counts
        .into_iter()
        .map(|((k1, k2), (count, _, sentence_index))| {
            let (subject_key, object_key) = (k1, k2);
            let subject_type = parse_type(&subject_key);
            let object_type = parse_type(&object_key);
            let confidence = (PER_OCCURRENCE * count as f64).min(MAX_CONFIDENCE);
            RelationshipCandidate {
                subject_type,
                subject_key,
                predicate: Predicate::AssociatedWith,
                object_type,
                object_key,
                evidence: vec![Evidence {
                    paper_id: paper_id.to_string(),
                    sentence_index,
                    confidence,
                    extractor_tag: EXTRACTOR_TAG.to_string(),
                }],
            }
        })
        .collect()
}

fn parse_type(key: &str) -> sbkg_common::EntityType {
    key.split("::")
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(sbkg_common::EntityType::Gene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbkg_common::EntityType;
    use std::collections::HashSet;

    fn mention(surface: &str, entity_type: EntityType, sentence_index: usize) -> Mention {
        Mention {
            paper_id: "p1".into(),
            sentence_index,
            start: 0,
            end: surface.len(),
            surface: surface.into(),
            normalized_key: surface.to_lowercase(),
            entity_type,
            confidence: 0.9,
            extractor_tag: "patterns_space_biology".into(),
        }
    }

    #[test]
    fn pair_in_window_gets_scaled_confidence() {
        let gene = mention("foxo3", EntityType::Gene, 0);
        let disease = mention("osteoporosis", EntityType::Disease, 1);
        let by_sentence = vec![(0usize, vec![gene]), (1usize, vec![disease])];
        let out = extract_paper("p1", &by_sentence, 2, &HashSet::new());
        assert_eq!(out.len(), 1);
        assert!((out[0].evidence[0].confidence - 0.1).abs() < 1e-9);
        assert_eq!(out[0].predicate, Predicate::AssociatedWith);
    }

    #[test]
    fn pair_already_claimed_is_skipped() {
        let gene = mention("foxo3", EntityType::Gene, 0);
        let disease = mention("osteoporosis", EntityType::Disease, 0);
        let by_sentence = vec![(0usize, vec![gene.clone(), disease.clone()])];
        let mut claimed = HashSet::new();
        let (k1, k2) = (mention_key(&gene), mention_key(&disease));
        claimed.insert(if k1 < k2 { (k1, k2) } else { (k2, k1) });
        let out = extract_paper("p1", &by_sentence, 2, &claimed);
        assert!(out.is_empty());
    }
}
