//! Reconciliation (§4.4 steps 1-5): merges candidate spans from every
//! enabled extractor into the sentence's final Mentions.

use sbkg_common::{domain::normalize_key, Mention};

use crate::extractor::{priority_rank, CandidateSpan};

fn overlaps(a: &CandidateSpan, b: &CandidateSpan) -> bool {
    a.start < b.end && b.start < a.end
}

/// Orders candidates best-first: longest span wins, then higher confidence,
/// then extractor priority (transformer > dictionary > patterns).
fn is_better(a: &CandidateSpan, b: &CandidateSpan) -> bool {
    let len_a = a.end - a.start;
    let len_b = b.end - b.start;
    if len_a != len_b {
        return len_a > len_b;
    }
    if a.confidence != b.confidence {
        return a.confidence > b.confidence;
    }
    priority_rank(a.extractor_tag) < priority_rank(b.extractor_tag)
}

/// Resolves overlaps greedily in best-first order, drops spans below
/// `min_confidence`, and emits one Mention per surviving span.
pub fn reconcile(
    mut candidates: Vec<CandidateSpan>,
    min_confidence: f64,
    paper_id: &str,
    sentence_index: usize,
) -> Vec<Mention> {
    candidates.sort_by(|a, b| {
        if is_better(a, b) {
            std::cmp::Ordering::Less
        } else if is_better(b, a) {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    });

    let mut accepted: Vec<CandidateSpan> = Vec::new();
    for candidate in candidates {
        if !accepted.iter().any(|kept| overlaps(kept, &candidate)) {
            accepted.push(candidate);
        }
    }

    accepted
        .into_iter()
        .filter(|span| span.confidence >= min_confidence)
        .map(|span| Mention {
            paper_id: paper_id.to_string(),
            sentence_index,
            start: span.start,
            end: span.end,
            normalized_key: normalize_key(&span.surface),
            surface: span.surface,
            entity_type: span.entity_type,
            confidence: span.confidence,
            extractor_tag: span.extractor_tag.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbkg_common::EntityType;

    fn span(start: usize, end: usize, confidence: f64, tag: &'static str) -> CandidateSpan {
        CandidateSpan {
            start,
            end,
            surface: "x".repeat(end - start),
            entity_type: EntityType::Gene,
            confidence,
            extractor_tag: tag,
        }
    }

    #[test]
    fn longest_span_wins_over_shorter_overlap() {
        let candidates = vec![span(0, 5, 0.6, "patterns_space_biology"), span(0, 10, 0.5, "dictionary_biomedical")];
        let mentions = reconcile(candidates, 0.0, "p1", 0);
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].end, 10);
    }

    #[test]
    fn equal_length_ties_break_on_confidence_then_priority() {
        let candidates = vec![span(0, 5, 0.6, "patterns_space_biology"), span(0, 5, 0.9, "dictionary_biomedical")];
        let mentions = reconcile(candidates, 0.0, "p1", 0);
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].extractor_tag, "dictionary_biomedical");
    }

    #[test]
    fn below_threshold_spans_are_dropped() {
        let candidates = vec![span(0, 5, 0.3, "patterns_space_biology")];
        let mentions = reconcile(candidates, 0.5, "p1", 0);
        assert!(mentions.is_empty());
    }

    #[test]
    fn non_overlapping_spans_both_survive() {
        let candidates = vec![span(0, 5, 0.6, "patterns_space_biology"), span(10, 15, 0.6, "patterns_space_biology")];
        let mentions = reconcile(candidates, 0.0, "p1", 0);
        assert_eq!(mentions.len(), 2);
    }
}
